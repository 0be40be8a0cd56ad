// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

#![warn(missing_docs)]

//! Client driver for the sevault crypto engine.
//!
//! The engine is a token-driven HSM: keys and other secrets live in its
//! asset store under immutable policies, and every operation is one
//! command/result exchange over a [`TokenChannel`]. This crate is the
//! host-side API over that protocol. It validates arguments locally before
//! any token leaves the host, splits oversized inputs into engine-sized
//! fragments transparently, and ties engine-resident state to RAII handles
//! so nothing leaks when a caller bails early.
//!
//! A [`Session`] couples an open channel with a caller identity; everything
//! else hangs off it:
//!
//! - [`Asset`] handles over the engine store, loaded from plaintext, key
//!   blobs, derivation or the TRNG.
//! - Streaming [`HashContext`], [`MacContext`], [`CipherContext`] and the
//!   single-shot [`AeadContext`].
//! - Asymmetric families in [`asym`]: ECDSA, EdDSA, ECDH, X25519, EC
//!   ElGamal, DH, DSA and RSA, described by a [`KeyDescriptor`].
//! - Auxiliary services in [`service`]: random data, counters, timers, OTP
//!   provisioning, AES key wrap, eMMC (RPMB) authentication and Milenage.
//!
//! ```no_run
//! use sevault::compose;
//! use sevault::Capability;
//! use sevault::Lifetime;
//! use sevault::MacAlg;
//! use sevault::Provenance;
//! use sevault::Session;
//! use sevault_sim::SimEngine;
//! use sevault_sim::SIM_ENGINE_PATH;
//!
//! # fn main() -> sevault::VaultResult<()> {
//! let engine = SimEngine::default();
//! let session = Session::open(&engine, SIM_ENGINE_PATH, 1, Provenance::NonSecure)?;
//! let policy = compose(Capability::Mac(MacAlg::HmacSha256), None, false, false, true)?;
//! let key = session.allocate_asset(policy, 32, Lifetime::Infinite)?;
//! # let _ = key;
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod asym;
pub mod error;
pub mod policy;
pub mod service;
pub mod session;
pub mod sym;

pub use asset::Asset;
pub use asset::MAX_ASSET_BYTES;
pub use asym::AsymFamily;
pub use asym::EccDomain;
pub use asym::EcPoint;
pub use asym::KeyDescriptor;
pub use asym::dh::DlDomain;
pub use asym::rsa::rsa_key_content;
pub use error::VaultError;
pub use error::VaultResult;
pub use policy::compose;
pub use policy::Capability;
pub use service::AuthVector;
pub use service::AutnOutcome;
pub use service::EmmcReadSession;
pub use service::EmmcWriteSession;
pub use service::SqnAdmin;
pub use service::Timer;
pub use session::engine_list;
pub use session::ClaimGuard;
pub use session::Session;
pub use sym::AeadContext;
pub use sym::CipherContext;
pub use sym::HashContext;
pub use sym::MacContext;
pub use sym::TempState;

pub use sevault_channel::TokenChannel;
pub use sevault_channel::TokenEngine;
pub use sevault_token::AeadAlg;
pub use sevault_token::AssetId;
pub use sevault_token::CipherAlg;
pub use sevault_token::CipherMode;
pub use sevault_token::GcmSubmode;
pub use sevault_token::HashAlg;
pub use sevault_token::Lifetime;
pub use sevault_token::MacAlg;
pub use sevault_token::MilenageConformance;
pub use sevault_token::PolicyMask;
pub use sevault_token::Provenance;
pub use sevault_token::StaticAssetNumber;
pub use sevault_token::SystemInfo;
pub use sevault_token::TrngConfigCmd;
pub use sevault_token::Version;
pub use sevault_token::WrapMethod;
