// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

#![warn(missing_docs)]

//! Token protocol types for the sevault HSM driver.
//!
//! The crypto engine is driven by a narrow command/result message protocol:
//! one command token in, one result token out, per operation. This crate
//! defines those messages as closed sum types ([`ServiceCmd`], [`ServiceRes`])
//! so that every opcode/subcode combination the driver can emit is spelled
//! out, plus the engine's big-integer/EC-point wire format ([`wire`]) and the
//! status codes the engine reports ([`EngineStatus`]).
//!
//! Nothing in this crate touches a transport; encoding and decoding are plain
//! functions over byte slices so the codec is testable on its own.

mod algo;
mod cmd;
mod id;
mod policy;
mod res;
mod status;
pub mod wire;

pub use algo::AeadAlg;
pub use algo::CipherAlg;
pub use algo::CipherMode;
pub use algo::GcmSubmode;
pub use algo::HashAlg;
pub use algo::MacAlg;
pub use cmd::AesWrapCmd;
pub use cmd::AssetCreateCmd;
pub use cmd::AssetDeleteCmd;
pub use cmd::AssetLoadCmd;
pub use cmd::AssetLoadFlavor;
pub use cmd::AssetSearchCmd;
pub use cmd::AuthCryptCmd;
pub use cmd::CipherCmd;
pub use cmd::ClaimOp;
pub use cmd::EmmcOp;
pub use cmd::ExportReq;
pub use cmd::GenKeyMethod;
pub use cmd::HashCmd;
pub use cmd::IvRef;
pub use cmd::KeyCheckMethod;
pub use cmd::KeyRef;
pub use cmd::MacCmd;
pub use cmd::MacRef;
pub use cmd::MilenageOp;
pub use cmd::MonotonicIncrementCmd;
pub use cmd::MonotonicReadCmd;
pub use cmd::Opcode;
pub use cmd::OtpWriteCmd;
pub use cmd::PkEncryptCmd;
pub use cmd::PkEncryptMethod;
pub use cmd::PkGenKeyCmd;
pub use cmd::PkKeyCheckCmd;
pub use cmd::PkSharedSecretCmd;
pub use cmd::PkSignVerifyCmd;
pub use cmd::PkWrapCmd;
pub use cmd::ProvisionHukCmd;
pub use cmd::PublicDataCmd;
pub use cmd::RandomCmd;
pub use cmd::ServiceCmd;
pub use cmd::SharedSecretMethod;
pub use cmd::SignVerifyMethod;
pub use cmd::StreamMode;
pub use cmd::StreamState;
pub use cmd::TimerOp;
pub use cmd::TokenCmd;
pub use cmd::TrngConfigCmd;
pub use cmd::WrapMethod;
pub use id::AssetId;
pub use id::Identity;
pub use id::Lifetime;
pub use id::Provenance;
pub use id::StaticAssetNumber;
pub use policy::PolicyMask;
pub use res::AuthCryptRes;
pub use res::CipherRes;
pub use res::MilenageConformance;
pub use res::MilenageRes;
pub use res::PkGenKeyRes;
pub use res::PkSignVerifyRes;
pub use res::SecureTimerRes;
pub use res::ServiceRes;
pub use res::SystemInfo;
pub use res::TokenRes;
pub use res::Version;
pub use status::EngineStatus;

/// Per-command cap on hash bytes carried inside an asymmetric-operation
/// token. Longer messages are pre-digested through the streaming hash path.
pub const MAX_PK_HASH_BYTES: usize = 4095;

/// Largest single data transfer the engine accepts in one command.
pub const MAX_DMA_BYTES: usize = 0x001f_ffff;

/// Key blob overhead added by the engine's KEK wrap (integrity tag).
pub const KEYBLOB_OVERHEAD: usize = 16;

/// Bounds for the associated data accompanying a KEK wrap or unwrap.
pub const KEYBLOB_AAD_MIN: usize = 1;
/// Upper associated-data bound.
pub const KEYBLOB_AAD_MAX: usize = 224;

/// Size of a wrapped key blob for an asset of `asset_len` bytes.
#[inline]
pub const fn keyblob_len(asset_len: usize) -> usize {
    asset_len + KEYBLOB_OVERHEAD
}
