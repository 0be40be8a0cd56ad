// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Asset policy composition.
//!
//! Every asset is created with an immutable policy mask; the engine refuses
//! any use the mask does not spell out. [`compose`] builds the mask from a
//! capability plus the common cross-cutting flags, so callers never deal in
//! raw bit positions. Pure computation, no engine involved.

use sevault_token::AeadAlg;
use sevault_token::CipherAlg;
use sevault_token::HashAlg;
use sevault_token::MacAlg;
use sevault_token::PolicyMask;

use crate::error::VaultError;
use crate::error::VaultResult;

/// What an asset is for.
///
/// One capability per asset; the engine's policy bits for composite uses
/// (e.g. EC ElGamal) are folded into the matching variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// MAC generation and verification with the named algorithm.
    Mac(MacAlg),
    /// Symmetric encryption and decryption with the named cipher family.
    Cipher(CipherAlg),
    /// Authenticated encryption with the named algorithm.
    Aead(AeadAlg),
    /// ECDSA signing key; hash-bound.
    EcdsaSign,
    /// EdDSA (Ed25519) signing key; hash-bound to SHA-512.
    EddsaSign,
    /// DSA signing key; hash-bound.
    DsaSign,
    /// ECDH agreement key.
    EcdhKey,
    /// X25519 agreement key.
    X25519Key,
    /// Finite-field DH agreement key.
    DhKey,
    /// EC ElGamal encryption key.
    EccElGamal,
    /// RSASSA-PKCS#1 v1.5 signing key; hash-bound.
    RsaPkcs1Sign,
    /// RSASSA-PSS signing key; hash-bound.
    RsaPssSign,
    /// RSAES-OAEP key-wrapping key; hash-bound.
    RsaOaepWrap,
    /// RSAES-PKCS#1 v1.5 key-wrapping key.
    RsaPkcs1Wrap,
    /// Domain parameters (EC curve or DH/DSA group).
    DomainParams,
    /// Key-derivation parent key.
    KeyDerive,
    /// AES key-wrap key-encryption key.
    AesWrap,
    /// Monotonic counter.
    Monotonic,
    /// Public data readable through the public-data service.
    PublicData,
    /// Opaque private data.
    PrivateData,
    /// eMMC/RPMB authentication key.
    EmmcAuthKey,
    /// Temporary hash/MAC intermediate state.
    TempMac,
    /// Temporary IV.
    TempIv,
    /// Temporary counter.
    TempCounter,
}

impl Capability {
    fn hash_bound(self) -> bool {
        matches!(
            self,
            Capability::EcdsaSign
                | Capability::EddsaSign
                | Capability::DsaSign
                | Capability::RsaPkcs1Sign
                | Capability::RsaPssSign
                | Capability::RsaOaepWrap
        )
    }

    fn base_bits(self, hash: Option<HashAlg>) -> VaultResult<PolicyMask> {
        let hash_bit = |h: Option<HashAlg>| match h {
            Some(h) => Ok(h.policy_bit()),
            None => Err(VaultError::InvalidAlgorithm),
        };
        let mask = match self {
            Capability::Mac(alg) => {
                let alg_bit = match alg.hash() {
                    Some(h) => h.policy_bit(),
                    None => PolicyMask::CMAC | PolicyMask::ALGO_AES,
                };
                alg_bit | PolicyMask::MAC_GENERATE | PolicyMask::MAC_VERIFY
            }
            Capability::Cipher(alg) => {
                alg.policy_bit() | PolicyMask::ENCRYPT | PolicyMask::DECRYPT
            }
            Capability::Aead(alg) => {
                let family = match alg {
                    AeadAlg::AesCcm | AeadAlg::AesGcm => PolicyMask::ALGO_AES,
                    AeadAlg::ChaCha20Poly1305 => PolicyMask::ALGO_CHACHA20,
                };
                family | PolicyMask::ENCRYPT | PolicyMask::DECRYPT
            }
            Capability::EcdsaSign => PolicyMask::PK_ECDSA_SIGN | hash_bit(hash)?,
            Capability::EddsaSign => {
                if hash != Some(HashAlg::Sha512) {
                    return Err(VaultError::InvalidAlgorithm);
                }
                PolicyMask::PK_ECDSA_SIGN | PolicyMask::SHA512
            }
            Capability::DsaSign => PolicyMask::PK_DSA_SIGN | hash_bit(hash)?,
            Capability::EcdhKey | Capability::X25519Key => PolicyMask::PK_ECDH_KEY,
            Capability::DhKey => PolicyMask::PK_DH_KEY,
            Capability::EccElGamal => PolicyMask::PK_ECC_ELGAMAL,
            Capability::RsaPkcs1Sign => PolicyMask::PK_RSA_PKCS1_SIGN | hash_bit(hash)?,
            Capability::RsaPssSign => PolicyMask::PK_RSA_PSS_SIGN | hash_bit(hash)?,
            Capability::RsaOaepWrap => PolicyMask::PK_RSA_OAEP_WRAP | hash_bit(hash)?,
            Capability::RsaPkcs1Wrap => PolicyMask::PK_RSA_PKCS1_WRAP,
            Capability::DomainParams => PolicyMask::PUBLIC_KEY_PARAM,
            Capability::KeyDerive => PolicyMask::KEY_DERIVE,
            Capability::AesWrap => PolicyMask::AES_WRAP,
            Capability::Monotonic => PolicyMask::MONOTONIC,
            Capability::PublicData => PolicyMask::PUBLIC_DATA,
            Capability::PrivateData => PolicyMask::PRIVATE_DATA,
            Capability::EmmcAuthKey => PolicyMask::EMMC_AUTH_KEY,
            Capability::TempMac => PolicyMask::TEMP_MAC,
            Capability::TempIv => PolicyMask::TEMP_IV,
            Capability::TempCounter => PolicyMask::TEMP_COUNTER,
        };
        // Hash-bound capabilities consumed their hash above; everything else
        // must not carry one.
        if !self.hash_bound() && hash.is_some() {
            return Err(VaultError::InvalidAlgorithm);
        }
        Ok(mask)
    }
}

/// Composes an asset policy mask.
///
/// `hash` is required by the hash-bound signing/wrapping capabilities and
/// refused everywhere else; either way a mismatch is
/// [`VaultError::InvalidAlgorithm`]. `export` permits KEK-wrapped export of
/// the asset's content, `cross_domain` permits use from the other security
/// domain, and `non_secure_source` marks an asset created by non-secure
/// callers (the engine requires it for them).
pub fn compose(
    capability: Capability,
    hash: Option<HashAlg>,
    cross_domain: bool,
    export: bool,
    non_secure_source: bool,
) -> VaultResult<PolicyMask> {
    let mut mask = capability.base_bits(hash)?;
    if cross_domain {
        mask |= PolicyMask::CROSS_DOMAIN;
    }
    if export {
        mask |= PolicyMask::EXPORT;
    }
    if non_secure_source {
        mask |= PolicyMask::SOURCE_NON_SECURE;
    }
    Ok(mask)
}

/// Adds the public-key marker to a composed mask.
///
/// Verification and wrap-side keys carry the same capability bits as their
/// private counterpart plus this marker.
pub fn public(mask: PolicyMask) -> PolicyMask {
    mask | PolicyMask::PUBLIC_KEY
}
