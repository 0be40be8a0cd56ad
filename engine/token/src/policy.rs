// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Asset policy mask and the engine's policy bit catalog.

use std::fmt;
use std::ops::BitOr;
use std::ops::BitOrAssign;

/// Immutable 64-bit policy bitset attached to an asset at allocation.
///
/// The catalog below mirrors the engine's asset-store policy word: hash and
/// cipher algorithm bits, permitted-operation bits, temporary-state markers,
/// and domain/export modifiers. Composition happens once, before the create
/// token is issued; the mask is never edited afterwards.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyMask(u64);

impl PolicyMask {
    /// Empty mask.
    pub const NONE: PolicyMask = PolicyMask(0);

    /// SHA-1 capable.
    pub const SHA1: PolicyMask = PolicyMask(1 << 0);
    /// SHA-224 capable.
    pub const SHA224: PolicyMask = PolicyMask(1 << 1);
    /// SHA-256 capable.
    pub const SHA256: PolicyMask = PolicyMask(1 << 2);
    /// SHA-384 capable.
    pub const SHA384: PolicyMask = PolicyMask(1 << 3);
    /// SHA-512 capable.
    pub const SHA512: PolicyMask = PolicyMask(1 << 4);
    /// CMAC construction allowed.
    pub const CMAC: PolicyMask = PolicyMask(1 << 5);

    /// AES cipher family.
    pub const ALGO_AES: PolicyMask = PolicyMask(1 << 8);
    /// Triple-DES cipher family.
    pub const ALGO_TRIPLE_DES: PolicyMask = PolicyMask(1 << 9);
    /// ChaCha20 cipher family.
    pub const ALGO_CHACHA20: PolicyMask = PolicyMask(1 << 10);

    /// MAC generate operation.
    pub const MAC_GENERATE: PolicyMask = PolicyMask(1 << 26);
    /// MAC verify operation.
    pub const MAC_VERIFY: PolicyMask = PolicyMask(1 << 27);
    /// Encrypt operation.
    pub const ENCRYPT: PolicyMask = PolicyMask(1 << 28);
    /// Decrypt operation.
    pub const DECRYPT: PolicyMask = PolicyMask(1 << 29);

    /// Asset holds a public key.
    pub const PUBLIC_KEY: PolicyMask = PolicyMask(1 << 31);
    /// Monotonic counter asset.
    pub const MONOTONIC: PolicyMask = PolicyMask(1 << 32);
    /// Key-derivation parent.
    pub const KEY_DERIVE: PolicyMask = PolicyMask(1 << 35);
    /// KEK for RFC-3394 style AES asset wrap.
    pub const AES_WRAP: PolicyMask = PolicyMask(1 << 37);

    /// RSA OAEP wrap/unwrap.
    pub const PK_RSA_OAEP_WRAP: PolicyMask = PolicyMask(1 << 38);
    /// RSA PKCS#1 v1.5 wrap/unwrap.
    pub const PK_RSA_PKCS1_WRAP: PolicyMask = PolicyMask(1 << 39);
    /// RSA PKCS#1 v1.5 signatures.
    pub const PK_RSA_PKCS1_SIGN: PolicyMask = PolicyMask(1 << 41);
    /// RSA PSS signatures.
    pub const PK_RSA_PSS_SIGN: PolicyMask = PolicyMask(1 << 42);
    /// DSA signatures.
    pub const PK_DSA_SIGN: PolicyMask = PolicyMask(1 << 43);
    /// ECDSA signatures (also covers EdDSA key assets).
    pub const PK_ECDSA_SIGN: PolicyMask = PolicyMask(1 << 44);
    /// Finite-field Diffie-Hellman key agreement.
    pub const PK_DH_KEY: PolicyMask = PolicyMask(1 << 45);
    /// Elliptic-curve Diffie-Hellman key agreement.
    pub const PK_ECDH_KEY: PolicyMask = PolicyMask(1 << 46);
    /// Public-key domain parameters.
    pub const PUBLIC_KEY_PARAM: PolicyMask = PolicyMask(1 << 47);

    /// Temporary IV state for a streaming cipher context.
    pub const TEMP_IV: PolicyMask = PolicyMask(1 << 48);
    /// Temporary counter state for CTR-mode ciphers.
    pub const TEMP_COUNTER: PolicyMask = PolicyMask(1 << 49);
    /// Temporary digest/MAC state for a streaming context.
    pub const TEMP_MAC: PolicyMask = PolicyMask(1 << 50);

    /// EC ElGamal encrypt/decrypt (composite capability).
    pub const PK_ECC_ELGAMAL: PolicyMask =
        PolicyMask(Self::PK_ECDSA_SIGN.0 | Self::PK_ECDH_KEY.0);

    /// Loadable/usable from the non-secure world.
    pub const SOURCE_NON_SECURE: PolicyMask = PolicyMask(1 << 56);
    /// Usable across security domains.
    pub const CROSS_DOMAIN: PolicyMask = PolicyMask(1 << 57);
    /// eMMC authentication key.
    pub const EMMC_AUTH_KEY: PolicyMask = PolicyMask(1 << 58);
    /// Opaque private data (write only through load).
    pub const PRIVATE_DATA: PolicyMask = PolicyMask(1 << 59);
    /// Readable public data.
    pub const PUBLIC_DATA: PolicyMask = PolicyMask(1 << 60);
    /// May be exported under a KEK.
    pub const EXPORT: PolicyMask = PolicyMask(1 << 61);

    /// Raw policy word.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Rebuilds a mask from a raw policy word.
    pub fn from_bits(bits: u64) -> Self {
        PolicyMask(bits)
    }

    /// True when every bit of `other` is set in `self`.
    pub fn contains(self, other: PolicyMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when `self` and `other` share at least one bit.
    pub fn intersects(self, other: PolicyMask) -> bool {
        self.0 & other.0 != 0
    }

    /// True for the empty mask.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PolicyMask {
    type Output = PolicyMask;

    fn bitor(self, rhs: PolicyMask) -> PolicyMask {
        PolicyMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for PolicyMask {
    fn bitor_assign(&mut self, rhs: PolicyMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for PolicyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyMask({:#018x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_and_containment() {
        let mask = PolicyMask::PK_ECDSA_SIGN | PolicyMask::SHA256 | PolicyMask::EXPORT;
        assert!(mask.contains(PolicyMask::SHA256));
        assert!(mask.contains(PolicyMask::PK_ECDSA_SIGN | PolicyMask::EXPORT));
        assert!(!mask.contains(PolicyMask::SHA384));
        assert!(mask.intersects(PolicyMask::EXPORT | PolicyMask::CROSS_DOMAIN));
        assert!(!PolicyMask::NONE.intersects(mask));
    }

    #[test]
    fn elgamal_is_composite() {
        assert!(PolicyMask::PK_ECC_ELGAMAL.contains(PolicyMask::PK_ECDSA_SIGN));
        assert!(PolicyMask::PK_ECC_ELGAMAL.contains(PolicyMask::PK_ECDH_KEY));
    }
}
