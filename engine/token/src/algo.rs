// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Algorithm discriminants shared by tokens and contexts.

use strum_macros::FromRepr;

use crate::PolicyMask;

/// Hash algorithm selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum HashAlg {
    /// SHA-1.
    Sha1 = 1,
    /// SHA-224.
    Sha224 = 2,
    /// SHA-256.
    Sha256 = 3,
    /// SHA-384.
    Sha384 = 4,
    /// SHA-512.
    Sha512 = 5,
}

impl HashAlg {
    /// Final digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlg::Sha1 => 20,
            HashAlg::Sha224 => 28,
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
            HashAlg::Sha512 => 64,
        }
    }

    /// Compression block length in bytes; streamed updates must be multiples
    /// of this except on the terminal call.
    pub fn block_len(self) -> usize {
        match self {
            HashAlg::Sha1 | HashAlg::Sha224 | HashAlg::Sha256 => 64,
            HashAlg::Sha384 | HashAlg::Sha512 => 128,
        }
    }

    /// Length of the intermediate state the engine keeps between updates.
    ///
    /// Truncated variants carry their parent's full state (SHA-224 state is
    /// the SHA-256 chaining value, SHA-384 the SHA-512 one).
    pub fn state_len(self) -> usize {
        match self {
            HashAlg::Sha1 => 20,
            HashAlg::Sha224 | HashAlg::Sha256 => 32,
            HashAlg::Sha384 | HashAlg::Sha512 => 64,
        }
    }

    /// Policy bit enabling this hash on an asset.
    pub fn policy_bit(self) -> PolicyMask {
        match self {
            HashAlg::Sha1 => PolicyMask::SHA1,
            HashAlg::Sha224 => PolicyMask::SHA224,
            HashAlg::Sha256 => PolicyMask::SHA256,
            HashAlg::Sha384 => PolicyMask::SHA384,
            HashAlg::Sha512 => PolicyMask::SHA512,
        }
    }
}

/// MAC algorithm selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum MacAlg {
    /// HMAC over SHA-1.
    HmacSha1 = 1,
    /// HMAC over SHA-224.
    HmacSha224 = 2,
    /// HMAC over SHA-256.
    HmacSha256 = 3,
    /// HMAC over SHA-384.
    HmacSha384 = 4,
    /// HMAC over SHA-512.
    HmacSha512 = 5,
    /// AES-CMAC.
    AesCmac = 6,
    /// AES-CBC-MAC.
    AesCbcMac = 7,
}

impl MacAlg {
    /// Underlying hash for the HMAC variants.
    pub fn hash(self) -> Option<HashAlg> {
        match self {
            MacAlg::HmacSha1 => Some(HashAlg::Sha1),
            MacAlg::HmacSha224 => Some(HashAlg::Sha224),
            MacAlg::HmacSha256 => Some(HashAlg::Sha256),
            MacAlg::HmacSha384 => Some(HashAlg::Sha384),
            MacAlg::HmacSha512 => Some(HashAlg::Sha512),
            MacAlg::AesCmac | MacAlg::AesCbcMac => None,
        }
    }

    /// Final MAC length in bytes.
    pub fn mac_len(self) -> usize {
        match self.hash() {
            Some(h) => h.digest_len(),
            None => 16,
        }
    }

    /// Block multiple required for non-terminal updates.
    pub fn block_len(self) -> usize {
        match self.hash() {
            Some(h) => h.block_len(),
            None => 16,
        }
    }

    /// Length of the intermediate state between updates.
    pub fn state_len(self) -> usize {
        match self.hash() {
            Some(h) => h.state_len(),
            None => 16,
        }
    }
}

/// Block/stream cipher family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum CipherAlg {
    /// AES.
    Aes = 1,
    /// Triple-DES (EDE, three keys).
    TripleDes = 2,
    /// ChaCha20 stream cipher.
    ChaCha20 = 3,
}

impl CipherAlg {
    /// Cipher block length; stream ciphers report their keystream granule.
    pub fn block_len(self) -> usize {
        match self {
            CipherAlg::Aes => 16,
            CipherAlg::TripleDes => 8,
            CipherAlg::ChaCha20 => 1,
        }
    }

    /// IV length the engine expects for this family.
    pub fn iv_len(self) -> usize {
        match self {
            CipherAlg::Aes => 16,
            CipherAlg::TripleDes => 8,
            CipherAlg::ChaCha20 => 16,
        }
    }

    /// Cipher-family policy bit.
    pub fn policy_bit(self) -> PolicyMask {
        match self {
            CipherAlg::Aes => PolicyMask::ALGO_AES,
            CipherAlg::TripleDes => PolicyMask::ALGO_TRIPLE_DES,
            CipherAlg::ChaCha20 => PolicyMask::ALGO_CHACHA20,
        }
    }
}

/// Cipher feedback mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum CipherMode {
    /// Electronic codebook; carries no IV.
    Ecb = 0,
    /// Cipher block chaining.
    Cbc = 1,
    /// Counter mode.
    Ctr = 2,
    /// XEX tweaked-codebook with ciphertext stealing; terminal-only.
    Xts = 3,
    /// 3GPP f8 confidentiality mode; terminal-only.
    F8 = 4,
    /// ChaCha20 keystream (the family's only mode).
    Stream = 5,
}

/// Authenticated-encryption algorithm selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum AeadAlg {
    /// AES-CCM.
    AesCcm = 1,
    /// AES-GCM.
    AesGcm = 2,
    /// ChaCha20-Poly1305.
    ChaCha20Poly1305 = 3,
}

/// GCM operating submode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum GcmSubmode {
    /// GHASH only; caller supplies the hash key and pre-counter block.
    GhashOnly = 0,
    /// Caller supplies the precomputed hash key.
    PrecomputedH = 1,
    /// Engine derives everything from key and nonce.
    Autonomous = 2,
}
