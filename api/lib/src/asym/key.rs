// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Asymmetric key shapes and footprints.

use sevault_channel::TokenChannel;
use sevault_token::wire;
use sevault_token::HashAlg;
use sevault_token::Lifetime;
use sevault_token::PolicyMask;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::policy;
use crate::session::Session;

/// Asymmetric key family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsymFamily {
    /// ECDSA over a prime curve.
    Ecdsa,
    /// ECDH over a prime curve.
    Ecdh,
    /// ECC El-Gamal over a prime curve.
    EccElGamal,
    /// Ed25519 signatures.
    Eddsa,
    /// Curve25519 key agreement.
    X25519,
    /// Finite-field Diffie-Hellman.
    Dh,
    /// DSA signatures.
    Dsa,
    /// RSA.
    Rsa,
}

/// Shape of an asymmetric key: family plus the sizes and the bound hash.
///
/// Build one with [`KeyDescriptor::new`] and the setters, then hand it to
/// the family operations; they call [`KeyDescriptor::validate`] before
/// anything touches the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// Key family.
    pub family: AsymFamily,
    /// Curve, prime or modulus size in bits.
    pub modulus_bits: usize,
    /// Subgroup order size in bits; discrete-log families only.
    pub divisor_bits: usize,
    /// Hash the key is used with, for the operations that bind one.
    pub hash: Option<HashAlg>,
}

impl KeyDescriptor {
    /// Starts a descriptor for `family` at `modulus_bits`.
    pub fn new(family: AsymFamily, modulus_bits: usize) -> Self {
        KeyDescriptor {
            family,
            modulus_bits,
            divisor_bits: 0,
            hash: None,
        }
    }

    /// Sets the subgroup order size for the DH/DSA families.
    pub fn with_divisor_bits(mut self, divisor_bits: usize) -> Self {
        self.divisor_bits = divisor_bits;
        self
    }

    /// Binds a hash algorithm.
    pub fn with_hash(mut self, hash: HashAlg) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Checks the sizes and the hash binding.
    pub fn validate(&self) -> VaultResult<()> {
        let bits_ok = match self.family {
            AsymFamily::Ecdsa | AsymFamily::Ecdh | AsymFamily::EccElGamal => {
                (192..=521).contains(&self.modulus_bits)
            }
            AsymFamily::Eddsa | AsymFamily::X25519 => self.modulus_bits == 255,
            AsymFamily::Dh | AsymFamily::Dsa => {
                (1024..=3072).contains(&self.modulus_bits)
                    && (160..=256).contains(&self.divisor_bits)
            }
            AsymFamily::Rsa => (1024..=4096).contains(&self.modulus_bits),
        };
        if !bits_ok {
            return Err(VaultError::BadArgument);
        }
        if let Some(hash) = self.hash {
            // The digest has to fit the scalar it is signed with.
            let scalar_bits = match self.family {
                AsymFamily::Dsa => self.divisor_bits,
                _ => self.modulus_bits,
            };
            if self.family == AsymFamily::Eddsa {
                if hash != HashAlg::Sha512 {
                    return Err(VaultError::InvalidAlgorithm);
                }
            } else if hash.digest_len() * 8 > scalar_bits {
                return Err(VaultError::InvalidAlgorithm);
            }
        }
        Ok(())
    }

    /// Bound hash, or an error when none was set.
    pub(crate) fn hash_required(&self) -> VaultResult<HashAlg> {
        self.hash.ok_or(VaultError::InvalidAlgorithm)
    }

    /// Bytes of asset backing a private key.
    pub fn private_len(&self) -> usize {
        match self.family {
            AsymFamily::Ecdsa | AsymFamily::Ecdh | AsymFamily::EccElGamal => {
                wire::vector_len(self.modulus_bits)
            }
            AsymFamily::Eddsa | AsymFamily::X25519 => 32,
            AsymFamily::Dh | AsymFamily::Dsa => wire::vector_len(self.divisor_bits),
            AsymFamily::Rsa => 2 * wire::vector_len(self.modulus_bits),
        }
    }

    /// Bytes of asset backing a public key.
    pub fn public_len(&self) -> usize {
        match self.family {
            AsymFamily::Ecdsa | AsymFamily::Ecdh | AsymFamily::EccElGamal => {
                2 * wire::vector_len(self.modulus_bits)
            }
            AsymFamily::Eddsa | AsymFamily::X25519 => 32,
            AsymFamily::Dh | AsymFamily::Dsa => wire::vector_len(self.modulus_bits),
            AsymFamily::Rsa => 2 * wire::vector_len(self.modulus_bits),
        }
    }

    /// Bytes of a signature in wire form.
    pub fn signature_len(&self) -> usize {
        match self.family {
            AsymFamily::Ecdsa => 2 * wire::vector_len(self.modulus_bits),
            AsymFamily::Eddsa => 2 * wire::vector_len(255),
            AsymFamily::Dsa => 2 * wire::vector_len(self.divisor_bits),
            AsymFamily::Rsa => wire::vector_len(self.modulus_bits),
            _ => 0,
        }
    }

    /// Bytes of asset backing the domain parameters.
    pub fn domain_len(&self) -> usize {
        match self.family {
            AsymFamily::Ecdsa | AsymFamily::Ecdh | AsymFamily::EccElGamal => {
                wire::ecc_domain_len(self.modulus_bits)
            }
            AsymFamily::Eddsa | AsymFamily::X25519 => 8,
            AsymFamily::Dh | AsymFamily::Dsa => {
                wire::dl_domain_len(self.modulus_bits, self.divisor_bits)
            }
            AsymFamily::Rsa => 0,
        }
    }

    /// Bytes of the shared secret the agreement families produce.
    pub fn secret_len(&self) -> usize {
        match self.family {
            AsymFamily::X25519 => 32,
            _ => wire::byte_len(self.modulus_bits),
        }
    }
}

impl<C: TokenChannel> Session<C> {
    /// Allocates an empty asset sized for a private key of this shape.
    pub fn alloc_private_key(
        &self,
        desc: &KeyDescriptor,
        policy: PolicyMask,
        lifetime: Lifetime,
    ) -> VaultResult<Asset<'_, C>> {
        desc.validate()?;
        self.allocate_asset(policy, desc.private_len(), lifetime)
    }

    /// Allocates an empty asset sized for a public key of this shape.
    ///
    /// The policy is widened with the public-key marker.
    pub fn alloc_public_key(
        &self,
        desc: &KeyDescriptor,
        policy: PolicyMask,
        lifetime: Lifetime,
    ) -> VaultResult<Asset<'_, C>> {
        desc.validate()?;
        self.allocate_asset(policy::public(policy), desc.public_len(), lifetime)
    }

    /// Allocates and loads the fixed Curve25519 domain marker asset.
    pub fn alloc_curve25519_domain(&self, lifetime: Lifetime) -> VaultResult<Asset<'_, C>> {
        let asset = self.allocate_asset(PolicyMask::PUBLIC_KEY_PARAM, 8, lifetime)?;
        asset.load_plaintext(&[0u8; 8])?;
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_bits_bounds() {
        assert!(KeyDescriptor::new(AsymFamily::Ecdsa, 192).validate().is_ok());
        assert!(KeyDescriptor::new(AsymFamily::Ecdsa, 521).validate().is_ok());
        let Err(VaultError::BadArgument) = KeyDescriptor::new(AsymFamily::Ecdsa, 191).validate()
        else {
            panic!()
        };
        let Err(VaultError::BadArgument) = KeyDescriptor::new(AsymFamily::X25519, 256).validate()
        else {
            panic!()
        };
    }

    #[test]
    fn hash_binding() {
        let desc = KeyDescriptor::new(AsymFamily::Ecdsa, 224).with_hash(HashAlg::Sha256);
        let Err(VaultError::InvalidAlgorithm) = desc.validate() else {
            panic!()
        };
        let desc = KeyDescriptor::new(AsymFamily::Ecdsa, 256).with_hash(HashAlg::Sha256);
        desc.validate().unwrap();
        let desc = KeyDescriptor::new(AsymFamily::Eddsa, 255).with_hash(HashAlg::Sha256);
        let Err(VaultError::InvalidAlgorithm) = desc.validate() else {
            panic!()
        };
    }

    #[test]
    fn dsa_binds_divisor() {
        let desc = KeyDescriptor::new(AsymFamily::Dsa, 2048)
            .with_divisor_bits(224)
            .with_hash(HashAlg::Sha256);
        let Err(VaultError::InvalidAlgorithm) = desc.validate() else {
            panic!()
        };
        let desc = KeyDescriptor::new(AsymFamily::Dsa, 2048)
            .with_divisor_bits(256)
            .with_hash(HashAlg::Sha256);
        desc.validate().unwrap();
    }

    #[test]
    fn p256_footprints() {
        let desc = KeyDescriptor::new(AsymFamily::Ecdsa, 256);
        assert_eq!(desc.private_len(), 36);
        assert_eq!(desc.public_len(), 72);
        assert_eq!(desc.signature_len(), 72);
    }
}
