// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! ECC El-Gamal encryption of curve points.
//!
//! The plaintext is a point on the curve; mapping application data onto
//! points is the caller's business. A ciphertext is the pair (C1, C2).

use sevault_channel::TokenChannel;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::PkEncryptCmd;
use sevault_token::PkEncryptMethod;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;

use crate::asset::Asset;
use crate::asym::ecc;
use crate::asym::AsymFamily;
use crate::asym::EcPoint;
use crate::asym::KeyDescriptor;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

fn check_family(desc: &KeyDescriptor) -> VaultResult<()> {
    if desc.family != AsymFamily::EccElGamal {
        return Err(VaultError::BadArgument);
    }
    desc.validate()
}

impl<C: TokenChannel> Session<C> {
    fn elgamal_run(
        &self,
        desc: &KeyDescriptor,
        method: PkEncryptMethod,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        data: Vec<u8>,
    ) -> VaultResult<Vec<u8>> {
        let res = self.exchange(ServiceCmd::PkEncrypt(PkEncryptCmd {
            method,
            modulus_bits: desc.modulus_bits,
            key: key.id(),
            domain: domain.id(),
            data,
        }))?;
        let ServiceRes::PkEncrypt { data } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(data)
    }

    /// Encrypts the point `message` under a public-key asset, returning
    /// the ciphertext pair.
    pub fn elgamal_encrypt(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &EcPoint,
    ) -> VaultResult<(EcPoint, EcPoint)> {
        check_family(desc)?;
        let data = ecc::point_to_wire(desc.modulus_bits, message)?;
        let out = self.elgamal_run(desc, PkEncryptMethod::EccElGamalEncrypt, key, domain, data)?;
        let mut r = Reader::new(&out);
        let ((x1, y1), (x2, y2)) =
            wire::get_point_pair(&mut r).map_err(|_| VaultError::InternalError)?;
        Ok((EcPoint { x: x1, y: y1 }, EcPoint { x: x2, y: y2 }))
    }

    /// Decrypts a ciphertext pair with a private-key asset, returning the
    /// message point.
    pub fn elgamal_decrypt(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        c1: &EcPoint,
        c2: &EcPoint,
    ) -> VaultResult<EcPoint> {
        check_family(desc)?;
        let mut data = vec![0u8; 4 * wire::vector_len(desc.modulus_bits)];
        let mut w = Writer::new(&mut data);
        wire::put_point_pair(&mut w, desc.modulus_bits, (&c1.x, &c1.y), (&c2.x, &c2.y))
            .map_err(|_| VaultError::BadArgument)?;
        let out = self.elgamal_run(desc, PkEncryptMethod::EccElGamalDecrypt, key, domain, data)?;
        ecc::point_from_wire(&out)
    }
}
