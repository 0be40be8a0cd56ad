// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Prime-curve domain parameters and point shapes.

use sevault_channel::TokenChannel;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::Lifetime;
use sevault_token::PolicyMask;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

/// Affine curve point, coordinates most-significant-byte first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcPoint {
    /// X coordinate.
    pub x: Vec<u8>,
    /// Y coordinate.
    pub y: Vec<u8>,
}

impl EcPoint {
    /// Encodes the point as the asset content of a `bits`-bit public key,
    /// ready for [`Asset::load_plaintext`].
    pub fn key_content(&self, bits: usize) -> VaultResult<Vec<u8>> {
        point_to_wire(bits, self)
    }
}

/// Prime-curve domain parameters, values most-significant-byte first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EccDomain {
    /// Curve size in bits.
    pub bits: usize,
    /// Field prime.
    pub modulus: Vec<u8>,
    /// Curve coefficient a.
    pub a: Vec<u8>,
    /// Curve coefficient b.
    pub b: Vec<u8>,
    /// Base point order.
    pub order: Vec<u8>,
    /// Base point x.
    pub base_x: Vec<u8>,
    /// Base point y.
    pub base_y: Vec<u8>,
    /// Cofactor.
    pub cofactor: u8,
}

impl EccDomain {
    /// The NIST P-256 curve.
    pub fn nist_p256() -> Self {
        EccDomain {
            bits: 256,
            modulus: hex::decode(
                "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
            )
            .unwrap(),
            a: hex::decode("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc")
                .unwrap(),
            b: hex::decode("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b")
                .unwrap(),
            order: hex::decode("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551")
                .unwrap(),
            base_x: hex::decode(
                "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
            )
            .unwrap(),
            base_y: hex::decode(
                "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5",
            )
            .unwrap(),
            cofactor: 1,
        }
    }

    fn params(&self) -> wire::EccDomainParams {
        wire::EccDomainParams {
            bits: self.bits,
            modulus: self.modulus.clone(),
            a: self.a.clone(),
            b: self.b.clone(),
            order: self.order.clone(),
            base_x: self.base_x.clone(),
            base_y: self.base_y.clone(),
            cofactor: self.cofactor,
        }
    }

    /// Encodes the parameters into a fresh domain asset.
    pub fn alloc<'a, C: TokenChannel>(
        &self,
        session: &'a Session<C>,
        lifetime: Lifetime,
    ) -> VaultResult<Asset<'a, C>> {
        let mut buf = vec![0u8; wire::ecc_domain_len(self.bits)];
        let mut w = Writer::new(&mut buf);
        wire::put_ecc_domain(&mut w, &self.params()).map_err(|_| VaultError::BadArgument)?;
        let asset = session.allocate_asset(PolicyMask::PUBLIC_KEY_PARAM, buf.len(), lifetime)?;
        asset.load_plaintext(&buf)?;
        Ok(asset)
    }
}

pub(crate) fn point_to_wire(bits: usize, point: &EcPoint) -> VaultResult<Vec<u8>> {
    let mut buf = vec![0u8; 2 * wire::vector_len(bits)];
    let mut w = Writer::new(&mut buf);
    wire::put_point(&mut w, bits, &point.x, &point.y).map_err(|_| VaultError::BadArgument)?;
    Ok(buf)
}

pub(crate) fn point_from_wire(data: &[u8]) -> VaultResult<EcPoint> {
    let mut r = Reader::new(data);
    let (x, y) = wire::get_point(&mut r).map_err(|_| VaultError::InternalError)?;
    Ok(EcPoint { x, y })
}

pub(crate) fn signature_to_wire(bits: usize, signature: &[u8]) -> VaultResult<Vec<u8>> {
    // Callers hand signatures around in the wire shape already; check the
    // footprint and pass it through.
    if signature.len() != 2 * wire::vector_len(bits) {
        return Err(VaultError::InvalidLength);
    }
    Ok(signature.to_vec())
}
