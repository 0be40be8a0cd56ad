// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Finite-field Diffie-Hellman key agreement.
//!
//! [`DlDomain`] also serves the DSA operations; both families share one
//! domain-parameter shape and one key layout: private scalars at the
//! subgroup order width, public values at the prime width.

use sevault_channel::TokenChannel;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::AssetId;
use sevault_token::GenKeyMethod;
use sevault_token::KeyCheckMethod;
use sevault_token::Lifetime;
use sevault_token::PkGenKeyCmd;
use sevault_token::PkKeyCheckCmd;
use sevault_token::PkSharedSecretCmd;
use sevault_token::PolicyMask;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SharedSecretMethod;

use crate::asset::Asset;
use crate::asym::x25519::check_kdf_args;
use crate::asym::AsymFamily;
use crate::asym::KeyDescriptor;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

/// Discrete-log domain parameters, values most-significant-byte first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DlDomain {
    /// Prime modulus size in bits.
    pub prime_bits: usize,
    /// Subgroup order size in bits.
    pub divisor_bits: usize,
    /// Prime modulus p.
    pub prime: Vec<u8>,
    /// Subgroup order q.
    pub divisor: Vec<u8>,
    /// Generator g.
    pub generator: Vec<u8>,
}

impl DlDomain {
    /// Encodes the parameters into a fresh domain asset.
    pub fn alloc<'a, C: TokenChannel>(
        &self,
        session: &'a Session<C>,
        lifetime: Lifetime,
    ) -> VaultResult<Asset<'a, C>> {
        let params = wire::DlDomainParams {
            prime_bits: self.prime_bits,
            divisor_bits: self.divisor_bits,
            prime: self.prime.clone(),
            divisor: self.divisor.clone(),
            generator: self.generator.clone(),
        };
        let mut buf = vec![0u8; wire::dl_domain_len(self.prime_bits, self.divisor_bits)];
        let mut w = Writer::new(&mut buf);
        wire::put_dl_domain(&mut w, &params).map_err(|_| VaultError::BadArgument)?;
        let asset = session.allocate_asset(PolicyMask::PUBLIC_KEY_PARAM, buf.len(), lifetime)?;
        asset.load_plaintext(&buf)?;
        Ok(asset)
    }

    /// Encodes a public value as public-key asset content for this group,
    /// ready for [`Asset::load_plaintext`].
    pub fn public_key_content(&self, value: &[u8]) -> VaultResult<Vec<u8>> {
        scalar_to_wire(self.prime_bits, value)
    }
}

/// Single-record wire form of one `bits`-wide number.
pub(crate) fn scalar_to_wire(bits: usize, value: &[u8]) -> VaultResult<Vec<u8>> {
    if value.len() > wire::byte_len(bits) {
        return Err(VaultError::BadArgument);
    }
    let mut buf = vec![0u8; wire::vector_len(bits)];
    let mut w = Writer::new(&mut buf);
    wire::put_bigint(&mut w, bits, 0, 1, value).map_err(|_| VaultError::BadArgument)?;
    Ok(buf)
}

/// Full-width most-significant-byte-first value of a single record.
pub(crate) fn scalar_from_wire(data: &[u8], bits: usize) -> VaultResult<Vec<u8>> {
    let mut r = Reader::new(data);
    let mut dest = vec![0u8; wire::byte_len(bits)];
    wire::get_bigint(&mut r, &mut dest).map_err(|_| VaultError::InternalError)?;
    Ok(dest)
}

pub(crate) fn check_dl_family(desc: &KeyDescriptor, family: AsymFamily) -> VaultResult<()> {
    if desc.family != family {
        return Err(VaultError::BadArgument);
    }
    desc.validate()
}

pub(crate) struct DlGen {
    pub public: Vec<u8>,
    pub blob: Option<Vec<u8>>,
}

impl<C: TokenChannel> Session<C> {
    pub(crate) fn dl_gen(
        &self,
        desc: &KeyDescriptor,
        method: GenKeyMethod,
        private: AssetId,
        domain: AssetId,
        export: Option<sevault_token::ExportReq>,
    ) -> VaultResult<DlGen> {
        let res = self.exchange(ServiceCmd::PkGenKey(PkGenKeyCmd {
            method,
            modulus_bits: desc.modulus_bits,
            divisor_bits: desc.divisor_bits,
            private,
            domain,
            export,
            want_public: true,
        }))?;
        let ServiceRes::PkGenKey(res) = res else {
            return Err(VaultError::InternalError);
        };
        let public = res.public.ok_or(VaultError::InternalError)?;
        Ok(DlGen {
            public: scalar_from_wire(&public, desc.modulus_bits)?,
            blob: res.blob,
        })
    }

    /// Generates a fresh DH key pair into `private`, returning the public
    /// value.
    pub fn dh_generate_key_pair(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<Vec<u8>> {
        check_dl_family(desc, AsymFamily::Dh)?;
        let gen = self.dl_gen(desc, GenKeyMethod::DhPair, private.id(), domain.id(), None)?;
        Ok(gen.public)
    }

    /// As [`Session::dh_generate_key_pair`], also returning the private
    /// scalar wrapped under `kek` as a key blob.
    pub fn dh_generate_key_pair_export(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        kek: &Asset<'_, C>,
        aad: &[u8],
    ) -> VaultResult<(Vec<u8>, Vec<u8>)> {
        check_dl_family(desc, AsymFamily::Dh)?;
        crate::asset::check_aad(aad)?;
        let export = sevault_token::ExportReq {
            kek: kek.id(),
            aad: aad.to_vec(),
        };
        let gen = self.dl_gen(
            desc,
            GenKeyMethod::DhPair,
            private.id(),
            domain.id(),
            Some(export),
        )?;
        Ok((gen.public, gen.blob.ok_or(VaultError::InternalError)?))
    }

    /// Recomputes the public value of an existing private key.
    pub fn dh_public_key(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<Vec<u8>> {
        check_dl_family(desc, AsymFamily::Dh)?;
        let gen = self.dl_gen(desc, GenKeyMethod::DhPublic, private.id(), domain.id(), None)?;
        Ok(gen.public)
    }

    #[allow(clippy::too_many_arguments)]
    fn dh_run(
        &self,
        desc: &KeyDescriptor,
        method: SharedSecretMethod,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        peer: &[u8],
        second: Option<(&Asset<'_, C>, &[u8])>,
        other_info: &[u8],
        dests: &[&Asset<'_, C>],
        save_shared: bool,
    ) -> VaultResult<()> {
        check_dl_family(desc, AsymFamily::Dh)?;
        check_kdf_args(other_info, dests, save_shared, desc.secret_len())?;
        let (private2, peer2) = match second {
            Some((private2, peer2)) => (
                Some(private2.id()),
                Some(scalar_to_wire(desc.modulus_bits, peer2)?),
            ),
            None => (None, None),
        };
        self.exchange(ServiceCmd::PkSharedSecret(PkSharedSecretCmd {
            method,
            modulus_bits: desc.modulus_bits,
            private: private.id(),
            domain: domain.id(),
            peer: scalar_to_wire(desc.modulus_bits, peer)?,
            private2,
            peer2,
            other_info: other_info.to_vec(),
            dest: dests.iter().map(|a| a.id()).collect(),
            save_shared,
        }))?;
        Ok(())
    }

    /// Agrees on a shared secret with the peer's public value and spreads
    /// it over `dests` through the derivation function; with `save_shared`
    /// the single destination receives the raw secret.
    pub fn dh_shared_secret(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        peer: &[u8],
        other_info: &[u8],
        dests: &[&Asset<'_, C>],
        save_shared: bool,
    ) -> VaultResult<()> {
        self.dh_run(
            desc,
            SharedSecretMethod::Dh,
            private,
            domain,
            peer,
            None,
            other_info,
            dests,
            save_shared,
        )
    }

    /// Dual-key agreement: both key pairs contribute, the concatenated
    /// secrets feed the derivation together.
    #[allow(clippy::too_many_arguments)]
    pub fn dh_dual_shared_secret(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        private2: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        peer: &[u8],
        peer2: &[u8],
        other_info: &[u8],
        dests: &[&Asset<'_, C>],
    ) -> VaultResult<()> {
        self.dh_run(
            desc,
            SharedSecretMethod::DhDual,
            private,
            domain,
            peer,
            Some((private2, peer2)),
            other_info,
            dests,
            false,
        )
    }

    /// Checks key material: public-value range and subgroup membership,
    /// private-scalar range, and pair consistency when both are given.
    ///
    /// Serves the DH and DSA families alike;
    /// [`VaultError::VerifyError`] when a check fails.
    pub fn dl_key_check(
        &self,
        desc: &KeyDescriptor,
        public: Option<&Asset<'_, C>>,
        private: Option<&Asset<'_, C>>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<()> {
        match desc.family {
            AsymFamily::Dh | AsymFamily::Dsa => desc.validate()?,
            _ => return Err(VaultError::BadArgument),
        }
        if public.is_none() && private.is_none() {
            return Err(VaultError::BadArgument);
        }
        self.exchange(ServiceCmd::PkKeyCheck(PkKeyCheckCmd {
            method: KeyCheckMethod::DhDsa,
            modulus_bits: desc.modulus_bits,
            divisor_bits: desc.divisor_bits,
            public: public.map(|a| a.id()),
            private: private.map(|a| a.id()),
            domain: domain.id(),
        }))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let value = vec![0xab; wire::byte_len(2048)];
        let buf = scalar_to_wire(2048, &value).unwrap();
        assert_eq!(buf.len(), wire::vector_len(2048));
        assert_eq!(scalar_from_wire(&buf, 2048).unwrap(), value);
    }

    #[test]
    fn short_scalar_pads_high_bytes() {
        let buf = scalar_to_wire(2048, &[0x01, 0x02]).unwrap();
        let back = scalar_from_wire(&buf, 2048).unwrap();
        assert_eq!(back[254..], [0x01, 0x02]);
        assert!(back[..254].iter().all(|b| *b == 0));
    }
}
