// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! ECDSA signatures over caller-supplied Weierstrass domains.
//!
//! Signatures travel in the engine's wire-vector shape; the footprint is
//! [`KeyDescriptor::signature_len`].

use sevault_channel::TokenChannel;
use sevault_token::AssetId;
use sevault_token::GenKeyMethod;
use sevault_token::KeyCheckMethod;
use sevault_token::PkGenKeyCmd;
use sevault_token::PkKeyCheckCmd;
use sevault_token::PkSignVerifyCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SignVerifyMethod;

use crate::asset::Asset;
use crate::asym::ecc;
use crate::asym::feed_digest;
use crate::asym::AsymFamily;
use crate::asym::EcPoint;
use crate::asym::KeyDescriptor;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

fn check_family(desc: &KeyDescriptor) -> VaultResult<()> {
    if desc.family != AsymFamily::Ecdsa {
        return Err(VaultError::BadArgument);
    }
    desc.validate()
}

/// Key generation and checking serve every Weierstrass family; the key's
/// policy decides what it may be used for.
fn check_weierstrass(desc: &KeyDescriptor) -> VaultResult<()> {
    match desc.family {
        AsymFamily::Ecdsa | AsymFamily::Ecdh | AsymFamily::EccElGamal => desc.validate(),
        _ => Err(VaultError::BadArgument),
    }
}

impl<C: TokenChannel> Session<C> {
    fn ecdsa_gen(
        &self,
        desc: &KeyDescriptor,
        method: GenKeyMethod,
        private: AssetId,
        domain: AssetId,
        export: Option<sevault_token::ExportReq>,
    ) -> VaultResult<(EcPoint, Option<Vec<u8>>)> {
        let res = self.exchange(ServiceCmd::PkGenKey(PkGenKeyCmd {
            method,
            modulus_bits: desc.modulus_bits,
            divisor_bits: 0,
            private,
            domain,
            export,
            want_public: true,
        }))?;
        let ServiceRes::PkGenKey(res) = res else {
            return Err(VaultError::InternalError);
        };
        let wire = res.public.ok_or(VaultError::InternalError)?;
        Ok((ecc::point_from_wire(&wire)?, res.blob))
    }

    /// Generates a fresh key pair into `private`, returning the public
    /// point.
    pub fn ecdsa_generate_key_pair(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<EcPoint> {
        check_weierstrass(desc)?;
        let (point, _) = self.ecdsa_gen(
            desc,
            GenKeyMethod::EcdsaPair,
            private.id(),
            domain.id(),
            None,
        )?;
        Ok(point)
    }

    /// As [`Session::ecdsa_generate_key_pair`], also returning the private
    /// scalar wrapped under `kek` as a key blob.
    pub fn ecdsa_generate_key_pair_export(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        kek: &Asset<'_, C>,
        aad: &[u8],
    ) -> VaultResult<(EcPoint, Vec<u8>)> {
        check_weierstrass(desc)?;
        crate::asset::check_aad(aad)?;
        let export = sevault_token::ExportReq {
            kek: kek.id(),
            aad: aad.to_vec(),
        };
        let (point, blob) = self.ecdsa_gen(
            desc,
            GenKeyMethod::EcdsaPair,
            private.id(),
            domain.id(),
            Some(export),
        )?;
        Ok((point, blob.ok_or(VaultError::InternalError)?))
    }

    /// Recomputes the public point of an existing private key.
    pub fn ecdsa_public_key(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<EcPoint> {
        check_weierstrass(desc)?;
        let (point, _) = self.ecdsa_gen(
            desc,
            GenKeyMethod::EcdsaPublic,
            private.id(),
            domain.id(),
            None,
        )?;
        Ok(point)
    }

    fn ecdsa_sign_verify(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
        signature: Option<Vec<u8>>,
    ) -> VaultResult<Vec<u8>> {
        let hash = desc.hash_required()?;
        let mut input = feed_digest(self, hash, message)?;
        let res = self.exchange(ServiceCmd::PkSignVerify(PkSignVerifyCmd {
            method: SignVerifyMethod::Ecdsa { hash },
            modulus_bits: desc.modulus_bits,
            key: key.id(),
            domain: Some(domain.id()),
            state: input.state.as_ref().map(|a| a.id()),
            data: input.tail.to_vec(),
            total_len: input.total_len,
            signature,
        }));
        // The engine swallows the digest state pass or fail.
        if let Some(state) = input.state.as_mut() {
            state.disarm();
        }
        let ServiceRes::PkSignVerify(res) = res? else {
            return Err(VaultError::InternalError);
        };
        Ok(res.signature)
    }

    /// Signs `message`, hashing it with the descriptor's bound hash.
    ///
    /// Returns the signature in wire form.
    pub fn ecdsa_sign(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
    ) -> VaultResult<Vec<u8>> {
        check_family(desc)?;
        self.ecdsa_sign_verify(desc, key, domain, message, None)
    }

    /// Signs a message partially absorbed through an asset-backed
    /// [`HashContext`](crate::sym::HashContext), consuming the context.
    ///
    /// `tail` is the final fragment and must fit one token.
    pub fn ecdsa_sign_stream(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        ctx: crate::sym::HashContext<'_, C>,
        tail: &[u8],
    ) -> VaultResult<Vec<u8>> {
        check_family(desc)?;
        let hash = desc.hash_required()?;
        if ctx.algorithm() != hash {
            return Err(VaultError::InvalidAlgorithm);
        }
        if tail.len() > sevault_token::MAX_PK_HASH_BYTES {
            return Err(VaultError::InvalidLength);
        }
        let (mut state, absorbed) = ctx.into_digest_state()?;
        let res = self.exchange(ServiceCmd::PkSignVerify(PkSignVerifyCmd {
            method: SignVerifyMethod::Ecdsa { hash },
            modulus_bits: desc.modulus_bits,
            key: key.id(),
            domain: Some(domain.id()),
            state: Some(state.id()),
            data: tail.to_vec(),
            total_len: absorbed + tail.len() as u64,
            signature: None,
        }));
        state.disarm();
        let ServiceRes::PkSignVerify(res) = res? else {
            return Err(VaultError::InternalError);
        };
        Ok(res.signature)
    }

    /// Verifies a signature over `message` against a public-key asset.
    ///
    /// [`VaultError::VerifyError`] when the signature does not check out.
    pub fn ecdsa_verify(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
        signature: &[u8],
    ) -> VaultResult<()> {
        check_family(desc)?;
        let signature = ecc::signature_to_wire(desc.modulus_bits, signature)?;
        self.ecdsa_sign_verify(desc, key, domain, message, Some(signature))?;
        Ok(())
    }

    /// Checks key material: a public point on the curve, a private scalar
    /// in range, and pair consistency when both are given.
    ///
    /// [`VaultError::VerifyError`] when a check fails.
    pub fn ecc_key_check(
        &self,
        desc: &KeyDescriptor,
        public: Option<&Asset<'_, C>>,
        private: Option<&Asset<'_, C>>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<()> {
        check_weierstrass(desc)?;
        if public.is_none() && private.is_none() {
            return Err(VaultError::BadArgument);
        }
        self.exchange(ServiceCmd::PkKeyCheck(PkKeyCheckCmd {
            method: KeyCheckMethod::EcdhEcdsa,
            modulus_bits: desc.modulus_bits,
            divisor_bits: 0,
            public: public.map(|a| a.id()),
            private: private.map(|a| a.id()),
            domain: domain.id(),
        }))?;
        Ok(())
    }
}
