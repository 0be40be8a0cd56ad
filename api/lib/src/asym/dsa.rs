// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! DSA signatures over caller-supplied discrete-log domains.
//!
//! Domains come from [`DlDomain`](crate::asym::dh::DlDomain); signatures
//! travel in the engine's wire-vector shape, two records at the subgroup
//! order width ([`KeyDescriptor::signature_len`]).

use sevault_channel::TokenChannel;
use sevault_token::wire;
use sevault_token::ExportReq;
use sevault_token::GenKeyMethod;
use sevault_token::PkSignVerifyCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SignVerifyMethod;

use crate::asset::Asset;
use crate::asym::dh::check_dl_family;
use crate::asym::feed_digest;
use crate::asym::AsymFamily;
use crate::asym::KeyDescriptor;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

impl<C: TokenChannel> Session<C> {
    /// Generates a fresh DSA key pair into `private`, returning the public
    /// value.
    pub fn dsa_generate_key_pair(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<Vec<u8>> {
        check_dl_family(desc, AsymFamily::Dsa)?;
        let gen = self.dl_gen(desc, GenKeyMethod::DsaPair, private.id(), domain.id(), None)?;
        Ok(gen.public)
    }

    /// As [`Session::dsa_generate_key_pair`], also returning the private
    /// scalar wrapped under `kek` as a key blob.
    pub fn dsa_generate_key_pair_export(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        kek: &Asset<'_, C>,
        aad: &[u8],
    ) -> VaultResult<(Vec<u8>, Vec<u8>)> {
        check_dl_family(desc, AsymFamily::Dsa)?;
        crate::asset::check_aad(aad)?;
        let export = ExportReq {
            kek: kek.id(),
            aad: aad.to_vec(),
        };
        let gen = self.dl_gen(
            desc,
            GenKeyMethod::DsaPair,
            private.id(),
            domain.id(),
            Some(export),
        )?;
        Ok((gen.public, gen.blob.ok_or(VaultError::InternalError)?))
    }

    /// Recomputes the public value of an existing private key.
    pub fn dsa_public_key(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<Vec<u8>> {
        check_dl_family(desc, AsymFamily::Dsa)?;
        let gen = self.dl_gen(desc, GenKeyMethod::DsaPublic, private.id(), domain.id(), None)?;
        Ok(gen.public)
    }

    fn dsa_sign_verify(
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
            method: SignVerifyMethod::Dsa { hash },
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
    pub fn dsa_sign(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
    ) -> VaultResult<Vec<u8>> {
        check_dl_family(desc, AsymFamily::Dsa)?;
        self.dsa_sign_verify(desc, key, domain, message, None)
    }

    /// Verifies a signature over `message` against a public-key asset.
    ///
    /// [`VaultError::VerifyError`] when the signature does not check out.
    pub fn dsa_verify(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
        signature: &[u8],
    ) -> VaultResult<()> {
        check_dl_family(desc, AsymFamily::Dsa)?;
        if signature.len() != 2 * wire::vector_len(desc.divisor_bits) {
            return Err(VaultError::InvalidLength);
        }
        self.dsa_sign_verify(desc, key, domain, message, Some(signature.to_vec()))?;
        Ok(())
    }
}
