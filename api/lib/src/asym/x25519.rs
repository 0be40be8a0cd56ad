// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! X25519 key agreement.
//!
//! As with Ed25519 the curve is fixed; keys cross this API raw and a
//! marker domain asset stands in for curve parameters. Agreement results
//! never leave the engine: they land in destination assets, either pushed
//! through the derivation function or, with `save_shared`, stored as the
//! raw shared secret.

use sevault_channel::TokenChannel;
use sevault_token::AssetId;
use sevault_token::GenKeyMethod;
use sevault_token::PkGenKeyCmd;
use sevault_token::PkSharedSecretCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SharedSecretMethod;

use crate::asset::Asset;
use crate::asym::eddsa::raw_from_wire;
use crate::asym::eddsa::raw_to_wire;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

const CURVE_BITS: usize = 255;
const SECRET_LEN: usize = 32;

pub(crate) fn check_kdf_args<C: TokenChannel>(
    other_info: &[u8],
    dests: &[&Asset<'_, C>],
    save_shared: bool,
    secret_len: usize,
) -> VaultResult<()> {
    if dests.is_empty() {
        return Err(VaultError::BadArgument);
    }
    if other_info.len() > sevault_token::KEYBLOB_AAD_MAX {
        return Err(VaultError::InvalidParameter);
    }
    if save_shared && (dests.len() != 1 || dests[0].len() != secret_len) {
        return Err(VaultError::InvalidLength);
    }
    Ok(())
}

impl<C: TokenChannel> Session<C> {
    fn x25519_gen(
        &self,
        method: GenKeyMethod,
        private: AssetId,
        domain: AssetId,
        export: Option<sevault_token::ExportReq>,
    ) -> VaultResult<([u8; 32], Option<Vec<u8>>)> {
        let res = self.exchange(ServiceCmd::PkGenKey(PkGenKeyCmd {
            method,
            modulus_bits: CURVE_BITS,
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
        Ok((raw_from_wire(&wire)?, res.blob))
    }

    /// Generates a fresh X25519 key pair into `private` (a 32 byte
    /// asset), returning the raw public key.
    pub fn x25519_generate_key_pair(
        &self,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<[u8; 32]> {
        let (public, _) =
            self.x25519_gen(GenKeyMethod::X25519Pair, private.id(), domain.id(), None)?;
        Ok(public)
    }

    /// As [`Session::x25519_generate_key_pair`], also returning the
    /// private key wrapped under `kek` as a key blob.
    pub fn x25519_generate_key_pair_export(
        &self,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        kek: &Asset<'_, C>,
        aad: &[u8],
    ) -> VaultResult<([u8; 32], Vec<u8>)> {
        crate::asset::check_aad(aad)?;
        let export = sevault_token::ExportReq {
            kek: kek.id(),
            aad: aad.to_vec(),
        };
        let (public, blob) =
            self.x25519_gen(GenKeyMethod::X25519Pair, private.id(), domain.id(), Some(export))?;
        Ok((public, blob.ok_or(VaultError::InternalError)?))
    }

    /// Recomputes the raw public key of an existing private key.
    pub fn x25519_public_key(
        &self,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<[u8; 32]> {
        let (public, _) =
            self.x25519_gen(GenKeyMethod::X25519Public, private.id(), domain.id(), None)?;
        Ok(public)
    }

    /// Agrees on a shared secret with `peer` and spreads it over `dests`.
    ///
    /// Each destination is filled by the derivation function keyed on the
    /// secret, its own length and `other_info`. With `save_shared` the
    /// single destination receives the raw 32 byte secret instead.
    pub fn x25519_shared_secret(
        &self,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        peer: &[u8; 32],
        other_info: &[u8],
        dests: &[&Asset<'_, C>],
        save_shared: bool,
    ) -> VaultResult<()> {
        check_kdf_args(other_info, dests, save_shared, SECRET_LEN)?;
        self.exchange(ServiceCmd::PkSharedSecret(PkSharedSecretCmd {
            method: SharedSecretMethod::X25519,
            modulus_bits: CURVE_BITS,
            private: private.id(),
            domain: domain.id(),
            peer: raw_to_wire(peer)?,
            private2: None,
            peer2: None,
            other_info: other_info.to_vec(),
            dest: dests.iter().map(|a| a.id()).collect(),
            save_shared,
        }))?;
        Ok(())
    }
}
