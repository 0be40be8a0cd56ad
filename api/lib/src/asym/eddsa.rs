// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Ed25519 signatures.
//!
//! The curve is fixed, so there is no descriptor; a marker domain asset
//! from [`Session::alloc_curve25519_domain`] stands in for curve
//! parameters. Keys and signatures cross this API in their raw RFC 8032
//! little-endian form; the wire-vector encoding stays internal.
//!
//! The engine absorbs the message over an initial/update/final phase
//! chain keyed by an engine-allocated state asset. Callers see a single
//! sign or verify call; the chain asset is cleaned up on every exit.

use sevault_channel::TokenChannel;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::AssetDeleteCmd;
use sevault_token::AssetId;
use sevault_token::GenKeyMethod;
use sevault_token::PkGenKeyCmd;
use sevault_token::PkSignVerifyCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SignVerifyMethod;
use sevault_token::MAX_PK_HASH_BYTES;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

const CURVE_BITS: usize = 255;
const RAW_LEN: usize = 32;

/// Message bytes the initial sign phase absorbs.
const INITIAL_SIGN_BYTES: usize = 96;
/// Message bytes the initial verify phase absorbs.
const INITIAL_VERIFY_BYTES: usize = 64;
/// Update fragments are whole absorption blocks.
const UPDATE_BLOCK: usize = 128;
/// Largest block-aligned update fragment one token carries.
const UPDATE_CAP: usize = MAX_PK_HASH_BYTES - MAX_PK_HASH_BYTES % UPDATE_BLOCK;

pub(crate) fn raw_to_wire(raw: &[u8; RAW_LEN]) -> VaultResult<Vec<u8>> {
    let mut msb = raw.to_vec();
    msb.reverse();
    let mut buf = vec![0u8; wire::vector_len(CURVE_BITS)];
    let mut w = Writer::new(&mut buf);
    wire::put_bigint(&mut w, CURVE_BITS, 0, 1, &msb).map_err(|_| VaultError::InternalError)?;
    Ok(buf)
}

pub(crate) fn raw_from_wire(data: &[u8]) -> VaultResult<[u8; RAW_LEN]> {
    let mut r = Reader::new(data);
    let mut dest = [0u8; RAW_LEN];
    let (header, _) = wire::get_bigint(&mut r, &mut dest).map_err(|_| VaultError::InternalError)?;
    header.expect(0, 1).map_err(|_| VaultError::InternalError)?;
    if header.bits as usize != CURVE_BITS {
        return Err(VaultError::InternalError);
    }
    dest.reverse();
    Ok(dest)
}

fn signature_to_wire(sig: &[u8; 64]) -> VaultResult<Vec<u8>> {
    let mut r = sig[..RAW_LEN].to_vec();
    let mut s = sig[RAW_LEN..].to_vec();
    r.reverse();
    s.reverse();
    let mut buf = vec![0u8; 2 * wire::vector_len(CURVE_BITS)];
    let mut w = Writer::new(&mut buf);
    wire::put_signature(&mut w, CURVE_BITS, &r, &s).map_err(|_| VaultError::InternalError)?;
    Ok(buf)
}

fn signature_from_wire(data: &[u8]) -> VaultResult<[u8; 64]> {
    let mut reader = Reader::new(data);
    let (r, s) = wire::get_signature(&mut reader).map_err(|_| VaultError::InternalError)?;
    if r.len() != RAW_LEN || s.len() != RAW_LEN {
        return Err(VaultError::InternalError);
    }
    let mut sig = [0u8; 64];
    sig[..RAW_LEN].copy_from_slice(&r);
    sig[RAW_LEN..].copy_from_slice(&s);
    sig[..RAW_LEN].reverse();
    sig[RAW_LEN..].reverse();
    Ok(sig)
}

/// Deletes the engine-side phase chain unless the final phase already
/// consumed it.
struct ChainGuard<'a, C: TokenChannel> {
    session: &'a Session<C>,
    chain: Option<AssetId>,
}

impl<C: TokenChannel> ChainGuard<'_, C> {
    fn disarm(&mut self) {
        self.chain = None;
    }
}

impl<C: TokenChannel> Drop for ChainGuard<'_, C> {
    fn drop(&mut self) {
        let Some(chain) = self.chain.take() else {
            return;
        };
        let cmd = ServiceCmd::AssetDelete(AssetDeleteCmd { asset: chain });
        if let Err(err) = self.session.exchange(cmd) {
            tracing::debug!(%err, "Ed25519 chain delete failed");
        }
    }
}

impl<C: TokenChannel> Session<C> {
    fn eddsa_gen(
        &self,
        method: GenKeyMethod,
        private: AssetId,
        domain: AssetId,
        export: Option<sevault_token::ExportReq>,
    ) -> VaultResult<([u8; RAW_LEN], Option<Vec<u8>>)> {
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

    /// Generates a fresh Ed25519 key pair into `private` (a 32 byte
    /// asset), returning the raw public key.
    pub fn eddsa_generate_key_pair(
        &self,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<[u8; 32]> {
        let (public, _) = self.eddsa_gen(GenKeyMethod::EddsaPair, private.id(), domain.id(), None)?;
        Ok(public)
    }

    /// As [`Session::eddsa_generate_key_pair`], also returning the private
    /// key wrapped under `kek` as a key blob.
    pub fn eddsa_generate_key_pair_export(
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
            self.eddsa_gen(GenKeyMethod::EddsaPair, private.id(), domain.id(), Some(export))?;
        Ok((public, blob.ok_or(VaultError::InternalError)?))
    }

    /// Recomputes the raw public key of an existing private key.
    pub fn eddsa_public_key(
        &self,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
    ) -> VaultResult<[u8; 32]> {
        let (public, _) =
            self.eddsa_gen(GenKeyMethod::EddsaPublic, private.id(), domain.id(), None)?;
        Ok(public)
    }

    fn eddsa_phase(
        &self,
        method: SignVerifyMethod,
        key: AssetId,
        domain: AssetId,
        state: Option<AssetId>,
        data: &[u8],
        total_len: u64,
        signature: Option<Vec<u8>>,
    ) -> VaultResult<sevault_token::PkSignVerifyRes> {
        let res = self.exchange(ServiceCmd::PkSignVerify(PkSignVerifyCmd {
            method,
            modulus_bits: CURVE_BITS,
            key,
            domain: Some(domain),
            state,
            data: data.to_vec(),
            total_len,
            signature,
        }))?;
        let ServiceRes::PkSignVerify(res) = res else {
            return Err(VaultError::InternalError);
        };
        Ok(res)
    }

    fn eddsa_run(
        &self,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
        signature: Option<Vec<u8>>,
    ) -> VaultResult<Vec<u8>> {
        let first_cap = if signature.is_some() {
            INITIAL_VERIFY_BYTES
        } else {
            INITIAL_SIGN_BYTES
        };
        let first = message.len().min(first_cap);
        let res = self.eddsa_phase(
            SignVerifyMethod::EddsaInitial,
            key.id(),
            domain.id(),
            None,
            &message[..first],
            0,
            signature,
        )?;
        let chain = res.state.ok_or(VaultError::InternalError)?;
        let mut guard = ChainGuard {
            session: self,
            chain: Some(chain),
        };
        let rem = &message[first..];
        let tail_at = if rem.len() > MAX_PK_HASH_BYTES {
            (rem.len() - MAX_PK_HASH_BYTES).div_ceil(UPDATE_BLOCK) * UPDATE_BLOCK
        } else {
            0
        };
        for fragment in rem[..tail_at].chunks(UPDATE_CAP) {
            self.eddsa_phase(
                SignVerifyMethod::EddsaUpdate,
                key.id(),
                domain.id(),
                Some(chain),
                fragment,
                0,
                None,
            )?;
        }
        // The final phase consumes the chain asset pass or fail.
        guard.disarm();
        let res = self.eddsa_phase(
            SignVerifyMethod::EddsaFinal,
            key.id(),
            domain.id(),
            Some(chain),
            &rem[tail_at..],
            message.len() as u64,
            None,
        )?;
        Ok(res.signature)
    }

    /// Signs `message` with an Ed25519 private-key asset.
    pub fn eddsa_sign(
        &self,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
    ) -> VaultResult<[u8; 64]> {
        let wire = self.eddsa_run(key, domain, message, None)?;
        signature_from_wire(&wire)
    }

    /// Verifies an Ed25519 signature against a public-key asset.
    ///
    /// [`VaultError::VerifyError`] when the signature does not check out.
    pub fn eddsa_verify(
        &self,
        key: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        message: &[u8],
        signature: &[u8; 64],
    ) -> VaultResult<()> {
        let signature = signature_to_wire(signature)?;
        self.eddsa_run(key, domain, message, Some(signature))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        let mut raw = [0u8; 32];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        let buf = raw_to_wire(&raw).unwrap();
        assert_eq!(buf.len(), wire::vector_len(255));
        assert_eq!(raw_from_wire(&buf).unwrap(), raw);
    }

    #[test]
    fn signature_round_trip() {
        let mut sig = [0u8; 64];
        for (i, b) in sig.iter_mut().enumerate() {
            *b = (255 - i) as u8;
        }
        let buf = signature_to_wire(&sig).unwrap();
        assert_eq!(buf.len(), 2 * wire::vector_len(255));
        assert_eq!(signature_from_wire(&buf).unwrap(), sig);
    }

    #[test]
    fn update_cap_is_block_aligned() {
        assert_eq!(UPDATE_CAP % UPDATE_BLOCK, 0);
        assert!(UPDATE_CAP <= MAX_PK_HASH_BYTES);
    }
}
