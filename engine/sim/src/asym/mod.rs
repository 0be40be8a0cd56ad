// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Asymmetric services, split by key family.

pub(crate) mod curve25519;
pub(crate) mod dl;
pub(crate) mod ecc;
pub(crate) mod rsa;

use openssl::bn::BigNum;
use openssl::bn::BigNumContext;
use openssl::bn::BigNumRef;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::AssetId;
use sevault_token::ExportReq;
use sevault_token::GenKeyMethod;
use sevault_token::HashAlg;
use sevault_token::KeyCheckMethod;
use sevault_token::PkEncryptCmd;
use sevault_token::PkGenKeyCmd;
use sevault_token::PkKeyCheckCmd;
use sevault_token::PkSharedSecretCmd;
use sevault_token::PkSignVerifyCmd;
use sevault_token::PkWrapCmd;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::SharedSecretMethod;
use sevault_token::SignVerifyMethod;
use sevault_token::MAX_PK_HASH_BYTES;

use crate::crypto::hash::check_total;
use crate::crypto::hash::digest;
use crate::crypto::hash::kdf_expand;
use crate::crypto::kw;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;
use crate::vault::check_aad;
use crate::vault::AAD_MAX;

/// Finishes the digest for a sign or verify command.
///
/// A `state` asset names a hash stream opened through the hash service with
/// asset-backed state; its absorbed fragments are consumed here and `data`
/// becomes the terminal fragment.
pub(crate) fn take_digest(
    state: &mut EngineState,
    alg: HashAlg,
    digest_state: &Option<AssetId>,
    data: &[u8],
    total_len: u64,
) -> SimResult<Vec<u8>> {
    if data.len() > MAX_PK_HASH_BYTES {
        return Err(SimError::InvalidLength);
    }
    let msg = match digest_state {
        Some(id) => {
            let mut msg = state.streams.take_asset(*id)?;
            msg.extend_from_slice(data);
            msg
        }
        None => data.to_vec(),
    };
    check_total(total_len, msg.len())?;
    Ok(digest(alg, &msg))
}

/// Distributes a shared secret into the destination assets.
///
/// With `save_shared` the raw secret goes verbatim into a single asset of
/// exactly matching length; otherwise the engine KDF expands it with the
/// caller's info and fills every destination in order.
pub(crate) fn kdf_fill(
    state: &mut EngineState,
    provenance: Provenance,
    secret: &[u8],
    other_info: &[u8],
    dest: &[AssetId],
    save_shared: bool,
) -> SimResult<()> {
    if dest.is_empty() || other_info.len() > AAD_MAX {
        return Err(SimError::InvalidParameter);
    }
    if save_shared {
        if dest.len() != 1 {
            return Err(SimError::InvalidParameter);
        }
        let length = state.vault.expect_empty(dest[0], provenance)?;
        if length != secret.len() {
            return Err(SimError::InvalidLength);
        }
        return state.vault.fill(dest[0], secret.to_vec());
    }
    let mut need = 0usize;
    for id in dest {
        need += state.vault.expect_empty(*id, provenance)?;
    }
    let keying = kdf_expand(secret, other_info, need);
    let mut offset = 0;
    for id in dest {
        let length = state.vault.expect_empty(*id, provenance)?;
        state.vault.fill(*id, keying[offset..offset + length].to_vec())?;
        offset += length;
    }
    Ok(())
}

/// Wraps freshly generated private-key content into a key blob when the
/// generate command asked for an export.
pub(crate) fn export_blob(
    state: &mut EngineState,
    provenance: Provenance,
    private: AssetId,
    export: &Option<ExportReq>,
    content: &[u8],
) -> SimResult<Option<Vec<u8>>> {
    let Some(req) = export else {
        return Ok(None);
    };
    check_aad(&req.aad)?;
    if !state.vault.policy_of(private)?.contains(PolicyMask::EXPORT) {
        return Err(SimError::AccessError);
    }
    let kek = state
        .vault
        .key_content(req.kek, PolicyMask::AES_WRAP, provenance)?;
    Ok(Some(kw::blob_wrap(&kek, &req.aad, content)?))
}

/// Uniform scalar in `[1, order)`.
pub(crate) fn rand_scalar(order: &BigNumRef) -> SimResult<BigNum> {
    let mut k = BigNum::new()?;
    for _ in 0..4 {
        order.rand_range(&mut k)?;
        if k.num_bits() != 0 {
            return Ok(k);
        }
    }
    Err(SimError::Panic)
}

/// `base^exp mod modulus` on raw big numbers.
pub(crate) fn mod_exp(base: &BigNumRef, exp: &BigNumRef, modulus: &BigNumRef) -> SimResult<BigNum> {
    let mut out = BigNum::new()?;
    let mut ctx = BigNumContext::new()?;
    out.mod_exp(base, exp, modulus, &mut ctx)?;
    Ok(out)
}

/// Reads a single `bits`-wide record holding one big number.
pub(crate) fn scalar_from_vector(content: &[u8], bits: usize) -> SimResult<BigNum> {
    let mut r = Reader::new(content);
    let mut dest = vec![0u8; wire::byte_len(bits)];
    let (_, n) = wire::get_bigint(&mut r, &mut dest)?;
    Ok(BigNum::from_slice(&dest[..n])?)
}

/// Single-record asset content for one big number.
pub(crate) fn scalar_to_vector(bits: usize, scalar: &BigNumRef) -> SimResult<Vec<u8>> {
    let mut buf = vec![0u8; wire::vector_len(bits)];
    let mut w = Writer::new(&mut buf);
    wire::put_bigint(&mut w, bits, 0, 1, &scalar.to_vec())?;
    Ok(buf)
}

pub(crate) fn sign_verify_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
) -> SimResult<ServiceRes> {
    match cmd.method {
        SignVerifyMethod::Ecdsa { hash } => ecc::ecdsa_sign_verify(state, provenance, cmd, hash),
        SignVerifyMethod::Dsa { hash } => dl::dsa_sign_verify(state, provenance, cmd, hash),
        SignVerifyMethod::RsaPkcs1 { .. } | SignVerifyMethod::RsaPss { .. } => {
            rsa::sign_verify(state, provenance, cmd)
        }
        SignVerifyMethod::EddsaInitial
        | SignVerifyMethod::EddsaUpdate
        | SignVerifyMethod::EddsaFinal => curve25519::eddsa_sign_verify(state, provenance, cmd),
    }
}

pub(crate) fn gen_key_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkGenKeyCmd,
) -> SimResult<ServiceRes> {
    match cmd.method {
        GenKeyMethod::EcdsaPair | GenKeyMethod::EcdsaPublic => {
            ecc::gen_key(state, provenance, cmd)
        }
        GenKeyMethod::EddsaPair
        | GenKeyMethod::EddsaPublic
        | GenKeyMethod::X25519Pair
        | GenKeyMethod::X25519Public => curve25519::gen_key(state, provenance, cmd),
        GenKeyMethod::DhPair
        | GenKeyMethod::DhPublic
        | GenKeyMethod::DsaPair
        | GenKeyMethod::DsaPublic => dl::gen_key(state, provenance, cmd),
    }
}

pub(crate) fn shared_secret_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSharedSecretCmd,
) -> SimResult<ServiceRes> {
    match cmd.method {
        SharedSecretMethod::Ecdh | SharedSecretMethod::EcdhDual => {
            ecc::shared_secret(state, provenance, cmd)
        }
        SharedSecretMethod::X25519 => curve25519::shared_secret(state, provenance, cmd),
        SharedSecretMethod::Dh | SharedSecretMethod::DhDual => {
            dl::shared_secret(state, provenance, cmd)
        }
    }
}

pub(crate) fn wrap_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkWrapCmd,
) -> SimResult<ServiceRes> {
    rsa::wrap_service(state, provenance, cmd)
}

pub(crate) fn encrypt_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkEncryptCmd,
) -> SimResult<ServiceRes> {
    ecc::elgamal_service(state, provenance, cmd)
}

pub(crate) fn key_check_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkKeyCheckCmd,
) -> SimResult<ServiceRes> {
    match cmd.method {
        KeyCheckMethod::EcdhEcdsa => ecc::key_check(state, provenance, cmd),
        KeyCheckMethod::DhDsa => dl::key_check(state, provenance, cmd),
    }
}
