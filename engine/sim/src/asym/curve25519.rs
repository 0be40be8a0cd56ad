// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Ed25519 and X25519 services.
//!
//! Asset content for both key kinds is the raw RFC 8032 / RFC 7748
//! little-endian string. Everything that crosses the token boundary rides in
//! the usual most-significant-byte-first sub-vector records, so the wire form
//! is the byte reverse of the raw form.

use openssl::derive::Deriver;
use openssl::pkey::Id;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use openssl::sign::Verifier;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::AssetId;
use sevault_token::GenKeyMethod;
use sevault_token::PkGenKeyCmd;
use sevault_token::PkGenKeyRes;
use sevault_token::PkSharedSecretCmd;
use sevault_token::PkSignVerifyCmd;
use sevault_token::PkSignVerifyRes;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::SignVerifyMethod;
use sevault_token::MAX_PK_HASH_BYTES;

use crate::asym::export_blob;
use crate::asym::kdf_fill;
use crate::crypto::hash::check_total;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;
use crate::vault::eddsa_state_footprint;
use crate::vault::AssetAux;
use crate::vault::EddsaState;

const CURVE_BITS: usize = 255;
const RAW_LEN: usize = 32;

/// Message bytes absorbed together with the initial sign command.
const INITIAL_SIGN_BYTES: usize = 96;
/// Message bytes absorbed together with the initial verify command.
const INITIAL_VERIFY_BYTES: usize = 64;
/// Continuation fragments arrive in whole absorption blocks.
const UPDATE_BLOCK: usize = 128;

fn check_curve(
    state: &mut EngineState,
    provenance: Provenance,
    cmd_bits: usize,
    domain: AssetId,
) -> SimResult<()> {
    if cmd_bits != CURVE_BITS {
        return Err(SimError::InvalidParameter);
    }
    // The curve is fixed; the domain asset only proves the caller holds one.
    state
        .vault
        .key_content(domain, PolicyMask::PUBLIC_KEY_PARAM, provenance)?;
    Ok(())
}

fn raw_key(state: &mut EngineState, provenance: Provenance, id: AssetId, need: PolicyMask) -> SimResult<Vec<u8>> {
    let content = state.vault.key_content(id, need, provenance)?;
    if content.len() != RAW_LEN {
        return Err(SimError::InvalidKeySize);
    }
    Ok(content)
}

fn raw_to_wire(raw: &[u8]) -> SimResult<Vec<u8>> {
    let mut msb = raw.to_vec();
    msb.reverse();
    let mut buf = vec![0u8; wire::vector_len(CURVE_BITS)];
    let mut w = Writer::new(&mut buf);
    wire::put_bigint(&mut w, CURVE_BITS, 0, 1, &msb)?;
    Ok(buf)
}

fn raw_from_wire(data: &[u8]) -> SimResult<[u8; RAW_LEN]> {
    let mut r = Reader::new(data);
    let mut dest = [0u8; RAW_LEN];
    let (header, _) = wire::get_bigint(&mut r, &mut dest)?;
    header.expect(0, 1)?;
    if header.bits as usize != CURVE_BITS {
        return Err(SimError::InvalidParameter);
    }
    dest.reverse();
    Ok(dest)
}

fn signature_to_wire(sig: &[u8]) -> SimResult<Vec<u8>> {
    let mut r = sig[..RAW_LEN].to_vec();
    let mut s = sig[RAW_LEN..].to_vec();
    r.reverse();
    s.reverse();
    let mut buf = vec![0u8; 2 * wire::vector_len(CURVE_BITS)];
    let mut w = Writer::new(&mut buf);
    wire::put_signature(&mut w, CURVE_BITS, &r, &s)?;
    Ok(buf)
}

fn signature_from_wire(data: &[u8]) -> SimResult<[u8; 64]> {
    let mut reader = Reader::new(data);
    let (r, s) = wire::get_signature(&mut reader)?;
    if r.len() != RAW_LEN || s.len() != RAW_LEN {
        return Err(SimError::InvalidParameter);
    }
    let mut sig = [0u8; 64];
    sig[..RAW_LEN].copy_from_slice(&r);
    sig[RAW_LEN..].copy_from_slice(&s);
    sig[..RAW_LEN].reverse();
    sig[RAW_LEN..].reverse();
    Ok(sig)
}

fn eddsa_initial(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
) -> SimResult<ServiceRes> {
    if cmd.state.is_some() {
        return Err(SimError::InvalidParameter);
    }
    let chain = match &cmd.signature {
        None => {
            if cmd.data.len() > INITIAL_SIGN_BYTES {
                return Err(SimError::InvalidLength);
            }
            let key = raw_key(state, provenance, cmd.key, PolicyMask::PK_ECDSA_SIGN)?;
            EddsaState {
                verify: false,
                key,
                signature: None,
                message: cmd.data.clone(),
            }
        }
        Some(signature) => {
            if cmd.data.len() > INITIAL_VERIFY_BYTES {
                return Err(SimError::InvalidLength);
            }
            let need = PolicyMask::PK_ECDSA_SIGN | PolicyMask::PUBLIC_KEY;
            let key = raw_key(state, provenance, cmd.key, need)?;
            EddsaState {
                verify: true,
                key,
                signature: Some(signature_from_wire(signature)?),
                message: cmd.data.clone(),
            }
        }
    };
    let id = state
        .vault
        .create_engine(eddsa_state_footprint(), provenance, AssetAux::Eddsa(chain))?;
    Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
        signature: Vec::new(),
        state: Some(id),
    }))
}

fn chain_of(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
) -> SimResult<&mut EddsaState> {
    let slot = state.vault.lookup(id)?;
    if slot.origin != provenance {
        return Err(SimError::AccessError);
    }
    let AssetAux::Eddsa(chain) = &mut slot.aux else {
        return Err(SimError::InvalidAsset);
    };
    Ok(chain)
}

fn eddsa_update(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
) -> SimResult<ServiceRes> {
    if cmd.signature.is_some() {
        return Err(SimError::InvalidParameter);
    }
    let id = cmd.state.ok_or(SimError::InvalidParameter)?;
    if cmd.data.is_empty()
        || cmd.data.len() % UPDATE_BLOCK != 0
        || cmd.data.len() > MAX_PK_HASH_BYTES
    {
        return Err(SimError::InvalidLength);
    }
    let chain = chain_of(state, provenance, id)?;
    chain.message.extend_from_slice(&cmd.data);
    Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
        signature: Vec::new(),
        state: Some(id),
    }))
}

fn eddsa_final(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
) -> SimResult<ServiceRes> {
    if cmd.signature.is_some() {
        return Err(SimError::InvalidParameter);
    }
    if cmd.data.len() > MAX_PK_HASH_BYTES {
        return Err(SimError::InvalidLength);
    }
    let id = cmd.state.ok_or(SimError::InvalidParameter)?;
    let mut chain = chain_of(state, provenance, id)?.clone();
    // The chaining asset dies with the final phase, pass or fail.
    state.vault.delete(id, provenance)?;
    chain.message.extend_from_slice(&cmd.data);
    check_total(cmd.total_len, chain.message.len())?;
    if chain.verify {
        let sig = chain.signature.ok_or(SimError::InvalidParameter)?;
        let pkey = PKey::public_key_from_raw_bytes(&chain.key, Id::ED25519)?;
        let mut verifier = Verifier::new_without_digest(&pkey)?;
        if !verifier.verify_oneshot(&sig, &chain.message)? {
            tracing::debug!(total = chain.message.len(), "Ed25519 verification failed");
            return Err(SimError::VerifyError);
        }
        Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
            signature: Vec::new(),
            state: None,
        }))
    } else {
        let pkey = PKey::private_key_from_raw_bytes(&chain.key, Id::ED25519)?;
        let mut signer = Signer::new_without_digest(&pkey)?;
        let sig = signer.sign_oneshot_to_vec(&chain.message)?;
        Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
            signature: signature_to_wire(&sig)?,
            state: None,
        }))
    }
}

pub(crate) fn eddsa_sign_verify(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
) -> SimResult<ServiceRes> {
    let domain = cmd.domain.ok_or(SimError::InvalidParameter)?;
    check_curve(state, provenance, cmd.modulus_bits, domain)?;
    match cmd.method {
        SignVerifyMethod::EddsaInitial => eddsa_initial(state, provenance, cmd),
        SignVerifyMethod::EddsaUpdate => eddsa_update(state, provenance, cmd),
        SignVerifyMethod::EddsaFinal => eddsa_final(state, provenance, cmd),
        _ => Err(SimError::InvalidParameter),
    }
}

pub(crate) fn gen_key(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkGenKeyCmd,
) -> SimResult<ServiceRes> {
    check_curve(state, provenance, cmd.modulus_bits, cmd.domain)?;
    let id = match cmd.method {
        GenKeyMethod::EddsaPair | GenKeyMethod::EddsaPublic => Id::ED25519,
        GenKeyMethod::X25519Pair | GenKeyMethod::X25519Public => Id::X25519,
        _ => return Err(SimError::InvalidParameter),
    };
    match cmd.method {
        GenKeyMethod::EddsaPair | GenKeyMethod::X25519Pair => {
            let pkey = match id {
                Id::ED25519 => PKey::generate_ed25519()?,
                _ => PKey::generate_x25519()?,
            };
            let content = pkey.raw_private_key()?;
            let blob = export_blob(state, provenance, cmd.private, &cmd.export, &content)?;
            state.vault.fill(cmd.private, content)?;
            let public = if cmd.want_public {
                Some(raw_to_wire(&pkey.raw_public_key()?)?)
            } else {
                None
            };
            Ok(ServiceRes::PkGenKey(PkGenKeyRes { public, blob }))
        }
        _ => {
            if cmd.export.is_some() {
                return Err(SimError::InvalidParameter);
            }
            let raw = raw_key(state, provenance, cmd.private, PolicyMask::NONE)?;
            let pkey = PKey::private_key_from_raw_bytes(&raw, id)?;
            let public = if cmd.want_public {
                Some(raw_to_wire(&pkey.raw_public_key()?)?)
            } else {
                None
            };
            Ok(ServiceRes::PkGenKey(PkGenKeyRes { public, blob: None }))
        }
    }
}

pub(crate) fn shared_secret(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSharedSecretCmd,
) -> SimResult<ServiceRes> {
    check_curve(state, provenance, cmd.modulus_bits, cmd.domain)?;
    if cmd.private2.is_some() || cmd.peer2.is_some() {
        return Err(SimError::InvalidParameter);
    }
    let raw = raw_key(state, provenance, cmd.private, PolicyMask::PK_ECDH_KEY)?;
    let private = PKey::private_key_from_raw_bytes(&raw, Id::X25519)?;
    let peer = raw_from_wire(&cmd.peer)?;
    let peer = PKey::public_key_from_raw_bytes(&peer, Id::X25519)?;
    let mut deriver = Deriver::new(&private)?;
    deriver.set_peer(&peer)?;
    let secret = deriver.derive_to_vec()?;
    kdf_fill(
        state,
        provenance,
        &secret,
        &cmd.other_info,
        &cmd.dest,
        cmd.save_shared,
    )?;
    Ok(ServiceRes::None)
}
