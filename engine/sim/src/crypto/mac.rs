// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! MAC service.

use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use openssl::symm::Cipher;
use sevault_token::HashAlg;
use sevault_token::KeyRef;
use sevault_token::MacAlg;
use sevault_token::MacCmd;
use sevault_token::MacRef;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::StreamMode;
use sevault_token::StreamState;
use sevault_token::MAX_DMA_BYTES;

use crate::crypto::cipher::aes_block;
use crate::crypto::hash::check_fragment;
use crate::crypto::hash::check_total;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

fn digest_md(alg: HashAlg) -> MessageDigest {
    match alg {
        HashAlg::Sha1 => MessageDigest::sha1(),
        HashAlg::Sha224 => MessageDigest::sha224(),
        HashAlg::Sha256 => MessageDigest::sha256(),
        HashAlg::Sha384 => MessageDigest::sha384(),
        HashAlg::Sha512 => MessageDigest::sha512(),
    }
}

/// HMAC over one message, shared with the eMMC service.
pub(crate) fn hmac(alg: HashAlg, key: &[u8], msg: &[u8]) -> SimResult<Vec<u8>> {
    let pkey = PKey::hmac(key)?;
    let mut signer = Signer::new(digest_md(alg), &pkey)?;
    signer.update(msg)?;
    Ok(signer.sign_to_vec()?)
}

fn cmac(key: &[u8], msg: &[u8]) -> SimResult<Vec<u8>> {
    let cipher = match key.len() {
        16 => Cipher::aes_128_cbc(),
        24 => Cipher::aes_192_cbc(),
        32 => Cipher::aes_256_cbc(),
        _ => return Err(SimError::InvalidKeySize),
    };
    let pkey = PKey::cmac(&cipher, key)?;
    let mut signer = Signer::new_without_digest(&pkey)?;
    signer.update(msg)?;
    Ok(signer.sign_to_vec()?)
}

fn cbc_mac(key: &[u8], msg: &[u8]) -> SimResult<Vec<u8>> {
    let mut mac = [0u8; 16];
    for chunk in msg.chunks(16) {
        let mut block = [0u8; 16];
        block[..chunk.len()].copy_from_slice(chunk);
        for (b, m) in block.iter_mut().zip(mac.iter()) {
            *b ^= *m;
        }
        mac = aes_block(key, &block, true)?;
    }
    Ok(mac.to_vec())
}

fn check_key_len(alg: MacAlg, len: usize) -> SimResult<()> {
    match alg.hash() {
        Some(hash) => {
            if len == 0 || len > hash.block_len() {
                return Err(SimError::InvalidKeySize);
            }
        }
        None => {
            if !matches!(len, 16 | 24 | 32) {
                return Err(SimError::InvalidKeySize);
            }
        }
    }
    Ok(())
}

fn resolve_key(state: &mut EngineState, provenance: Provenance, cmd: &MacCmd) -> SimResult<Vec<u8>> {
    let key = match &cmd.key {
        KeyRef::Inline(key) => key.clone(),
        KeyRef::Asset(id) => {
            let mut need = match cmd.alg.hash() {
                Some(hash) => hash.policy_bit(),
                None => PolicyMask::CMAC,
            };
            need |= if cmd.verify.is_some() {
                PolicyMask::MAC_VERIFY
            } else {
                PolicyMask::MAC_GENERATE
            };
            state.vault.key_content(*id, need, provenance)?
        }
    };
    check_key_len(cmd.alg, key.len())?;
    Ok(key)
}

fn compute(alg: MacAlg, key: &[u8], msg: &[u8]) -> SimResult<Vec<u8>> {
    if let Some(hash) = alg.hash() {
        return hmac(hash, key, msg);
    }
    match alg {
        MacAlg::AesCbcMac => cbc_mac(key, msg),
        _ => cmac(key, msg),
    }
}

fn finalize(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &MacCmd,
    msg: Vec<u8>,
) -> SimResult<ServiceRes> {
    check_total(cmd.total_len, msg.len())?;
    let key = resolve_key(state, provenance, cmd)?;
    let mac = compute(cmd.alg, &key, &msg)?;
    match &cmd.verify {
        Some(reference) => {
            let expect = match reference {
                MacRef::Inline(mac) => mac.clone(),
                MacRef::Asset(id) => state.vault.key_content(*id, PolicyMask::TEMP_MAC, provenance)?,
            };
            if expect.len() != mac.len() || !openssl::memcmp::eq(&expect, &mac) {
                tracing::debug!(alg = ?cmd.alg, "MAC verification failed");
                return Err(SimError::VerifyError);
            }
            Ok(ServiceRes::Mac {
                mac: Vec::new(),
                state: None,
            })
        }
        None => Ok(ServiceRes::Mac { mac, state: None }),
    }
}

pub(crate) fn mac_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &MacCmd,
) -> SimResult<ServiceRes> {
    if cmd.data.len() > MAX_DMA_BYTES {
        return Err(SimError::InvalidLength);
    }
    if cmd.verify.is_some() && !cmd.mode.is_final() {
        return Err(SimError::InvalidParameter);
    }
    let state_len = cmd.alg.state_len();
    match cmd.mode {
        StreamMode::Init2Final => {
            if cmd.state != StreamState::None {
                return Err(SimError::InvalidParameter);
            }
            let msg = cmd.data.clone();
            finalize(state, provenance, cmd, msg)
        }
        StreamMode::Init2Cont => {
            check_fragment(&cmd.data, cmd.alg.block_len())?;
            if let StreamState::Asset(id) = &cmd.state {
                state.vault.lookup(*id)?;
            }
            let echo = state.streams.start(&cmd.state, state_len, &cmd.data)?;
            Ok(ServiceRes::Mac {
                mac: Vec::new(),
                state: echo,
            })
        }
        StreamMode::Cont2Cont => {
            check_fragment(&cmd.data, cmd.alg.block_len())?;
            let echo = state.streams.append(&cmd.state, state_len, &cmd.data)?;
            Ok(ServiceRes::Mac {
                mac: Vec::new(),
                state: echo,
            })
        }
        StreamMode::Cont2Final => {
            let mut msg = state.streams.finish(&cmd.state, state_len)?;
            msg.extend_from_slice(&cmd.data);
            finalize(state, provenance, cmd, msg)
        }
    }
}
