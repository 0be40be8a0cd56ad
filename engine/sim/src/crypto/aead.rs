// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Authenticated encryption service.

use openssl::symm::decrypt_aead;
use openssl::symm::encrypt_aead;
use openssl::symm::Cipher;
use sevault_token::AeadAlg;
use sevault_token::AuthCryptCmd;
use sevault_token::AuthCryptRes;
use sevault_token::GcmSubmode;
use sevault_token::KeyRef;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::MAX_DMA_BYTES;

use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

fn check_params(alg: AeadAlg, nonce_len: usize, tag_len: usize) -> SimResult<()> {
    let ok = match alg {
        AeadAlg::AesCcm => {
            (7..=13).contains(&nonce_len) && matches!(tag_len, 4 | 6 | 8 | 10 | 12 | 14 | 16)
        }
        AeadAlg::AesGcm => nonce_len == 12 && (12..=16).contains(&tag_len),
        AeadAlg::ChaCha20Poly1305 => nonce_len == 12 && tag_len == 16,
    };
    if !ok {
        return Err(SimError::InvalidParameter);
    }
    Ok(())
}

fn select_cipher(alg: AeadAlg, key_len: usize) -> SimResult<Cipher> {
    match (alg, key_len) {
        (AeadAlg::AesCcm, 16) => Ok(Cipher::aes_128_ccm()),
        (AeadAlg::AesCcm, 24) => Ok(Cipher::aes_192_ccm()),
        (AeadAlg::AesCcm, 32) => Ok(Cipher::aes_256_ccm()),
        (AeadAlg::AesGcm, 16) => Ok(Cipher::aes_128_gcm()),
        (AeadAlg::AesGcm, 24) => Ok(Cipher::aes_192_gcm()),
        (AeadAlg::AesGcm, 32) => Ok(Cipher::aes_256_gcm()),
        (AeadAlg::ChaCha20Poly1305, 32) => Ok(Cipher::chacha20_poly1305()),
        _ => Err(SimError::InvalidKeySize),
    }
}

fn resolve_key(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &AuthCryptCmd,
) -> SimResult<Vec<u8>> {
    let algo_bit = match cmd.alg {
        AeadAlg::AesCcm | AeadAlg::AesGcm => PolicyMask::ALGO_AES,
        AeadAlg::ChaCha20Poly1305 => PolicyMask::ALGO_CHACHA20,
    };
    let need = algo_bit
        | if cmd.encrypt {
            PolicyMask::ENCRYPT
        } else {
            PolicyMask::DECRYPT
        };
    match &cmd.key {
        KeyRef::Inline(key) => Ok(key.clone()),
        KeyRef::Asset(id) => state.vault.key_content(*id, need, provenance),
    }
}

pub(crate) fn auth_crypt_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &AuthCryptCmd,
) -> SimResult<ServiceRes> {
    if cmd.data.len() > MAX_DMA_BYTES || cmd.aad.len() > MAX_DMA_BYTES {
        return Err(SimError::InvalidLength);
    }
    if cmd.alg == AeadAlg::AesGcm && cmd.gcm != GcmSubmode::Autonomous {
        // The externally-keyed GHASH submodes are hardware offload paths
        // with no caller-visible use through this driver.
        return Err(SimError::InvalidParameter);
    }
    if cmd.hash_key.is_some() {
        return Err(SimError::InvalidParameter);
    }
    check_params(cmd.alg, cmd.nonce.len(), cmd.tag_len)?;
    let key = resolve_key(state, provenance, cmd)?;
    let cipher = select_cipher(cmd.alg, key.len())?;

    if cmd.encrypt {
        if cmd.tag.is_some() {
            return Err(SimError::InvalidParameter);
        }
        let mut tag = vec![0u8; cmd.tag_len];
        let data = encrypt_aead(cipher, &key, Some(&cmd.nonce), &cmd.aad, &cmd.data, &mut tag)?;
        Ok(ServiceRes::AuthCrypt(AuthCryptRes {
            data,
            tag: Some(tag),
        }))
    } else {
        let tag = cmd.tag.as_ref().ok_or(SimError::InvalidParameter)?;
        if tag.len() != cmd.tag_len {
            return Err(SimError::InvalidParameter);
        }
        let data = decrypt_aead(cipher, &key, Some(&cmd.nonce), &cmd.aad, &cmd.data, tag)
            .map_err(|_| {
                tracing::debug!(alg = ?cmd.alg, "AEAD authentication failed");
                SimError::VerifyError
            })?;
        Ok(ServiceRes::AuthCrypt(AuthCryptRes { data, tag: None }))
    }
}
