// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! AES key wrap (RFC 5649) and the engine key-blob format.
//!
//! Key blobs are the engine's own export container: AES-256-GCM under a key
//! derived from the KEK, with the caller's associated data both
//! authenticated and mixed into the nonce derivation. That keeps the
//! construction deterministic, so two parties exporting the same content
//! under the same KEK and associated data produce identical blobs.

use openssl::sha;
use openssl::symm::decrypt_aead;
use openssl::symm::encrypt_aead;
use openssl::symm::Cipher;
use sevault_token::AesWrapCmd;
use sevault_token::KeyRef;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::KEYBLOB_OVERHEAD;
use sevault_token::MAX_DMA_BYTES;

use crate::crypto::cipher::aes_block;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

const AIV_PREFIX: [u8; 4] = [0xa6, 0x59, 0x59, 0xa6];

/// RFC 5649 wrap with padding.
pub(crate) fn kwp_wrap(kek: &[u8], data: &[u8]) -> SimResult<Vec<u8>> {
    if data.is_empty() {
        return Err(SimError::InvalidLength);
    }
    let padded = data.len().div_ceil(8) * 8;
    let mut plain = vec![0u8; 8 + padded];
    plain[..4].copy_from_slice(&AIV_PREFIX);
    plain[4..8].copy_from_slice(&(data.len() as u32).to_be_bytes());
    plain[8..8 + data.len()].copy_from_slice(data);

    if padded == 8 {
        let mut block = [0u8; 16];
        block.copy_from_slice(&plain);
        return Ok(aes_block(kek, &block, true)?.to_vec());
    }

    let n = padded / 8;
    let mut a = [0u8; 8];
    a.copy_from_slice(&plain[..8]);
    let mut r = plain[8..].to_vec();
    for j in 0..6u64 {
        for i in 0..n {
            let mut block = [0u8; 16];
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(&r[i * 8..(i + 1) * 8]);
            let enc = aes_block(kek, &block, true)?;
            let t = (n as u64 * j + i as u64 + 1).to_be_bytes();
            for (k, byte) in a.iter_mut().enumerate() {
                *byte = enc[k] ^ t[k];
            }
            r[i * 8..(i + 1) * 8].copy_from_slice(&enc[8..]);
        }
    }
    let mut out = a.to_vec();
    out.extend_from_slice(&r);
    Ok(out)
}

/// RFC 5649 unwrap with padding.
pub(crate) fn kwp_unwrap(kek: &[u8], blob: &[u8]) -> SimResult<Vec<u8>> {
    if blob.len() < 16 || blob.len() % 8 != 0 {
        return Err(SimError::InvalidLength);
    }
    let (a, mut r) = if blob.len() == 16 {
        let mut block = [0u8; 16];
        block.copy_from_slice(blob);
        let plain = aes_block(kek, &block, false)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(&plain[..8]);
        (a, plain[8..].to_vec())
    } else {
        let n = blob.len() / 8 - 1;
        let mut a = [0u8; 8];
        a.copy_from_slice(&blob[..8]);
        let mut r = blob[8..].to_vec();
        for j in (0..6u64).rev() {
            for i in (0..n).rev() {
                let t = (n as u64 * j + i as u64 + 1).to_be_bytes();
                let mut block = [0u8; 16];
                for (k, byte) in block[..8].iter_mut().enumerate() {
                    *byte = a[k] ^ t[k];
                }
                block[8..].copy_from_slice(&r[i * 8..(i + 1) * 8]);
                let dec = aes_block(kek, &block, false)?;
                a.copy_from_slice(&dec[..8]);
                r[i * 8..(i + 1) * 8].copy_from_slice(&dec[8..]);
            }
        }
        (a, r)
    };

    if a[..4] != AIV_PREFIX {
        return Err(SimError::VerifyError);
    }
    let mut len_word = [0u8; 4];
    len_word.copy_from_slice(&a[4..8]);
    let mlen = u32::from_be_bytes(len_word) as usize;
    if mlen == 0 || mlen > r.len() || r.len() - mlen >= 8 {
        return Err(SimError::VerifyError);
    }
    if r[mlen..].iter().any(|&b| b != 0) {
        return Err(SimError::VerifyError);
    }
    r.truncate(mlen);
    Ok(r)
}

fn blob_key(kek: &[u8]) -> [u8; 32] {
    sha::sha256(kek)
}

fn blob_nonce(aad: &[u8]) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&sha::sha256(aad)[..12]);
    nonce
}

/// Wraps asset content into a key blob.
pub(crate) fn blob_wrap(kek: &[u8], aad: &[u8], content: &[u8]) -> SimResult<Vec<u8>> {
    let mut tag = [0u8; KEYBLOB_OVERHEAD];
    let mut out = encrypt_aead(
        Cipher::aes_256_gcm(),
        &blob_key(kek),
        Some(&blob_nonce(aad)),
        aad,
        content,
        &mut tag,
    )?;
    out.extend_from_slice(&tag);
    Ok(out)
}

/// Opens a key blob; any mismatch in KEK, associated data or blob bytes is
/// a verification failure.
pub(crate) fn blob_unwrap(kek: &[u8], aad: &[u8], blob: &[u8]) -> SimResult<Vec<u8>> {
    if blob.len() < KEYBLOB_OVERHEAD {
        return Err(SimError::InvalidLength);
    }
    let (data, tag) = blob.split_at(blob.len() - KEYBLOB_OVERHEAD);
    decrypt_aead(
        Cipher::aes_256_gcm(),
        &blob_key(kek),
        Some(&blob_nonce(aad)),
        aad,
        data,
        tag,
    )
    .map_err(|_| {
        tracing::debug!("key blob authentication failed");
        SimError::VerifyError
    })
}

pub(crate) fn aes_wrap_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &AesWrapCmd,
) -> SimResult<ServiceRes> {
    if cmd.data.len() > MAX_DMA_BYTES {
        return Err(SimError::InvalidLength);
    }
    let key = match &cmd.key {
        KeyRef::Inline(key) => key.clone(),
        KeyRef::Asset(id) => state.vault.key_content(*id, PolicyMask::AES_WRAP, provenance)?,
    };
    if !matches!(key.len(), 16 | 24 | 32) {
        return Err(SimError::InvalidKeySize);
    }
    let data = if cmd.encrypt {
        kwp_wrap(&key, &cmd.data)?
    } else {
        kwp_unwrap(&key, &cmd.data)?
    };
    Ok(ServiceRes::AesWrap { data })
}
