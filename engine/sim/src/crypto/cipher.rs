// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Symmetric cipher service.

use openssl::symm::Cipher;
use openssl::symm::Crypter;
use openssl::symm::Mode;
use sevault_token::AssetId;
use sevault_token::CipherAlg;
use sevault_token::CipherCmd;
use sevault_token::CipherMode;
use sevault_token::CipherRes;
use sevault_token::IvRef;
use sevault_token::KeyRef;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::MAX_DMA_BYTES;

use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

fn run_crypter(
    cipher: Cipher,
    key: &[u8],
    iv: Option<&[u8]>,
    encrypt: bool,
    data: &[u8],
) -> SimResult<Vec<u8>> {
    let mode = if encrypt { Mode::Encrypt } else { Mode::Decrypt };
    let mut crypter = Crypter::new(cipher, mode, key, iv)?;
    crypter.pad(false);
    let mut out = vec![0u8; data.len() + cipher.block_size()];
    let mut written = crypter.update(data, &mut out)?;
    written += crypter.finalize(&mut out[written..])?;
    out.truncate(written);
    Ok(out)
}

/// Single AES block operation, shared with key wrap, CBC-MAC and f8.
pub(crate) fn aes_block(key: &[u8], block: &[u8; 16], encrypt: bool) -> SimResult<[u8; 16]> {
    let cipher = match key.len() {
        16 => Cipher::aes_128_ecb(),
        24 => Cipher::aes_192_ecb(),
        32 => Cipher::aes_256_ecb(),
        _ => return Err(SimError::InvalidKeySize),
    };
    let out = run_crypter(cipher, key, None, encrypt, block)?;
    if out.len() != 16 {
        return Err(SimError::Panic);
    }
    let mut result = [0u8; 16];
    result.copy_from_slice(&out);
    Ok(result)
}

fn aes_cipher(mode: CipherMode, key_len: usize) -> SimResult<Cipher> {
    match (mode, key_len) {
        (CipherMode::Ecb, 16) => Ok(Cipher::aes_128_ecb()),
        (CipherMode::Ecb, 24) => Ok(Cipher::aes_192_ecb()),
        (CipherMode::Ecb, 32) => Ok(Cipher::aes_256_ecb()),
        (CipherMode::Cbc, 16) => Ok(Cipher::aes_128_cbc()),
        (CipherMode::Cbc, 24) => Ok(Cipher::aes_192_cbc()),
        (CipherMode::Cbc, 32) => Ok(Cipher::aes_256_cbc()),
        (CipherMode::Ctr, 16) => Ok(Cipher::aes_128_ctr()),
        (CipherMode::Ctr, 24) => Ok(Cipher::aes_192_ctr()),
        (CipherMode::Ctr, 32) => Ok(Cipher::aes_256_ctr()),
        (CipherMode::Xts, 32) => Ok(Cipher::aes_128_xts()),
        (CipherMode::Xts, 64) => Ok(Cipher::aes_256_xts()),
        _ => Err(SimError::InvalidKeySize),
    }
}

/// 3GPP f8 keystream over AES.
///
/// The pre-IV is the caller IV encrypted under the key masked with
/// `fresh || 0x55..`; bearer and direction fold into its first byte. Each
/// keystream block chains the previous one alongside a big-endian block
/// counter.
fn f8_transform(
    key: &[u8],
    iv: &[u8],
    fresh: &[u8; 8],
    bearer: u8,
    direction: u8,
    data: &[u8],
) -> SimResult<Vec<u8>> {
    let mut masked_key = [0u8; 16];
    for (i, b) in masked_key.iter_mut().enumerate() {
        let mask = if i < 8 { fresh[i] } else { 0x55 };
        *b = key[i] ^ mask;
    }
    let mut iv16 = [0u8; 16];
    iv16.copy_from_slice(iv);
    let mut pre_iv = aes_block(&masked_key, &iv16, true)?;
    pre_iv[0] ^= ((bearer & 0x1f) << 3) | ((direction & 1) << 2);

    let mut out = Vec::with_capacity(data.len());
    let mut feedback = [0u8; 16];
    for (j, chunk) in data.chunks(16).enumerate() {
        let counter = (j as u128).to_be_bytes();
        let mut block = pre_iv;
        for i in 0..16 {
            block[i] ^= counter[i] ^ feedback[i];
        }
        feedback = aes_block(key, &block, true)?;
        out.extend(chunk.iter().zip(feedback.iter()).map(|(d, k)| d ^ k));
    }
    Ok(out)
}

fn ctr_next(iv: &[u8], blocks: u64) -> Vec<u8> {
    let mut word = [0u8; 16];
    word.copy_from_slice(iv);
    u128::from_be_bytes(word)
        .wrapping_add(u128::from(blocks))
        .to_be_bytes()
        .to_vec()
}

fn check_family_mode(alg: CipherAlg, mode: CipherMode) -> SimResult<()> {
    let ok = match alg {
        CipherAlg::Aes => matches!(
            mode,
            CipherMode::Ecb | CipherMode::Cbc | CipherMode::Ctr | CipherMode::Xts | CipherMode::F8
        ),
        CipherAlg::TripleDes => matches!(mode, CipherMode::Ecb | CipherMode::Cbc),
        CipherAlg::ChaCha20 => matches!(mode, CipherMode::Stream),
    };
    if !ok {
        return Err(SimError::InvalidParameter);
    }
    Ok(())
}

fn check_key_len(alg: CipherAlg, mode: CipherMode, len: usize) -> SimResult<()> {
    let ok = match (alg, mode) {
        (CipherAlg::Aes, CipherMode::Xts) => matches!(len, 32 | 64),
        (CipherAlg::Aes, CipherMode::F8) => len == 16,
        (CipherAlg::Aes, _) => matches!(len, 16 | 24 | 32),
        (CipherAlg::TripleDes, _) => len == 24,
        (CipherAlg::ChaCha20, _) => matches!(len, 16 | 32),
    };
    if !ok {
        return Err(SimError::InvalidKeySize);
    }
    Ok(())
}

fn check_data_len(alg: CipherAlg, mode: CipherMode, len: usize) -> SimResult<()> {
    let ok = match mode {
        CipherMode::Ecb | CipherMode::Cbc => len > 0 && len % alg.block_len() == 0,
        CipherMode::Xts => len >= 16,
        _ => len > 0,
    };
    if !ok {
        return Err(SimError::InvalidLength);
    }
    Ok(())
}

fn iv_expect(cmd: &CipherCmd) -> SimResult<usize> {
    match cmd.alg {
        CipherAlg::ChaCha20 => {
            if !matches!(cmd.nonce_len, 12 | 16) {
                return Err(SimError::InvalidParameter);
            }
            Ok(usize::from(cmd.nonce_len))
        }
        alg => Ok(alg.iv_len()),
    }
}

enum IvSlot {
    None,
    Inline(Vec<u8>),
    Asset(AssetId, Vec<u8>),
}

impl IvSlot {
    fn bytes(&self) -> Option<&[u8]> {
        match self {
            IvSlot::None => None,
            IvSlot::Inline(iv) | IvSlot::Asset(_, iv) => Some(iv),
        }
    }
}

fn resolve_iv(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &CipherCmd,
) -> SimResult<IvSlot> {
    if cmd.mode == CipherMode::Ecb {
        return match cmd.iv {
            IvRef::None => Ok(IvSlot::None),
            _ => Err(SimError::InvalidParameter),
        };
    }
    let expect = iv_expect(cmd)?;
    match &cmd.iv {
        IvRef::None => Err(SimError::InvalidParameter),
        IvRef::Inline(iv) => {
            if iv.len() != expect {
                return Err(SimError::InvalidParameter);
            }
            Ok(IvSlot::Inline(iv.clone()))
        }
        IvRef::Asset(id) => {
            let need = match cmd.mode {
                CipherMode::Ctr | CipherMode::Stream => PolicyMask::TEMP_COUNTER,
                _ => PolicyMask::TEMP_IV,
            };
            let iv = state.vault.key_content(*id, need, provenance)?;
            if iv.len() != expect {
                return Err(SimError::InvalidState);
            }
            Ok(IvSlot::Asset(*id, iv))
        }
    }
}

fn resolve_key(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &CipherCmd,
) -> SimResult<Vec<u8>> {
    let need = cmd.alg.policy_bit()
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

fn transform(cmd: &CipherCmd, key: &[u8], iv: Option<&[u8]>) -> SimResult<(Vec<u8>, Option<Vec<u8>>)> {
    match (cmd.alg, cmd.mode) {
        (CipherAlg::Aes, CipherMode::F8) => {
            let fresh = cmd.f8_fresh.as_ref().ok_or(SimError::InvalidParameter)?;
            let iv = iv.ok_or(SimError::InvalidParameter)?;
            let out = f8_transform(key, iv, fresh, cmd.f8_bearer, cmd.f8_direction, &cmd.data)?;
            Ok((out, None))
        }
        (CipherAlg::ChaCha20, _) => {
            let iv = iv.ok_or(SimError::InvalidParameter)?;
            // The backend keeps one 256-bit schedule; a 128-bit key repeats
            // into it, matching the engine's key ladder.
            let full_key = if key.len() == 16 {
                [key, key].concat()
            } else {
                key.to_vec()
            };
            let full_iv = if iv.len() == 12 {
                let mut v = vec![0u8; 4];
                v.extend_from_slice(iv);
                v
            } else {
                iv.to_vec()
            };
            let out = run_crypter(Cipher::chacha20(), &full_key, Some(&full_iv), cmd.encrypt, &cmd.data)?;
            Ok((out, None))
        }
        (alg, mode) => {
            let cipher = match alg {
                CipherAlg::Aes => aes_cipher(mode, key.len())?,
                CipherAlg::TripleDes => match mode {
                    CipherMode::Ecb => Cipher::des_ede3(),
                    _ => Cipher::des_ede3_cbc(),
                },
                CipherAlg::ChaCha20 => return Err(SimError::InvalidParameter),
            };
            let out = run_crypter(cipher, key, iv, cmd.encrypt, &cmd.data)?;
            let next = match mode {
                CipherMode::Cbc => {
                    let block = alg.block_len();
                    let src = if cmd.encrypt { &out } else { &cmd.data };
                    Some(src[src.len() - block..].to_vec())
                }
                CipherMode::Ctr => iv.map(|iv| ctr_next(iv, cmd.data.len().div_ceil(16) as u64)),
                _ => None,
            };
            Ok((out, next))
        }
    }
}

pub(crate) fn cipher_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &CipherCmd,
) -> SimResult<ServiceRes> {
    if cmd.data.len() > MAX_DMA_BYTES {
        return Err(SimError::InvalidLength);
    }
    check_family_mode(cmd.alg, cmd.mode)?;
    let key = resolve_key(state, provenance, cmd)?;
    check_key_len(cmd.alg, cmd.mode, key.len())?;
    check_data_len(cmd.alg, cmd.mode, cmd.data.len())?;
    let slot = resolve_iv(state, provenance, cmd)?;
    let (data, next) = transform(cmd, &key, slot.bytes())?;
    let iv = match (slot, next) {
        (IvSlot::Inline(_), Some(next)) => Some(next),
        (IvSlot::Asset(id, _), Some(next)) => {
            state.vault.update_content(id, next)?;
            None
        }
        _ => None,
    };
    Ok(ServiceRes::Cipher(CipherRes { data, iv }))
}
