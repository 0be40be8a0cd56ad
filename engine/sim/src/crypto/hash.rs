// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Hash service.

use openssl::sha;
use sevault_token::HashAlg;
use sevault_token::HashCmd;
use sevault_token::ServiceRes;
use sevault_token::StreamMode;
use sevault_token::StreamState;
use sevault_token::MAX_DMA_BYTES;

use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

/// One-shot digest used across the simulator.
pub(crate) fn digest(alg: HashAlg, msg: &[u8]) -> Vec<u8> {
    match alg {
        HashAlg::Sha1 => sha::sha1(msg).to_vec(),
        HashAlg::Sha224 => sha::sha224(msg).to_vec(),
        HashAlg::Sha256 => sha::sha256(msg).to_vec(),
        HashAlg::Sha384 => sha::sha384(msg).to_vec(),
        HashAlg::Sha512 => sha::sha512(msg).to_vec(),
    }
}

/// SHA-256 counter-mode KDF the engine uses for asset derivation and
/// shared-secret expansion.
pub(crate) fn kdf_expand(secret: &[u8], info: &[u8], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len.div_ceil(32) * 32);
    let mut counter = 1u32;
    while out.len() < len {
        let mut block = Vec::with_capacity(4 + secret.len() + info.len());
        block.extend_from_slice(&counter.to_be_bytes());
        block.extend_from_slice(secret);
        block.extend_from_slice(info);
        out.extend_from_slice(&sha::sha256(&block));
        counter += 1;
    }
    out.truncate(len);
    out
}

pub(crate) fn check_total(total_len: u64, have: usize) -> SimResult<()> {
    if total_len != have as u64 {
        tracing::debug!(total_len, have, "total length does not match the stream");
        return Err(SimError::InvalidLength);
    }
    Ok(())
}

pub(crate) fn check_fragment(data: &[u8], block_len: usize) -> SimResult<()> {
    if data.is_empty() || data.len() % block_len != 0 {
        return Err(SimError::InvalidLength);
    }
    Ok(())
}

pub(crate) fn hash_service(state: &mut EngineState, cmd: &HashCmd) -> SimResult<ServiceRes> {
    if cmd.data.len() > MAX_DMA_BYTES {
        return Err(SimError::InvalidLength);
    }
    let state_len = cmd.alg.state_len();
    match cmd.mode {
        StreamMode::Init2Final => {
            if cmd.state != StreamState::None {
                return Err(SimError::InvalidParameter);
            }
            check_total(cmd.total_len, cmd.data.len())?;
            Ok(ServiceRes::Hash {
                digest: digest(cmd.alg, &cmd.data),
                state: None,
            })
        }
        StreamMode::Init2Cont => {
            check_fragment(&cmd.data, cmd.alg.block_len())?;
            if let StreamState::Asset(id) = &cmd.state {
                state.vault.lookup(*id)?;
            }
            let echo = state.streams.start(&cmd.state, state_len, &cmd.data)?;
            Ok(ServiceRes::Hash {
                digest: Vec::new(),
                state: echo,
            })
        }
        StreamMode::Cont2Cont => {
            check_fragment(&cmd.data, cmd.alg.block_len())?;
            let echo = state.streams.append(&cmd.state, state_len, &cmd.data)?;
            Ok(ServiceRes::Hash {
                digest: Vec::new(),
                state: echo,
            })
        }
        StreamMode::Cont2Final => {
            let mut msg = state.streams.finish(&cmd.state, state_len)?;
            msg.extend_from_slice(&cmd.data);
            check_total(cmd.total_len, msg.len())?;
            Ok(ServiceRes::Hash {
                digest: digest(cmd.alg, &msg),
                state: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use test_with_tracing::test;

    use super::*;

    fn one_shot(state: &mut EngineState, alg: HashAlg, msg: &[u8]) -> Vec<u8> {
        let res = hash_service(
            state,
            &HashCmd {
                alg,
                mode: StreamMode::Init2Final,
                state: StreamState::None,
                data: msg.to_vec(),
                total_len: msg.len() as u64,
            },
        )
        .unwrap();
        let ServiceRes::Hash { digest, .. } = res else {
            panic!("unexpected payload");
        };
        digest
    }

    #[test]
    fn sha256_known_vector() {
        let mut state = EngineState::boot();
        let digest = one_shot(&mut state, HashAlg::Sha256, b"abc");
        assert_eq!(
            digest,
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap()
        );
    }

    #[test]
    fn streamed_digest_matches_one_shot() {
        let mut state = EngineState::boot();
        let msg: Vec<u8> = (0u8..=255).cycle().take(200).collect();
        let expect = one_shot(&mut state, HashAlg::Sha256, &msg);

        let res = hash_service(
            &mut state,
            &HashCmd {
                alg: HashAlg::Sha256,
                mode: StreamMode::Init2Cont,
                state: StreamState::Embedded(Vec::new()),
                data: msg[..128].to_vec(),
                total_len: 0,
            },
        )
        .unwrap();
        let ServiceRes::Hash { state: Some(cookie), .. } = res else {
            panic!("continuation must return embedded state");
        };
        let res = hash_service(
            &mut state,
            &HashCmd {
                alg: HashAlg::Sha256,
                mode: StreamMode::Cont2Final,
                state: StreamState::Embedded(cookie),
                data: msg[128..].to_vec(),
                total_len: msg.len() as u64,
            },
        )
        .unwrap();
        let ServiceRes::Hash { digest, .. } = res else {
            panic!("unexpected payload");
        };
        assert_eq!(digest, expect);
    }

    #[test]
    fn continuation_fragments_must_be_block_aligned() {
        let mut state = EngineState::boot();
        let res = hash_service(
            &mut state,
            &HashCmd {
                alg: HashAlg::Sha256,
                mode: StreamMode::Init2Cont,
                state: StreamState::Embedded(Vec::new()),
                data: vec![0; 65],
                total_len: 0,
            },
        );
        assert_eq!(res, Err(SimError::InvalidLength));
    }

    #[test]
    fn total_length_mismatch_is_refused() {
        let mut state = EngineState::boot();
        let res = hash_service(
            &mut state,
            &HashCmd {
                alg: HashAlg::Sha1,
                mode: StreamMode::Init2Final,
                state: StreamState::None,
                data: b"abc".to_vec(),
                total_len: 4,
            },
        );
        assert_eq!(res, Err(SimError::InvalidLength));
    }

    #[test]
    fn kdf_is_deterministic_and_length_exact() {
        let a = kdf_expand(b"secret", b"label", 48);
        let b = kdf_expand(b"secret", b"label", 48);
        assert_eq!(a, b);
        assert_eq!(a.len(), 48);
        assert_ne!(kdf_expand(b"secret", b"other", 48), a);
    }
}
