// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Streaming digest flows against the simulated engine.

mod common;

use openssl::hash::MessageDigest;
use sevault::HashAlg;
use sevault::HashContext;
use sevault::TempState;
use sevault::VaultError;
use test_with_tracing::test;

fn reference(alg: HashAlg, message: &[u8]) -> Vec<u8> {
    let md = match alg {
        HashAlg::Sha1 => MessageDigest::sha1(),
        HashAlg::Sha224 => MessageDigest::sha224(),
        HashAlg::Sha256 => MessageDigest::sha256(),
        HashAlg::Sha384 => MessageDigest::sha384(),
        HashAlg::Sha512 => MessageDigest::sha512(),
    };
    openssl::hash::hash(md, message).unwrap().to_vec()
}

#[test]
fn one_shot_abc_is_the_published_digest() {
    let session = common::session();
    let mut ctx = HashContext::alloc(&session, HashAlg::Sha256, TempState::Embedded);
    let mut digest = [0u8; 32];
    let n = ctx.finish(b"abc", &mut digest).unwrap();
    assert_eq!(n, 32);
    assert_eq!(
        hex::encode(digest),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn split_points_do_not_change_the_digest() {
    let session = common::session();
    let message: Vec<u8> = (0..197u32).map(|i| (i * 7) as u8).collect();
    for alg in [HashAlg::Sha1, HashAlg::Sha256, HashAlg::Sha512] {
        let expect = reference(alg, &message);
        let block = alg.block_len();
        for temp in [TempState::Embedded, TempState::AssetBacked] {
            for updates in 0..=(message.len() / block) {
                let mut ctx = HashContext::alloc(&session, alg, temp);
                let split = updates * block;
                if split > 0 {
                    ctx.update(&message[..split]).unwrap();
                }
                let mut digest = vec![0u8; alg.digest_len()];
                ctx.finish(&message[split..], &mut digest).unwrap();
                assert_eq!(digest, expect, "{alg:?} split at {split}");
            }
        }
    }
}

#[test]
fn updates_must_be_whole_blocks() {
    let session = common::session();
    let mut ctx = HashContext::alloc(&session, HashAlg::Sha256, TempState::Embedded);
    let Err(VaultError::InvalidLength) = ctx.update(&[0u8; 63]) else {
        panic!()
    };
    let Err(VaultError::InvalidLength) = ctx.update(&[]) else {
        panic!()
    };
    // The rejected updates left nothing absorbed.
    assert_eq!(ctx.total_len(), 0);
}

#[test]
fn short_digest_buffer_reports_and_preserves_the_stream() {
    let session = common::session();
    let mut ctx = HashContext::alloc(&session, HashAlg::Sha256, TempState::Embedded);
    ctx.update(&[0x5a; 64]).unwrap();
    let mut short = [0u8; 31];
    let Err(VaultError::BufferTooSmall { required: 32 }) = ctx.finish(b"tail", &mut short)
    else {
        panic!()
    };
    // The stream is still live; the full-size retry matches a one-shot.
    let mut digest = [0u8; 32];
    ctx.finish(b"tail", &mut digest).unwrap();
    let mut whole = Vec::from([0x5a; 64]);
    whole.extend_from_slice(b"tail");
    assert_eq!(digest.to_vec(), reference(HashAlg::Sha256, &whole));
}

#[test]
fn finished_context_refuses_more_input() {
    let session = common::session();
    let mut ctx = HashContext::alloc(&session, HashAlg::Sha384, TempState::Embedded);
    let mut digest = [0u8; 48];
    ctx.finish(b"abc", &mut digest).unwrap();
    let Err(VaultError::InvalidState) = ctx.update(&[0u8; 128]) else {
        panic!()
    };
    let Err(VaultError::InvalidState) = ctx.finish(b"", &mut digest) else {
        panic!()
    };
}

#[test]
fn oversized_terminal_input_is_fragmented_invisibly() {
    let session = common::session();
    // Past the one-token transfer limit; the context absorbs a
    // block-aligned prefix through the stream before the terminal call.
    let len = sevault_token::MAX_DMA_BYTES + 65;
    let message: Vec<u8> = (0..len as u32).map(|i| (i % 251) as u8).collect();
    let mut digest = [0u8; 32];
    let mut ctx = HashContext::alloc(&session, HashAlg::Sha256, TempState::AssetBacked);
    ctx.finish(&message, &mut digest).unwrap();
    assert_eq!(digest.to_vec(), reference(HashAlg::Sha256, &message));
}
