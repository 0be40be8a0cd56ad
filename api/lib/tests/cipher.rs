// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Block and stream cipher flows against the simulated engine.

mod common;

use openssl::symm::Cipher;
use openssl::symm::Crypter;
use openssl::symm::Mode;
use rand::RngCore;
use sevault::CipherAlg;
use sevault::CipherContext;
use sevault::CipherMode;
use sevault::VaultError;
use test_with_tracing::test;

fn reference(cipher: Cipher, key: &[u8], iv: &[u8], encrypt: bool, data: &[u8]) -> Vec<u8> {
    let mode = if encrypt { Mode::Encrypt } else { Mode::Decrypt };
    let mut crypter = Crypter::new(cipher, mode, key, Some(iv)).unwrap();
    crypter.pad(false);
    let mut out = vec![0u8; data.len() + cipher.block_size()];
    let mut n = crypter.update(data, &mut out).unwrap();
    n += crypter.finalize(&mut out[n..]).unwrap();
    out.truncate(n);
    out
}

#[test]
fn aes_cbc_matches_the_reference_both_ways() {
    let session = common::session();
    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];
    let mut plain = [0u8; 96];
    rand::thread_rng().fill_bytes(&mut key);
    rand::thread_rng().fill_bytes(&mut iv);
    rand::thread_rng().fill_bytes(&mut plain);
    let expect = reference(Cipher::aes_256_cbc(), &key, &iv, true, &plain);

    let mut enc = CipherContext::alloc(&session, CipherAlg::Aes, CipherMode::Cbc).unwrap();
    enc.set_encrypt();
    enc.init_key(&key).unwrap();
    enc.init_iv(&iv).unwrap();
    let mut cipher = [0u8; 96];
    let n = enc.finish(&plain, &mut cipher).unwrap();
    assert_eq!(&cipher[..n], expect.as_slice());

    let mut dec = CipherContext::alloc(&session, CipherAlg::Aes, CipherMode::Cbc).unwrap();
    dec.init_key(&key).unwrap();
    dec.init_iv(&iv).unwrap();
    let mut back = [0u8; 96];
    let n = dec.finish(&cipher, &mut back).unwrap();
    assert_eq!(&back[..n], plain.as_slice());
}

#[test]
fn chained_updates_equal_the_one_shot_computation() {
    let session = common::session();
    let key = [0x42; 16];
    let iv = [0x24; 16];
    let plain: Vec<u8> = (0..160u32).map(|i| (i * 5) as u8).collect();
    for mode in [CipherMode::Cbc, CipherMode::Ctr] {
        let mut one = CipherContext::alloc(&session, CipherAlg::Aes, mode).unwrap();
        one.set_encrypt();
        one.init_key(&key).unwrap();
        one.init_iv(&iv).unwrap();
        let mut expect = vec![0u8; plain.len()];
        one.finish(&plain, &mut expect).unwrap();

        // The chained IV rides back with each fragment.
        let mut ctx = CipherContext::alloc(&session, CipherAlg::Aes, mode).unwrap();
        ctx.set_encrypt();
        ctx.init_key(&key).unwrap();
        ctx.init_iv(&iv).unwrap();
        let mut out = vec![0u8; plain.len()];
        let n = ctx.update(&plain[..64], &mut out).unwrap();
        assert_eq!(n, 64);
        let n = ctx.update(&plain[64..128], &mut out[64..]).unwrap();
        assert_eq!(n, 64);
        ctx.finish(&plain[128..], &mut out[128..]).unwrap();
        assert_eq!(out, expect, "{mode:?}");
    }
}

#[test]
fn ecb_requires_whole_blocks_and_no_iv() {
    let session = common::session();
    let mut ctx = CipherContext::alloc(&session, CipherAlg::Aes, CipherMode::Ecb).unwrap();
    ctx.set_encrypt();
    ctx.init_key(&[0u8; 16]).unwrap();
    let Err(VaultError::InvalidMode) = ctx.init_iv(&[0u8; 16]) else {
        panic!()
    };
    let mut out = [0u8; 32];
    let Err(VaultError::InvalidLength) = ctx.finish(&[0u8; 17], &mut out) else {
        panic!()
    };
}

#[test]
fn xts_is_terminal_only() {
    let session = common::session();
    let mut ctx = CipherContext::alloc(&session, CipherAlg::Aes, CipherMode::Xts).unwrap();
    ctx.set_encrypt();
    ctx.init_key(&[0x55; 64]).unwrap();
    ctx.init_iv(&[0u8; 16]).unwrap();
    let mut out = [0u8; 32];
    let Err(VaultError::InvalidMode) = ctx.update(&[0u8; 32], &mut out) else {
        panic!()
    };
    // A data unit shorter than one block has no home in XTS.
    let Err(VaultError::InvalidLength) = ctx.finish(&[0u8; 15], &mut out) else {
        panic!()
    };
    ctx.finish(&[0x77; 32], &mut out).unwrap();
}

#[test]
fn xts_key_must_be_double_width() {
    let session = common::session();
    let mut ctx = CipherContext::alloc(&session, CipherAlg::Aes, CipherMode::Xts).unwrap();
    let Err(VaultError::InvalidKeySize) = ctx.init_key(&[0u8; 48]) else {
        panic!()
    };
}

#[test]
fn chacha20_matches_the_reference() {
    let session = common::session();
    let key = [0x1f; 32];
    let iv = [0x09; 16];
    let plain = b"ChaCha20 keystream test payload bytes";
    let expect = reference(Cipher::chacha20(), &key, &iv, true, plain);

    let mut ctx = CipherContext::alloc(&session, CipherAlg::ChaCha20, CipherMode::Stream).unwrap();
    ctx.set_encrypt();
    ctx.init_key(&key).unwrap();
    ctx.init_iv(&iv).unwrap();
    let mut out = vec![0u8; plain.len()];
    let n = ctx.finish(plain, &mut out).unwrap();
    assert_eq!(&out[..n], expect.as_slice());
}

#[test]
fn unsupported_mode_pairs_are_refused_at_allocation() {
    let session = common::session();
    let Err(VaultError::InvalidMode) =
        CipherContext::alloc(&session, CipherAlg::TripleDes, CipherMode::Xts)
    else {
        panic!()
    };
    let Err(VaultError::InvalidMode) =
        CipherContext::alloc(&session, CipherAlg::ChaCha20, CipherMode::Cbc)
    else {
        panic!()
    };
}

#[test]
fn short_output_reports_the_requirement() {
    let session = common::session();
    let mut ctx = CipherContext::alloc(&session, CipherAlg::Aes, CipherMode::Cbc).unwrap();
    ctx.set_encrypt();
    ctx.init_key(&[0u8; 16]).unwrap();
    ctx.init_iv(&[0u8; 16]).unwrap();
    let mut short = [0u8; 16];
    let Err(VaultError::BufferTooSmall { required: 32 }) = ctx.update(&[0u8; 32], &mut short)
    else {
        panic!()
    };
}
