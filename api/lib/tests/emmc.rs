// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! RPMB authentication exchanges driven through the session handles.
//!
//! The tests play the storage device: the shared 256-bit key computes the
//! device-side frame MACs with plain OpenSSL HMAC.

mod common;

use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use sevault::compose;
use sevault::Asset;
use sevault::Capability;
use sevault::Lifetime;
use sevault::MacAlg;
use sevault::Session;
use sevault::VaultError;
use sevault_sim::SimChannel;
use test_with_tracing::test;

const KEY: [u8; 32] = [0x6e; 32];

fn auth_key(session: &Session<SimChannel>) -> Asset<'_, SimChannel> {
    let policy = compose(Capability::EmmcAuthKey, None, false, false, true).unwrap();
    let key = session.allocate_asset(policy, 32, Lifetime::Infinite).unwrap();
    key.load_plaintext(&KEY).unwrap();
    key
}

/// MAC the device would stamp on a frame, with the nonce appended when the
/// frame type echoes one.
fn device_mac(data: &[u8], nonce: Option<&[u8; 16]>) -> [u8; 32] {
    let key = PKey::hmac(&KEY).unwrap();
    let mut signer = Signer::new(MessageDigest::sha256(), &key).unwrap();
    signer.update(data).unwrap();
    if let Some(nonce) = nonce {
        signer.update(nonce).unwrap();
    }
    let mut out = [0u8; 32];
    signer.sign(&mut out).unwrap();
    out
}

#[test]
fn authenticated_reads_check_the_device_mac() {
    let session = common::session();
    let key = auth_key(&session);
    let mut read = session.emmc_read_request(&key).unwrap();
    let nonce = read.nonce();
    let frames = vec![0xd1u8; 512];
    read.verify(&frames, &device_mac(&frames, Some(&nonce))).unwrap();
    // The session is spent.
    let Err(VaultError::InvalidState) =
        read.verify(&frames, &device_mac(&frames, Some(&nonce)))
    else {
        panic!()
    };
}

#[test]
fn a_forged_read_frame_leaves_the_session_retryable() {
    let session = common::session();
    let key = auth_key(&session);
    let mut read = session.emmc_read_request(&key).unwrap();
    let nonce = read.nonce();
    let frames = vec![0xd1u8; 512];
    let mut mac = device_mac(&frames, Some(&nonce));
    mac[0] = mac[0].wrapping_add(0x1);
    let Err(VaultError::VerifyError) = read.verify(&frames, &mac) else {
        panic!()
    };
    mac[0] = mac[0].wrapping_add(0xff);
    read.verify(&frames, &mac).unwrap();
}

#[test]
fn writes_run_counter_then_frame_then_result() {
    let session = common::session();
    let key = auth_key(&session);
    let mut write = session.emmc_counter_request(&key).unwrap();
    let nonce = write.nonce();

    let counter_frame = vec![0x07u8; 64];
    write
        .counter_verify(&counter_frame, &device_mac(&counter_frame, Some(&nonce)))
        .unwrap();

    // The engine authors the host MAC for the outgoing write frame.
    let write_frame = vec![0xa5u8; 512];
    let mac = write.write_request(&write_frame).unwrap();
    assert_eq!(mac, device_mac(&write_frame, None));

    // The result frame carries no nonce.
    let result_frame = vec![0x00u8; 64];
    write
        .write_verify(&result_frame, &device_mac(&result_frame, None))
        .unwrap();
    let Err(VaultError::InvalidState) = write.write_request(&write_frame) else {
        panic!()
    };
}

#[test]
fn counter_verify_keeps_the_session_open() {
    let session = common::session();
    let key = auth_key(&session);
    let mut write = session.emmc_counter_request(&key).unwrap();
    let nonce = write.nonce();
    let counter_frame = vec![0x07u8; 64];
    write
        .counter_verify(&counter_frame, &device_mac(&counter_frame, Some(&nonce)))
        .unwrap();
    // A second counter exchange against the same session still verifies.
    write
        .counter_verify(&counter_frame, &device_mac(&counter_frame, Some(&nonce)))
        .unwrap();
}

#[test]
fn sessions_demand_a_proper_authentication_key() {
    let session = common::session();
    let policy = compose(Capability::Mac(MacAlg::HmacSha256), None, false, false, true).unwrap();
    let mac_key = session.allocate_asset(policy, 32, Lifetime::Infinite).unwrap();
    mac_key.load_plaintext(&KEY).unwrap();
    let Err(VaultError::BadArgument) = session.emmc_read_request(&mac_key) else {
        panic!()
    };

    let policy = compose(Capability::EmmcAuthKey, None, false, false, true).unwrap();
    let short = session.allocate_asset(policy, 16, Lifetime::Infinite).unwrap();
    short.load_plaintext(&[0x6e; 16]).unwrap();
    let Err(VaultError::InvalidKeySize) = session.emmc_counter_request(&short) else {
        panic!()
    };
}

#[test]
fn empty_frame_runs_never_leave_the_host() {
    let session = common::session();
    let key = auth_key(&session);
    let mut read = session.emmc_read_request(&key).unwrap();
    let Err(VaultError::InvalidLength) = read.verify(&[], &[0u8; 32]) else {
        panic!()
    };
    let write = session.emmc_counter_request(&key).unwrap();
    let Err(VaultError::InvalidLength) = write.write_request(&[]) else {
        panic!()
    };
}
