// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Milenage authentication against the built-in subscriber set
//! (3GPP TS 35.208 test set 1 in catalog slot 10).

mod common;

use sevault::AutnOutcome;
use sevault::StaticAssetNumber;
use sevault::VaultError;
use sevault_sim::MILENAGE_TEST_SET_NUMBER;
use sevault_sim::PROVISIONING_KEK_NUMBER;
use test_with_tracing::test;

const K: &str = "465b5ce8b199b49faa5f0a2ee238a6bc";
const RAND: &str = "23553cde8f6bd6a977b4637a5f12cabe";
const OP: &str = "cdc202d5123e20f62b6d676ac72cb318";
const SQN: &str = "ff9bb4d0b607";
const AMF: &str = "b9b9";
const AUTN: &str = "55f328b43577b9b94a9ffac354dfafb3";

fn bytes<const N: usize>(hex: &str) -> [u8; N] {
    let v = hex::decode(hex).unwrap();
    let mut out = [0u8; N];
    out.copy_from_slice(&v);
    out
}

fn slot() -> StaticAssetNumber {
    StaticAssetNumber::new(MILENAGE_TEST_SET_NUMBER).unwrap()
}

#[test]
fn conformance_matches_the_published_test_set() {
    let session = common::session();
    let v = session
        .milenage_conformance(&bytes(RAND), &bytes(SQN), &bytes(AMF), bytes(K), bytes(OP))
        .unwrap();
    assert_eq!(v.opc, bytes::<16>("cd63cb71954a9f4e48a5994e37a02baf"));
    assert_eq!(v.mac_a, bytes::<8>("4a9ffac354dfafb3"));
    assert_eq!(v.mac_s, bytes::<8>("01cfaf9ec4e871e9"));
    assert_eq!(v.res, bytes::<8>("a54211d5e3ba50bf"));
    assert_eq!(v.ck, bytes::<16>("b40ba9a3c58b2a05bbf0d987b21bf8cb"));
    assert_eq!(v.ik, bytes::<16>("f769bcd751044604127672711c6d3441"));
    assert_eq!(v.ak, bytes::<6>("aa689c648370"));
    assert_eq!(v.ak_star, bytes::<6>("451e8beca43b"));
}

#[test]
fn static_verification_recovers_the_challenge_contents() {
    let session = common::session();
    let vector = session
        .milenage_autn_verify(slot(), &bytes(RAND), &bytes(AUTN))
        .unwrap();
    assert_eq!(vector.res, bytes::<8>("a54211d5e3ba50bf"));
    assert_eq!(vector.ck, bytes::<16>("b40ba9a3c58b2a05bbf0d987b21bf8cb"));
    assert_eq!(vector.ik, bytes::<16>("f769bcd751044604127672711c6d3441"));
    assert_eq!(vector.sqn, bytes::<6>(SQN));
    assert_eq!(vector.amf, bytes::<2>(AMF));

    let mut forged = bytes::<16>(AUTN);
    forged[15] = forged[15].wrapping_add(0x1);
    let Err(VaultError::VerifyError) =
        session.milenage_autn_verify(slot(), &bytes(RAND), &forged)
    else {
        panic!()
    };
}

#[test]
fn sequence_tracking_accepts_then_resynchronizes_then_resets() {
    let session = common::session();
    let admin = session.milenage_sqn_admin(slot(), false).unwrap();

    let outcome = admin.autn_verify(&bytes(RAND), &bytes(AUTN)).unwrap();
    let AutnOutcome::Accepted(vector) = outcome else {
        panic!("fresh challenge should be accepted");
    };
    assert_eq!(vector.sqn, bytes::<6>(SQN));

    // Replaying the same challenge is stale, answered with a token over the
    // tracked sequence, not reported as a fault.
    let outcome = admin.autn_verify(&bytes(RAND), &bytes(AUTN)).unwrap();
    let AutnOutcome::Resync { cause, auts } = outcome else {
        panic!("a replay should resynchronize");
    };
    assert_eq!(cause, 21);
    assert_eq!(auts[..6], bytes::<6>("ba853f3c123c"));

    admin.reset().unwrap();
    let outcome = admin.autn_verify(&bytes(RAND), &bytes(AUTN)).unwrap();
    assert!(matches!(outcome, AutnOutcome::Accepted(_)));
    admin.free().unwrap();
}

#[test]
fn a_forged_challenge_is_still_a_fault_under_tracking() {
    let session = common::session();
    let admin = session.milenage_sqn_admin(slot(), false).unwrap();
    let mut forged = bytes::<16>(AUTN);
    forged[8] = forged[8].wrapping_add(0x1);
    let Err(VaultError::VerifyError) = admin.autn_verify(&bytes(RAND), &forged) else {
        panic!()
    };
}

#[test]
fn auts_generation_matches_the_published_test_set() {
    let session = common::session();
    let auts = session
        .milenage_auts_generate(slot(), &bytes(RAND), &bytes(SQN), &bytes(AMF))
        .unwrap();
    assert_eq!(auts[..6], bytes::<6>("ba853f3c123c"));
    assert_eq!(auts[6..], bytes::<8>("01cfaf9ec4e871e9"));
}

#[test]
fn tracker_state_exports_as_a_key_blob() {
    let session = common::session();
    let admin = session.milenage_sqn_admin(slot(), false).unwrap();
    let kek = session
        .search_asset(StaticAssetNumber::new(PROVISIONING_KEK_NUMBER).unwrap())
        .unwrap();
    let blob = admin.export(&kek, b"sqn tracker backup").unwrap();
    // An 8-byte tracker wraps to 24 bytes.
    assert_eq!(blob.len(), 24);
}

#[test]
fn trackers_need_a_provisioned_subscriber_set() {
    let session = common::session();
    let empty = StaticAssetNumber::new(35).unwrap();
    let Err(VaultError::BadArgument) = session.milenage_sqn_admin(empty, false) else {
        panic!()
    };
}
