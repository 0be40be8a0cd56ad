// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! ECDH key agreement over NIST P-256.

mod common;

use sevault::compose;
use sevault::Asset;
use sevault::AsymFamily;
use sevault::Capability;
use sevault::EccDomain;
use sevault::EcPoint;
use sevault::HashAlg;
use sevault::KeyDescriptor;
use sevault::Lifetime;
use sevault::MacAlg;
use sevault::MacContext;
use sevault::Session;
use sevault::TempState;
use sevault::VaultError;
use sevault_sim::SimChannel;
use test_with_tracing::test;

fn p256_desc() -> KeyDescriptor {
    KeyDescriptor::new(AsymFamily::Ecdh, 256)
}

fn keygen<'a>(
    session: &'a Session<SimChannel>,
    domain: &Asset<'a, SimChannel>,
) -> (Asset<'a, SimChannel>, EcPoint) {
    let desc = p256_desc();
    let policy = compose(Capability::EcdhKey, None, false, false, true).unwrap();
    let private = session
        .alloc_private_key(&desc, policy, Lifetime::Infinite)
        .unwrap();
    let point = session
        .ecdsa_generate_key_pair(&desc, &private, domain)
        .unwrap();
    (private, point)
}

fn secret_dest(session: &Session<SimChannel>, len: usize) -> Asset<'_, SimChannel> {
    let policy = compose(Capability::PublicData, None, false, false, true).unwrap();
    session.allocate_asset(policy, len, Lifetime::Infinite).unwrap()
}

fn hmac(session: &Session<SimChannel>, key: &Asset<'_, SimChannel>, msg: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut ctx = MacContext::alloc(session, MacAlg::HmacSha256, TempState::Embedded);
    ctx.init_key_asset(key).unwrap();
    ctx.generate(msg, &mut out).unwrap();
    out
}

#[test]
fn both_sides_observe_the_same_raw_secret() {
    let session = common::session();
    let desc = p256_desc();
    let domain = EccDomain::nist_p256().alloc(&session, Lifetime::Infinite).unwrap();
    let (alice, alice_pub) = keygen(&session, &domain);
    let (bob, bob_pub) = keygen(&session, &domain);

    // Public-data destinations make the x coordinate observable.
    let dest_a = secret_dest(&session, 32);
    let dest_b = secret_dest(&session, 32);
    session
        .ecdh_shared_secret(&desc, &alice, &domain, &bob_pub, &[], &[&dest_a], true)
        .unwrap();
    session
        .ecdh_shared_secret(&desc, &bob, &domain, &alice_pub, &[], &[&dest_b], true)
        .unwrap();

    let mut raw_a = [0u8; 32];
    let n = session.public_data_read(&dest_a, &mut raw_a).unwrap();
    assert_eq!(n, 32);
    let mut raw_b = [0u8; 32];
    session.public_data_read(&dest_b, &mut raw_b).unwrap();
    assert_eq!(raw_a, raw_b);
    assert_ne!(raw_a, [0u8; 32]);
}

#[test]
fn derived_keys_agree_across_the_channel() {
    let session = common::session();
    let desc = p256_desc();
    let domain = EccDomain::nist_p256().alloc(&session, Lifetime::Infinite).unwrap();
    let (alice, alice_pub) = keygen(&session, &domain);
    let (bob, bob_pub) = keygen(&session, &domain);

    let mac_policy = compose(
        Capability::Mac(MacAlg::HmacSha256),
        None,
        false,
        false,
        true,
    )
    .unwrap();
    let key_a = session.allocate_asset(mac_policy, 32, Lifetime::Infinite).unwrap();
    let key_b = session.allocate_asset(mac_policy, 32, Lifetime::Infinite).unwrap();
    session
        .ecdh_shared_secret(&desc, &alice, &domain, &bob_pub, b"link-v2", &[&key_a], false)
        .unwrap();
    session
        .ecdh_shared_secret(&desc, &bob, &domain, &alice_pub, b"link-v2", &[&key_b], false)
        .unwrap();
    let msg = b"agreement check";
    assert_eq!(hmac(&session, &key_a, msg), hmac(&session, &key_b, msg));

    // A different info string lands somewhere else entirely.
    let key_c = session.allocate_asset(mac_policy, 32, Lifetime::Infinite).unwrap();
    session
        .ecdh_shared_secret(&desc, &alice, &domain, &bob_pub, b"link-v3", &[&key_c], false)
        .unwrap();
    assert_ne!(hmac(&session, &key_a, msg), hmac(&session, &key_c, msg));
}

#[test]
fn dual_agreement_is_symmetric() {
    let session = common::session();
    let desc = p256_desc();
    let domain = EccDomain::nist_p256().alloc(&session, Lifetime::Infinite).unwrap();
    let (alice_s, alice_s_pub) = keygen(&session, &domain);
    let (alice_e, alice_e_pub) = keygen(&session, &domain);
    let (bob_s, bob_s_pub) = keygen(&session, &domain);
    let (bob_e, bob_e_pub) = keygen(&session, &domain);

    let mac_policy = compose(
        Capability::Mac(MacAlg::HmacSha256),
        None,
        false,
        false,
        true,
    )
    .unwrap();
    let key_a = session.allocate_asset(mac_policy, 32, Lifetime::Infinite).unwrap();
    let key_b = session.allocate_asset(mac_policy, 32, Lifetime::Infinite).unwrap();
    session
        .ecdh_dual_shared_secret(
            &desc,
            &alice_s,
            &alice_e,
            &domain,
            &bob_s_pub,
            &bob_e_pub,
            b"dual",
            &[&key_a],
        )
        .unwrap();
    session
        .ecdh_dual_shared_secret(
            &desc,
            &bob_s,
            &bob_e,
            &domain,
            &alice_s_pub,
            &alice_e_pub,
            b"dual",
            &[&key_b],
        )
        .unwrap();
    let msg = b"dual agreement check";
    assert_eq!(hmac(&session, &key_a, msg), hmac(&session, &key_b, msg));
}

#[test]
fn derivation_arguments_are_checked_locally() {
    let session = common::session();
    let desc = p256_desc();
    let domain = EccDomain::nist_p256().alloc(&session, Lifetime::Infinite).unwrap();
    let (alice, _) = keygen(&session, &domain);
    let (_, bob_pub) = keygen(&session, &domain);

    let Err(VaultError::BadArgument) =
        session.ecdh_shared_secret(&desc, &alice, &domain, &bob_pub, &[], &[], false)
    else {
        panic!()
    };
    let short = secret_dest(&session, 16);
    let Err(VaultError::InvalidLength) =
        session.ecdh_shared_secret(&desc, &alice, &domain, &bob_pub, &[], &[&short], true)
    else {
        panic!()
    };
    let a = secret_dest(&session, 32);
    let b = secret_dest(&session, 32);
    let Err(VaultError::InvalidLength) =
        session.ecdh_shared_secret(&desc, &alice, &domain, &bob_pub, &[], &[&a, &b], true)
    else {
        panic!()
    };
    let info = vec![0u8; 225];
    let Err(VaultError::InvalidParameter) =
        session.ecdh_shared_secret(&desc, &alice, &domain, &bob_pub, &info, &[&a], false)
    else {
        panic!()
    };
    let signing = KeyDescriptor::new(AsymFamily::Ecdsa, 256);
    let Err(VaultError::BadArgument) =
        session.ecdh_shared_secret(&signing, &alice, &domain, &bob_pub, &[], &[&a], false)
    else {
        panic!()
    };
}

#[test]
fn agreement_demands_the_agreement_policy() {
    let session = common::session();
    let desc = p256_desc();
    let domain = EccDomain::nist_p256().alloc(&session, Lifetime::Infinite).unwrap();
    let (_, bob_pub) = keygen(&session, &domain);

    let signing = compose(Capability::EcdsaSign, Some(HashAlg::Sha256), false, false, true).unwrap();
    let private = session
        .alloc_private_key(&desc, signing, Lifetime::Infinite)
        .unwrap();
    session
        .ecdsa_generate_key_pair(&desc, &private, &domain)
        .unwrap();
    let dest = secret_dest(&session, 32);
    let Err(VaultError::BadArgument) =
        session.ecdh_shared_secret(&desc, &private, &domain, &bob_pub, &[], &[&dest], true)
    else {
        panic!()
    };
}
