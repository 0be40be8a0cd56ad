// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! X25519 key agreement.

mod common;

use sevault::compose;
use sevault::Asset;
use sevault::AsymFamily;
use sevault::Capability;
use sevault::KeyDescriptor;
use sevault::Lifetime;
use sevault::MacAlg;
use sevault::MacContext;
use sevault::Session;
use sevault::TempState;
use sevault::VaultError;
use sevault_sim::SimChannel;
use test_with_tracing::test;

// RFC 7748 section 6.1.
const ALICE_PRIVATE: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
const ALICE_PUBLIC: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";
const BOB_PUBLIC: &str = "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f";
const SHARED: &str = "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742";

fn desc() -> KeyDescriptor {
    KeyDescriptor::new(AsymFamily::X25519, 255)
}

fn load_private<'a>(session: &'a Session<SimChannel>, raw: &[u8]) -> Asset<'a, SimChannel> {
    let policy = compose(Capability::X25519Key, None, false, false, true).unwrap();
    let private = session
        .alloc_private_key(&desc(), policy, Lifetime::Infinite)
        .unwrap();
    private.load_plaintext(raw).unwrap();
    private
}

fn secret_dest(session: &Session<SimChannel>, len: usize) -> Asset<'_, SimChannel> {
    let policy = compose(Capability::PublicData, None, false, false, true).unwrap();
    session.allocate_asset(policy, len, Lifetime::Infinite).unwrap()
}

#[test]
fn known_scalar_yields_the_published_public_key() {
    let session = common::session();
    let domain = session.alloc_curve25519_domain(Lifetime::Infinite).unwrap();
    let private = load_private(&session, &hex::decode(ALICE_PRIVATE).unwrap());
    let public = session.x25519_public_key(&private, &domain).unwrap();
    assert_eq!(public.to_vec(), hex::decode(ALICE_PUBLIC).unwrap());
}

#[test]
fn saved_shared_secret_matches_the_published_value() {
    let session = common::session();
    let domain = session.alloc_curve25519_domain(Lifetime::Infinite).unwrap();
    let private = load_private(&session, &hex::decode(ALICE_PRIVATE).unwrap());
    let mut peer = [0u8; 32];
    peer.copy_from_slice(&hex::decode(BOB_PUBLIC).unwrap());

    // A public-data destination makes the raw secret observable.
    let dest = secret_dest(&session, 32);
    session
        .x25519_shared_secret(&private, &domain, &peer, &[], &[&dest], true)
        .unwrap();
    let mut out = [0u8; 32];
    let n = session.public_data_read(&dest, &mut out).unwrap();
    assert_eq!(out[..n].to_vec(), hex::decode(SHARED).unwrap());
}

#[test]
fn save_shared_demands_one_exact_destination() {
    let session = common::session();
    let domain = session.alloc_curve25519_domain(Lifetime::Infinite).unwrap();
    let private = load_private(&session, &hex::decode(ALICE_PRIVATE).unwrap());
    let mut peer = [0u8; 32];
    peer.copy_from_slice(&hex::decode(BOB_PUBLIC).unwrap());

    let short = secret_dest(&session, 16);
    let Err(VaultError::InvalidLength) =
        session.x25519_shared_secret(&private, &domain, &peer, &[], &[&short], true)
    else {
        panic!()
    };
    let a = secret_dest(&session, 32);
    let b = secret_dest(&session, 32);
    let Err(VaultError::InvalidLength) =
        session.x25519_shared_secret(&private, &domain, &peer, &[], &[&a, &b], true)
    else {
        panic!()
    };
    let Err(VaultError::BadArgument) =
        session.x25519_shared_secret(&private, &domain, &peer, &[], &[], false)
    else {
        panic!()
    };
}

#[test]
fn both_sides_derive_the_same_mac_key() {
    let session = common::session();
    let domain = session.alloc_curve25519_domain(Lifetime::Infinite).unwrap();
    let key_policy = compose(Capability::X25519Key, None, false, false, true).unwrap();
    let alice = session
        .alloc_private_key(&desc(), key_policy, Lifetime::Infinite)
        .unwrap();
    let alice_pub = session.x25519_generate_key_pair(&alice, &domain).unwrap();
    let bob = session
        .alloc_private_key(&desc(), key_policy, Lifetime::Infinite)
        .unwrap();
    let bob_pub = session.x25519_generate_key_pair(&bob, &domain).unwrap();

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
        .x25519_shared_secret(&alice, &domain, &bob_pub, b"session-v1", &[&key_a], false)
        .unwrap();
    session
        .x25519_shared_secret(&bob, &domain, &alice_pub, b"session-v1", &[&key_b], false)
        .unwrap();

    let msg = b"agreement check";
    let mut mac_a = [0u8; 32];
    let mut ctx = MacContext::alloc(&session, MacAlg::HmacSha256, TempState::Embedded);
    ctx.init_key_asset(&key_a).unwrap();
    ctx.generate(msg, &mut mac_a).unwrap();
    let mut mac_b = [0u8; 32];
    let mut ctx = MacContext::alloc(&session, MacAlg::HmacSha256, TempState::Embedded);
    ctx.init_key_asset(&key_b).unwrap();
    ctx.generate(msg, &mut mac_b).unwrap();
    assert_eq!(mac_a, mac_b);
}
