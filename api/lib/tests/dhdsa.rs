// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Finite-field DH agreement and DSA signatures over one shared group.

mod common;

use openssl::dsa::Dsa;
use sevault::compose;
use sevault::Asset;
use sevault::AsymFamily;
use sevault::Capability;
use sevault::DlDomain;
use sevault::HashAlg;
use sevault::KeyDescriptor;
use sevault::Lifetime;
use sevault::Session;
use sevault::VaultError;
use sevault_sim::SimChannel;
use test_with_tracing::test;

/// A real discrete-log group from the backend generator; the bit sizes are
/// read off the parameters rather than assumed.
fn group() -> DlDomain {
    let dsa = Dsa::generate(1024).unwrap();
    DlDomain {
        prime_bits: dsa.p().num_bits() as usize,
        divisor_bits: dsa.q().num_bits() as usize,
        prime: dsa.p().to_vec(),
        divisor: dsa.q().to_vec(),
        generator: dsa.g().to_vec(),
    }
}

fn secret_dest(session: &Session<SimChannel>, len: usize) -> Asset<'_, SimChannel> {
    let policy = compose(Capability::PublicData, None, false, false, true).unwrap();
    session.allocate_asset(policy, len, Lifetime::Infinite).unwrap()
}

fn read_back(session: &Session<SimChannel>, dest: &Asset<'_, SimChannel>) -> Vec<u8> {
    let mut out = vec![0u8; dest.len()];
    let n = session.public_data_read(dest, &mut out).unwrap();
    out.truncate(n);
    out
}

#[test]
fn dh_agreement_is_symmetric() {
    let session = common::session();
    let group = group();
    let domain = group.alloc(&session, Lifetime::Infinite).unwrap();
    let desc = KeyDescriptor::new(AsymFamily::Dh, group.prime_bits)
        .with_divisor_bits(group.divisor_bits);
    let policy = compose(Capability::DhKey, None, false, false, true).unwrap();

    let alice = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let alice_pub = session.dh_generate_key_pair(&desc, &alice, &domain).unwrap();
    let bob = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let bob_pub = session.dh_generate_key_pair(&desc, &bob, &domain).unwrap();
    assert_eq!(alice_pub.len(), desc.secret_len());

    let dest_a = secret_dest(&session, desc.secret_len());
    let dest_b = secret_dest(&session, desc.secret_len());
    session
        .dh_shared_secret(&desc, &alice, &domain, &bob_pub, &[], &[&dest_a], true)
        .unwrap();
    session
        .dh_shared_secret(&desc, &bob, &domain, &alice_pub, &[], &[&dest_b], true)
        .unwrap();
    assert_eq!(read_back(&session, &dest_a), read_back(&session, &dest_b));
}

#[test]
fn dual_key_agreement_feeds_both_secrets() {
    let session = common::session();
    let group = group();
    let domain = group.alloc(&session, Lifetime::Infinite).unwrap();
    let desc = KeyDescriptor::new(AsymFamily::Dh, group.prime_bits)
        .with_divisor_bits(group.divisor_bits);
    let policy = compose(Capability::DhKey, None, false, false, true).unwrap();

    let a1 = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let a1_pub = session.dh_generate_key_pair(&desc, &a1, &domain).unwrap();
    let a2 = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let a2_pub = session.dh_generate_key_pair(&desc, &a2, &domain).unwrap();
    let b1 = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let b1_pub = session.dh_generate_key_pair(&desc, &b1, &domain).unwrap();
    let b2 = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let b2_pub = session.dh_generate_key_pair(&desc, &b2, &domain).unwrap();

    let dest_a = secret_dest(&session, 48);
    let dest_b = secret_dest(&session, 48);
    session
        .dh_dual_shared_secret(&desc, &a1, &a2, &domain, &b1_pub, &b2_pub, b"dual", &[&dest_a])
        .unwrap();
    session
        .dh_dual_shared_secret(&desc, &b1, &b2, &domain, &a1_pub, &a2_pub, b"dual", &[&dest_b])
        .unwrap();
    assert_eq!(read_back(&session, &dest_a), read_back(&session, &dest_b));
}

#[test]
fn dsa_sign_then_verify_round_trips() {
    let session = common::session();
    let group = group();
    let domain = group.alloc(&session, Lifetime::Infinite).unwrap();
    let desc = KeyDescriptor::new(AsymFamily::Dsa, group.prime_bits)
        .with_divisor_bits(group.divisor_bits)
        .with_hash(HashAlg::Sha1);
    let policy = compose(Capability::DsaSign, Some(HashAlg::Sha1), false, false, true).unwrap();

    let private = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let value = session.dsa_generate_key_pair(&desc, &private, &domain).unwrap();
    let public = session.alloc_public_key(&desc, policy, Lifetime::Infinite).unwrap();
    public
        .load_plaintext(&group.public_key_content(&value).unwrap())
        .unwrap();

    let msg = b"group-bound signature";
    let mut signature = session.dsa_sign(&desc, &private, &domain, msg).unwrap();
    assert_eq!(signature.len(), desc.signature_len());
    session
        .dsa_verify(&desc, &public, &domain, msg, &signature)
        .unwrap();

    signature[6] = signature[6].wrapping_add(0x1);
    let Err(VaultError::VerifyError) =
        session.dsa_verify(&desc, &public, &domain, msg, &signature)
    else {
        panic!()
    };
}

#[test]
fn dsa_hash_must_fit_the_subgroup() {
    let group = group();
    let desc = KeyDescriptor::new(AsymFamily::Dsa, group.prime_bits)
        .with_divisor_bits(group.divisor_bits)
        .with_hash(HashAlg::Sha256);
    let Err(VaultError::InvalidAlgorithm) = desc.validate() else {
        panic!()
    };
}

#[test]
fn key_checks_cover_the_discrete_log_families() {
    let session = common::session();
    let group = group();
    let domain = group.alloc(&session, Lifetime::Infinite).unwrap();
    let desc = KeyDescriptor::new(AsymFamily::Dh, group.prime_bits)
        .with_divisor_bits(group.divisor_bits);
    let policy = compose(Capability::DhKey, None, false, false, true).unwrap();
    let private = session.alloc_private_key(&desc, policy, Lifetime::Infinite).unwrap();
    let value = session.dh_generate_key_pair(&desc, &private, &domain).unwrap();
    let public = session.alloc_public_key(&desc, policy, Lifetime::Infinite).unwrap();
    public
        .load_plaintext(&group.public_key_content(&value).unwrap())
        .unwrap();

    session
        .dl_key_check(&desc, Some(&public), Some(&private), &domain)
        .unwrap();
    let Err(VaultError::BadArgument) = session.dl_key_check(&desc, None, None, &domain) else {
        panic!()
    };
}
