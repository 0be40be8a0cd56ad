// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! ECDSA key generation, signing and verification over NIST P-256.

mod common;

use sevault::compose;
use sevault::Asset;
use sevault::AsymFamily;
use sevault::Capability;
use sevault::EccDomain;
use sevault::HashAlg;
use sevault::HashContext;
use sevault::KeyDescriptor;
use sevault::Lifetime;
use sevault::Session;
use sevault::StaticAssetNumber;
use sevault::TempState;
use sevault::VaultError;
use sevault_sim::SimChannel;
use sevault_sim::PROVISIONING_KEK_NUMBER;
use test_with_tracing::test;

fn p256_desc() -> KeyDescriptor {
    KeyDescriptor::new(AsymFamily::Ecdsa, 256).with_hash(HashAlg::Sha256)
}

struct Keys<'a> {
    desc: KeyDescriptor,
    domain: Asset<'a, SimChannel>,
    private: Asset<'a, SimChannel>,
    public: Asset<'a, SimChannel>,
}

fn keygen(session: &Session<SimChannel>) -> Keys<'_> {
    let desc = p256_desc();
    let domain = EccDomain::nist_p256().alloc(session, Lifetime::Infinite).unwrap();
    let policy = compose(Capability::EcdsaSign, Some(HashAlg::Sha256), false, false, true).unwrap();
    let private = session
        .alloc_private_key(&desc, policy, Lifetime::Infinite)
        .unwrap();
    let point = session
        .ecdsa_generate_key_pair(&desc, &private, &domain)
        .unwrap();
    let public = session
        .alloc_public_key(&desc, policy, Lifetime::Infinite)
        .unwrap();
    public.load_plaintext(&point.key_content(256).unwrap()).unwrap();
    Keys {
        desc,
        domain,
        private,
        public,
    }
}

#[test]
fn sign_then_verify_round_trips() {
    let session = common::session();
    let keys = keygen(&session);
    let msg = b"payload under signature";
    let signature = session
        .ecdsa_sign(&keys.desc, &keys.private, &keys.domain, msg)
        .unwrap();
    assert_eq!(signature.len(), keys.desc.signature_len());
    session
        .ecdsa_verify(&keys.desc, &keys.public, &keys.domain, msg, &signature)
        .unwrap();
}

#[test]
fn tampering_breaks_verification() {
    let session = common::session();
    let keys = keygen(&session);
    let msg = b"payload under signature";
    let mut signature = session
        .ecdsa_sign(&keys.desc, &keys.private, &keys.domain, msg)
        .unwrap();
    signature[10] = signature[10].wrapping_add(0x1);
    let Err(VaultError::VerifyError) =
        session.ecdsa_verify(&keys.desc, &keys.public, &keys.domain, msg, &signature)
    else {
        panic!()
    };
    signature[10] = signature[10].wrapping_add(0xff);
    let Err(VaultError::VerifyError) = session.ecdsa_verify(
        &keys.desc,
        &keys.public,
        &keys.domain,
        b"payload under signaturE",
        &signature,
    ) else {
        panic!()
    };
}

#[test]
fn message_fragmentation_is_invisible() {
    let session = common::session();
    let keys = keygen(&session);
    for len in [4095usize, 4096, 4 * 4096 + 1] {
        let msg: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        let signature = session
            .ecdsa_sign(&keys.desc, &keys.private, &keys.domain, &msg)
            .unwrap();
        session
            .ecdsa_verify(&keys.desc, &keys.public, &keys.domain, &msg, &signature)
            .unwrap();
    }
}

#[test]
fn streamed_digest_state_signs_the_whole_message() {
    let session = common::session();
    let keys = keygen(&session);
    let msg: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

    let mut ctx = HashContext::alloc(&session, HashAlg::Sha256, TempState::AssetBacked);
    ctx.update(&msg[..640]).unwrap();
    let signature = session
        .ecdsa_sign_stream(&keys.desc, &keys.private, &keys.domain, ctx, &msg[640..])
        .unwrap();
    session
        .ecdsa_verify(&keys.desc, &keys.public, &keys.domain, &msg, &signature)
        .unwrap();
}

#[test]
fn recomputed_public_key_matches_the_generated_one() {
    let session = common::session();
    let keys = keygen(&session);
    let point = session
        .ecdsa_public_key(&keys.desc, &keys.private, &keys.domain)
        .unwrap();
    let content = point.key_content(256).unwrap();
    let policy = compose(Capability::EcdsaSign, Some(HashAlg::Sha256), false, false, true).unwrap();
    let fresh = session
        .alloc_public_key(&keys.desc, policy, Lifetime::Infinite)
        .unwrap();
    fresh.load_plaintext(&content).unwrap();
    let msg = b"same point, either handle";
    let signature = session
        .ecdsa_sign(&keys.desc, &keys.private, &keys.domain, msg)
        .unwrap();
    session
        .ecdsa_verify(&keys.desc, &fresh, &keys.domain, msg, &signature)
        .unwrap();
}

#[test]
fn key_checks_accept_good_material_and_demand_some() {
    let session = common::session();
    let keys = keygen(&session);
    session
        .ecc_key_check(
            &keys.desc,
            Some(&keys.public),
            Some(&keys.private),
            &keys.domain,
        )
        .unwrap();
    let Err(VaultError::BadArgument) =
        session.ecc_key_check(&keys.desc, None, None, &keys.domain)
    else {
        panic!()
    };
}

#[test]
fn descriptor_bounds_are_enforced_before_any_exchange() {
    let session = common::session();
    let domain = EccDomain::nist_p256().alloc(&session, Lifetime::Infinite).unwrap();
    let desc = KeyDescriptor::new(AsymFamily::Ecdsa, 191).with_hash(HashAlg::Sha256);
    let policy = compose(Capability::EcdsaSign, Some(HashAlg::Sha256), false, false, true).unwrap();
    let Err(VaultError::BadArgument) = session.alloc_private_key(&desc, policy, Lifetime::Infinite)
    else {
        panic!()
    };
    let good = p256_desc();
    let private = session
        .alloc_private_key(&good, policy, Lifetime::Infinite)
        .unwrap();
    let Err(VaultError::BadArgument) = session.ecdsa_sign(&desc, &private, &domain, b"m") else {
        panic!()
    };
}

#[test]
fn exported_key_pairs_restore_from_the_blob() {
    let session = common::session();
    let desc = p256_desc();
    let domain = EccDomain::nist_p256().alloc(&session, Lifetime::Infinite).unwrap();
    let kek = session
        .search_asset(StaticAssetNumber::new(PROVISIONING_KEK_NUMBER).unwrap())
        .unwrap();
    let exportable =
        compose(Capability::EcdsaSign, Some(HashAlg::Sha256), false, true, true).unwrap();
    let private = session
        .alloc_private_key(&desc, exportable, Lifetime::Infinite)
        .unwrap();
    let (point, blob) = session
        .ecdsa_generate_key_pair_export(&desc, &private, &domain, &kek, b"escrow")
        .unwrap();
    assert_eq!(blob.len(), desc.private_len() + 16);

    let restored = session
        .alloc_private_key(&desc, exportable, Lifetime::Infinite)
        .unwrap();
    restored.load_import(&kek, b"escrow", &blob).unwrap();
    let public = session
        .alloc_public_key(&desc, exportable, Lifetime::Infinite)
        .unwrap();
    public.load_plaintext(&point.key_content(256).unwrap()).unwrap();
    let msg = b"the escrowed scalar still signs";
    let signature = session.ecdsa_sign(&desc, &restored, &domain, msg).unwrap();
    session
        .ecdsa_verify(&desc, &public, &domain, msg, &signature)
        .unwrap();

    // Without the export bit the engine refuses to wrap the scalar.
    let sealed = compose(Capability::EcdsaSign, Some(HashAlg::Sha256), false, false, true).unwrap();
    let private = session
        .alloc_private_key(&desc, sealed, Lifetime::Infinite)
        .unwrap();
    let Err(VaultError::BadArgument) =
        session.ecdsa_generate_key_pair_export(&desc, &private, &domain, &kek, b"escrow")
    else {
        panic!()
    };
}
