// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Elliptic-curve services over caller-supplied Weierstrass domains.

use openssl::bn::BigNum;
use openssl::bn::BigNumContext;
use openssl::ec::EcGroup;
use openssl::ec::EcGroupRef;
use openssl::ec::EcKey;
use openssl::ec::EcPoint;
use openssl::ec::EcPointRef;
use openssl::ecdsa::EcdsaSig;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::AssetId;
use sevault_token::GenKeyMethod;
use sevault_token::HashAlg;
use sevault_token::PkEncryptCmd;
use sevault_token::PkEncryptMethod;
use sevault_token::PkGenKeyCmd;
use sevault_token::PkGenKeyRes;
use sevault_token::PkKeyCheckCmd;
use sevault_token::PkSharedSecretCmd;
use sevault_token::PkSignVerifyCmd;
use sevault_token::PkSignVerifyRes;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::SharedSecretMethod;

use crate::asym::export_blob;
use crate::asym::kdf_fill;
use crate::asym::rand_scalar;
use crate::asym::scalar_from_vector;
use crate::asym::scalar_to_vector;
use crate::asym::take_digest;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

pub(crate) struct Curve {
    pub group: EcGroup,
    pub order: BigNum,
    pub bits: usize,
}

/// Builds the OpenSSL group from a domain-parameters asset.
pub(crate) fn load_curve(
    state: &mut EngineState,
    provenance: Provenance,
    domain: AssetId,
    modulus_bits: usize,
) -> SimResult<Curve> {
    let content = state
        .vault
        .key_content(domain, PolicyMask::PUBLIC_KEY_PARAM, provenance)?;
    let mut r = Reader::new(&content);
    let d = wire::get_ecc_domain(&mut r)?;
    if d.bits != modulus_bits {
        tracing::debug!(domain = d.bits, cmd = modulus_bits, "curve size mismatch");
        return Err(SimError::InvalidParameter);
    }
    let mut ctx = BigNumContext::new()?;
    let p = BigNum::from_slice(&d.modulus)?;
    let a = BigNum::from_slice(&d.a)?;
    let b = BigNum::from_slice(&d.b)?;
    let mut group = EcGroup::from_components(p, a, b, &mut ctx)?;
    let mut generator = EcPoint::new(&group)?;
    let gx = BigNum::from_slice(&d.base_x)?;
    let gy = BigNum::from_slice(&d.base_y)?;
    generator.set_affine_coordinates_gfp(&group, &gx, &gy, &mut ctx)?;
    let order = BigNum::from_slice(&d.order)?;
    let cofactor = BigNum::from_u32(u32::from(d.cofactor.max(1)))?;
    group.set_generator(generator, order, cofactor)?;
    let order = BigNum::from_slice(&d.order)?;
    Ok(Curve {
        group,
        order,
        bits: d.bits,
    })
}

fn point_coords(
    group: &EcGroupRef,
    point: &EcPointRef,
    ctx: &mut BigNumContext,
) -> SimResult<(BigNum, BigNum)> {
    let mut x = BigNum::new()?;
    let mut y = BigNum::new()?;
    point.affine_coordinates_gfp(group, &mut x, &mut y, ctx)?;
    Ok((x, y))
}

fn point_wire(
    bits: usize,
    group: &EcGroupRef,
    point: &EcPointRef,
    ctx: &mut BigNumContext,
) -> SimResult<Vec<u8>> {
    let (x, y) = point_coords(group, point, ctx)?;
    let mut buf = vec![0u8; 2 * wire::vector_len(bits)];
    let mut w = Writer::new(&mut buf);
    wire::put_point(&mut w, bits, &x.to_vec(), &y.to_vec())?;
    Ok(buf)
}

fn point_from_xy(
    curve: &Curve,
    x: &[u8],
    y: &[u8],
    ctx: &mut BigNumContext,
) -> SimResult<EcPoint> {
    let x = BigNum::from_slice(x)?;
    let y = BigNum::from_slice(y)?;
    let mut point = EcPoint::new(&curve.group)?;
    point
        .set_affine_coordinates_gfp(&curve.group, &x, &y, ctx)
        .map_err(|_| SimError::InvalidParameter)?;
    if !point.is_on_curve(&curve.group, ctx)? {
        return Err(SimError::InvalidParameter);
    }
    Ok(point)
}

fn point_from_wire(curve: &Curve, data: &[u8], ctx: &mut BigNumContext) -> SimResult<EcPoint> {
    let mut r = Reader::new(data);
    let (x, y) = wire::get_point(&mut r)?;
    point_from_xy(curve, &x, &y, ctx)
}

pub(crate) fn ecdsa_sign_verify(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
    hash: HashAlg,
) -> SimResult<ServiceRes> {
    let domain = cmd.domain.ok_or(SimError::InvalidParameter)?;
    let curve = load_curve(state, provenance, domain, cmd.modulus_bits)?;
    let digest = take_digest(state, hash, &cmd.state, &cmd.data, cmd.total_len)?;
    let mut ctx = BigNumContext::new()?;
    match &cmd.signature {
        None => {
            let need = PolicyMask::PK_ECDSA_SIGN | hash.policy_bit();
            let content = state.vault.key_content(cmd.key, need, provenance)?;
            let scalar = scalar_from_vector(&content, curve.bits)?;
            let mut public = EcPoint::new(&curve.group)?;
            public.mul_generator(&curve.group, &scalar, &ctx)?;
            let key = EcKey::from_private_components(&curve.group, &scalar, &public)?;
            let sig = EcdsaSig::sign(&digest, &key)?;
            let mut buf = vec![0u8; 2 * wire::vector_len(curve.bits)];
            let mut w = Writer::new(&mut buf);
            wire::put_signature(&mut w, curve.bits, &sig.r().to_vec(), &sig.s().to_vec())?;
            Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
                signature: buf,
                state: None,
            }))
        }
        Some(signature) => {
            let need = PolicyMask::PK_ECDSA_SIGN | PolicyMask::PUBLIC_KEY | hash.policy_bit();
            let content = state.vault.key_content(cmd.key, need, provenance)?;
            let public = point_from_wire(&curve, &content, &mut ctx)?;
            let key = EcKey::from_public_key(&curve.group, &public)?;
            let mut r = Reader::new(signature);
            let (sig_r, sig_s) = wire::get_signature(&mut r)?;
            let sig =
                EcdsaSig::from_private_components(BigNum::from_slice(&sig_r)?, BigNum::from_slice(&sig_s)?)?;
            if !sig.verify(&digest, &key)? {
                tracing::debug!(bits = curve.bits, "ECDSA verification failed");
                return Err(SimError::VerifyError);
            }
            Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
                signature: Vec::new(),
                state: None,
            }))
        }
    }
}

pub(crate) fn gen_key(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkGenKeyCmd,
) -> SimResult<ServiceRes> {
    let curve = load_curve(state, provenance, cmd.domain, cmd.modulus_bits)?;
    let mut ctx = BigNumContext::new()?;
    match cmd.method {
        GenKeyMethod::EcdsaPair => {
            let key = EcKey::generate(&curve.group)?;
            let content = scalar_to_vector(curve.bits, key.private_key())?;
            let blob = export_blob(state, provenance, cmd.private, &cmd.export, &content)?;
            state.vault.fill(cmd.private, content)?;
            let public = if cmd.want_public {
                Some(point_wire(curve.bits, &curve.group, key.public_key(), &mut ctx)?)
            } else {
                None
            };
            Ok(ServiceRes::PkGenKey(PkGenKeyRes { public, blob }))
        }
        GenKeyMethod::EcdsaPublic => {
            if cmd.export.is_some() {
                return Err(SimError::InvalidParameter);
            }
            let content = state
                .vault
                .key_content(cmd.private, PolicyMask::NONE, provenance)?;
            let scalar = scalar_from_vector(&content, curve.bits)?;
            let mut public = EcPoint::new(&curve.group)?;
            public.mul_generator(&curve.group, &scalar, &ctx)?;
            let public = if cmd.want_public {
                Some(point_wire(curve.bits, &curve.group, &public, &mut ctx)?)
            } else {
                None
            };
            Ok(ServiceRes::PkGenKey(PkGenKeyRes { public, blob: None }))
        }
        _ => Err(SimError::InvalidParameter),
    }
}

fn agree(
    state: &mut EngineState,
    provenance: Provenance,
    curve: &Curve,
    private: AssetId,
    peer: &[u8],
    ctx: &mut BigNumContext,
) -> SimResult<Vec<u8>> {
    let content = state
        .vault
        .key_content(private, PolicyMask::PK_ECDH_KEY, provenance)?;
    let scalar = scalar_from_vector(&content, curve.bits)?;
    let peer = point_from_wire(curve, peer, ctx)?;
    let mut shared = EcPoint::new(&curve.group)?;
    shared.mul(&curve.group, &peer, &scalar, ctx)?;
    let (x, _) = point_coords(&curve.group, &shared, ctx)?;
    Ok(x.to_vec_padded(wire::byte_len(curve.bits) as i32)?)
}

pub(crate) fn shared_secret(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSharedSecretCmd,
) -> SimResult<ServiceRes> {
    let curve = load_curve(state, provenance, cmd.domain, cmd.modulus_bits)?;
    let mut ctx = BigNumContext::new()?;
    let mut secret = agree(state, provenance, &curve, cmd.private, &cmd.peer, &mut ctx)?;
    match cmd.method {
        SharedSecretMethod::Ecdh => {
            if cmd.private2.is_some() || cmd.peer2.is_some() {
                return Err(SimError::InvalidParameter);
            }
        }
        SharedSecretMethod::EcdhDual => {
            let private2 = cmd.private2.ok_or(SimError::InvalidParameter)?;
            let peer2 = cmd.peer2.as_ref().ok_or(SimError::InvalidParameter)?;
            secret.extend(agree(state, provenance, &curve, private2, peer2, &mut ctx)?);
        }
        _ => return Err(SimError::InvalidParameter),
    }
    kdf_fill(
        state,
        provenance,
        &secret,
        &cmd.other_info,
        &cmd.dest,
        cmd.save_shared,
    )?;
    Ok(ServiceRes::None)
}

pub(crate) fn elgamal_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkEncryptCmd,
) -> SimResult<ServiceRes> {
    let curve = load_curve(state, provenance, cmd.domain, cmd.modulus_bits)?;
    let mut ctx = BigNumContext::new()?;
    match cmd.method {
        PkEncryptMethod::EccElGamalEncrypt => {
            let need = PolicyMask::PK_ECC_ELGAMAL | PolicyMask::PUBLIC_KEY;
            let content = state.vault.key_content(cmd.key, need, provenance)?;
            let public = point_from_wire(&curve, &content, &mut ctx)?;
            let message = point_from_wire(&curve, &cmd.data, &mut ctx)?;
            let k = rand_scalar(&curve.order)?;
            let mut c1 = EcPoint::new(&curve.group)?;
            c1.mul_generator(&curve.group, &k, &ctx)?;
            let mut mask = EcPoint::new(&curve.group)?;
            mask.mul(&curve.group, &public, &k, &ctx)?;
            let mut c2 = EcPoint::new(&curve.group)?;
            c2.add(&curve.group, &message, &mask, &mut ctx)?;
            let (x1, y1) = point_coords(&curve.group, &c1, &mut ctx)?;
            let (x2, y2) = point_coords(&curve.group, &c2, &mut ctx)?;
            let mut buf = vec![0u8; 4 * wire::vector_len(curve.bits)];
            let mut w = Writer::new(&mut buf);
            wire::put_point_pair(
                &mut w,
                curve.bits,
                (&x1.to_vec(), &y1.to_vec()),
                (&x2.to_vec(), &y2.to_vec()),
            )?;
            Ok(ServiceRes::PkEncrypt { data: buf })
        }
        PkEncryptMethod::EccElGamalDecrypt => {
            let content = state
                .vault
                .key_content(cmd.key, PolicyMask::PK_ECC_ELGAMAL, provenance)?;
            let scalar = scalar_from_vector(&content, curve.bits)?;
            let mut r = Reader::new(&cmd.data);
            let ((x1, y1), (x2, y2)) = wire::get_point_pair(&mut r)?;
            let c1 = point_from_xy(&curve, &x1, &y1, &mut ctx)?;
            let c2 = point_from_xy(&curve, &x2, &y2, &mut ctx)?;
            let mut mask = EcPoint::new(&curve.group)?;
            mask.mul(&curve.group, &c1, &scalar, &ctx)?;
            mask.invert(&curve.group, &ctx)?;
            let mut message = EcPoint::new(&curve.group)?;
            message.add(&curve.group, &c2, &mask, &mut ctx)?;
            let data = point_wire(curve.bits, &curve.group, &message, &mut ctx)?;
            Ok(ServiceRes::PkEncrypt { data })
        }
    }
}

pub(crate) fn key_check(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkKeyCheckCmd,
) -> SimResult<ServiceRes> {
    let curve = load_curve(state, provenance, cmd.domain, cmd.modulus_bits)?;
    let mut ctx = BigNumContext::new()?;
    let public = match cmd.public {
        Some(id) => {
            let content = state.vault.key_content(id, PolicyMask::NONE, provenance)?;
            let point =
                point_from_wire(&curve, &content, &mut ctx).map_err(|_| SimError::VerifyError)?;
            let key = EcKey::from_public_key(&curve.group, &point)?;
            key.check_key().map_err(|_| SimError::VerifyError)?;
            Some(point)
        }
        None => None,
    };
    let private = match cmd.private {
        Some(id) => {
            let content = state.vault.key_content(id, PolicyMask::NONE, provenance)?;
            let scalar = scalar_from_vector(&content, curve.bits)?;
            if scalar.num_bits() == 0 || scalar.ucmp(&curve.order) != std::cmp::Ordering::Less {
                return Err(SimError::VerifyError);
            }
            Some(scalar)
        }
        None => None,
    };
    match (public, private) {
        (None, None) => Err(SimError::InvalidParameter),
        (Some(public), Some(private)) => {
            let mut expect = EcPoint::new(&curve.group)?;
            expect.mul_generator(&curve.group, &private, &ctx)?;
            if !expect.eq(&curve.group, &public, &mut ctx)? {
                return Err(SimError::VerifyError);
            }
            Ok(ServiceRes::None)
        }
        _ => Ok(ServiceRes::None),
    }
}

#[cfg(test)]
mod tests {
    use sevault_token::Lifetime;
    use test_with_tracing::test;

    use super::*;

    fn p256_domain(state: &mut EngineState) -> AssetId {
        let d = wire::EccDomainParams {
            bits: 256,
            modulus: hex::decode(
                "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
            )
            .unwrap(),
            a: hex::decode("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc")
                .unwrap(),
            b: hex::decode("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b")
                .unwrap(),
            order: hex::decode(
                "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551",
            )
            .unwrap(),
            base_x: hex::decode(
                "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
            )
            .unwrap(),
            base_y: hex::decode(
                "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5",
            )
            .unwrap(),
            cofactor: 1,
        };
        let mut buf = vec![0u8; wire::ecc_domain_len(256)];
        let mut w = Writer::new(&mut buf);
        wire::put_ecc_domain(&mut w, &d).unwrap();
        let id = state
            .vault
            .create_caller(
                PolicyMask::PUBLIC_KEY_PARAM | PolicyMask::SOURCE_NON_SECURE,
                buf.len(),
                Lifetime::Infinite,
                Provenance::NonSecure,
            )
            .unwrap();
        state.vault.fill(id, buf).unwrap();
        id
    }

    fn empty_asset(state: &mut EngineState, policy: PolicyMask, length: usize) -> AssetId {
        state
            .vault
            .create_caller(
                policy | PolicyMask::SOURCE_NON_SECURE,
                length,
                Lifetime::Infinite,
                Provenance::NonSecure,
            )
            .unwrap()
    }

    fn loaded_asset(state: &mut EngineState, policy: PolicyMask, content: Vec<u8>) -> AssetId {
        let id = empty_asset(state, policy, content.len());
        state.vault.fill(id, content).unwrap();
        id
    }

    fn generate(
        state: &mut EngineState,
        domain: AssetId,
        policy: PolicyMask,
    ) -> (AssetId, Vec<u8>) {
        let private = empty_asset(state, policy, wire::vector_len(256));
        let res = gen_key(
            state,
            Provenance::NonSecure,
            &PkGenKeyCmd {
                method: GenKeyMethod::EcdsaPair,
                modulus_bits: 256,
                divisor_bits: 0,
                private,
                domain,
                export: None,
                want_public: true,
            },
        )
        .unwrap();
        let ServiceRes::PkGenKey(PkGenKeyRes { public: Some(public), .. }) = res else {
            panic!("expected a public key");
        };
        (private, public)
    }

    #[test]
    fn ecdsa_sign_verify_round_trip() {
        let mut state = EngineState::boot();
        let domain = p256_domain(&mut state);
        let (private, public) = generate(
            &mut state,
            domain,
            PolicyMask::PK_ECDSA_SIGN | PolicyMask::SHA256,
        );
        let public = loaded_asset(
            &mut state,
            PolicyMask::PK_ECDSA_SIGN | PolicyMask::PUBLIC_KEY | PolicyMask::SHA256,
            public,
        );

        let sign = PkSignVerifyCmd {
            method: sevault_token::SignVerifyMethod::Ecdsa {
                hash: HashAlg::Sha256,
            },
            modulus_bits: 256,
            key: private,
            domain: Some(domain),
            state: None,
            data: b"signed by the engine".to_vec(),
            total_len: 20,
            signature: None,
        };
        let res = ecdsa_sign_verify(&mut state, Provenance::NonSecure, &sign, HashAlg::Sha256)
            .unwrap();
        let ServiceRes::PkSignVerify(PkSignVerifyRes { signature, .. }) = res else {
            panic!("expected a signature");
        };
        assert_eq!(signature.len(), 2 * wire::vector_len(256));

        let mut verify = sign.clone();
        verify.key = public;
        verify.signature = Some(signature.clone());
        assert!(
            ecdsa_sign_verify(&mut state, Provenance::NonSecure, &verify, HashAlg::Sha256).is_ok()
        );

        let mut bad = signature;
        bad[5] = bad[5].wrapping_add(0x1);
        verify.signature = Some(bad);
        assert_eq!(
            ecdsa_sign_verify(&mut state, Provenance::NonSecure, &verify, HashAlg::Sha256),
            Err(SimError::VerifyError)
        );
    }

    #[test]
    fn ecdh_both_parties_agree() {
        let mut state = EngineState::boot();
        let domain = p256_domain(&mut state);
        let (priv_a, pub_a) = generate(&mut state, domain, PolicyMask::PK_ECDH_KEY);
        let (priv_b, pub_b) = generate(&mut state, domain, PolicyMask::PK_ECDH_KEY);

        let derive = |state: &mut EngineState, private: AssetId, peer: Vec<u8>| -> Vec<u8> {
            let dest = empty_asset(state, PolicyMask::PUBLIC_DATA, 32);
            shared_secret(
                state,
                Provenance::NonSecure,
                &PkSharedSecretCmd {
                    method: SharedSecretMethod::Ecdh,
                    modulus_bits: 256,
                    private,
                    domain,
                    peer,
                    private2: None,
                    peer2: None,
                    other_info: b"kdf context".to_vec(),
                    dest: vec![dest],
                    save_shared: false,
                },
            )
            .unwrap();
            state
                .vault
                .key_content(dest, PolicyMask::PUBLIC_DATA, Provenance::NonSecure)
                .unwrap()
        };
        let a = derive(&mut state, priv_a, pub_b);
        let b = derive(&mut state, priv_b, pub_a);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn elgamal_round_trip() {
        let mut state = EngineState::boot();
        let domain = p256_domain(&mut state);
        let elgamal = PolicyMask::PK_ECC_ELGAMAL;
        let (private, public) = generate(&mut state, domain, elgamal);
        let public = loaded_asset(&mut state, elgamal | PolicyMask::PUBLIC_KEY, public);
        // Any curve point works as a message; borrow one from a second pair.
        let (_, message) = generate(&mut state, domain, elgamal);

        let res = elgamal_service(
            &mut state,
            Provenance::NonSecure,
            &PkEncryptCmd {
                method: PkEncryptMethod::EccElGamalEncrypt,
                modulus_bits: 256,
                key: public,
                domain,
                data: message.clone(),
            },
        )
        .unwrap();
        let ServiceRes::PkEncrypt { data: sealed } = res else {
            panic!("expected ciphertext points");
        };
        assert_eq!(sealed.len(), 4 * wire::vector_len(256));

        let res = elgamal_service(
            &mut state,
            Provenance::NonSecure,
            &PkEncryptCmd {
                method: PkEncryptMethod::EccElGamalDecrypt,
                modulus_bits: 256,
                key: private,
                domain,
                data: sealed,
            },
        )
        .unwrap();
        let ServiceRes::PkEncrypt { data: opened } = res else {
            panic!("expected the message point");
        };
        assert_eq!(opened, message);
    }

    #[test]
    fn key_check_accepts_pairs_and_rejects_mismatches() {
        let mut state = EngineState::boot();
        let domain = p256_domain(&mut state);
        let (priv_a, pub_a) = generate(&mut state, domain, PolicyMask::PK_ECDSA_SIGN);
        let (priv_b, _) = generate(&mut state, domain, PolicyMask::PK_ECDSA_SIGN);
        let pub_a = loaded_asset(&mut state, PolicyMask::PUBLIC_KEY, pub_a);

        let cmd = |public, private| PkKeyCheckCmd {
            method: sevault_token::KeyCheckMethod::EcdhEcdsa,
            modulus_bits: 256,
            divisor_bits: 0,
            public,
            private,
            domain,
        };
        assert!(key_check(&mut state, Provenance::NonSecure, &cmd(Some(pub_a), Some(priv_a))).is_ok());
        assert!(key_check(&mut state, Provenance::NonSecure, &cmd(None, Some(priv_a))).is_ok());
        assert!(key_check(&mut state, Provenance::NonSecure, &cmd(Some(pub_a), None)).is_ok());
        assert_eq!(
            key_check(&mut state, Provenance::NonSecure, &cmd(Some(pub_a), Some(priv_b))),
            Err(SimError::VerifyError)
        );
        assert_eq!(
            key_check(&mut state, Provenance::NonSecure, &cmd(None, None)),
            Err(SimError::InvalidParameter)
        );
    }

    #[test]
    fn generated_private_key_can_be_exported() {
        let mut state = EngineState::boot();
        let domain = p256_domain(&mut state);
        let kek = loaded_asset(&mut state, PolicyMask::AES_WRAP, vec![0x6bu8; 32]);
        let private = empty_asset(
            &mut state,
            PolicyMask::PK_ECDSA_SIGN | PolicyMask::SHA256 | PolicyMask::EXPORT,
            wire::vector_len(256),
        );
        let res = gen_key(
            &mut state,
            Provenance::NonSecure,
            &PkGenKeyCmd {
                method: GenKeyMethod::EcdsaPair,
                modulus_bits: 256,
                divisor_bits: 0,
                private,
                domain,
                export: Some(sevault_token::ExportReq {
                    kek,
                    aad: b"backup".to_vec(),
                }),
                want_public: false,
            },
        )
        .unwrap();
        let ServiceRes::PkGenKey(PkGenKeyRes { public: None, blob: Some(blob) }) = res else {
            panic!("expected an export blob");
        };
        assert_eq!(
            blob.len(),
            sevault_token::keyblob_len(wire::vector_len(256))
        );
    }
}
