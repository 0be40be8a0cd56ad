// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! DSA and finite-field Diffie-Hellman over caller-supplied domains.
//!
//! The math runs on raw big numbers because the OpenSSL DSA and DH objects
//! refuse the partial key forms the asset store holds. The subgroup order is
//! prime, so inverses come from Fermat's little theorem instead of a
//! dedicated inversion call.

use openssl::bn::BigNum;
use openssl::bn::BigNumContext;
use openssl::bn::BigNumRef;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::AssetId;
use sevault_token::GenKeyMethod;
use sevault_token::HashAlg;
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
use crate::asym::mod_exp;
use crate::asym::rand_scalar;
use crate::asym::scalar_from_vector;
use crate::asym::scalar_to_vector;
use crate::asym::take_digest;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

/// Signing retries before the engine gives up on a zero component.
const SIGN_ATTEMPTS: usize = 8;

struct Domain {
    p: BigNum,
    q: BigNum,
    g: BigNum,
    prime_bits: usize,
    divisor_bits: usize,
}

fn load_domain(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
    prime_bits: usize,
    divisor_bits: Option<usize>,
) -> SimResult<Domain> {
    let content = state
        .vault
        .key_content(id, PolicyMask::PUBLIC_KEY_PARAM, provenance)?;
    let mut r = Reader::new(&content);
    let d = wire::get_dl_domain(&mut r)?;
    if d.prime_bits != prime_bits || divisor_bits.is_some_and(|bits| bits != d.divisor_bits) {
        tracing::debug!(
            domain_prime = d.prime_bits,
            domain_divisor = d.divisor_bits,
            cmd_prime = prime_bits,
            "domain size mismatch"
        );
        return Err(SimError::InvalidParameter);
    }
    Ok(Domain {
        p: BigNum::from_slice(&d.prime)?,
        q: BigNum::from_slice(&d.divisor)?,
        g: BigNum::from_slice(&d.generator)?,
        prime_bits: d.prime_bits,
        divisor_bits: d.divisor_bits,
    })
}

/// `a^-1 mod q` for prime `q`.
fn fermat_inverse(a: &BigNumRef, q: &BigNumRef) -> SimResult<BigNum> {
    let mut exp = BigNum::new()?;
    exp.checked_sub(q, &*BigNum::from_u32(2)?)?;
    mod_exp(a, &exp, q)
}

/// Leftmost `divisor_bits` of the digest as a number (FIPS 186-4 section
/// 4.6).
fn digest_value(md: &[u8], divisor_bits: usize) -> SimResult<BigNum> {
    let take = md.len().min(wire::byte_len(divisor_bits));
    Ok(BigNum::from_slice(&md[..take])?)
}

fn in_scalar_range(x: &BigNumRef, q: &BigNumRef) -> bool {
    x.num_bits() != 0 && x.ucmp(q) == std::cmp::Ordering::Less
}

/// `2 <= y <= p - 2`, the public-key range both FIPS documents require.
fn in_public_range(y: &BigNumRef, p: &BigNumRef) -> SimResult<bool> {
    let one = BigNum::from_u32(1)?;
    let mut p_minus_1 = BigNum::new()?;
    p_minus_1.checked_sub(p, &one)?;
    Ok(y.ucmp(&one) == std::cmp::Ordering::Greater
        && y.ucmp(&p_minus_1) == std::cmp::Ordering::Less)
}

pub(crate) fn dsa_sign_verify(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
    hash: HashAlg,
) -> SimResult<ServiceRes> {
    let domain = cmd.domain.ok_or(SimError::InvalidParameter)?;
    let dom = load_domain(state, provenance, domain, cmd.modulus_bits, None)?;
    let md = take_digest(state, hash, &cmd.state, &cmd.data, cmd.total_len)?;
    let z = digest_value(&md, dom.divisor_bits)?;
    let mut ctx = BigNumContext::new()?;
    match &cmd.signature {
        None => {
            let need = PolicyMask::PK_DSA_SIGN | hash.policy_bit();
            let content = state.vault.key_content(cmd.key, need, provenance)?;
            let x = scalar_from_vector(&content, dom.divisor_bits)?;
            for _ in 0..SIGN_ATTEMPTS {
                let k = rand_scalar(&dom.q)?;
                let mut r = BigNum::new()?;
                r.nnmod(&*mod_exp(&dom.g, &k, &dom.p)?, &dom.q, &mut ctx)?;
                if r.num_bits() == 0 {
                    continue;
                }
                let k_inv = fermat_inverse(&k, &dom.q)?;
                let mut xr = BigNum::new()?;
                xr.mod_mul(&x, &r, &dom.q, &mut ctx)?;
                let mut z_xr = BigNum::new()?;
                z_xr.mod_add(&z, &xr, &dom.q, &mut ctx)?;
                let mut s = BigNum::new()?;
                s.mod_mul(&k_inv, &z_xr, &dom.q, &mut ctx)?;
                if s.num_bits() == 0 {
                    continue;
                }
                let mut buf = vec![0u8; 2 * wire::vector_len(dom.divisor_bits)];
                let mut w = Writer::new(&mut buf);
                wire::put_signature(&mut w, dom.divisor_bits, &r.to_vec(), &s.to_vec())?;
                return Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
                    signature: buf,
                    state: None,
                }));
            }
            tracing::error!("DSA signing failed to find nonzero components");
            Err(SimError::Panic)
        }
        Some(signature) => {
            let need = PolicyMask::PK_DSA_SIGN | PolicyMask::PUBLIC_KEY | hash.policy_bit();
            let content = state.vault.key_content(cmd.key, need, provenance)?;
            let y = scalar_from_vector(&content, dom.prime_bits)?;
            let mut reader = Reader::new(signature);
            let (r_bytes, s_bytes) = wire::get_signature(&mut reader)?;
            let r = BigNum::from_slice(&r_bytes)?;
            let s = BigNum::from_slice(&s_bytes)?;
            if !in_scalar_range(&r, &dom.q) || !in_scalar_range(&s, &dom.q) {
                return Err(SimError::VerifyError);
            }
            let w = fermat_inverse(&s, &dom.q)?;
            let mut u1 = BigNum::new()?;
            u1.mod_mul(&z, &w, &dom.q, &mut ctx)?;
            let mut u2 = BigNum::new()?;
            u2.mod_mul(&r, &w, &dom.q, &mut ctx)?;
            let mut gy = BigNum::new()?;
            gy.mod_mul(
                &*mod_exp(&dom.g, &u1, &dom.p)?,
                &*mod_exp(&y, &u2, &dom.p)?,
                &dom.p,
                &mut ctx,
            )?;
            let mut v = BigNum::new()?;
            v.nnmod(&gy, &dom.q, &mut ctx)?;
            if v != r {
                tracing::debug!(bits = dom.prime_bits, "DSA verification failed");
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
    let dom = load_domain(
        state,
        provenance,
        cmd.domain,
        cmd.modulus_bits,
        Some(cmd.divisor_bits),
    )?;
    match cmd.method {
        GenKeyMethod::DsaPair | GenKeyMethod::DhPair => {
            let x = rand_scalar(&dom.q)?;
            let y = mod_exp(&dom.g, &x, &dom.p)?;
            let content = scalar_to_vector(dom.divisor_bits, &x)?;
            let blob = export_blob(state, provenance, cmd.private, &cmd.export, &content)?;
            state.vault.fill(cmd.private, content)?;
            let public = if cmd.want_public {
                Some(scalar_to_vector(dom.prime_bits, &y)?)
            } else {
                None
            };
            Ok(ServiceRes::PkGenKey(PkGenKeyRes { public, blob }))
        }
        GenKeyMethod::DsaPublic | GenKeyMethod::DhPublic => {
            if cmd.export.is_some() {
                return Err(SimError::InvalidParameter);
            }
            let content = state
                .vault
                .key_content(cmd.private, PolicyMask::NONE, provenance)?;
            let x = scalar_from_vector(&content, dom.divisor_bits)?;
            let y = mod_exp(&dom.g, &x, &dom.p)?;
            let public = if cmd.want_public {
                Some(scalar_to_vector(dom.prime_bits, &y)?)
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
    dom: &Domain,
    private: AssetId,
    peer: &[u8],
) -> SimResult<Vec<u8>> {
    let content = state
        .vault
        .key_content(private, PolicyMask::PK_DH_KEY, provenance)?;
    let x = scalar_from_vector(&content, dom.divisor_bits)?;
    let y = scalar_from_vector(peer, dom.prime_bits)?;
    if !in_public_range(&y, &dom.p)? {
        return Err(SimError::InvalidParameter);
    }
    let z = mod_exp(&y, &x, &dom.p)?;
    Ok(z.to_vec_padded(wire::byte_len(dom.prime_bits) as i32)?)
}

pub(crate) fn shared_secret(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSharedSecretCmd,
) -> SimResult<ServiceRes> {
    let dom = load_domain(state, provenance, cmd.domain, cmd.modulus_bits, None)?;
    let mut secret = agree(state, provenance, &dom, cmd.private, &cmd.peer)?;
    match cmd.method {
        SharedSecretMethod::Dh => {
            if cmd.private2.is_some() || cmd.peer2.is_some() {
                return Err(SimError::InvalidParameter);
            }
        }
        SharedSecretMethod::DhDual => {
            let private2 = cmd.private2.ok_or(SimError::InvalidParameter)?;
            let peer2 = cmd.peer2.as_ref().ok_or(SimError::InvalidParameter)?;
            secret.extend(agree(state, provenance, &dom, private2, peer2)?);
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

pub(crate) fn key_check(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkKeyCheckCmd,
) -> SimResult<ServiceRes> {
    let dom = load_domain(
        state,
        provenance,
        cmd.domain,
        cmd.modulus_bits,
        Some(cmd.divisor_bits),
    )?;
    let public = match cmd.public {
        Some(id) => {
            let content = state.vault.key_content(id, PolicyMask::NONE, provenance)?;
            let y = scalar_from_vector(&content, dom.prime_bits)?;
            if !in_public_range(&y, &dom.p)? {
                return Err(SimError::VerifyError);
            }
            // Subgroup membership: y^q mod p must be 1.
            if mod_exp(&y, &dom.q, &dom.p)? != BigNum::from_u32(1)? {
                return Err(SimError::VerifyError);
            }
            Some(y)
        }
        None => None,
    };
    let private = match cmd.private {
        Some(id) => {
            let content = state.vault.key_content(id, PolicyMask::NONE, provenance)?;
            let x = scalar_from_vector(&content, dom.divisor_bits)?;
            if !in_scalar_range(&x, &dom.q) {
                return Err(SimError::VerifyError);
            }
            Some(x)
        }
        None => None,
    };
    match (public, private) {
        (None, None) => Err(SimError::InvalidParameter),
        (Some(y), Some(x)) => {
            if mod_exp(&dom.g, &x, &dom.p)? != y {
                return Err(SimError::VerifyError);
            }
            Ok(ServiceRes::None)
        }
        _ => Ok(ServiceRes::None),
    }
}
