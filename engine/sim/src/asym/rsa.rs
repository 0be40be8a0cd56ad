// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! RSA signatures and key wrapping.
//!
//! Key assets hold the modulus and one exponent as a two-record wire vector,
//! so a key loaded over the token rides straight into the store. The modular
//! arithmetic runs on raw big numbers and the message encodings come from
//! [`rsa_encoding`]; the OpenSSL RSA object is never built because it
//! insists on the CRT parameters the engine does not keep.

use openssl::bn::BigNum;
use rsa_encoding::eme_pkcs1v15_decode;
use rsa_encoding::eme_pkcs1v15_encode;
use rsa_encoding::oaep_decode;
use rsa_encoding::oaep_encode;
use rsa_encoding::pkcs1v15_encode;
use rsa_encoding::pkcs1v15_verify;
use rsa_encoding::pss_encode;
use rsa_encoding::pss_verify;
use rsa_encoding::DigestKind;
use rsa_encoding::HashFn;
use sevault_token::wire;
use sevault_token::wire::Reader;
use sevault_token::wire::Writer;
use sevault_token::AssetId;
use sevault_token::HashAlg;
use sevault_token::PkSignVerifyCmd;
use sevault_token::PkSignVerifyRes;
use sevault_token::PkWrapCmd;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::SignVerifyMethod;
use sevault_token::WrapMethod;

use crate::asym::mod_exp;
use crate::asym::take_digest;
use crate::crypto::hash::digest;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;

/// Longest OAEP label the engine hashes itself.
const LABEL_MAX: usize = 208;

pub(crate) fn digest_kind(hash: HashAlg) -> DigestKind {
    match hash {
        HashAlg::Sha1 => DigestKind::Sha1,
        HashAlg::Sha224 => DigestKind::Sha224,
        HashAlg::Sha256 => DigestKind::Sha256,
        HashAlg::Sha384 => DigestKind::Sha384,
        HashAlg::Sha512 => DigestKind::Sha512,
    }
}

pub(crate) fn hash_fn(hash: HashAlg) -> HashFn {
    fn sha1(data: &[u8]) -> Vec<u8> {
        openssl::sha::sha1(data).to_vec()
    }
    fn sha224(data: &[u8]) -> Vec<u8> {
        openssl::sha::sha224(data).to_vec()
    }
    fn sha256(data: &[u8]) -> Vec<u8> {
        openssl::sha::sha256(data).to_vec()
    }
    fn sha384(data: &[u8]) -> Vec<u8> {
        openssl::sha::sha384(data).to_vec()
    }
    fn sha512(data: &[u8]) -> Vec<u8> {
        openssl::sha::sha512(data).to_vec()
    }
    match hash {
        HashAlg::Sha1 => sha1,
        HashAlg::Sha224 => sha224,
        HashAlg::Sha256 => sha256,
        HashAlg::Sha384 => sha384,
        HashAlg::Sha512 => sha512,
    }
}

fn rng(buf: &mut [u8]) -> Result<(), ()> {
    openssl::rand::rand_bytes(buf).map_err(|_| ())
}

struct RsaKey {
    n: BigNum,
    exp: BigNum,
    /// Modulus length in bytes.
    k: usize,
}

/// Parses a two-record key vector: the modulus, then the exponent.
fn parse_key(content: &[u8], bits: usize) -> SimResult<RsaKey> {
    let mut r = Reader::new(content);
    let mut dest = vec![0u8; wire::byte_len(bits)];
    let (header, len) = wire::get_bigint(&mut r, &mut dest)?;
    header.expect(0, 2)?;
    if header.bits as usize != bits {
        return Err(SimError::InvalidParameter);
    }
    let n = BigNum::from_slice(&dest[..len])?;
    if n.num_bits() as usize != bits {
        tracing::debug!(declared = bits, actual = n.num_bits(), "modulus width mismatch");
        return Err(SimError::InvalidParameter);
    }
    let (header, len) = wire::get_bigint(&mut r, &mut dest)?;
    header.expect(1, 2)?;
    let exp = BigNum::from_slice(&dest[..len])?;
    Ok(RsaKey {
        n,
        exp,
        k: wire::byte_len(bits),
    })
}

fn load_key(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
    need: PolicyMask,
    bits: usize,
) -> SimResult<RsaKey> {
    let content = state.vault.key_content(id, need, provenance)?;
    parse_key(&content, bits)
}

pub(crate) fn sign_verify(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkSignVerifyCmd,
) -> SimResult<ServiceRes> {
    let (hash, pss, salt_len) = match cmd.method {
        SignVerifyMethod::RsaPkcs1 { hash } => (hash, false, 0),
        SignVerifyMethod::RsaPss { hash, salt_len } => (hash, true, salt_len),
        _ => return Err(SimError::InvalidParameter),
    };
    if cmd.domain.is_some() {
        return Err(SimError::InvalidParameter);
    }
    let md = take_digest(state, hash, &cmd.state, &cmd.data, cmd.total_len)?;
    let kind = digest_kind(hash);
    let sign_bit = if pss {
        PolicyMask::PK_RSA_PSS_SIGN
    } else {
        PolicyMask::PK_RSA_PKCS1_SIGN
    };
    match &cmd.signature {
        None => {
            let need = sign_bit | hash.policy_bit();
            let key = load_key(state, provenance, cmd.key, need, cmd.modulus_bits)?;
            let em = if pss {
                pss_encode(&md, cmd.modulus_bits - 1, kind, hash_fn(hash), salt_len, rng)?
            } else {
                pkcs1v15_encode(&md, key.k, kind)?
            };
            let m = BigNum::from_slice(&em)?;
            let s = mod_exp(&m, &key.exp, &key.n)?;
            let mut buf = vec![0u8; wire::vector_len(cmd.modulus_bits)];
            let mut w = Writer::new(&mut buf);
            wire::put_bigint(&mut w, cmd.modulus_bits, 0, 1, &s.to_vec())?;
            Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
                signature: buf,
                state: None,
            }))
        }
        Some(signature) => {
            let need = sign_bit | PolicyMask::PUBLIC_KEY | hash.policy_bit();
            let key = load_key(state, provenance, cmd.key, need, cmd.modulus_bits)?;
            let mut r = Reader::new(signature);
            let mut dest = vec![0u8; key.k];
            let (_, len) = wire::get_bigint(&mut r, &mut dest)?;
            let s = BigNum::from_slice(&dest[..len])?;
            let good = if pss {
                let em_len = (cmd.modulus_bits - 1).div_ceil(8);
                let em = mod_exp(&s, &key.exp, &key.n)?.to_vec_padded(em_len as i32)?;
                pss_verify(&md, &em, cmd.modulus_bits - 1, kind, hash_fn(hash), salt_len)
                    .map_err(|_| SimError::VerifyError)?
            } else {
                let em = mod_exp(&s, &key.exp, &key.n)?.to_vec_padded(key.k as i32)?;
                pkcs1v15_verify(&md, &em, kind).map_err(|_| SimError::VerifyError)?
            };
            if !good {
                tracing::debug!(bits = cmd.modulus_bits, pss, "RSA verification failed");
                return Err(SimError::VerifyError);
            }
            Ok(ServiceRes::PkSignVerify(PkSignVerifyRes {
                signature: Vec::new(),
                state: None,
            }))
        }
    }
}

fn label_hash(method: WrapMethod, additional: &[u8]) -> SimResult<Option<Vec<u8>>> {
    match method {
        WrapMethod::OaepLabel { hash } => {
            if additional.len() > LABEL_MAX {
                return Err(SimError::InvalidLength);
            }
            Ok(Some(digest(hash, additional)))
        }
        WrapMethod::OaepDigest { hash } => {
            if additional.len() != hash.digest_len() {
                return Err(SimError::InvalidParameter);
            }
            Ok(Some(additional.to_vec()))
        }
        WrapMethod::Pkcs1 => {
            if !additional.is_empty() {
                return Err(SimError::InvalidParameter);
            }
            Ok(None)
        }
    }
}

fn wrap_policy(method: WrapMethod) -> PolicyMask {
    match method {
        WrapMethod::OaepLabel { .. } | WrapMethod::OaepDigest { .. } => {
            PolicyMask::PK_RSA_OAEP_WRAP
        }
        WrapMethod::Pkcs1 => PolicyMask::PK_RSA_PKCS1_WRAP,
    }
}

pub(crate) fn wrap_service(
    state: &mut EngineState,
    provenance: Provenance,
    cmd: &PkWrapCmd,
) -> SimResult<ServiceRes> {
    let l_hash = label_hash(cmd.method, &cmd.additional)?;
    if cmd.wrap {
        if !cmd.data.is_empty() {
            return Err(SimError::InvalidParameter);
        }
        let need = wrap_policy(cmd.method) | PolicyMask::PUBLIC_KEY;
        let key = load_key(state, provenance, cmd.key, need, cmd.modulus_bits)?;
        let material = state
            .vault
            .key_content(cmd.target, PolicyMask::EXPORT, provenance)?;
        let em = match (cmd.method, l_hash) {
            (WrapMethod::Pkcs1, _) => eme_pkcs1v15_encode(&material, key.k, rng)?,
            (WrapMethod::OaepLabel { hash } | WrapMethod::OaepDigest { hash }, Some(l_hash)) => {
                oaep_encode(&material, &l_hash, key.k, digest_kind(hash), hash_fn(hash), rng)?
            }
            _ => return Err(SimError::InvalidParameter),
        };
        let m = BigNum::from_slice(&em)?;
        let data = mod_exp(&m, &key.exp, &key.n)?.to_vec_padded(key.k as i32)?;
        Ok(ServiceRes::PkWrap { data })
    } else {
        let key = load_key(state, provenance, cmd.key, wrap_policy(cmd.method), cmd.modulus_bits)?;
        if cmd.data.len() != key.k {
            return Err(SimError::InvalidLength);
        }
        let c = BigNum::from_slice(&cmd.data)?;
        let em = mod_exp(&c, &key.exp, &key.n)?.to_vec_padded(key.k as i32)?;
        let material = match (cmd.method, l_hash) {
            (WrapMethod::Pkcs1, _) => {
                eme_pkcs1v15_decode(&em).map_err(|_| SimError::VerifyError)?
            }
            (WrapMethod::OaepLabel { hash } | WrapMethod::OaepDigest { hash }, Some(l_hash)) => {
                oaep_decode(&em, &l_hash, key.k, digest_kind(hash), hash_fn(hash))
                    .map_err(|_| SimError::VerifyError)?
            }
            _ => return Err(SimError::InvalidParameter),
        };
        let length = state.vault.expect_empty(cmd.target, provenance)?;
        if length != material.len() {
            return Err(SimError::InvalidLength);
        }
        state.vault.fill(cmd.target, material)?;
        Ok(ServiceRes::PkWrap { data: Vec::new() })
    }
}
