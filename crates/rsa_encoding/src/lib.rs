// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! RSA message encodings from RFC 8017.
//!
//! Signature encodings: PKCS#1 v1.5 and PSS. Encryption encodings: OAEP and
//! PKCS#1 v1.5.
//! The functions here only build and check encoded message blocks; the
//! modular exponentiation happens elsewhere. Hashing is injected through a
//! function pointer so the crate carries no crypto dependency of its own.
//!
//! OAEP takes the label's digest rather than the label, because callers in
//! this workspace receive either form and hash the label themselves when
//! they hold it.

use thiserror::Error;

/// Digest algorithm used inside an encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestKind {
    /// SHA-1
    Sha1,

    /// SHA-224
    Sha224,

    /// SHA-256
    Sha256,

    /// SHA-384
    Sha384,

    /// SHA-512
    Sha512,
}

impl DigestKind {
    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            DigestKind::Sha1 => 20,
            DigestKind::Sha224 => 28,
            DigestKind::Sha256 => 32,
            DigestKind::Sha384 => 48,
            DigestKind::Sha512 => 64,
        }
    }

    // DigestInfo prefixes from RFC 8017 section 9.2 notes.
    fn digest_info_prefix(self) -> &'static [u8] {
        const SHA1: [u8; 15] = [
            0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04,
            0x14,
        ];
        const SHA224: [u8; 19] = [
            0x30, 0x2d, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x04, 0x05, 0x00, 0x04, 0x1c,
        ];
        const SHA256: [u8; 19] = [
            0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x01, 0x05, 0x00, 0x04, 0x20,
        ];
        const SHA384: [u8; 19] = [
            0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x02, 0x05, 0x00, 0x04, 0x30,
        ];
        const SHA512: [u8; 19] = [
            0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x03, 0x05, 0x00, 0x04, 0x40,
        ];
        match self {
            DigestKind::Sha1 => &SHA1,
            DigestKind::Sha224 => &SHA224,
            DigestKind::Sha256 => &SHA256,
            DigestKind::Sha384 => &SHA384,
            DigestKind::Sha512 => &SHA512,
        }
    }
}

/// Hash function injected by the caller; must match the [`DigestKind`]
/// passed alongside it.
pub type HashFn = fn(&[u8]) -> Vec<u8>;

/// Random filler injected by the caller.
pub type RngFn = fn(&mut [u8]) -> Result<(), ()>;

/// Encoding failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// A length constraint of the scheme was violated.
    #[error("invalid parameter")]
    InvalidParameter,

    /// The injected random source failed.
    #[error("RNG failure")]
    RngFailure,
}

/// Result type for the encoding functions.
pub type EncodeResult<T> = Result<T, EncodeError>;

fn xor_into(a: &mut [u8], b: &[u8]) {
    debug_assert_eq!(a.len(), b.len());
    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x ^= *y;
    }
}

fn clear_leading_bits(v: &mut [u8], nbits: usize) {
    let whole = nbits / 8;
    let rest = nbits % 8;
    for b in v.iter_mut().take(whole) {
        *b = 0;
    }
    if rest != 0 {
        if let Some(b) = v.get_mut(whole) {
            *b &= 0xff >> rest;
        }
    }
}

fn leading_bits_clear(v: &[u8], nbits: usize) -> bool {
    let whole = nbits / 8;
    let rest = nbits % 8;
    if v.iter().take(whole).any(|b| *b != 0) {
        return false;
    }
    if rest != 0 {
        let b = v.get(whole).copied().unwrap_or(0);
        if b & !(0xffu8 >> rest) != 0 {
            return false;
        }
    }
    true
}

/// MGF1 mask generation (RFC 8017 appendix B.2.1).
fn mgf1(seed: &[u8], length: usize, kind: DigestKind, hash: HashFn) -> Vec<u8> {
    let h_len = kind.digest_len();
    let mut mask = Vec::with_capacity(length + h_len);
    let mut counter: u32 = 0;
    while mask.len() < length {
        let mut block = Vec::with_capacity(seed.len() + 4);
        block.extend_from_slice(seed);
        block.extend_from_slice(&counter.to_be_bytes());
        mask.extend_from_slice(&hash(&block));
        counter += 1;
    }
    mask.truncate(length);
    mask
}

/// Build an EMSA-PKCS1-v1_5 block for `digest`.
///
/// `em_len` is the modulus length in bytes (RFC 8017 section 8.2.1 step 1).
pub fn pkcs1v15_encode(digest: &[u8], em_len: usize, kind: DigestKind) -> EncodeResult<Vec<u8>> {
    let prefix = kind.digest_info_prefix();
    let h_len = kind.digest_len();
    if digest.len() != h_len {
        tracing::error!(have = digest.len(), want = h_len, "digest length mismatch");
        return Err(EncodeError::InvalidParameter);
    }
    let t_len = prefix.len() + h_len;
    if em_len < t_len + 11 {
        tracing::error!(em_len, "encoded message length too short");
        return Err(EncodeError::InvalidParameter);
    }

    // EM = 0x00 || 0x01 || PS(0xff..) || 0x00 || DigestInfo || digest
    let mut em = vec![0u8; em_len];
    em[1] = 0x01;
    for b in em.iter_mut().skip(2).take(em_len - t_len - 3) {
        *b = 0xff;
    }
    em[em_len - t_len..em_len - h_len].copy_from_slice(prefix);
    em[em_len - h_len..].copy_from_slice(digest);
    Ok(em)
}

/// Check an EMSA-PKCS1-v1_5 block against `digest`.
pub fn pkcs1v15_verify(digest: &[u8], em: &[u8], kind: DigestKind) -> EncodeResult<bool> {
    let expected = pkcs1v15_encode(digest, em.len(), kind)?;
    Ok(em == expected.as_slice())
}

/// Build an EMSA-PSS block for `digest`.
///
/// `em_bits` is the modulus bit length minus one (RFC 8017 section 8.1.1
/// step 1). The salt length must not exceed the digest length.
pub fn pss_encode(
    digest: &[u8],
    em_bits: usize,
    kind: DigestKind,
    hash: HashFn,
    salt_len: usize,
    rng: RngFn,
) -> EncodeResult<Vec<u8>> {
    let em_len = em_bits.div_ceil(8);
    let h_len = kind.digest_len();
    if digest.len() != h_len || salt_len > h_len {
        tracing::error!(salt_len, "bad digest or salt length for PSS");
        return Err(EncodeError::InvalidParameter);
    }
    if em_len < h_len + salt_len + 2 {
        tracing::error!(em_len, h_len, salt_len, "PSS block too short");
        return Err(EncodeError::InvalidParameter);
    }

    let mut salt = vec![0u8; salt_len];
    rng(&mut salt).map_err(|()| EncodeError::RngFailure)?;

    // H = Hash(0x00*8 || digest || salt)
    let mut m_dash = vec![0u8; 8];
    m_dash.extend_from_slice(digest);
    m_dash.extend_from_slice(&salt);
    let h = hash(&m_dash);

    let db_len = em_len - h_len - 1;
    let mut em = vec![0u8; em_len];
    let db = &mut em[..db_len];
    db[db_len - salt_len - 1] = 0x01;
    if salt_len != 0 {
        db[db_len - salt_len..].copy_from_slice(&salt);
    }
    let db_mask = mgf1(&h, db_len, kind, hash);
    xor_into(db, &db_mask);
    clear_leading_bits(db, 8 * em_len - em_bits);

    em[db_len..em_len - 1].copy_from_slice(&h);
    em[em_len - 1] = 0xbc;
    Ok(em)
}

/// Check an EMSA-PSS block against `digest` with a fixed salt length.
pub fn pss_verify(
    digest: &[u8],
    em: &[u8],
    em_bits: usize,
    kind: DigestKind,
    hash: HashFn,
    salt_len: usize,
) -> EncodeResult<bool> {
    let em_len = em_bits.div_ceil(8);
    let h_len = kind.digest_len();
    if digest.len() != h_len || salt_len > h_len || em.len() != em_len {
        return Err(EncodeError::InvalidParameter);
    }
    if em_len < h_len + salt_len + 2 {
        return Err(EncodeError::InvalidParameter);
    }
    if em[em_len - 1] != 0xbc {
        return Ok(false);
    }

    let db_len = em_len - h_len - 1;
    let h = &em[db_len..em_len - 1];
    let mut db = em[..db_len].to_vec();
    if !leading_bits_clear(&db, 8 * em_len - em_bits) {
        return Ok(false);
    }
    let db_mask = mgf1(h, db_len, kind, hash);
    xor_into(&mut db, &db_mask);
    clear_leading_bits(&mut db, 8 * em_len - em_bits);

    // DB = 0x00.. || 0x01 || salt
    let pad_len = db_len - salt_len - 1;
    if db.iter().take(pad_len).any(|b| *b != 0) || db[pad_len] != 0x01 {
        return Ok(false);
    }
    let salt = &db[db_len - salt_len..];

    let mut m_dash = vec![0u8; 8];
    m_dash.extend_from_slice(digest);
    m_dash.extend_from_slice(salt);
    Ok(hash(&m_dash) == h)
}

/// Build an EME-OAEP block for `message`.
///
/// `l_hash` is the digest of the OAEP label and must be one digest long;
/// `em_len` is the modulus length in bytes.
pub fn oaep_encode(
    message: &[u8],
    l_hash: &[u8],
    em_len: usize,
    kind: DigestKind,
    hash: HashFn,
    rng: RngFn,
) -> EncodeResult<Vec<u8>> {
    let h_len = kind.digest_len();
    if l_hash.len() != h_len {
        tracing::error!(have = l_hash.len(), want = h_len, "label hash length mismatch");
        return Err(EncodeError::InvalidParameter);
    }
    if em_len < 2 * h_len + 2 || message.len() > em_len - 2 * h_len - 2 {
        tracing::error!(msg_len = message.len(), em_len, "message too long for OAEP");
        return Err(EncodeError::InvalidParameter);
    }

    // DB = lHash || 0x00.. || 0x01 || message
    let db_len = em_len - h_len - 1;
    let mut db = vec![0u8; db_len];
    db[..h_len].copy_from_slice(l_hash);
    db[db_len - message.len() - 1] = 0x01;
    db[db_len - message.len()..].copy_from_slice(message);

    let mut seed = vec![0u8; h_len];
    rng(&mut seed).map_err(|()| EncodeError::RngFailure)?;
    let db_mask = mgf1(&seed, db_len, kind, hash);
    xor_into(&mut db, &db_mask);
    let seed_mask = mgf1(&db, h_len, kind, hash);
    xor_into(&mut seed, &seed_mask);

    let mut em = vec![0u8; em_len];
    em[1..h_len + 1].copy_from_slice(&seed);
    em[h_len + 1..].copy_from_slice(&db);
    Ok(em)
}

/// Recover the message from an EME-OAEP block.
///
/// Error conditions are deliberately not distinguished (RFC 8017 section
/// 7.1.2).
pub fn oaep_decode(
    em: &[u8],
    l_hash: &[u8],
    em_len: usize,
    kind: DigestKind,
    hash: HashFn,
) -> EncodeResult<Vec<u8>> {
    let h_len = kind.digest_len();
    if l_hash.len() != h_len || em.len() != em_len || em_len < 2 * h_len + 2 {
        return Err(EncodeError::InvalidParameter);
    }

    let mut seed = em[1..h_len + 1].to_vec();
    let seed_mask = mgf1(&em[h_len + 1..], h_len, kind, hash);
    xor_into(&mut seed, &seed_mask);

    let mut db = em[h_len + 1..].to_vec();
    let db_mask = mgf1(&seed, em_len - h_len - 1, kind, hash);
    xor_into(&mut db, &db_mask);

    let label_mismatch = db[..h_len] != *l_hash;
    let leading_byte_set = em[0] != 0;
    let marker = db.iter().skip(h_len).position(|b| *b == 0x01);
    let marker_missing = marker.is_none()
        || db[h_len..h_len + marker.unwrap_or(0)]
            .iter()
            .any(|b| *b != 0);
    if label_mismatch || leading_byte_set || marker_missing {
        return Err(EncodeError::InvalidParameter);
    }
    let marker = marker.ok_or(EncodeError::InvalidParameter)?;
    Ok(db[h_len + marker + 1..].to_vec())
}

/// Build an EME-PKCS1-v1_5 block for `message` (RFC 8017 section 7.2.1).
///
/// `em_len` is the modulus length in bytes; the padding string is at least
/// eight nonzero random bytes, so `message` must leave eleven bytes of room.
pub fn eme_pkcs1v15_encode(message: &[u8], em_len: usize, rng: RngFn) -> EncodeResult<Vec<u8>> {
    if em_len < 11 || message.len() > em_len - 11 {
        tracing::error!(msg_len = message.len(), em_len, "message too long for PKCS#1 v1.5");
        return Err(EncodeError::InvalidParameter);
    }

    // EM = 0x00 || 0x02 || PS(nonzero random) || 0x00 || message
    let ps_len = em_len - message.len() - 3;
    let mut em = vec![0u8; em_len];
    em[1] = 0x02;
    let ps = &mut em[2..2 + ps_len];
    rng(ps).map_err(|()| EncodeError::RngFailure)?;
    let mut fresh = [0u8; 1];
    for b in ps.iter_mut() {
        while *b == 0 {
            rng(&mut fresh).map_err(|()| EncodeError::RngFailure)?;
            *b = fresh[0];
        }
    }
    em[em_len - message.len()..].copy_from_slice(message);
    Ok(em)
}

/// Recover the message from an EME-PKCS1-v1_5 block.
///
/// Error conditions are deliberately not distinguished (RFC 8017 section
/// 7.2.2).
pub fn eme_pkcs1v15_decode(em: &[u8]) -> EncodeResult<Vec<u8>> {
    if em.len() < 11 || em[0] != 0 || em[1] != 0x02 {
        return Err(EncodeError::InvalidParameter);
    }
    let separator = em
        .iter()
        .skip(2)
        .position(|b| *b == 0)
        .ok_or(EncodeError::InvalidParameter)?;
    if separator < 8 {
        return Err(EncodeError::InvalidParameter);
    }
    Ok(em[separator + 3..].to_vec())
}

#[cfg(test)]
mod tests {
    use openssl::hash::MessageDigest;
    use openssl::pkey::PKey;
    use openssl::pkey_ctx::PkeyCtx;
    use openssl::rsa::Padding;
    use openssl::rsa::Rsa;
    use openssl::sha::sha256;
    use openssl::sign::RsaPssSaltlen;
    use openssl::sign::Verifier;

    use super::*;

    fn sha256_vec(data: &[u8]) -> Vec<u8> {
        sha256(data).to_vec()
    }

    fn test_rng(buf: &mut [u8]) -> Result<(), ()> {
        openssl::rand::rand_bytes(buf).map_err(|_| ())
    }

    fn raw_private_op(rsa: &Rsa<openssl::pkey::Private>, em: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; rsa.size() as usize];
        let n = rsa.private_encrypt(em, &mut out, Padding::NONE).unwrap();
        out.truncate(n);
        out
    }

    #[test]
    fn pkcs1v15_signature_accepted_by_openssl() {
        let rsa = Rsa::generate(2048).unwrap();
        let message = b"the quick brown fox";
        let digest = sha256_vec(message);
        let em = pkcs1v15_encode(&digest, 256, DigestKind::Sha256).unwrap();
        let sig = raw_private_op(&rsa, &em);

        let pkey = PKey::from_rsa(rsa).unwrap();
        let mut verifier = Verifier::new(MessageDigest::sha256(), &pkey).unwrap();
        verifier.update(message).unwrap();
        assert!(verifier.verify(&sig).unwrap());
    }

    #[test]
    fn pss_signature_accepted_by_openssl() {
        let rsa = Rsa::generate(2048).unwrap();
        let message = b"pss cross check";
        let digest = sha256_vec(message);
        let em = pss_encode(&digest, 2047, DigestKind::Sha256, sha256_vec, 32, test_rng).unwrap();
        let sig = raw_private_op(&rsa, &em);

        let pkey = PKey::from_rsa(rsa).unwrap();
        let mut verifier = Verifier::new(MessageDigest::sha256(), &pkey).unwrap();
        verifier.set_rsa_padding(Padding::PKCS1_PSS).unwrap();
        verifier
            .set_rsa_pss_saltlen(RsaPssSaltlen::custom(32))
            .unwrap();
        verifier.update(message).unwrap();
        assert!(verifier.verify(&sig).unwrap());
    }

    #[test]
    fn pss_verify_rejects_bit_flip() {
        let digest = sha256_vec(b"message");
        let mut em =
            pss_encode(&digest, 2047, DigestKind::Sha256, sha256_vec, 32, test_rng).unwrap();
        assert!(pss_verify(&digest, &em, 2047, DigestKind::Sha256, sha256_vec, 32).unwrap());
        em[5] ^= 0x01;
        assert!(!pss_verify(&digest, &em, 2047, DigestKind::Sha256, sha256_vec, 32).unwrap());
    }

    #[test]
    fn oaep_block_decrypted_by_openssl() {
        let rsa = Rsa::generate(2048).unwrap();
        let message = b"wrapped key bytes";
        let l_hash = sha256_vec(b"");
        let em = oaep_encode(message, &l_hash, 256, DigestKind::Sha256, sha256_vec, test_rng)
            .unwrap();
        // Raw public op, then OAEP decrypt on the openssl side.
        let mut ct = vec![0u8; 256];
        let n = rsa.public_encrypt(&em, &mut ct, Padding::NONE).unwrap();
        ct.truncate(n);

        let pkey = PKey::from_rsa(rsa).unwrap();
        let mut ctx = PkeyCtx::new(&pkey).unwrap();
        ctx.decrypt_init().unwrap();
        ctx.set_rsa_padding(Padding::PKCS1_OAEP).unwrap();
        ctx.set_rsa_oaep_md(openssl::md::Md::sha256()).unwrap();
        let len = ctx.decrypt(&ct, None).unwrap();
        let mut out = vec![0u8; len];
        let len = ctx.decrypt(&ct, Some(&mut out)).unwrap();
        assert_eq!(&out[..len], message);
    }

    #[test]
    fn oaep_round_trip_and_label_binding() {
        let l_hash = sha256_vec(b"label");
        let em = oaep_encode(b"secret", &l_hash, 256, DigestKind::Sha256, sha256_vec, test_rng)
            .unwrap();
        let back = oaep_decode(&em, &l_hash, 256, DigestKind::Sha256, sha256_vec).unwrap();
        assert_eq!(back, b"secret");

        let wrong = sha256_vec(b"other label");
        let err = oaep_decode(&em, &wrong, 256, DigestKind::Sha256, sha256_vec).unwrap_err();
        assert_eq!(err, EncodeError::InvalidParameter);
    }

    #[test]
    fn pkcs1v15_rejects_short_modulus() {
        let digest = sha256_vec(b"x");
        let err = pkcs1v15_encode(&digest, 50, DigestKind::Sha256).unwrap_err();
        assert_eq!(err, EncodeError::InvalidParameter);
    }

    #[test]
    fn eme_pkcs1v15_block_decrypted_by_openssl() {
        let rsa = Rsa::generate(2048).unwrap();
        let message = b"legacy wrapped key";
        let em = eme_pkcs1v15_encode(message, 256, test_rng).unwrap();
        let mut ct = vec![0u8; 256];
        let n = rsa.public_encrypt(&em, &mut ct, Padding::NONE).unwrap();
        ct.truncate(n);

        let mut out = vec![0u8; 256];
        let n = rsa.private_decrypt(&ct, &mut out, Padding::PKCS1).unwrap();
        assert_eq!(&out[..n], message);
    }

    #[test]
    fn eme_pkcs1v15_round_trip_and_malformed_blocks() {
        let em = eme_pkcs1v15_encode(b"secret", 64, test_rng).unwrap();
        assert_eq!(em[0], 0x00);
        assert_eq!(em[1], 0x02);
        assert_eq!(eme_pkcs1v15_decode(&em).unwrap(), b"secret");

        let mut wrong_type = em.clone();
        wrong_type[1] = 0x01;
        assert_eq!(
            eme_pkcs1v15_decode(&wrong_type).unwrap_err(),
            EncodeError::InvalidParameter
        );

        // Separator inside the minimum padding run.
        let mut short_ps = em;
        short_ps[5] = 0x00;
        assert_eq!(
            eme_pkcs1v15_decode(&short_ps).unwrap_err(),
            EncodeError::InvalidParameter
        );

        let err = eme_pkcs1v15_encode(&[0u8; 54], 64, test_rng).unwrap_err();
        assert_eq!(err, EncodeError::InvalidParameter);
    }
}
