// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! RSA signatures and key wrapping.
//!
//! There are no engine-generated RSA keys; key material is produced
//! elsewhere and loaded as a two-record wire vector built by
//! [`rsa_key_content`]. A private key pairs the modulus with the private
//! exponent, a public key with the public exponent. Signatures and
//! wrapped blobs cross this API as plain big-endian strings of the
//! modulus width.

use sevault_channel::TokenChannel;
use sevault_token::wire;
use sevault_token::wire::Writer;
use sevault_token::PkSignVerifyCmd;
use sevault_token::PkWrapCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SignVerifyMethod;
use sevault_token::WrapMethod;

use crate::asset::Asset;
use crate::asym::dh::scalar_from_wire;
use crate::asym::dh::scalar_to_wire;
use crate::asym::feed_digest;
use crate::asym::AsymFamily;
use crate::asym::KeyDescriptor;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

/// Longest OAEP label the engine hashes itself.
const LABEL_MAX: usize = 208;

/// Builds RSA key asset content: the modulus and one exponent, both
/// most-significant-byte first.
///
/// The result is the exact content of a [`KeyDescriptor::private_len`]
/// (equally [`KeyDescriptor::public_len`]) sized asset.
pub fn rsa_key_content(modulus_bits: usize, n: &[u8], exp: &[u8]) -> VaultResult<Vec<u8>> {
    let blen = wire::byte_len(modulus_bits);
    if n.len() > blen || exp.len() > blen {
        return Err(VaultError::BadArgument);
    }
    let mut buf = vec![0u8; 2 * wire::vector_len(modulus_bits)];
    let mut w = Writer::new(&mut buf);
    wire::put_bigint(&mut w, modulus_bits, 0, 2, n).map_err(|_| VaultError::BadArgument)?;
    wire::put_bigint(&mut w, modulus_bits, 1, 2, exp).map_err(|_| VaultError::BadArgument)?;
    Ok(buf)
}

fn check_family(desc: &KeyDescriptor) -> VaultResult<()> {
    if desc.family != AsymFamily::Rsa {
        return Err(VaultError::BadArgument);
    }
    desc.validate()
}

fn check_additional(method: WrapMethod, additional: &[u8]) -> VaultResult<()> {
    match method {
        WrapMethod::OaepLabel { .. } => {
            if additional.len() > LABEL_MAX {
                return Err(VaultError::InvalidLength);
            }
        }
        WrapMethod::OaepDigest { hash } => {
            if additional.len() != hash.digest_len() {
                return Err(VaultError::InvalidParameter);
            }
        }
        WrapMethod::Pkcs1 => {
            if !additional.is_empty() {
                return Err(VaultError::InvalidParameter);
            }
        }
    }
    Ok(())
}

impl<C: TokenChannel> Session<C> {
    fn rsa_sign_verify(
        &self,
        desc: &KeyDescriptor,
        method: SignVerifyMethod,
        key: &Asset<'_, C>,
        message: &[u8],
        signature: Option<Vec<u8>>,
    ) -> VaultResult<Vec<u8>> {
        let hash = desc.hash_required()?;
        let mut input = feed_digest(self, hash, message)?;
        let res = self.exchange(ServiceCmd::PkSignVerify(PkSignVerifyCmd {
            method,
            modulus_bits: desc.modulus_bits,
            key: key.id(),
            domain: None,
            state: input.state.as_ref().map(|a| a.id()),
            data: input.tail.to_vec(),
            total_len: input.total_len,
            signature,
        }));
        // The engine swallows the digest state pass or fail.
        if let Some(state) = input.state.as_mut() {
            state.disarm();
        }
        let ServiceRes::PkSignVerify(res) = res? else {
            return Err(VaultError::InternalError);
        };
        Ok(res.signature)
    }

    /// Signs `message` with PKCS#1 v1.5 padding and the descriptor's
    /// bound hash, returning the big-endian signature.
    pub fn rsa_pkcs1_sign(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        message: &[u8],
    ) -> VaultResult<Vec<u8>> {
        check_family(desc)?;
        let hash = desc.hash_required()?;
        let wire_sig = self.rsa_sign_verify(
            desc,
            SignVerifyMethod::RsaPkcs1 { hash },
            key,
            message,
            None,
        )?;
        scalar_from_wire(&wire_sig, desc.modulus_bits)
    }

    /// Verifies a PKCS#1 v1.5 signature against a public-key asset.
    ///
    /// [`VaultError::VerifyError`] when the signature does not check out.
    pub fn rsa_pkcs1_verify(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        message: &[u8],
        signature: &[u8],
    ) -> VaultResult<()> {
        check_family(desc)?;
        let hash = desc.hash_required()?;
        let signature = scalar_to_wire(desc.modulus_bits, signature)?;
        self.rsa_sign_verify(
            desc,
            SignVerifyMethod::RsaPkcs1 { hash },
            key,
            message,
            Some(signature),
        )?;
        Ok(())
    }

    /// Signs `message` with PSS padding, `salt_len` salt bytes and the
    /// descriptor's bound hash, returning the big-endian signature.
    pub fn rsa_pss_sign(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        message: &[u8],
        salt_len: usize,
    ) -> VaultResult<Vec<u8>> {
        check_family(desc)?;
        let hash = desc.hash_required()?;
        let wire_sig = self.rsa_sign_verify(
            desc,
            SignVerifyMethod::RsaPss { hash, salt_len },
            key,
            message,
            None,
        )?;
        scalar_from_wire(&wire_sig, desc.modulus_bits)
    }

    /// Verifies a PSS signature against a public-key asset.
    ///
    /// [`VaultError::VerifyError`] when the signature does not check out.
    pub fn rsa_pss_verify(
        &self,
        desc: &KeyDescriptor,
        key: &Asset<'_, C>,
        message: &[u8],
        signature: &[u8],
        salt_len: usize,
    ) -> VaultResult<()> {
        check_family(desc)?;
        let hash = desc.hash_required()?;
        let signature = scalar_to_wire(desc.modulus_bits, signature)?;
        self.rsa_sign_verify(
            desc,
            SignVerifyMethod::RsaPss { hash, salt_len },
            key,
            message,
            Some(signature),
        )?;
        Ok(())
    }

    /// Wraps the content of `target` (which must carry the export policy)
    /// under a public wrapping key, returning the ciphertext.
    ///
    /// For [`WrapMethod::OaepLabel`] the additional data is the label, at
    /// most 208 bytes; for [`WrapMethod::OaepDigest`] it is the
    /// pre-hashed label; PKCS#1 takes none.
    pub fn rsa_wrap(
        &self,
        desc: &KeyDescriptor,
        method: WrapMethod,
        key: &Asset<'_, C>,
        target: &Asset<'_, C>,
        additional: &[u8],
    ) -> VaultResult<Vec<u8>> {
        check_family(desc)?;
        check_additional(method, additional)?;
        let res = self.exchange(ServiceCmd::PkWrap(PkWrapCmd {
            method,
            wrap: true,
            modulus_bits: desc.modulus_bits,
            key: key.id(),
            target: target.id(),
            additional: additional.to_vec(),
            data: Vec::new(),
        }))?;
        let ServiceRes::PkWrap { data } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(data)
    }

    /// Unwraps `data` (a full modulus-width ciphertext) into the empty
    /// asset `target`, whose length must match the wrapped material.
    ///
    /// [`VaultError::VerifyError`] when the padding does not decode.
    pub fn rsa_unwrap(
        &self,
        desc: &KeyDescriptor,
        method: WrapMethod,
        key: &Asset<'_, C>,
        target: &Asset<'_, C>,
        additional: &[u8],
        data: &[u8],
    ) -> VaultResult<()> {
        check_family(desc)?;
        check_additional(method, additional)?;
        if data.len() != wire::byte_len(desc.modulus_bits) {
            return Err(VaultError::InvalidLength);
        }
        self.exchange(ServiceCmd::PkWrap(PkWrapCmd {
            method,
            wrap: false,
            modulus_bits: desc.modulus_bits,
            key: key.id(),
            target: target.id(),
            additional: additional.to_vec(),
            data: data.to_vec(),
        }))?;
        Ok(())
    }
}
