// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Authenticated encryption context.

use sevault_channel::TokenChannel;
use sevault_token::AeadAlg;
use sevault_token::AuthCryptCmd;
use sevault_token::AuthCryptRes;
use sevault_token::GcmSubmode;
use sevault_token::KeyRef;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;
use crate::sym::Phase;

fn key_size_ok(alg: AeadAlg, len: usize) -> bool {
    match alg {
        AeadAlg::AesCcm | AeadAlg::AesGcm => matches!(len, 16 | 24 | 32),
        AeadAlg::ChaCha20Poly1305 => len == 32,
    }
}

fn nonce_len_ok(alg: AeadAlg, len: usize) -> bool {
    match alg {
        AeadAlg::AesCcm => (7..=13).contains(&len),
        AeadAlg::AesGcm | AeadAlg::ChaCha20Poly1305 => len == 12,
    }
}

fn tag_len_ok(alg: AeadAlg, len: usize) -> bool {
    match alg {
        AeadAlg::AesCcm => matches!(len, 4 | 6 | 8 | 10 | 12 | 14 | 16),
        AeadAlg::AesGcm => (12..=16).contains(&len),
        AeadAlg::ChaCha20Poly1305 => len == 16,
    }
}

/// One authenticated-encryption operation.
///
/// Single shot: set key, nonce and optionally the tag length, then call
/// [`AeadContext::encrypt`] or [`AeadContext::decrypt`] exactly once.
pub struct AeadContext<'a, C: TokenChannel> {
    session: &'a Session<C>,
    alg: AeadAlg,
    key: Option<KeyRef>,
    nonce: Vec<u8>,
    tag_len: usize,
    gcm: GcmSubmode,
    phase: Phase,
}

impl<'a, C: TokenChannel> AeadContext<'a, C> {
    /// Creates a context for `alg` with the full-length default tag.
    pub fn alloc(session: &'a Session<C>, alg: AeadAlg) -> Self {
        AeadContext {
            session,
            alg,
            key: None,
            nonce: Vec::new(),
            tag_len: 16,
            gcm: GcmSubmode::Autonomous,
            phase: Phase::Idle,
        }
    }

    /// Loads an inline key.
    pub fn init_key(&mut self, key: &[u8]) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        if !key_size_ok(self.alg, key.len()) {
            return Err(VaultError::InvalidKeySize);
        }
        self.key = Some(KeyRef::Inline(key.to_vec()));
        Ok(())
    }

    /// References a key asset instead of inline material.
    pub fn init_key_asset(&mut self, key: &Asset<'_, C>) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        self.key = Some(KeyRef::Asset(key.id()));
        Ok(())
    }

    /// Sets the nonce. CCM takes 7..=13 bytes, the others exactly 12.
    pub fn set_nonce(&mut self, nonce: &[u8]) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        if !nonce_len_ok(self.alg, nonce.len()) {
            return Err(VaultError::InvalidLength);
        }
        self.nonce = nonce.to_vec();
        Ok(())
    }

    /// Shortens the tag from the 16 byte default.
    pub fn set_tag_len(&mut self, tag_len: usize) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        if !tag_len_ok(self.alg, tag_len) {
            return Err(VaultError::InvalidLength);
        }
        self.tag_len = tag_len;
        Ok(())
    }

    /// Selects the GCM dataflow variant.
    pub fn set_gcm_submode(&mut self, gcm: GcmSubmode) -> VaultResult<()> {
        if self.alg != AeadAlg::AesGcm {
            return Err(VaultError::InvalidMode);
        }
        self.gcm = gcm;
        Ok(())
    }

    fn run(
        &mut self,
        encrypt: bool,
        aad: &[u8],
        data: &[u8],
        tag: Option<Vec<u8>>,
    ) -> VaultResult<AuthCryptRes> {
        if self.phase == Phase::Done {
            return Err(VaultError::InvalidState);
        }
        let key = self.key.clone().ok_or(VaultError::InvalidState)?;
        if self.nonce.is_empty() {
            return Err(VaultError::InvalidState);
        }
        let res = self.session.exchange(ServiceCmd::AuthCrypt(AuthCryptCmd {
            alg: self.alg,
            encrypt,
            key,
            gcm: self.gcm,
            hash_key: None,
            nonce: self.nonce.clone(),
            aad: aad.to_vec(),
            data: data.to_vec(),
            tag_len: self.tag_len,
            tag,
        }))?;
        let ServiceRes::AuthCrypt(res) = res else {
            return Err(VaultError::InternalError);
        };
        self.phase = Phase::Done;
        Ok(res)
    }

    /// Seals `data` under `aad`, writing the ciphertext into `out`.
    ///
    /// Returns the ciphertext length and the tag.
    pub fn encrypt(
        &mut self,
        aad: &[u8],
        data: &[u8],
        out: &mut [u8],
    ) -> VaultResult<(usize, Vec<u8>)> {
        if out.len() < data.len() {
            return Err(VaultError::BufferTooSmall { required: data.len() });
        }
        let res = self.run(true, aad, data, None)?;
        let tag = res.tag.ok_or(VaultError::InternalError)?;
        out[..res.data.len()].copy_from_slice(&res.data);
        Ok((res.data.len(), tag))
    }

    /// Opens `data` under `aad`, checking `tag`.
    ///
    /// Returns the plaintext length; [`VaultError::VerifyError`] when the
    /// tag does not authenticate.
    pub fn decrypt(
        &mut self,
        aad: &[u8],
        data: &[u8],
        tag: &[u8],
        out: &mut [u8],
    ) -> VaultResult<usize> {
        if tag.len() != self.tag_len {
            return Err(VaultError::InvalidLength);
        }
        if out.len() < data.len() {
            return Err(VaultError::BufferTooSmall { required: data.len() });
        }
        let res = self.run(false, aad, data, Some(tag.to_vec()))?;
        out[..res.data.len()].copy_from_slice(&res.data);
        Ok(res.data.len())
    }
}
