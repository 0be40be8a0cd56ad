// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! AES key wrap with padding (RFC 5649).
//!
//! Wrapping any n-byte key yields `8 * ceil(n/8) + 8` bytes; unwrapping
//! recovers the exact original length. The KEK may ride inline in the
//! token or live in an asset whose policy carries `AES_WRAP`.

use sevault_channel::TokenChannel;
use sevault_token::AesWrapCmd;
use sevault_token::KeyRef;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

fn check_kek(key: &KeyRef) -> VaultResult<()> {
    if let Some(len) = key.inline_len() {
        if !matches!(len, 16 | 24 | 32) {
            return Err(VaultError::InvalidKeySize);
        }
    }
    Ok(())
}

impl<C: TokenChannel> Session<C> {
    fn aes_wrap_run(&self, encrypt: bool, key: KeyRef, data: &[u8]) -> VaultResult<Vec<u8>> {
        check_kek(&key)?;
        if encrypt {
            if data.is_empty() {
                return Err(VaultError::InvalidLength);
            }
        } else if data.len() < 16 || data.len() % 8 != 0 {
            return Err(VaultError::InvalidLength);
        }
        let res = self.exchange(ServiceCmd::AesWrap(AesWrapCmd {
            encrypt,
            key,
            data: data.to_vec(),
        }))?;
        let ServiceRes::AesWrap { data } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(data)
    }

    /// Wraps `data` under an inline KEK of 16, 24 or 32 bytes.
    pub fn aes_key_wrap(&self, key: &[u8], data: &[u8]) -> VaultResult<Vec<u8>> {
        self.aes_wrap_run(true, KeyRef::Inline(key.to_vec()), data)
    }

    /// Wraps `data` under a wrapping-key asset.
    pub fn aes_key_wrap_asset(
        &self,
        key: &Asset<'_, C>,
        data: &[u8],
    ) -> VaultResult<Vec<u8>> {
        self.aes_wrap_run(true, KeyRef::Asset(key.id()), data)
    }

    /// Unwraps an RFC 5649 blob under an inline KEK.
    ///
    /// A corrupted blob or the wrong KEK answers
    /// [`VaultError::VerifyError`].
    pub fn aes_key_unwrap(&self, key: &[u8], wrapped: &[u8]) -> VaultResult<Vec<u8>> {
        self.aes_wrap_run(false, KeyRef::Inline(key.to_vec()), wrapped)
    }

    /// Unwraps an RFC 5649 blob under a wrapping-key asset.
    pub fn aes_key_unwrap_asset(
        &self,
        key: &Asset<'_, C>,
        wrapped: &[u8],
    ) -> VaultResult<Vec<u8>> {
        self.aes_wrap_run(false, KeyRef::Asset(key.id()), wrapped)
    }
}
