// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Block and stream cipher context.

use sevault_channel::TokenChannel;
use sevault_token::CipherAlg;
use sevault_token::CipherCmd;
use sevault_token::CipherMode;
use sevault_token::CipherRes;
use sevault_token::IvRef;
use sevault_token::KeyRef;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;
use crate::sym::block_cap;
use crate::sym::Phase;

fn key_size_ok(alg: CipherAlg, mode: CipherMode, len: usize) -> bool {
    match (alg, mode) {
        (CipherAlg::Aes, CipherMode::Xts) => matches!(len, 32 | 64),
        (CipherAlg::Aes, CipherMode::F8) => len == 16,
        (CipherAlg::Aes, _) => matches!(len, 16 | 24 | 32),
        (CipherAlg::TripleDes, _) => len == 24,
        (CipherAlg::ChaCha20, _) => matches!(len, 16 | 32),
    }
}

fn mode_ok(alg: CipherAlg, mode: CipherMode) -> bool {
    match alg {
        CipherAlg::Aes => matches!(
            mode,
            CipherMode::Ecb | CipherMode::Cbc | CipherMode::Ctr | CipherMode::Xts | CipherMode::F8
        ),
        CipherAlg::TripleDes => matches!(mode, CipherMode::Ecb | CipherMode::Cbc),
        CipherAlg::ChaCha20 => mode == CipherMode::Stream,
    }
}

/// Whether the engine hands back chaining state for this mode.
///
/// Modes without it take all their data in a single terminal call.
fn chains(mode: CipherMode) -> bool {
    matches!(mode, CipherMode::Ecb | CipherMode::Cbc | CipherMode::Ctr)
}

/// One running cipher operation.
///
/// Direction defaults to decrypt until [`CipherContext::set_encrypt`].
/// ECB, CBC and CTR accept whole-block [`CipherContext::update`] calls
/// followed by a [`CipherContext::finish`]; XTS, F8 and the stream cipher
/// take everything in a single `finish`.
pub struct CipherContext<'a, C: TokenChannel> {
    session: &'a Session<C>,
    alg: CipherAlg,
    mode: CipherMode,
    encrypt: bool,
    key: Option<KeyRef>,
    iv: IvRef,
    nonce_len: u8,
    f8_fresh: Option<[u8; 8]>,
    f8_bearer: u8,
    f8_direction: u8,
    phase: Phase,
}

impl<'a, C: TokenChannel> CipherContext<'a, C> {
    /// Creates a context for the `alg`/`mode` pair.
    pub fn alloc(session: &'a Session<C>, alg: CipherAlg, mode: CipherMode) -> VaultResult<Self> {
        if !mode_ok(alg, mode) {
            return Err(VaultError::InvalidMode);
        }
        Ok(CipherContext {
            session,
            alg,
            mode,
            encrypt: false,
            key: None,
            iv: IvRef::None,
            nonce_len: 0,
            f8_fresh: None,
            f8_bearer: 0,
            f8_direction: 0,
            phase: Phase::Idle,
        })
    }

    /// Switches the context to encryption.
    pub fn set_encrypt(&mut self) {
        self.encrypt = true;
    }

    /// Loads an inline key.
    pub fn init_key(&mut self, key: &[u8]) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        if !key_size_ok(self.alg, self.mode, key.len()) {
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

    /// Loads an inline IV, counter or nonce.
    ///
    /// ECB takes none. The stream cipher accepts a 12 or 16 byte nonce;
    /// every other mode wants exactly one cipher block.
    pub fn init_iv(&mut self, iv: &[u8]) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        if self.mode == CipherMode::Ecb {
            return Err(VaultError::InvalidMode);
        }
        if self.mode == CipherMode::Stream {
            if !matches!(iv.len(), 12 | 16) {
                return Err(VaultError::InvalidLength);
            }
            self.nonce_len = iv.len() as u8;
        } else if iv.len() != self.alg.iv_len() {
            return Err(VaultError::InvalidLength);
        }
        self.iv = IvRef::Inline(iv.to_vec());
        Ok(())
    }

    /// References an IV asset; the engine updates it in place across calls.
    pub fn init_iv_asset(&mut self, iv: &Asset<'_, C>) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        if self.mode == CipherMode::Ecb || self.mode == CipherMode::Stream {
            return Err(VaultError::InvalidMode);
        }
        self.iv = IvRef::Asset(iv.id());
        Ok(())
    }

    /// Sets the F8 freshness, bearer and direction inputs.
    pub fn set_f8(&mut self, fresh: [u8; 8], bearer: u8, direction: u8) -> VaultResult<()> {
        if self.mode != CipherMode::F8 {
            return Err(VaultError::InvalidMode);
        }
        self.f8_fresh = Some(fresh);
        self.f8_bearer = bearer;
        self.f8_direction = direction;
        Ok(())
    }

    fn run(&mut self, data: &[u8]) -> VaultResult<CipherRes> {
        let key = self.key.clone().ok_or(VaultError::InvalidState)?;
        let res = self.session.exchange(ServiceCmd::Cipher(CipherCmd {
            alg: self.alg,
            mode: self.mode,
            encrypt: self.encrypt,
            key,
            iv: self.iv.clone(),
            data: data.to_vec(),
            f8_fresh: self.f8_fresh,
            f8_bearer: self.f8_bearer,
            f8_direction: self.f8_direction,
            nonce_len: self.nonce_len,
        }))?;
        let ServiceRes::Cipher(res) = res else {
            return Err(VaultError::InternalError);
        };
        Ok(res)
    }

    /// Transforms a non-terminal fragment; must be nonempty whole blocks.
    ///
    /// Only chaining modes support this. `out` must hold `data.len()`
    /// bytes.
    pub fn update(&mut self, data: &[u8], out: &mut [u8]) -> VaultResult<usize> {
        if self.phase == Phase::Done {
            return Err(VaultError::InvalidState);
        }
        if !chains(self.mode) {
            return Err(VaultError::InvalidMode);
        }
        let block = self.alg.block_len();
        if data.is_empty() || data.len() % block != 0 {
            return Err(VaultError::InvalidLength);
        }
        if out.len() < data.len() {
            return Err(VaultError::BufferTooSmall { required: data.len() });
        }
        let mut written = 0;
        for fragment in data.chunks(block_cap(block)) {
            let res = self.run(fragment)?;
            out[written..written + res.data.len()].copy_from_slice(&res.data);
            written += res.data.len();
            // Inline chaining state comes back in the response; an asset
            // IV was already advanced engine-side.
            if let Some(next) = res.iv {
                self.iv = IvRef::Inline(next);
            }
            self.phase = Phase::Active;
        }
        Ok(written)
    }

    /// Transforms the final fragment and closes the context.
    pub fn finish(&mut self, data: &[u8], out: &mut [u8]) -> VaultResult<usize> {
        if self.phase == Phase::Done {
            return Err(VaultError::InvalidState);
        }
        if self.phase == Phase::Active && !chains(self.mode) {
            return Err(VaultError::InvalidState);
        }
        let ok = match self.mode {
            CipherMode::Ecb | CipherMode::Cbc => {
                !data.is_empty() && data.len() % self.alg.block_len() == 0
            }
            CipherMode::Xts => data.len() >= 16,
            _ => !data.is_empty(),
        };
        if !ok {
            return Err(VaultError::InvalidLength);
        }
        if out.len() < data.len() {
            return Err(VaultError::BufferTooSmall { required: data.len() });
        }
        let mut tail = data;
        let mut written = 0;
        if chains(self.mode) {
            let cap = block_cap(self.alg.block_len());
            while tail.len() > cap {
                written += self.update(&tail[..cap], &mut out[written..])?;
                tail = &tail[cap..];
            }
        }
        let res = self.run(tail)?;
        out[written..written + res.data.len()].copy_from_slice(&res.data);
        written += res.data.len();
        self.phase = Phase::Done;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_table() {
        assert!(mode_ok(CipherAlg::Aes, CipherMode::Xts));
        assert!(mode_ok(CipherAlg::TripleDes, CipherMode::Cbc));
        assert!(!mode_ok(CipherAlg::TripleDes, CipherMode::Ctr));
        assert!(!mode_ok(CipherAlg::ChaCha20, CipherMode::Cbc));
        assert!(mode_ok(CipherAlg::ChaCha20, CipherMode::Stream));
    }

    #[test]
    fn xts_key_sizes() {
        assert!(key_size_ok(CipherAlg::Aes, CipherMode::Xts, 64));
        assert!(!key_size_ok(CipherAlg::Aes, CipherMode::Xts, 24));
        assert!(key_size_ok(CipherAlg::Aes, CipherMode::Cbc, 24));
    }
}
