// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Streaming MAC context.

use sevault_channel::TokenChannel;
use sevault_token::HashCmd;
use sevault_token::KeyRef;
use sevault_token::MacAlg;
use sevault_token::MacCmd;
use sevault_token::MacRef;
use sevault_token::PolicyMask;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::StreamMode;
use sevault_token::StreamState;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;
use crate::sym::block_cap;
use crate::sym::Phase;
use crate::sym::StreamSlot;
use crate::sym::TempState;

const CMAC_KEY_SIZES: [usize; 3] = [16, 24, 32];

/// One running MAC computation.
///
/// Set the key before the first update. A generate final emits the MAC, a
/// verify final checks one and answers [`VaultError::VerifyError`] on
/// mismatch; both close the context.
pub struct MacContext<'a, C: TokenChannel> {
    session: &'a Session<C>,
    alg: MacAlg,
    key: Option<KeyRef>,
    slot: StreamSlot<'a, C>,
    total: u64,
    phase: Phase,
}

impl<'a, C: TokenChannel> MacContext<'a, C> {
    /// Creates a context for `alg` with the chosen state carrier.
    pub fn alloc(session: &'a Session<C>, alg: MacAlg, temp: TempState) -> Self {
        let alg_bit = match alg.hash() {
            Some(h) => h.policy_bit(),
            None => PolicyMask::CMAC,
        };
        MacContext {
            session,
            alg,
            key: None,
            slot: StreamSlot::new(temp, PolicyMask::TEMP_MAC | alg_bit, alg.state_len()),
            total: 0,
            phase: Phase::Idle,
        }
    }

    /// Loads an inline key.
    ///
    /// CMAC/CBC-MAC keys must be 16, 24 or 32 bytes. HMAC keys are 1..=block
    /// bytes inline; a longer key is compressed through an engine hash
    /// first, as the MAC construction defines.
    pub fn init_key(&mut self, key: &[u8]) -> VaultResult<()> {
        if self.phase != Phase::Idle {
            return Err(VaultError::InvalidState);
        }
        let inline = match self.alg.hash() {
            None => {
                if !CMAC_KEY_SIZES.contains(&key.len()) {
                    return Err(VaultError::InvalidKeySize);
                }
                key.to_vec()
            }
            Some(hash) => {
                if key.is_empty() {
                    return Err(VaultError::InvalidKeySize);
                }
                if key.len() <= hash.block_len() {
                    key.to_vec()
                } else {
                    let res = self.session.exchange(ServiceCmd::Hash(HashCmd {
                        alg: hash,
                        mode: StreamMode::Init2Final,
                        state: StreamState::None,
                        data: key.to_vec(),
                        total_len: key.len() as u64,
                    }))?;
                    let ServiceRes::Hash { digest, .. } = res else {
                        return Err(VaultError::InternalError);
                    };
                    digest
                }
            }
        };
        self.key = Some(KeyRef::Inline(inline));
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

    fn key_ref(&self) -> VaultResult<KeyRef> {
        self.key.clone().ok_or(VaultError::InvalidState)
    }

    fn run(
        &mut self,
        mode: StreamMode,
        state: StreamState,
        data: &[u8],
        total_len: u64,
        verify: Option<MacRef>,
    ) -> VaultResult<ServiceRes> {
        self.session.exchange(ServiceCmd::Mac(MacCmd {
            alg: self.alg,
            mode,
            key: self.key_ref()?,
            state,
            data: data.to_vec(),
            total_len,
            verify,
        }))
    }

    /// Absorbs a non-terminal fragment; must be nonempty whole blocks.
    pub fn update(&mut self, data: &[u8]) -> VaultResult<()> {
        if self.phase == Phase::Done {
            return Err(VaultError::InvalidState);
        }
        let block = self.alg.block_len();
        if data.is_empty() || data.len() % block != 0 {
            return Err(VaultError::InvalidLength);
        }
        for fragment in data.chunks(block_cap(block)) {
            let (mode, state) = match self.phase {
                Phase::Idle => (StreamMode::Init2Cont, self.slot.begin(self.session)?),
                Phase::Active => (StreamMode::Cont2Cont, self.slot.resume()?),
                Phase::Done => unreachable!(),
            };
            let res = self.run(mode, state, fragment, 0, None)?;
            let ServiceRes::Mac { state, .. } = res else {
                return Err(VaultError::InternalError);
            };
            self.slot.echo(state)?;
            self.phase = Phase::Active;
            self.total += fragment.len() as u64;
        }
        Ok(())
    }

    fn terminal(&mut self) -> VaultResult<(StreamMode, StreamState)> {
        match self.phase {
            Phase::Idle => Ok((StreamMode::Init2Final, StreamState::None)),
            Phase::Active => Ok((StreamMode::Cont2Final, self.slot.resume()?)),
            Phase::Done => Err(VaultError::InvalidState),
        }
    }

    /// Absorbs the final fragment and writes the MAC into `mac`.
    ///
    /// Returns the MAC length. A short buffer reports
    /// [`VaultError::BufferTooSmall`] without disturbing the stream.
    pub fn generate(&mut self, data: &[u8], mac: &mut [u8]) -> VaultResult<usize> {
        let required = self.alg.mac_len();
        if self.phase != Phase::Done && mac.len() < required {
            return Err(VaultError::BufferTooSmall { required });
        }
        let (mode, state) = self.terminal()?;
        let total = self.total + data.len() as u64;
        let res = self.run(mode, state, data, total, None)?;
        let ServiceRes::Mac { mac: out, .. } = res else {
            return Err(VaultError::InternalError);
        };
        if out.len() != required {
            return Err(VaultError::InternalError);
        }
        mac[..required].copy_from_slice(&out);
        self.phase = Phase::Done;
        self.slot.clear();
        Ok(required)
    }

    fn verify_with(&mut self, data: &[u8], reference: MacRef) -> VaultResult<()> {
        let (mode, state) = self.terminal()?;
        let total = self.total + data.len() as u64;
        let res = self.run(mode, state, data, total, Some(reference));
        // The context closes pass or fail; a mismatch is an answer.
        self.phase = Phase::Done;
        self.slot.clear();
        res?;
        Ok(())
    }

    /// Absorbs the final fragment and checks the expected MAC.
    ///
    /// [`VaultError::VerifyError`] on mismatch. The context closes either
    /// way.
    pub fn verify(&mut self, data: &[u8], mac: &[u8]) -> VaultResult<()> {
        if self.phase == Phase::Done {
            return Err(VaultError::InvalidState);
        }
        if mac.len() != self.alg.mac_len() {
            return Err(VaultError::InvalidLength);
        }
        self.verify_with(data, MacRef::Inline(mac.to_vec()))
    }

    /// As [`MacContext::verify`] with the expected MAC held in an asset.
    pub fn verify_asset(&mut self, data: &[u8], mac: &Asset<'_, C>) -> VaultResult<()> {
        if self.phase == Phase::Done {
            return Err(VaultError::InvalidState);
        }
        self.verify_with(data, MacRef::Asset(mac.id()))
    }
}
