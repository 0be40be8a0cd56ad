// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Streaming hash context.

use sevault_channel::TokenChannel;
use sevault_token::HashAlg;
use sevault_token::HashCmd;
use sevault_token::PolicyMask;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::StreamMode;
use sevault_token::StreamState;
use sevault_token::MAX_DMA_BYTES;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;
use crate::sym::block_cap;
use crate::sym::Phase;
use crate::sym::StreamSlot;
use crate::sym::TempState;

/// One running digest computation.
///
/// Allocate, feed whole blocks through [`HashContext::update`], close with
/// [`HashContext::finish`]. Allocation touches nothing engine-side; an
/// asset-backed context claims its temp asset on the first update.
pub struct HashContext<'a, C: TokenChannel> {
    session: &'a Session<C>,
    alg: HashAlg,
    slot: StreamSlot<'a, C>,
    total: u64,
    phase: Phase,
}

impl<'a, C: TokenChannel> HashContext<'a, C> {
    /// Creates a context for `alg` with the chosen state carrier.
    pub fn alloc(session: &'a Session<C>, alg: HashAlg, temp: TempState) -> Self {
        HashContext {
            session,
            alg,
            slot: StreamSlot::new(temp, PolicyMask::TEMP_MAC | alg.policy_bit(), alg.state_len()),
            total: 0,
            phase: Phase::Idle,
        }
    }

    /// The digest algorithm this context runs.
    pub fn algorithm(&self) -> HashAlg {
        self.alg
    }

    /// Message bytes absorbed so far.
    pub fn total_len(&self) -> u64 {
        self.total
    }

    fn absorb(&mut self, fragment: &[u8]) -> VaultResult<()> {
        let (mode, state) = match self.phase {
            Phase::Idle => (StreamMode::Init2Cont, self.slot.begin(self.session)?),
            Phase::Active => (StreamMode::Cont2Cont, self.slot.resume()?),
            Phase::Done => return Err(VaultError::InvalidState),
        };
        let res = self.session.exchange(ServiceCmd::Hash(HashCmd {
            alg: self.alg,
            mode,
            state,
            data: fragment.to_vec(),
            total_len: 0,
        }))?;
        let ServiceRes::Hash { state, .. } = res else {
            return Err(VaultError::InternalError);
        };
        self.slot.echo(state)?;
        self.phase = Phase::Active;
        self.total += fragment.len() as u64;
        Ok(())
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
        let cap = block_cap(block);
        for fragment in data.chunks(cap) {
            self.absorb(fragment)?;
        }
        Ok(())
    }

    /// Absorbs the final fragment and writes the digest into `digest`.
    ///
    /// Returns the digest length. A short buffer reports
    /// [`VaultError::BufferTooSmall`] without disturbing the stream.
    pub fn finish(&mut self, data: &[u8], digest: &mut [u8]) -> VaultResult<usize> {
        if self.phase == Phase::Done {
            return Err(VaultError::InvalidState);
        }
        let required = self.alg.digest_len();
        if digest.len() < required {
            return Err(VaultError::BufferTooSmall { required });
        }
        let mut tail = data;
        if tail.len() > MAX_DMA_BYTES {
            let block = self.alg.block_len();
            let absorbed = (tail.len() - MAX_DMA_BYTES).div_ceil(block) * block;
            self.update(&tail[..absorbed])?;
            tail = &tail[absorbed..];
        }
        let (mode, state) = match self.phase {
            Phase::Idle => (StreamMode::Init2Final, StreamState::None),
            Phase::Active => (StreamMode::Cont2Final, self.slot.resume()?),
            Phase::Done => unreachable!(),
        };
        let res = self.session.exchange(ServiceCmd::Hash(HashCmd {
            alg: self.alg,
            mode,
            state,
            data: tail.to_vec(),
            total_len: self.total + tail.len() as u64,
        }))?;
        let ServiceRes::Hash { digest: out, .. } = res else {
            return Err(VaultError::InternalError);
        };
        if out.len() != required {
            return Err(VaultError::InternalError);
        }
        digest[..required].copy_from_slice(&out);
        self.phase = Phase::Done;
        self.slot.clear();
        Ok(required)
    }

    /// Hands the running digest over to an asymmetric operation.
    ///
    /// Only an active asset-backed context can be consumed this way; the
    /// returned asset carries the intermediate state and dies with its
    /// handle.
    pub(crate) fn into_digest_state(self) -> VaultResult<(Asset<'a, C>, u64)> {
        if self.phase != Phase::Active {
            return Err(VaultError::InvalidState);
        }
        let total = self.total;
        Ok((self.slot.detach()?, total))
    }
}
