// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Streaming symmetric crypto contexts.
//!
//! A context runs one computation over any number of calls: allocate, feed
//! updates, finish. Intermediate state either rides inside the tokens
//! ([`TempState::Embedded`]) or lives in a short-lived engine asset
//! ([`TempState::AssetBacked`]); the choice is made at allocation and the
//! context owns whatever it allocated, releasing it on finish or drop.
//!
//! Non-terminal updates must be nonempty whole blocks. Oversized calls are
//! split into engine-sized fragments internally; results match the
//! single-call computation.

pub mod aead;
pub mod cipher;
pub mod hash;
pub mod mac;

use sevault_channel::TokenChannel;
use sevault_token::Lifetime;
use sevault_token::PolicyMask;
use sevault_token::StreamState;
use sevault_token::MAX_DMA_BYTES;

use crate::asset::source_policy;
use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

pub use aead::AeadContext;
pub use cipher::CipherContext;
pub use hash::HashContext;
pub use mac::MacContext;

/// Where a context keeps its intermediate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TempState {
    /// State travels inside the tokens; nothing engine-resident.
    Embedded,
    /// State lives in a dedicated engine asset owned by the context.
    AssetBacked,
}

/// Largest block-aligned fragment one token can carry.
pub(crate) fn block_cap(block_len: usize) -> usize {
    MAX_DMA_BYTES - MAX_DMA_BYTES % block_len
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Active,
    Done,
}

enum Carrier<'a, C: TokenChannel> {
    Idle,
    Embedded(Vec<u8>),
    Backed(Asset<'a, C>),
}

/// State carrier shared by the hash and MAC contexts.
pub(crate) struct StreamSlot<'a, C: TokenChannel> {
    choice: TempState,
    policy: PolicyMask,
    state_len: usize,
    carrier: Carrier<'a, C>,
}

impl<'a, C: TokenChannel> StreamSlot<'a, C> {
    pub(crate) fn new(choice: TempState, policy: PolicyMask, state_len: usize) -> Self {
        StreamSlot {
            choice,
            policy,
            state_len,
            carrier: Carrier::Idle,
        }
    }

    /// Carrier for the stream-opening fragment; allocates the temp asset
    /// for asset-backed contexts.
    pub(crate) fn begin(&mut self, session: &'a Session<C>) -> VaultResult<StreamState> {
        match self.choice {
            TempState::Embedded => Ok(StreamState::Embedded(Vec::new())),
            TempState::AssetBacked => {
                let asset = session.allocate_asset(
                    source_policy(session, self.policy),
                    self.state_len,
                    Lifetime::Infinite,
                )?;
                let state = StreamState::Asset(asset.id());
                self.carrier = Carrier::Backed(asset);
                Ok(state)
            }
        }
    }

    /// Carrier for a continuation fragment.
    pub(crate) fn resume(&self) -> VaultResult<StreamState> {
        match &self.carrier {
            Carrier::Idle => Err(VaultError::InvalidState),
            Carrier::Embedded(bytes) => Ok(StreamState::Embedded(bytes.clone())),
            Carrier::Backed(asset) => Ok(StreamState::Asset(asset.id())),
        }
    }

    /// Stores the state echoed by a continuation result.
    pub(crate) fn echo(&mut self, state: Option<Vec<u8>>) -> VaultResult<()> {
        match self.choice {
            TempState::Embedded => {
                let bytes = state.ok_or(VaultError::InternalError)?;
                self.carrier = Carrier::Embedded(bytes);
                Ok(())
            }
            TempState::AssetBacked => Ok(()),
        }
    }

    /// Releases the carrier; the owned temp asset (if any) is deleted.
    pub(crate) fn clear(&mut self) {
        self.carrier = Carrier::Idle;
    }

    /// Surrenders the backing asset to the caller.
    pub(crate) fn detach(mut self) -> VaultResult<Asset<'a, C>> {
        match std::mem::replace(&mut self.carrier, Carrier::Idle) {
            Carrier::Backed(asset) => Ok(asset),
            _ => Err(VaultError::InvalidState),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_cap_is_aligned_and_maximal() {
        for block in [16usize, 64, 128] {
            let cap = block_cap(block);
            assert_eq!(cap % block, 0);
            assert!(cap <= MAX_DMA_BYTES);
            assert!(cap + block > MAX_DMA_BYTES);
        }
    }
}
