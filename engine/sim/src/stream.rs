// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Streaming contexts.
//!
//! The hardware checkpoints a running digest or MAC either into the token
//! (embedded state the caller carries between calls) or into an asset. The
//! simulator instead accumulates the raw message fragments here and runs the
//! primitive once at the final call; the embedded state it hands out is a
//! fixed-size opaque cookie of the algorithm's advertised state length, so
//! callers see the same byte counts the device would produce.

use std::collections::HashMap;

use sevault_token::AssetId;
use sevault_token::StreamState;

use crate::errors::SimError;
use crate::errors::SimResult;

const EMBEDDED_BIT: u64 = 1 << 32;

fn asset_key(id: AssetId) -> u64 {
    u64::from(id.raw())
}

fn embedded_key(cookie: u32) -> u64 {
    EMBEDDED_BIT | u64::from(cookie)
}

fn embedded_bytes(cookie: u32, state_len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; state_len];
    bytes[..4].copy_from_slice(&cookie.to_le_bytes());
    bytes
}

/// Open streaming contexts, keyed by cookie or backing asset.
#[derive(Debug, Default)]
pub(crate) struct StreamTable {
    slots: HashMap<u64, Vec<u8>>,
    next_cookie: u32,
}

impl StreamTable {
    fn mint(&mut self) -> u32 {
        self.next_cookie = self.next_cookie.wrapping_add(1);
        self.next_cookie
    }

    fn resume_key(&self, state: &StreamState, state_len: usize) -> SimResult<u64> {
        match state {
            StreamState::Embedded(bytes) => {
                if bytes.len() != state_len {
                    return Err(SimError::InvalidParameter);
                }
                let mut cookie = [0u8; 4];
                cookie.copy_from_slice(&bytes[..4]);
                Ok(embedded_key(u32::from_le_bytes(cookie)))
            }
            StreamState::Asset(id) => Ok(asset_key(*id)),
            StreamState::None => Err(SimError::InvalidParameter),
        }
    }

    /// Opens a context for an init-to-continue fragment.
    ///
    /// Returns the embedded state bytes to echo when the caller chose the
    /// embedded carrier, `None` for asset-backed state.
    pub(crate) fn start(
        &mut self,
        state: &StreamState,
        state_len: usize,
        data: &[u8],
    ) -> SimResult<Option<Vec<u8>>> {
        match state {
            StreamState::Embedded(prior) => {
                if !prior.is_empty() {
                    return Err(SimError::InvalidParameter);
                }
                let cookie = self.mint();
                self.slots.insert(embedded_key(cookie), data.to_vec());
                Ok(Some(embedded_bytes(cookie, state_len)))
            }
            StreamState::Asset(id) => {
                let key = asset_key(*id);
                if self.slots.contains_key(&key) {
                    return Err(SimError::InvalidState);
                }
                self.slots.insert(key, data.to_vec());
                Ok(None)
            }
            StreamState::None => Err(SimError::InvalidParameter),
        }
    }

    /// Absorbs a middle fragment, echoing the embedded state when present.
    pub(crate) fn append(
        &mut self,
        state: &StreamState,
        state_len: usize,
        data: &[u8],
    ) -> SimResult<Option<Vec<u8>>> {
        let key = self.resume_key(state, state_len)?;
        let slot = self.slots.get_mut(&key).ok_or(SimError::InvalidState)?;
        slot.extend_from_slice(data);
        match state {
            StreamState::Embedded(bytes) => Ok(Some(bytes.clone())),
            _ => Ok(None),
        }
    }

    /// Closes a context and returns everything absorbed so far.
    pub(crate) fn finish(&mut self, state: &StreamState, state_len: usize) -> SimResult<Vec<u8>> {
        let key = self.resume_key(state, state_len)?;
        self.slots.remove(&key).ok_or(SimError::InvalidState)
    }

    /// Takes the context backing `id` directly, for the asymmetric services
    /// that finish a pre-hashed message.
    pub(crate) fn take_asset(&mut self, id: AssetId) -> SimResult<Vec<u8>> {
        self.slots
            .remove(&asset_key(id))
            .ok_or(SimError::InvalidState)
    }

    /// Drops the context backing a deleted asset, if any.
    pub(crate) fn drop_asset_slot(&mut self, id: AssetId) {
        self.slots.remove(&asset_key(id));
    }

    /// Drops every open context.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}
