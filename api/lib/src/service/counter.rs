// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Monotonic counters.
//!
//! A counter is an asset whose policy carries `MONOTONIC`. The value is the
//! whole asset content, a big-endian integer as wide as the asset, and the
//! engine only ever moves it forward.

use sevault_channel::TokenChannel;
use sevault_token::MonotonicIncrementCmd;
use sevault_token::MonotonicReadCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

impl<C: TokenChannel> Session<C> {
    /// Reads a monotonic counter; the value is big-endian, asset-width.
    pub fn monotonic_read(&self, counter: &Asset<'_, C>) -> VaultResult<Vec<u8>> {
        let res = self.exchange(ServiceCmd::MonotonicRead(MonotonicReadCmd {
            asset: counter.id(),
        }))?;
        let ServiceRes::MonotonicRead { data } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(data)
    }

    /// Advances a monotonic counter by one.
    pub fn monotonic_increment(&self, counter: &Asset<'_, C>) -> VaultResult<()> {
        self.exchange(ServiceCmd::MonotonicIncrement(MonotonicIncrementCmd {
            asset: counter.id(),
        }))?;
        Ok(())
    }
}
