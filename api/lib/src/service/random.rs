// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Random data and TRNG control.
//!
//! The generator starts cold: random output, random asset loads and HUK
//! provisioning all answer [`VaultError::NotInitialized`] until a
//! configuration with `load_start` set has been applied.

use sevault_channel::TokenChannel;
use sevault_token::RandomCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::TrngConfigCmd;

use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

/// Largest random request one token answers.
pub const MAX_RANDOM_BYTES: usize = 65535;

impl<C: TokenChannel> Session<C> {
    /// Applies a TRNG configuration.
    ///
    /// `load_start` loads the sampling parameters and starts the generator;
    /// `reseed` forces an immediate DRBG reseed and needs a running
    /// generator.
    pub fn trng_config(&self, cfg: TrngConfigCmd) -> VaultResult<()> {
        self.exchange(ServiceCmd::TrngConfig(cfg))?;
        Ok(())
    }

    /// Fetches `size` random bytes, 1..=65535.
    pub fn random(&self, size: usize) -> VaultResult<Vec<u8>> {
        if size == 0 || size > MAX_RANDOM_BYTES {
            return Err(VaultError::BadArgument);
        }
        let res = self.exchange(ServiceCmd::Random(RandomCmd { size }))?;
        let ServiceRes::Random { data } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(data)
    }
}
