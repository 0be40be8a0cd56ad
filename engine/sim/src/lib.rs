// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

#![warn(missing_docs)]

//! Software rendition of the sevault crypto engine.
//!
//! [`SimEngine`] implements the token channel against an in-process model
//! of the device: a locked asset store, the streaming contexts, and the
//! full service set backed by OpenSSL primitives. Driver code written
//! against [`sevault_channel`] runs unchanged on the simulator and on
//! hardware; tests use the simulator as the engine of record.
//!
//! One [`SimEngine`] value models one device. Channels cloned from it share
//! the asset store and the exclusive-access claim, the same way concurrent
//! host contexts share a physical engine.

mod asym;
mod crypto;
mod dispatcher;
mod emmc;
mod errors;
mod milenage;
mod stream;
mod vault;

use std::sync::Arc;

use sevault_channel::ChannelError;
use sevault_channel::ChannelResult;
use sevault_channel::EngineInfo;
use sevault_channel::TokenChannel;
use sevault_channel::TokenEngine;
use sevault_token::TokenCmd;
use sevault_token::TokenRes;

use crate::dispatcher::SimCore;

/// Endpoint path the software engine answers to.
pub const SIM_ENGINE_PATH: &str = "sim:0";

/// Model string reported for the software engine.
pub const SIM_ENGINE_MODEL: &str = "sevault software engine";

/// Static asset number of the factory provisioning KEK.
///
/// The simulator ships with this slot programmed so that provisioning flows
/// (OTP writes, key blob imports) can run without a factory step.
pub const PROVISIONING_KEK_NUMBER: u8 = 1;

/// Static asset number of the pre-provisioned hardware unique key.
pub const HUK_NUMBER: u8 = 2;

/// Static asset number of the built-in Milenage subscriber key set
/// (3GPP TS 35.208 test set 1).
pub const MILENAGE_TEST_SET_NUMBER: u8 = 10;

/// Software crypto engine.
///
/// `Default` builds a freshly booted device: OTP catalog provisioned, TRNG
/// not yet configured, no dynamic assets.
#[derive(Clone, Debug, Default)]
pub struct SimEngine {
    core: Arc<SimCore>,
}

impl TokenEngine for SimEngine {
    type Channel = SimChannel;

    fn engine_info_list(&self) -> Vec<EngineInfo> {
        vec![EngineInfo {
            path: SIM_ENGINE_PATH.to_string(),
            model: SIM_ENGINE_MODEL.to_string(),
        }]
    }

    fn connect(&self, path: &str) -> ChannelResult<SimChannel> {
        if path != SIM_ENGINE_PATH {
            tracing::debug!(path, "no simulated engine at this path");
            return Err(ChannelError::EngineNotFound);
        }
        Ok(SimChannel {
            core: Arc::clone(&self.core),
        })
    }
}

/// Open channel to a [`SimEngine`].
#[derive(Clone, Debug)]
pub struct SimChannel {
    core: Arc<SimCore>,
}

impl TokenChannel for SimChannel {
    fn exchange(&self, cmd: &TokenCmd) -> ChannelResult<TokenRes> {
        // The in-process transport never faults; every outcome is a result
        // token.
        Ok(self.core.dispatch(cmd))
    }
}
