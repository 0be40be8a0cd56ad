// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

#![warn(missing_docs)]

//! Token channel interface library.
//!
//! A channel carries one command token to the crypto engine and brings one
//! result token back. Everything the driver knows about an engine goes
//! through [`TokenChannel::exchange`]; the concrete transport behind it
//! (simulator, mailbox hardware) is chosen by the [`TokenEngine`]
//! implementation that opened the channel.

mod error;

use std::cmp::Ordering;

pub use error::ChannelError;
use sevault_token::TokenCmd;
use sevault_token::TokenRes;

/// Channel result.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Engine endpoint description.
#[derive(Clone, Debug)]
pub struct EngineInfo {
    /// Endpoint path.
    pub path: String,

    /// Engine model string.
    pub model: String,
}

impl Ord for EngineInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

impl PartialOrd for EngineInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EngineInfo {
    fn eq(&self, other: &Self) -> bool {
        self.path.eq(&other.path)
    }
}

impl Eq for EngineInfo {}

/// Crypto engine locator trait.
pub trait TokenEngine: Default {
    /// Channel type this engine hands out.
    type Channel: TokenChannel;

    /// Returns the reachable engine endpoints.
    fn engine_info_list(&self) -> Vec<EngineInfo>;

    /// Open a channel to the engine at `path`.
    ///
    /// # Arguments
    /// `path` - Endpoint path
    ///
    /// # Returns
    /// `Self::Channel` - Open channel
    ///
    /// # Error
    /// * `ChannelError` - Error encountered while opening the channel
    fn connect(&self, path: &str) -> ChannelResult<Self::Channel>;
}

/// Channel trait.
pub trait TokenChannel {
    /// Submit one command token and wait for its result token.
    ///
    /// Transport faults surface as [`ChannelError`]; everything the engine
    /// itself has to say, including rejections, comes back inside the
    /// result token's status.
    ///
    /// # Arguments
    /// * `cmd` - Command token
    ///
    /// # Returns
    /// * `TokenRes` - Result token
    ///
    /// # Error
    /// * `ChannelError` - Error encountered while exchanging the token
    fn exchange(&self, cmd: &TokenCmd) -> ChannelResult<TokenRes>;
}
