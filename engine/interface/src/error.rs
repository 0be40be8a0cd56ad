// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Token channel interface library - Error module

use thiserror::Error;

/// Channel Error
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No engine answers at the given path
    #[error("engine not found")]
    EngineNotFound,

    /// Engine accepted the command but never produced a result
    #[error("token exchange timed out")]
    Timeout,

    /// Channel is no longer usable (engine reset or link torn down)
    #[error("channel link down")]
    LinkDown,

    /// IO error
    #[error("io error")]
    IoError(#[from] std::io::Error),
}
