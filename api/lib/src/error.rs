// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Driver error type and the total mapping from engine and channel faults.

use sevault_channel::ChannelError;
use sevault_token::EngineStatus;
use thiserror::Error;

/// Driver result.
pub type VaultResult<T> = Result<T, VaultError>;

/// Everything a driver operation can fail with.
///
/// Local validation failures, engine rejections and transport faults all
/// land here. [`VaultError::VerifyError`] and [`VaultError::BufferTooSmall`]
/// are expected recoverable outcomes rather than faults: a mismatched
/// signature is an answer, not an error in the exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// An argument failed validation or the engine rejected a reference.
    #[error("bad argument")]
    BadArgument,

    /// The algorithm is not valid for the operation or key.
    #[error("invalid algorithm")]
    InvalidAlgorithm,

    /// The mode is not valid for the algorithm or the context's state.
    #[error("invalid mode")]
    InvalidMode,

    /// A data length is out of range or misaligned.
    #[error("invalid length")]
    InvalidLength,

    /// The key size is not acceptable for the algorithm.
    #[error("invalid key size")]
    InvalidKeySize,

    /// Inconsistent parameter combination.
    #[error("invalid parameter")]
    InvalidParameter,

    /// The caller's output buffer is too short.
    #[error("buffer too small, {required} bytes required")]
    BufferTooSmall {
        /// Bytes the operation needs.
        required: usize,
    },

    /// The engine's asset store is exhausted.
    #[error("no memory")]
    NoMemory,

    /// The engine is claimed by another identity.
    #[error("busy")]
    Busy,

    /// A required subsystem has not been configured.
    #[error("not initialized")]
    NotInitialized,

    /// The operation is not valid in the object's current state.
    #[error("invalid state")]
    InvalidState,

    /// A signature, MAC or integrity check did not match.
    #[error("verify error")]
    VerifyError,

    /// The engine reported a result code outside its published set.
    #[error("unknown engine error")]
    Unknown,

    /// Transport fault or an internal engine fault.
    #[error("internal error")]
    InternalError,

    /// The token exchange timed out.
    #[error("timeout")]
    TimeoutError,
}

impl From<ChannelError> for VaultError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Timeout => VaultError::TimeoutError,
            ChannelError::EngineNotFound | ChannelError::LinkDown | ChannelError::IoError(_) => {
                VaultError::InternalError
            }
        }
    }
}

/// Maps a non-success engine status to the driver error.
///
/// The mapping is total: the engine's parameter, token and asset rejections
/// all collapse to [`VaultError::BadArgument`] (the reference was wrong,
/// whatever its exact shape), a panic becomes an internal fault, and a code
/// outside the published set becomes [`VaultError::Unknown`] with a warning.
pub(crate) fn status_error(status: EngineStatus) -> VaultError {
    match status {
        EngineStatus::Success => {
            // Callers only map failures; success never reaches this point.
            VaultError::Unknown
        }
        EngineStatus::InvalidToken
        | EngineStatus::InvalidParameter
        | EngineStatus::InvalidAsset
        | EngineStatus::AccessError => VaultError::BadArgument,
        EngineStatus::InvalidKeySize => VaultError::InvalidKeySize,
        EngineStatus::InvalidLength => VaultError::InvalidLength,
        EngineStatus::StorageFull => VaultError::NoMemory,
        EngineStatus::Busy => VaultError::Busy,
        EngineStatus::VerifyError => VaultError::VerifyError,
        EngineStatus::InvalidState => VaultError::InvalidState,
        EngineStatus::NotInitialized => VaultError::NotInitialized,
        EngineStatus::Panic => {
            tracing::warn!("engine reported an internal fault");
            VaultError::InternalError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_faults_collapse_to_two_kinds() {
        assert_eq!(
            VaultError::from(ChannelError::Timeout),
            VaultError::TimeoutError
        );
        assert_eq!(
            VaultError::from(ChannelError::LinkDown),
            VaultError::InternalError
        );
        assert_eq!(
            VaultError::from(ChannelError::EngineNotFound),
            VaultError::InternalError
        );
    }

    #[test]
    fn engine_rejections_map_totally() {
        assert_eq!(
            status_error(EngineStatus::InvalidParameter),
            VaultError::BadArgument
        );
        assert_eq!(
            status_error(EngineStatus::InvalidAsset),
            VaultError::BadArgument
        );
        assert_eq!(
            status_error(EngineStatus::AccessError),
            VaultError::BadArgument
        );
        assert_eq!(
            status_error(EngineStatus::VerifyError),
            VaultError::VerifyError
        );
        assert_eq!(status_error(EngineStatus::StorageFull), VaultError::NoMemory);
        assert_eq!(status_error(EngineStatus::Busy), VaultError::Busy);
        assert_eq!(
            status_error(EngineStatus::Panic),
            VaultError::InternalError
        );
    }
}
