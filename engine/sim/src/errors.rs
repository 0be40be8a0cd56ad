// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Software engine library - Error module.

use sevault_token::wire::WireError;
use sevault_token::EngineStatus;
use thiserror::Error;

/// Internal failure of a simulated service.
///
/// Every variant maps onto exactly one [`EngineStatus`] code; the dispatcher
/// performs that mapping when it builds the result token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Command token malformed or its opcode/subcode unknown.
    #[error("malformed or unsupported command token")]
    InvalidToken,

    /// A parameter failed a range or consistency check.
    #[error("parameter out of range")]
    InvalidParameter,

    /// Key length not acceptable for the selected algorithm.
    #[error("key size not supported")]
    InvalidKeySize,

    /// Data length not acceptable (alignment or bounds).
    #[error("data length not acceptable")]
    InvalidLength,

    /// Referenced asset missing, expired, or its policy refused the use.
    #[error("asset missing or policy refused")]
    InvalidAsset,

    /// Asset store exhausted.
    #[error("asset store full")]
    StorageFull,

    /// Channel locked by another identity.
    #[error("resource locked by another identity")]
    Busy,

    /// Signature, MAC, or integrity check did not match.
    #[error("verification failed")]
    VerifyError,

    /// Operation not valid for the object's current state.
    #[error("operation not valid in this state")]
    InvalidState,

    /// Subsystem has not been configured yet.
    #[error("subsystem not configured")]
    NotInitialized,

    /// Caller provenance refused by the asset's policy.
    #[error("provenance refused by policy")]
    AccessError,

    /// Crypto backend reported an unrecoverable fault.
    #[error("internal crypto backend failure")]
    Panic,
}

/// Result type used by the simulated services.
pub type SimResult<T> = Result<T, SimError>;

impl From<SimError> for EngineStatus {
    fn from(value: SimError) -> Self {
        match value {
            SimError::InvalidToken => EngineStatus::InvalidToken,
            SimError::InvalidParameter => EngineStatus::InvalidParameter,
            SimError::InvalidKeySize => EngineStatus::InvalidKeySize,
            SimError::InvalidLength => EngineStatus::InvalidLength,
            SimError::InvalidAsset => EngineStatus::InvalidAsset,
            SimError::StorageFull => EngineStatus::StorageFull,
            SimError::Busy => EngineStatus::Busy,
            SimError::VerifyError => EngineStatus::VerifyError,
            SimError::InvalidState => EngineStatus::InvalidState,
            SimError::NotInitialized => EngineStatus::NotInitialized,
            SimError::AccessError => EngineStatus::AccessError,
            SimError::Panic => EngineStatus::Panic,
        }
    }
}

impl From<openssl::error::ErrorStack> for SimError {
    fn from(openssl_error_stack: openssl::error::ErrorStack) -> Self {
        tracing::error!(?openssl_error_stack, "crypto backend failure");
        SimError::Panic
    }
}

impl From<WireError> for SimError {
    fn from(wire_error: WireError) -> Self {
        tracing::error!(?wire_error, "malformed wire vector");
        SimError::InvalidParameter
    }
}

impl From<rsa_encoding::EncodeError> for SimError {
    fn from(encode_error: rsa_encoding::EncodeError) -> Self {
        match encode_error {
            rsa_encoding::EncodeError::InvalidParameter => SimError::InvalidParameter,
            rsa_encoding::EncodeError::RngFailure => {
                tracing::error!("random source failed during RSA encoding");
                SimError::Panic
            }
        }
    }
}
