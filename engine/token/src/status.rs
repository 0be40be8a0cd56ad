// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Engine result codes.

use strum_macros::FromRepr;

/// Result code reported by the engine in every result token.
///
/// The set is closed: the engine firmware reports codes from this list and
/// nothing else. Decoding an out-of-range word therefore signals a protocol
/// fault, which [`EngineStatus::from_code`] surfaces as `None` so the caller
/// can collapse it to an unknown-error kind instead of guessing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(i32)]
pub enum EngineStatus {
    /// Operation completed.
    Success = 0,
    /// Command token malformed or its opcode/subcode unknown.
    InvalidToken = -1,
    /// A parameter failed the engine's range or consistency checks.
    InvalidParameter = -2,
    /// Key length not acceptable for the selected algorithm.
    InvalidKeySize = -3,
    /// Data length not acceptable (alignment or bounds).
    InvalidLength = -4,
    /// Referenced asset does not exist or its policy forbids the use.
    InvalidAsset = -5,
    /// Asset store exhausted.
    StorageFull = -6,
    /// Resource is locked by another claimant.
    Busy = -7,
    /// Signature, MAC, or integrity check did not match.
    VerifyError = -8,
    /// Operation is not valid in the object's current state.
    InvalidState = -9,
    /// Subsystem has not been configured yet.
    NotInitialized = -10,
    /// Caller provenance does not satisfy the asset's policy.
    AccessError = -11,
    /// Engine detected an unrecoverable internal fault.
    Panic = -15,
}

impl EngineStatus {
    /// Decodes a raw result word; `None` for codes outside the closed set.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_repr(code)
    }

    /// Raw result word.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// True when the result token reports success.
    pub fn is_success(self) -> bool {
        self == EngineStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_round_trip() {
        for status in [
            EngineStatus::Success,
            EngineStatus::InvalidToken,
            EngineStatus::InvalidParameter,
            EngineStatus::InvalidKeySize,
            EngineStatus::InvalidLength,
            EngineStatus::InvalidAsset,
            EngineStatus::StorageFull,
            EngineStatus::Busy,
            EngineStatus::VerifyError,
            EngineStatus::InvalidState,
            EngineStatus::NotInitialized,
            EngineStatus::AccessError,
            EngineStatus::Panic,
        ] {
            assert_eq!(EngineStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(EngineStatus::from_code(-1000), None);
        assert_eq!(EngineStatus::from_code(1), None);
    }
}
