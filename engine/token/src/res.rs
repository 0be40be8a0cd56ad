// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Result tokens.
//!
//! Every command produces exactly one [`TokenRes`]. The [`ServiceRes`]
//! payload mirrors [`ServiceCmd`](crate::ServiceCmd); commands whose only
//! outcome is their status map to [`ServiceRes::None`].

use core::fmt;

use crate::AssetId;
use crate::EngineStatus;
use crate::Identity;

/// Three-part component version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Version {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Patch level.
    pub patch: u8,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Engine identification and health, from the system-information service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemInfo {
    /// Firmware version.
    pub firmware: Version,
    /// Hardware version.
    pub hardware: Version,
    /// Asset store size in bytes.
    pub mem_size: u32,
    /// Identity the engine binds this channel's commands to.
    pub self_identity: Identity,
    /// Nonzero when the engine detected a one-time-programmable memory
    /// anomaly at boot.
    pub otp_anomaly: u8,
}

/// Cipher transform output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherRes {
    /// Transformed data, same length as the input.
    pub data: Vec<u8>,
    /// Chained IV for the feedback modes when the command carried the IV
    /// inline; `None` when the IV lives in an asset.
    pub iv: Option<Vec<u8>>,
}

/// Authenticated-encryption output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthCryptRes {
    /// Transformed payload.
    pub data: Vec<u8>,
    /// Authentication tag; present on encrypt only.
    pub tag: Option<Vec<u8>>,
}

/// Secure timer state after a timer command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecureTimerRes {
    /// Timer asset, newly allocated on a bare start.
    pub asset: AssetId,
    /// Elapsed count; zero after a start.
    pub count: u32,
}

/// Signature operation output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkSignVerifyRes {
    /// Produced signature in wire vector form; empty on verify and on the
    /// non-final EdDSA phases.
    pub signature: Vec<u8>,
    /// Chaining state asset allocated by the first EdDSA phase.
    pub state: Option<AssetId>,
}

/// Key generation output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkGenKeyRes {
    /// Public half in wire vector form, when requested.
    pub public: Option<Vec<u8>>,
    /// Key blob of the private half, when an export was requested.
    pub blob: Option<Vec<u8>>,
}

/// Full intermediate set of the Milenage f1..f5* functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MilenageConformance {
    /// f2 response.
    pub res: [u8; 8],
    /// f3 confidentiality key.
    pub ck: [u8; 16],
    /// f4 integrity key.
    pub ik: [u8; 16],
    /// f1 network authentication code.
    pub mac_a: [u8; 8],
    /// f1* resynchronization authentication code.
    pub mac_s: [u8; 8],
    /// f5 anonymity key.
    pub ak: [u8; 6],
    /// f5* resynchronization anonymity key.
    pub ak_star: [u8; 6],
    /// Derived operator constant.
    pub opc: [u8; 16],
}

/// Milenage operation output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MilenageRes {
    /// Administration result: the created asset or the exported blob.
    SqnAdmin {
        /// Created SQN administration asset.
        asset: Option<AssetId>,
        /// Exported key blob; empty unless an export was requested.
        blob: Vec<u8>,
    },
    /// Successful AUTN verification.
    Autn {
        /// f2 response.
        res: [u8; 8],
        /// f3 confidentiality key.
        ck: [u8; 16],
        /// f4 integrity key.
        ik: [u8; 16],
        /// Sequence number recovered from the AUTN.
        sqn: [u8; 6],
        /// Authentication management field recovered from the AUTN.
        amf: [u8; 2],
    },
    /// Sequence-number rejection from the tracking flavor; travels with a
    /// verify-failure status.
    AutnReject {
        /// EMM cause reported by the engine.
        cause: u8,
        /// Resynchronization token for the network.
        auts: [u8; 14],
    },
    /// Generated resynchronization token.
    Auts {
        /// The AUTS value.
        auts: [u8; 14],
    },
    /// Conformance vector.
    Conformance(Box<MilenageConformance>),
}

/// The result payload matching a [`ServiceCmd`](crate::ServiceCmd).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceRes {
    /// No payload beyond the status.
    None,
    /// Hash fragment output.
    Hash {
        /// Final digest; empty on continuations.
        digest: Vec<u8>,
        /// Updated embedded state, for contexts that carry state inline.
        state: Option<Vec<u8>>,
    },
    /// MAC fragment output.
    Mac {
        /// Final MAC; empty on continuations and verifications.
        mac: Vec<u8>,
        /// Updated embedded state, for contexts that carry state inline.
        state: Option<Vec<u8>>,
    },
    /// Cipher output.
    Cipher(CipherRes),
    /// AEAD output.
    AuthCrypt(AuthCryptRes),
    /// Located static asset.
    AssetSearch {
        /// Asset id bound to the static number.
        asset: AssetId,
        /// Asset length in bytes.
        length: usize,
    },
    /// Newly allocated asset.
    AssetCreate {
        /// The new asset.
        asset: AssetId,
    },
    /// Load output.
    AssetLoad {
        /// Key blob, when the load requested an export.
        blob: Option<Vec<u8>>,
    },
    /// Public data content.
    PublicData {
        /// Asset content.
        data: Vec<u8>,
    },
    /// Monotonic counter value.
    MonotonicRead {
        /// Counter content, most significant byte first.
        data: Vec<u8>,
    },
    /// Timer state.
    SecureTimer(SecureTimerRes),
    /// Signature operation output.
    PkSignVerify(PkSignVerifyRes),
    /// Key generation output.
    PkGenKey(PkGenKeyRes),
    /// RSA wrap output.
    PkWrap {
        /// Wrapped blob; empty on unwrap.
        data: Vec<u8>,
    },
    /// EC ElGamal output points.
    PkEncrypt {
        /// Two points after encrypt, one after decrypt, wire vector form.
        data: Vec<u8>,
    },
    /// AES key wrap output.
    AesWrap {
        /// Wrapped or unwrapped data.
        data: Vec<u8>,
    },
    /// Random bytes.
    Random {
        /// The bytes.
        data: Vec<u8>,
    },
    /// eMMC/RPMB output.
    Emmc {
        /// Session state asset, from the request forms.
        state: Option<AssetId>,
        /// Engine nonce, from the request forms.
        nonce: Option<[u8; 16]>,
        /// Frame MAC, from the write-request form.
        mac: Option<[u8; 32]>,
    },
    /// Milenage output.
    Milenage(MilenageRes),
    /// Engine identification.
    SystemInfo(SystemInfo),
}

/// One result received from the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRes {
    /// Engine status code.
    pub status: EngineStatus,
    /// Service-specific payload; [`ServiceRes::None`] on most failures.
    pub service: ServiceRes,
}

impl TokenRes {
    /// Failure result carrying only a status.
    pub fn from_status(status: EngineStatus) -> Self {
        TokenRes {
            status,
            service: ServiceRes::None,
        }
    }

    /// True when the engine reported success.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
