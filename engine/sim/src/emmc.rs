// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Authenticated eMMC (RPMB) services.
//!
//! The engine never talks to the storage device itself; it holds the
//! authentication key and plays its half of the replay-protected protocol.
//! A request form mints a nonce and a session asset, the host relays the
//! device frames, and the verify forms check the device MACs against the
//! session. Write sessions additionally produce the host-side frame MAC.

use sevault_token::AssetId;
use sevault_token::EmmcOp;
use sevault_token::HashAlg;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;

use crate::crypto::mac::hmac;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;
use crate::vault::emmc_session_footprint;
use crate::vault::AssetAux;
use crate::vault::EmmcSession;

/// RPMB authentication keys are always 256 bits.
const AUTH_KEY_LEN: usize = 32;

/// Mints a session asset around a fresh nonce.
fn open_session(
    state: &mut EngineState,
    provenance: Provenance,
    key: AssetId,
    write_capable: bool,
) -> SimResult<ServiceRes> {
    let key = state
        .vault
        .key_content(key, PolicyMask::EMMC_AUTH_KEY, provenance)?;
    if key.len() != AUTH_KEY_LEN {
        return Err(SimError::InvalidKeySize);
    }
    let mut nonce = [0u8; 16];
    openssl::rand::rand_bytes(&mut nonce)?;
    let session = EmmcSession {
        write_capable,
        key,
        nonce,
    };
    let id = state.vault.create_engine(
        emmc_session_footprint(),
        provenance,
        AssetAux::Emmc(session),
    )?;
    Ok(ServiceRes::Emmc {
        state: Some(id),
        nonce: Some(nonce),
        mac: None,
    })
}

/// Loads a session, refusing assets from the other world or of another kind.
fn session_of(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
) -> SimResult<EmmcSession> {
    let asset = state.vault.lookup(id)?;
    if asset.origin != provenance {
        return Err(SimError::AccessError);
    }
    match &asset.aux {
        AssetAux::Emmc(session) => Ok(session.clone()),
        _ => Err(SimError::InvalidAsset),
    }
}

/// Checks a device MAC; the session survives a mismatch so the host can
/// retry the exchange.
fn check_frame_mac(session: &EmmcSession, data: &[u8], mac: &[u8; 32], nonce: bool) -> SimResult<()> {
    let mut covered = data.to_vec();
    if nonce {
        covered.extend_from_slice(&session.nonce);
    }
    let expect = hmac(HashAlg::Sha256, &session.key, &covered)?;
    if expect.len() != mac.len() || !openssl::memcmp::eq(&expect, mac) {
        tracing::debug!("device frame MAC did not match");
        return Err(SimError::VerifyError);
    }
    Ok(())
}

fn check_data(data: &[u8]) -> SimResult<()> {
    if data.is_empty() {
        return Err(SimError::InvalidLength);
    }
    Ok(())
}

/// Runs one eMMC protocol operation.
pub(crate) fn emmc_service(
    state: &mut EngineState,
    provenance: Provenance,
    op: &EmmcOp,
) -> SimResult<ServiceRes> {
    let none = ServiceRes::Emmc {
        state: None,
        nonce: None,
        mac: None,
    };
    match op {
        EmmcOp::ReadRequest { key } => open_session(state, provenance, *key, false),
        EmmcOp::ReadVerify {
            state: id,
            data,
            mac,
        } => {
            check_data(data)?;
            let session = session_of(state, provenance, *id)?;
            if session.write_capable {
                return Err(SimError::InvalidState);
            }
            check_frame_mac(&session, data, mac, true)?;
            state.vault.delete(*id, provenance)?;
            Ok(none)
        }
        EmmcOp::CounterRequest { key } => open_session(state, provenance, *key, true),
        EmmcOp::CounterVerify {
            state: id,
            data,
            mac,
        } => {
            check_data(data)?;
            let session = session_of(state, provenance, *id)?;
            if !session.write_capable {
                return Err(SimError::InvalidState);
            }
            // The session stays open: the verified counter feeds the write
            // frames that follow.
            check_frame_mac(&session, data, mac, true)?;
            Ok(none)
        }
        EmmcOp::WriteRequest { state: id, data } => {
            check_data(data)?;
            let session = session_of(state, provenance, *id)?;
            if !session.write_capable {
                return Err(SimError::InvalidState);
            }
            let mac = hmac(HashAlg::Sha256, &session.key, data)?;
            let mut out = [0u8; 32];
            out.copy_from_slice(&mac);
            Ok(ServiceRes::Emmc {
                state: None,
                nonce: None,
                mac: Some(out),
            })
        }
        EmmcOp::WriteVerify {
            state: id,
            data,
            mac,
        } => {
            check_data(data)?;
            let session = session_of(state, provenance, *id)?;
            if !session.write_capable {
                return Err(SimError::InvalidState);
            }
            // The write result frame carries no nonce; its MAC covers the
            // frame alone.
            check_frame_mac(&session, data, mac, false)?;
            state.vault.delete(*id, provenance)?;
            Ok(none)
        }
    }
}
