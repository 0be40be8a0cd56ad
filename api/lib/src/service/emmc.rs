// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Authenticated eMMC (RPMB) protocol endpoints.
//!
//! The host drives the storage device; the engine holds the 256-bit RPMB
//! authentication key and plays its half of the replay-protected protocol.
//! A request opens a session around a fresh nonce, the host relays the
//! device frames, and the verify calls check the device MACs against the
//! session. Write-capable sessions additionally produce the host-side MAC
//! for outgoing frames.
//!
//! A failed MAC check reports [`VaultError::VerifyError`] and leaves the
//! session open so the exchange can be retried; the consuming verify calls
//! close it only on success.

use sevault_channel::TokenChannel;
use sevault_token::AssetDeleteCmd;
use sevault_token::AssetId;
use sevault_token::EmmcOp;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

fn check_frames(data: &[u8]) -> VaultResult<()> {
    if data.is_empty() {
        return Err(VaultError::InvalidLength);
    }
    Ok(())
}

struct EmmcState<'a, C: TokenChannel> {
    session: &'a Session<C>,
    id: AssetId,
    nonce: [u8; 16],
    open: bool,
}

impl<'a, C: TokenChannel> EmmcState<'a, C> {
    fn open(
        session: &'a Session<C>,
        key: &Asset<'_, C>,
        op: fn(AssetId) -> EmmcOp,
    ) -> VaultResult<Self> {
        let res = session.exchange(ServiceCmd::Emmc(op(key.id())))?;
        let ServiceRes::Emmc {
            state: Some(id),
            nonce: Some(nonce),
            mac: None,
        } = res
        else {
            return Err(VaultError::InternalError);
        };
        Ok(EmmcState {
            session,
            id,
            nonce,
            open: true,
        })
    }

    /// Runs a verify form; `closes` marks the ops the engine deletes the
    /// session for on success.
    fn verify(&mut self, op: EmmcOp, closes: bool) -> VaultResult<()> {
        if !self.open {
            return Err(VaultError::InvalidState);
        }
        self.session.exchange(ServiceCmd::Emmc(op))?;
        if closes {
            self.open = false;
        }
        Ok(())
    }
}

impl<C: TokenChannel> Drop for EmmcState<'_, C> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let cmd = ServiceCmd::AssetDelete(AssetDeleteCmd { asset: self.id });
        if let Err(err) = self.session.exchange(cmd) {
            tracing::debug!(%err, asset = self.id.raw(), "session delete on drop failed");
        }
    }
}

/// One authenticated-read exchange against the device.
pub struct EmmcReadSession<'a, C: TokenChannel>(EmmcState<'a, C>);

/// One write-counter-plus-write exchange against the device.
pub struct EmmcWriteSession<'a, C: TokenChannel>(EmmcState<'a, C>);

impl<C: TokenChannel> Session<C> {
    /// Opens an authenticated read against the RPMB key in `key`.
    ///
    /// The key asset must be 32 bytes with the eMMC authentication policy.
    /// Send the returned nonce in the read request frame.
    pub fn emmc_read_request(&self, key: &Asset<'_, C>) -> VaultResult<EmmcReadSession<'_, C>> {
        let state = EmmcState::open(self, key, |key| EmmcOp::ReadRequest { key })?;
        Ok(EmmcReadSession(state))
    }

    /// Opens an authenticated write by reading the device write counter.
    pub fn emmc_counter_request(
        &self,
        key: &Asset<'_, C>,
    ) -> VaultResult<EmmcWriteSession<'_, C>> {
        let state = EmmcState::open(self, key, |key| EmmcOp::CounterRequest { key })?;
        Ok(EmmcWriteSession(state))
    }
}

impl<C: TokenChannel> EmmcReadSession<'_, C> {
    /// Nonce to place in the outgoing read request frame.
    pub fn nonce(&self) -> [u8; 16] {
        self.0.nonce
    }

    /// Checks the device MAC over the read response frames.
    ///
    /// The MAC covers `data` followed by the session nonce. Success closes
    /// the session; a mismatch leaves it open for a retried exchange.
    pub fn verify(&mut self, data: &[u8], mac: &[u8; 32]) -> VaultResult<()> {
        check_frames(data)?;
        self.0.verify(
            EmmcOp::ReadVerify {
                state: self.0.id,
                data: data.to_vec(),
                mac: *mac,
            },
            true,
        )
    }
}

impl<C: TokenChannel> EmmcWriteSession<'_, C> {
    /// Nonce to place in the outgoing counter request frame.
    pub fn nonce(&self) -> [u8; 16] {
        self.0.nonce
    }

    /// Checks the device MAC over the write-counter response.
    ///
    /// The MAC covers `data` followed by the session nonce. The session
    /// stays open either way: the verified counter feeds the write frames
    /// that follow.
    pub fn counter_verify(&mut self, data: &[u8], mac: &[u8; 32]) -> VaultResult<()> {
        check_frames(data)?;
        self.0.verify(
            EmmcOp::CounterVerify {
                state: self.0.id,
                data: data.to_vec(),
                mac: *mac,
            },
            false,
        )
    }

    /// Produces the host MAC for an outgoing write frame.
    pub fn write_request(&self, data: &[u8]) -> VaultResult<[u8; 32]> {
        check_frames(data)?;
        if !self.0.open {
            return Err(VaultError::InvalidState);
        }
        let res = self.0.session.exchange(ServiceCmd::Emmc(EmmcOp::WriteRequest {
            state: self.0.id,
            data: data.to_vec(),
        }))?;
        let ServiceRes::Emmc {
            state: None,
            nonce: None,
            mac: Some(mac),
        } = res
        else {
            return Err(VaultError::InternalError);
        };
        Ok(mac)
    }

    /// Checks the device MAC over the write result frame.
    ///
    /// The result frame carries no nonce; the MAC covers `data` alone.
    /// Success closes the session.
    pub fn write_verify(&mut self, data: &[u8], mac: &[u8; 32]) -> VaultResult<()> {
        check_frames(data)?;
        self.0.verify(
            EmmcOp::WriteVerify {
                state: self.0.id,
                data: data.to_vec(),
                mac: *mac,
            },
            true,
        )
    }
}
