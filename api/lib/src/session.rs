// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Engine sessions.
//!
//! A [`Session`] couples an open token channel with the caller's identity
//! and security domain; every driver operation goes through it. Sessions are
//! cheap: open as many as needed against one engine, they all talk to the
//! same device state.

use sevault_channel::EngineInfo;
use sevault_channel::TokenChannel;
use sevault_channel::TokenEngine;
use sevault_token::ClaimOp;
use sevault_token::Identity;
use sevault_token::Provenance;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SystemInfo;
use sevault_token::TokenCmd;
use sevault_token::TokenRes;

use crate::error::status_error;
use crate::error::VaultError;
use crate::error::VaultResult;

/// Lists the engine endpoints an engine locator can reach.
pub fn engine_list<E: TokenEngine>(engine: &E) -> Vec<EngineInfo> {
    engine.engine_info_list()
}

/// One caller's connection to a crypto engine.
pub struct Session<C: TokenChannel> {
    channel: C,
    identity: Identity,
    provenance: Provenance,
}

impl<C: TokenChannel> Session<C> {
    /// Opens a session to the engine at `path`.
    ///
    /// `identity` names the caller for exclusive-access arbitration and is
    /// stamped into every token header. `provenance` is the security domain
    /// the caller runs in; the engine enforces asset policies against it.
    #[tracing::instrument(skip(engine))]
    pub fn open<E>(
        engine: &E,
        path: &str,
        identity: u32,
        provenance: Provenance,
    ) -> VaultResult<Self>
    where
        E: TokenEngine<Channel = C>,
    {
        let channel = engine.connect(path)?;
        let session = Session {
            channel,
            identity: Identity(identity),
            provenance,
        };
        // A no-op round trip proves the channel is live before the caller
        // builds anything on it.
        session.exchange(ServiceCmd::Nop)?;
        Ok(session)
    }

    /// The identity this session claims and signs tokens with.
    pub fn identity(&self) -> u32 {
        self.identity.0
    }

    /// The security domain this session operates from.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Runs one command and returns the full result token.
    ///
    /// Most callers want [`Session::exchange`]; this form is for the few
    /// services whose failure results still carry a payload.
    pub(crate) fn exchange_raw(&self, service: ServiceCmd) -> VaultResult<TokenRes> {
        let cmd = TokenCmd {
            identity: self.identity,
            provenance: self.provenance,
            service,
        };
        let (opcode, subcode) = cmd.opcode();
        let res = self.channel.exchange(&cmd)?;
        tracing::trace!(?opcode, subcode, status = ?res.status, "token exchange");
        Ok(res)
    }

    /// Runs one command, mapping any engine rejection to an error.
    pub(crate) fn exchange(&self, service: ServiceCmd) -> VaultResult<ServiceRes> {
        let res = self.exchange_raw(service)?;
        if !res.is_success() {
            return Err(status_error(res.status));
        }
        Ok(res.service)
    }

    /// Engine identification: firmware/hardware versions, asset store size
    /// and the identity the engine sees this session as.
    pub fn system_info(&self) -> VaultResult<SystemInfo> {
        let ServiceRes::SystemInfo(info) = self.exchange(ServiceCmd::SystemInfo)? else {
            return Err(VaultError::InternalError);
        };
        Ok(info)
    }

    /// Resets the engine: every non-OTP asset, stream and claim is dropped.
    ///
    /// Handles and contexts created before the reset are dead afterwards;
    /// using one reports whatever the engine says about the stale reference.
    #[tracing::instrument(skip(self))]
    pub fn system_reset(&self) -> VaultResult<()> {
        self.exchange(ServiceCmd::SystemReset)?;
        Ok(())
    }

    /// Claims exclusive access to the engine for this identity.
    ///
    /// Commands from other identities answer `Busy` until the claim guard
    /// releases. Claims nest: a session may claim again while holding.
    /// A claim held by another identity makes this fail with
    /// [`VaultError::Busy`].
    pub fn claim(&self) -> VaultResult<ClaimGuard<'_, C>> {
        self.exchange(ServiceCmd::Claim(ClaimOp::Claim))?;
        Ok(ClaimGuard {
            session: self,
            released: false,
        })
    }

    /// Seizes exclusive access even if another identity holds it.
    pub fn claim_overrule(&self) -> VaultResult<ClaimGuard<'_, C>> {
        self.exchange(ServiceCmd::Claim(ClaimOp::Overrule))?;
        Ok(ClaimGuard {
            session: self,
            released: false,
        })
    }
}

impl<C: TokenChannel> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("provenance", &self.provenance)
            .finish()
    }
}

/// Scoped exclusive access; releases the claim on drop.
#[must_use = "dropping the guard releases the claim immediately"]
pub struct ClaimGuard<'a, C: TokenChannel> {
    session: &'a Session<C>,
    released: bool,
}

impl<C: TokenChannel> ClaimGuard<'_, C> {
    /// Releases the claim, reporting any engine rejection.
    pub fn release(mut self) -> VaultResult<()> {
        self.released = true;
        self.session
            .exchange(ServiceCmd::Claim(ClaimOp::Release))?;
        Ok(())
    }
}

impl<C: TokenChannel> Drop for ClaimGuard<'_, C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.session.exchange(ServiceCmd::Claim(ClaimOp::Release)) {
            tracing::debug!(%err, "claim release on drop failed");
        }
    }
}
