// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Secure timers.
//!
//! A timer lives in an engine-allocated asset and counts 100µs ticks or
//! whole seconds. The handle owns the asset and deletes it on drop.

use sevault_channel::TokenChannel;
use sevault_token::AssetDeleteCmd;
use sevault_token::AssetId;
use sevault_token::SecureTimerRes;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::TimerOp;

use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

/// Handle on one running or stopped engine timer.
pub struct Timer<'a, C: TokenChannel> {
    session: &'a Session<C>,
    id: AssetId,
    seconds: bool,
}

impl<C: TokenChannel> Session<C> {
    /// Allocates and starts a timer counting seconds or 100µs ticks.
    pub fn timer_start(&self, seconds: bool) -> VaultResult<Timer<'_, C>> {
        let res = self.timer_op(None, seconds, TimerOp::Start)?;
        Ok(Timer {
            session: self,
            id: res.asset,
            seconds,
        })
    }

    fn timer_op(
        &self,
        asset: Option<AssetId>,
        seconds: bool,
        op: TimerOp,
    ) -> VaultResult<SecureTimerRes> {
        let res = self.exchange(ServiceCmd::SecureTimer { asset, seconds, op })?;
        let ServiceRes::SecureTimer(timer) = res else {
            return Err(VaultError::InternalError);
        };
        Ok(timer)
    }
}

impl<C: TokenChannel> Timer<'_, C> {
    /// Engine id of the backing asset.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Restarts the timer from zero, keeping its tick unit.
    pub fn restart(&self) -> VaultResult<()> {
        self.session
            .timer_op(Some(self.id), self.seconds, TimerOp::Start)?;
        Ok(())
    }

    /// Reports the elapsed count without stopping.
    pub fn read(&self) -> VaultResult<u32> {
        let res = self
            .session
            .timer_op(Some(self.id), self.seconds, TimerOp::Read)?;
        Ok(res.count)
    }

    /// Stops the timer and reports the final count; a later
    /// [`Timer::restart`] runs it again.
    pub fn stop(&self) -> VaultResult<u32> {
        let res = self
            .session
            .timer_op(Some(self.id), self.seconds, TimerOp::Stop)?;
        Ok(res.count)
    }

    /// Deletes the timer now, reporting any engine rejection.
    pub fn free(self) -> VaultResult<()> {
        let id = self.id;
        let session = self.session;
        std::mem::forget(self);
        session.exchange(ServiceCmd::AssetDelete(AssetDeleteCmd { asset: id }))?;
        Ok(())
    }
}

impl<C: TokenChannel> Drop for Timer<'_, C> {
    fn drop(&mut self) {
        let cmd = ServiceCmd::AssetDelete(AssetDeleteCmd { asset: self.id });
        if let Err(err) = self.session.exchange(cmd) {
            tracing::debug!(%err, asset = self.id.raw(), "timer delete on drop failed");
        }
    }
}

impl<C: TokenChannel> std::fmt::Debug for Timer<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("seconds", &self.seconds)
            .finish()
    }
}
