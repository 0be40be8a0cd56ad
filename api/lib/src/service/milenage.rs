// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Milenage (3GPP TS 35.205) authentication functions.
//!
//! The subscriber key set (K and OP) lives in a provisioned static asset;
//! the engine computes AUTN verification, AUTS resynchronization tokens and
//! the f1-f5* conformance vectors without the keys ever leaving it.
//!
//! Sequence-number tracking is optional: the static verify flavor checks
//! the MAC alone, while a [`SqnAdmin`] handle pins a strictly advancing
//! 48-bit sequence and answers stale challenges with a resynchronization
//! token.

use sevault_channel::TokenChannel;
use sevault_token::AssetDeleteCmd;
use sevault_token::AssetId;
use sevault_token::EngineStatus;
use sevault_token::MilenageConformance;
use sevault_token::MilenageOp;
use sevault_token::MilenageRes;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::StaticAssetNumber;

use crate::asset::check_aad;
use crate::asset::Asset;
use crate::error::status_error;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

/// Accepted authentication: the session keys and the challenge contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthVector {
    /// Signed response to send to the network.
    pub res: [u8; 8],
    /// Confidentiality key.
    pub ck: [u8; 16],
    /// Integrity key.
    pub ik: [u8; 16],
    /// Sequence number recovered from the challenge.
    pub sqn: [u8; 6],
    /// Authentication management field from the challenge.
    pub amf: [u8; 2],
}

/// Outcome of a sequence-tracking AUTN verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutnOutcome {
    /// The challenge verified and its sequence number advanced the tracker.
    Accepted(AuthVector),
    /// The MAC verified but the sequence number was stale; answer the
    /// network with the resynchronization token.
    Resync {
        /// Failure cause code.
        cause: u8,
        /// `AUTS` token carrying the tracked sequence.
        auts: [u8; 14],
    },
}

fn vector(res: [u8; 8], ck: [u8; 16], ik: [u8; 16], sqn: [u8; 6], amf: [u8; 2]) -> AuthVector {
    AuthVector {
        res,
        ck,
        ik,
        sqn,
        amf,
    }
}

/// Handle on one engine-resident sequence-number tracker.
///
/// The tracker is bound to the subscriber set it was created against and
/// starts at zero. The handle owns the asset and deletes it on drop.
pub struct SqnAdmin<'a, C: TokenChannel> {
    session: &'a Session<C>,
    id: AssetId,
}

impl<C: TokenChannel> Session<C> {
    fn milenage(&self, op: MilenageOp) -> VaultResult<MilenageRes> {
        let res = self.exchange(ServiceCmd::Milenage(op))?;
        let ServiceRes::Milenage(res) = res else {
            return Err(VaultError::InternalError);
        };
        Ok(res)
    }

    /// Creates a sequence-number tracker bound to the subscriber set at
    /// `number`.
    ///
    /// `amf_sb_test` makes verification additionally require the AMF
    /// separation bit in accepted challenges.
    pub fn milenage_sqn_admin(
        &self,
        number: StaticAssetNumber,
        amf_sb_test: bool,
    ) -> VaultResult<SqnAdmin<'_, C>> {
        let res = self.milenage(MilenageOp::SqnAdminCreate {
            number,
            amf_sb_test,
        })?;
        let MilenageRes::SqnAdmin {
            asset: Some(id), ..
        } = res
        else {
            return Err(VaultError::InternalError);
        };
        Ok(SqnAdmin { session: self, id })
    }

    /// Verifies a network challenge against the subscriber set at `number`
    /// without sequence tracking.
    ///
    /// A bad MAC answers [`VaultError::VerifyError`].
    pub fn milenage_autn_verify(
        &self,
        number: StaticAssetNumber,
        rand: &[u8; 16],
        autn: &[u8; 16],
    ) -> VaultResult<AuthVector> {
        let res = self.milenage(MilenageOp::AutnVerifyStatic {
            number,
            rand: *rand,
            autn: *autn,
        })?;
        let MilenageRes::Autn {
            res,
            ck,
            ik,
            sqn,
            amf,
        } = res
        else {
            return Err(VaultError::InternalError);
        };
        Ok(vector(res, ck, ik, sqn, amf))
    }

    /// Builds the `AUTS` resynchronization token for `sqn_ms` under the
    /// subscriber set at `number`.
    pub fn milenage_auts_generate(
        &self,
        number: StaticAssetNumber,
        rand: &[u8; 16],
        sqn_ms: &[u8; 6],
        amf: &[u8; 2],
    ) -> VaultResult<[u8; 14]> {
        let res = self.milenage(MilenageOp::AutsGenerate {
            number,
            rand: *rand,
            sqn_ms: *sqn_ms,
            amf: *amf,
        })?;
        let MilenageRes::Auts { auts } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(auts)
    }

    /// Runs the f1-f5* conformance computation over caller-supplied K and
    /// OP, reporting every intermediate output.
    ///
    /// For algorithm validation against published test sets only; real
    /// subscriber keys stay in their provisioned assets.
    pub fn milenage_conformance(
        &self,
        rand: &[u8; 16],
        sqn: &[u8; 6],
        amf: &[u8; 2],
        k: [u8; 16],
        op: [u8; 16],
    ) -> VaultResult<MilenageConformance> {
        let res = self.milenage(MilenageOp::Conformance {
            rand: *rand,
            sqn: *sqn,
            amf: *amf,
            k,
            op,
        })?;
        let MilenageRes::Conformance(conformance) = res else {
            return Err(VaultError::InternalError);
        };
        Ok(*conformance)
    }
}

impl<C: TokenChannel> SqnAdmin<'_, C> {
    /// Engine id of the tracker asset.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Resets the tracked sequence number to zero.
    pub fn reset(&self) -> VaultResult<()> {
        self.session
            .milenage(MilenageOp::SqnAdminReset { asset: self.id })?;
        Ok(())
    }

    /// Exports the tracker state as a key blob wrapped under `kek`.
    ///
    /// The tracker stays in place; the blob preserves the sequence across
    /// an engine reset.
    pub fn export(&self, kek: &Asset<'_, C>, aad: &[u8]) -> VaultResult<Vec<u8>> {
        check_aad(aad)?;
        let res = self.session.milenage(MilenageOp::SqnAdminExport {
            asset: self.id,
            kek: kek.id(),
            aad: aad.to_vec(),
        })?;
        let MilenageRes::SqnAdmin { asset: None, blob } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(blob)
    }

    /// Verifies a network challenge, advancing the tracked sequence.
    ///
    /// A stale sequence number with a good MAC is an answer, not a fault:
    /// it reports [`AutnOutcome::Resync`] with the token to send back. A
    /// bad MAC answers [`VaultError::VerifyError`].
    pub fn autn_verify(&self, rand: &[u8; 16], autn: &[u8; 16]) -> VaultResult<AutnOutcome> {
        let res = self
            .session
            .exchange_raw(ServiceCmd::Milenage(MilenageOp::AutnVerifySqn {
                sqn: self.id,
                rand: *rand,
                autn: *autn,
            }))?;
        // The stale-sequence rejection travels as a verify-failure status
        // that still carries the resynchronization payload.
        if res.status == EngineStatus::VerifyError {
            if let ServiceRes::Milenage(MilenageRes::AutnReject { cause, auts }) = res.service {
                return Ok(AutnOutcome::Resync { cause, auts });
            }
            return Err(VaultError::VerifyError);
        }
        if !res.is_success() {
            return Err(status_error(res.status));
        }
        let ServiceRes::Milenage(MilenageRes::Autn {
            res,
            ck,
            ik,
            sqn,
            amf,
        }) = res.service
        else {
            return Err(VaultError::InternalError);
        };
        Ok(AutnOutcome::Accepted(vector(res, ck, ik, sqn, amf)))
    }

    /// Deletes the tracker now, reporting any engine rejection.
    pub fn free(self) -> VaultResult<()> {
        let id = self.id;
        let session = self.session;
        std::mem::forget(self);
        session.exchange(ServiceCmd::AssetDelete(AssetDeleteCmd { asset: id }))?;
        Ok(())
    }
}

impl<C: TokenChannel> Drop for SqnAdmin<'_, C> {
    fn drop(&mut self) {
        let cmd = ServiceCmd::AssetDelete(AssetDeleteCmd { asset: self.id });
        if let Err(err) = self.session.exchange(cmd) {
            tracing::debug!(%err, asset = self.id.raw(), "tracker delete on drop failed");
        }
    }
}

impl<C: TokenChannel> std::fmt::Debug for SqnAdmin<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqnAdmin").field("id", &self.id).finish()
    }
}
