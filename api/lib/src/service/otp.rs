// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! One-time programmable provisioning.
//!
//! OTP writes program a static catalog slot exactly once: the content
//! arrives as a key blob wrapped under the provisioning KEK, the policy is
//! picked from the engine's fixed policy table by number, and a second
//! write to the same slot answers [`VaultError::InvalidState`].

use sevault_channel::TokenChannel;
use sevault_token::AssetId;
use sevault_token::OtpWriteCmd;
use sevault_token::ProvisionHukCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::StaticAssetNumber;
use sevault_token::TrngConfigCmd;

use crate::asset::check_aad;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

impl<C: TokenChannel> Session<C> {
    /// Programs a static catalog slot from a key blob.
    ///
    /// `blob` must be wrapped under the engine's provisioning KEK with
    /// `aad` as associated data; `policy_number` selects from the engine's
    /// OTP policy table. `add_crc` appends a validation CRC to the
    /// programmed item.
    #[tracing::instrument(skip(self, blob, aad), fields(number = number.get()))]
    pub fn otp_write(
        &self,
        number: StaticAssetNumber,
        policy_number: u32,
        add_crc: bool,
        blob: &[u8],
        aad: &[u8],
    ) -> VaultResult<()> {
        check_aad(aad)?;
        self.exchange(ServiceCmd::OtpWrite(OtpWriteCmd {
            number,
            policy_number,
            add_crc,
            blob: blob.to_vec(),
            aad: aad.to_vec(),
        }))?;
        Ok(())
    }

    /// Provisions a random hardware unique key into OTP.
    ///
    /// The engine applies `trng` before sampling, so a cold generator can
    /// be started in the same call. The key is 256-bit unless `bits_128`;
    /// the programmed slot carries the derive policy and is resolvable with
    /// [`Session::search_asset`] afterwards.
    #[tracing::instrument(skip(self, trng), fields(number = number.get()))]
    pub fn provision_huk(
        &self,
        number: StaticAssetNumber,
        bits_128: bool,
        add_crc: bool,
        trng: TrngConfigCmd,
    ) -> VaultResult<AssetId> {
        let res = self.exchange(ServiceCmd::ProvisionHuk(ProvisionHukCmd {
            number,
            bits_128,
            add_crc,
            trng,
        }))?;
        let ServiceRes::AssetCreate { asset } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(asset)
    }
}
