// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Public data reads.

use sevault_channel::TokenChannel;
use sevault_token::PublicDataCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;

use crate::asset::Asset;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

impl<C: TokenChannel> Session<C> {
    /// Reads a public-data asset into `out`, returning the byte count.
    ///
    /// The asset's policy must carry `PUBLIC_DATA`. A short `out` answers
    /// [`VaultError::BufferTooSmall`] with the required size before any
    /// token leaves the host.
    pub fn public_data_read(
        &self,
        asset: &Asset<'_, C>,
        out: &mut [u8],
    ) -> VaultResult<usize> {
        if out.len() < asset.len() {
            return Err(VaultError::BufferTooSmall {
                required: asset.len(),
            });
        }
        let res = self.exchange(ServiceCmd::PublicData(PublicDataCmd {
            asset: asset.id(),
        }))?;
        let ServiceRes::PublicData { data } = res else {
            return Err(VaultError::InternalError);
        };
        out[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}
