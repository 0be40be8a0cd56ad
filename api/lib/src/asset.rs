// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Asset management.
//!
//! An [`Asset`] is the driver's handle on one engine-resident storage slot:
//! a key, domain parameters, a counter, or temporary state. Handles own
//! their slot and delete it on drop; handles resolved from the static OTP
//! catalog borrow theirs and never delete.
//!
//! Every load flavor reports locally checkable mistakes (sizes, AAD bounds)
//! before any token leaves the host.

use sevault_channel::TokenChannel;
use sevault_token::keyblob_len;
use sevault_token::AssetCreateCmd;
use sevault_token::AssetDeleteCmd;
use sevault_token::AssetId;
use sevault_token::AssetLoadCmd;
use sevault_token::AssetLoadFlavor;
use sevault_token::AssetSearchCmd;
use sevault_token::ExportReq;
use sevault_token::Lifetime;
use sevault_token::PolicyMask;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::StaticAssetNumber;
use sevault_token::KEYBLOB_AAD_MAX;
use sevault_token::KEYBLOB_AAD_MIN;

use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

/// Largest asset the engine's store accepts, in bytes.
pub const MAX_ASSET_BYTES: usize = 4096;

/// Adds the non-secure-source marker for assets created by a non-secure
/// session; the engine requires it on everything such callers create.
pub(crate) fn source_policy<C: TokenChannel>(
    session: &Session<C>,
    base: PolicyMask,
) -> PolicyMask {
    if session.provenance().is_secure() {
        base
    } else {
        base | PolicyMask::SOURCE_NON_SECURE
    }
}

pub(crate) fn check_aad(aad: &[u8]) -> VaultResult<()> {
    if aad.len() < KEYBLOB_AAD_MIN || aad.len() > KEYBLOB_AAD_MAX {
        return Err(VaultError::InvalidParameter);
    }
    Ok(())
}

/// Handle on one engine-resident asset.
pub struct Asset<'a, C: TokenChannel> {
    session: &'a Session<C>,
    id: AssetId,
    length: usize,
    owned: bool,
}

impl<C: TokenChannel> Session<C> {
    /// Allocates an empty asset of `length` bytes under `policy`.
    ///
    /// The policy must not be empty and the length must be 1..=4096; both
    /// are checked locally. The engine answers [`VaultError::NoMemory`]
    /// when the store is exhausted.
    pub fn allocate_asset(
        &self,
        policy: PolicyMask,
        length: usize,
        lifetime: Lifetime,
    ) -> VaultResult<Asset<'_, C>> {
        if policy.is_empty() {
            return Err(VaultError::BadArgument);
        }
        if length == 0 || length > MAX_ASSET_BYTES {
            return Err(VaultError::BadArgument);
        }
        let res = self.exchange(ServiceCmd::AssetCreate(AssetCreateCmd {
            policy,
            length,
            lifetime,
        }))?;
        let ServiceRes::AssetCreate { asset } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(Asset {
            session: self,
            id: asset,
            length,
            owned: true,
        })
    }

    /// Resolves a provisioned catalog asset by its static number.
    ///
    /// The returned handle borrows the slot: dropping it leaves the asset
    /// in place.
    pub fn search_asset(&self, number: StaticAssetNumber) -> VaultResult<Asset<'_, C>> {
        let res = self.exchange(ServiceCmd::AssetSearch(AssetSearchCmd { number }))?;
        let ServiceRes::AssetSearch { asset, length } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(Asset {
            session: self,
            id: asset,
            length,
            owned: false,
        })
    }
}

impl<'a, C: TokenChannel> Asset<'a, C> {
    /// Engine id of this asset.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Asset length in bytes.
    pub fn len(&self) -> usize {
        self.length
    }

    /// True for zero-length handles; allocation forbids these, so only a
    /// degenerate search result could produce one.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(crate) fn session(&self) -> &'a Session<C> {
        self.session
    }

    /// Stops the handle from deleting on drop; for slots the engine
    /// consumes as a side effect of another command.
    pub(crate) fn disarm(&mut self) {
        self.owned = false;
    }

    fn load(&self, flavor: AssetLoadFlavor, export: Option<ExportReq>) -> VaultResult<Option<Vec<u8>>> {
        let res = self.session.exchange(ServiceCmd::AssetLoad(AssetLoadCmd {
            asset: self.id,
            flavor,
            export,
        }))?;
        let ServiceRes::AssetLoad { blob } = res else {
            return Err(VaultError::InternalError);
        };
        Ok(blob)
    }

    fn export_req(&self, kek: &Asset<'_, C>, aad: &[u8]) -> VaultResult<ExportReq> {
        check_aad(aad)?;
        Ok(ExportReq {
            kek: kek.id,
            aad: aad.to_vec(),
        })
    }

    /// Loads plaintext content; `data` must match the asset length exactly.
    pub fn load_plaintext(&self, data: &[u8]) -> VaultResult<()> {
        if data.len() != self.length {
            return Err(VaultError::BadArgument);
        }
        self.load(
            AssetLoadFlavor::Plaintext {
                data: data.to_vec(),
            },
            None,
        )?;
        Ok(())
    }

    /// As [`Asset::load_plaintext`], additionally returning the content
    /// wrapped under `kek` as a key blob (asset length + 16 bytes).
    pub fn load_plaintext_export(
        &self,
        data: &[u8],
        kek: &Asset<'_, C>,
        aad: &[u8],
    ) -> VaultResult<Vec<u8>> {
        if data.len() != self.length {
            return Err(VaultError::BadArgument);
        }
        let export = self.export_req(kek, aad)?;
        let blob = self.load(
            AssetLoadFlavor::Plaintext {
                data: data.to_vec(),
            },
            Some(export),
        )?;
        blob.ok_or(VaultError::InternalError)
    }

    /// Fills the asset from the engine TRNG.
    pub fn load_random(&self) -> VaultResult<()> {
        self.load(AssetLoadFlavor::Random, None)?;
        Ok(())
    }

    /// As [`Asset::load_random`], additionally returning the fresh content
    /// wrapped under `kek`.
    pub fn load_random_export(
        &self,
        kek: &Asset<'_, C>,
        aad: &[u8],
    ) -> VaultResult<Vec<u8>> {
        let export = self.export_req(kek, aad)?;
        let blob = self.load(AssetLoadFlavor::Random, Some(export))?;
        blob.ok_or(VaultError::InternalError)
    }

    /// Derives the content from a key-derivation parent with `label` as the
    /// derivation input.
    pub fn load_derive(&self, kdk: &Asset<'_, C>, label: &[u8]) -> VaultResult<()> {
        check_aad(label)?;
        self.load(
            AssetLoadFlavor::Derive {
                kdk: kdk.id,
                label: label.to_vec(),
            },
            None,
        )?;
        Ok(())
    }

    /// Imports a key blob produced by an export under the same `kek` and
    /// `aad`. The blob must be asset length + 16 bytes.
    pub fn load_import(
        &self,
        kek: &Asset<'_, C>,
        aad: &[u8],
        blob: &[u8],
    ) -> VaultResult<()> {
        check_aad(aad)?;
        if blob.len() != keyblob_len(self.length) {
            return Err(VaultError::InvalidLength);
        }
        self.load(
            AssetLoadFlavor::Import {
                kek: kek.id,
                aad: aad.to_vec(),
                blob: blob.to_vec(),
            },
            None,
        )?;
        Ok(())
    }

    /// Unwraps RFC 5649 wrapped key material directly into the asset.
    pub fn load_aes_unwrap(&self, kek: &Asset<'_, C>, blob: &[u8]) -> VaultResult<()> {
        self.load(
            AssetLoadFlavor::AesUnwrap {
                kek: kek.id,
                blob: blob.to_vec(),
            },
            None,
        )?;
        Ok(())
    }

    /// Deletes the asset now, reporting any engine rejection.
    ///
    /// Dropping an owned handle deletes too, but swallows errors.
    pub fn free(mut self) -> VaultResult<()> {
        self.owned = false;
        self.session
            .exchange(ServiceCmd::AssetDelete(AssetDeleteCmd { asset: self.id }))?;
        Ok(())
    }
}

impl<C: TokenChannel> Drop for Asset<'_, C> {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        let cmd = ServiceCmd::AssetDelete(AssetDeleteCmd { asset: self.id });
        if let Err(err) = self.session.exchange(cmd) {
            tracing::debug!(%err, asset = self.id.raw(), "asset delete on drop failed");
        }
    }
}

impl<C: TokenChannel> std::fmt::Debug for Asset<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("id", &self.id)
            .field("length", &self.length)
            .field("owned", &self.owned)
            .finish()
    }
}
