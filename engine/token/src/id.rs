// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Identifier and attribute primitives shared by command and result tokens.

use std::num::NonZeroU32;

/// Handle to an engine-resident asset.
///
/// Handles are opaque nonzero words minted by the engine; zero is the
/// engine's "no asset" marker, which Rust callers express as
/// `Option<AssetId>` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(NonZeroU32);

impl AssetId {
    /// Wraps a raw engine word, returning `None` for the null handle.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw engine word for this handle.
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Raw engine word for an optional handle, zero when absent.
pub fn asset_word(asset: Option<AssetId>) -> u32 {
    asset.map_or(0, AssetId::raw)
}

/// Catalog number of a factory-provisioned (static) asset.
///
/// The engine addresses its one-time-programmable catalog with 6-bit
/// numbers; construction enforces the range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticAssetNumber(u8);

impl StaticAssetNumber {
    /// Highest addressable catalog slot.
    pub const MAX: u8 = 63;

    /// Builds a catalog number, rejecting values beyond the 6-bit range.
    pub fn new(number: u8) -> Option<Self> {
        (number <= Self::MAX).then_some(Self(number))
    }

    /// Raw catalog slot.
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Caller provenance carried by every command token.
///
/// The engine grants or refuses certain policies based on whether the
/// request originated from the secure world; the driver stamps this from its
/// session configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provenance {
    /// Request issued from the secure world.
    Secure,
    /// Request issued from the non-secure world.
    #[default]
    NonSecure,
}

impl Provenance {
    /// True for the secure world.
    pub fn is_secure(self) -> bool {
        matches!(self, Provenance::Secure)
    }
}

/// Caller identity used for exclusive-access claims.
///
/// Identities distinguish claimants of the channel lock; each session picks
/// one at open time and stamps it into every command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity(pub u32);

/// Lifetime attribute for an allocated asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifetime {
    /// Asset persists until freed.
    #[default]
    Infinite,
    /// Asset expires after the given number of engine ticks.
    Ticks(u32),
}

impl Lifetime {
    /// Raw tick count, zero for infinite.
    pub fn ticks(self) -> u32 {
        match self {
            Lifetime::Infinite => 0,
            Lifetime::Ticks(t) => t,
        }
    }
}
