// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Asset store of the software engine.
//!
//! Assets are kept in one keyed table guarded by the dispatcher's lock.
//! Beyond plain key/data slots the table also hosts the engine-created
//! bookkeeping objects (timers, EdDSA chaining state, eMMC sessions) as
//! auxiliary payloads, so one id space and one free path covers everything.

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use sevault_token::AssetCreateCmd;
use sevault_token::AssetDeleteCmd;
use sevault_token::AssetId;
use sevault_token::AssetLoadCmd;
use sevault_token::AssetLoadFlavor;
use sevault_token::AssetSearchCmd;
use sevault_token::Lifetime;
use sevault_token::MonotonicIncrementCmd;
use sevault_token::MonotonicReadCmd;
use sevault_token::OtpWriteCmd;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::PublicDataCmd;
use sevault_token::SecureTimerRes;
use sevault_token::ServiceRes;
use sevault_token::TimerOp;

use crate::crypto::hash::kdf_expand;
use crate::crypto::kw;
use crate::errors::SimError;
use crate::errors::SimResult;
use crate::PROVISIONING_KEK_NUMBER;

/// Total asset store capacity in bytes, reported through system info.
pub(crate) const STORE_BYTES: usize = 65536;

/// Largest single asset the store accepts.
pub(crate) const MAX_ASSET_BYTES: usize = 4096;

/// Associated-data bounds for key blob wrap and unwrap.
pub(crate) const AAD_MIN: usize = 1;
pub(crate) const AAD_MAX: usize = 224;

const TIMER_FOOTPRINT: usize = 4;
const EDDSA_STATE_FOOTPRINT: usize = 128;
const EMMC_SESSION_FOOTPRINT: usize = 48;

/// Secure timer bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct TimerState {
    pub base: Instant,
    pub seconds: bool,
    pub running: bool,
    pub held: u32,
}

/// EdDSA three-phase chaining state, bound at the initial phase.
#[derive(Debug, Clone)]
pub(crate) struct EddsaState {
    pub verify: bool,
    pub key: Vec<u8>,
    pub signature: Option<[u8; 64]>,
    pub message: Vec<u8>,
}

/// eMMC/RPMB authentication session opened by a request command.
#[derive(Debug, Clone)]
pub(crate) struct EmmcSession {
    pub write_capable: bool,
    pub key: Vec<u8>,
    pub nonce: [u8; 16],
}

/// Engine-side payload attached to some assets.
#[derive(Debug, Clone, Default)]
pub(crate) enum AssetAux {
    #[default]
    None,
    Timer(TimerState),
    Eddsa(EddsaState),
    Emmc(EmmcSession),
}

/// One asset store entry.
#[derive(Debug, Clone)]
pub(crate) struct Asset {
    pub policy: PolicyMask,
    pub length: usize,
    pub content: Option<Vec<u8>>,
    pub origin: Provenance,
    pub static_number: Option<u8>,
    pub otp: bool,
    pub expires_at: Option<Instant>,
    pub aux: AssetAux,
}

impl Asset {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Instant::now() >= t)
    }
}

/// The asset table.
#[derive(Debug)]
pub(crate) struct Vault {
    assets: HashMap<u32, Asset>,
    next_id: u32,
    used: usize,
}

impl Vault {
    pub(crate) fn new() -> Self {
        Vault {
            assets: HashMap::new(),
            next_id: 0x5000,
            used: 0,
        }
    }

    fn mint(&mut self) -> SimResult<AssetId> {
        self.next_id = self.next_id.wrapping_add(1);
        AssetId::from_raw(self.next_id).ok_or(SimError::StorageFull)
    }

    fn insert(&mut self, asset: Asset) -> SimResult<AssetId> {
        if self.used + asset.length > STORE_BYTES {
            tracing::warn!(used = self.used, want = asset.length, "asset store full");
            return Err(SimError::StorageFull);
        }
        let id = self.mint()?;
        self.used += asset.length;
        self.assets.insert(id.raw(), asset);
        Ok(id)
    }

    /// Looks an asset up, sweeping it first if its lifetime ran out.
    pub(crate) fn lookup(&mut self, id: AssetId) -> SimResult<&mut Asset> {
        let raw = id.raw();
        if self.assets.get(&raw).is_some_and(Asset::expired) {
            if let Some(gone) = self.assets.remove(&raw) {
                tracing::debug!(asset = raw, "asset lifetime expired");
                self.used -= gone.length;
            }
        }
        self.assets.get_mut(&raw).ok_or(SimError::InvalidAsset)
    }

    /// Resolves the content of a loaded asset for use as key material.
    ///
    /// The asset's policy must contain every bit of `need`, and a caller
    /// from the other security domain is refused unless the policy carries
    /// the cross-domain bit.
    pub(crate) fn key_content(
        &mut self,
        id: AssetId,
        need: PolicyMask,
        provenance: Provenance,
    ) -> SimResult<Vec<u8>> {
        let asset = self.lookup(id)?;
        if !asset.policy.contains(need) {
            tracing::debug!(asset = id.raw(), ?need, "asset policy refused the use");
            return Err(SimError::InvalidAsset);
        }
        if asset.origin != provenance && !asset.policy.contains(PolicyMask::CROSS_DOMAIN) {
            return Err(SimError::AccessError);
        }
        asset.content.clone().ok_or(SimError::InvalidState)
    }

    /// Policy word of an existing asset.
    pub(crate) fn policy_of(&mut self, id: AssetId) -> SimResult<PolicyMask> {
        Ok(self.lookup(id)?.policy)
    }

    /// Checks that an asset exists, is reachable from `provenance`, and has
    /// not been loaded yet; returns its declared length.
    pub(crate) fn expect_empty(&mut self, id: AssetId, provenance: Provenance) -> SimResult<usize> {
        let asset = self.lookup(id)?;
        if asset.origin != provenance && !asset.policy.contains(PolicyMask::CROSS_DOMAIN) {
            return Err(SimError::AccessError);
        }
        if asset.content.is_some() {
            return Err(SimError::InvalidState);
        }
        Ok(asset.length)
    }

    /// Stores engine-computed content into an empty asset.
    pub(crate) fn fill(&mut self, id: AssetId, content: Vec<u8>) -> SimResult<()> {
        let asset = self.lookup(id)?;
        if asset.content.is_some() {
            return Err(SimError::InvalidState);
        }
        if content.len() != asset.length {
            tracing::debug!(
                asset = id.raw(),
                have = content.len(),
                want = asset.length,
                "content does not fit the asset"
            );
            return Err(SimError::InvalidLength);
        }
        asset.content = Some(content);
        Ok(())
    }

    /// Replaces the content of a loaded asset, keeping its length.
    pub(crate) fn update_content(&mut self, id: AssetId, content: Vec<u8>) -> SimResult<()> {
        let asset = self.lookup(id)?;
        if asset.content.is_none() || content.len() != asset.length {
            return Err(SimError::InvalidState);
        }
        asset.content = Some(content);
        Ok(())
    }

    /// Allocates an asset on behalf of a caller.
    pub(crate) fn create_caller(
        &mut self,
        policy: PolicyMask,
        length: usize,
        lifetime: Lifetime,
        provenance: Provenance,
    ) -> SimResult<AssetId> {
        if policy.is_empty() {
            return Err(SimError::InvalidParameter);
        }
        if length == 0 || length > MAX_ASSET_BYTES {
            return Err(SimError::InvalidLength);
        }
        if !provenance.is_secure() && !policy.contains(PolicyMask::SOURCE_NON_SECURE) {
            return Err(SimError::AccessError);
        }
        let expires_at = match lifetime {
            Lifetime::Infinite => None,
            Lifetime::Ticks(t) => Some(Instant::now() + Duration::from_millis(u64::from(t))),
        };
        self.insert(Asset {
            policy,
            length,
            content: None,
            origin: provenance,
            static_number: None,
            otp: false,
            expires_at,
            aux: AssetAux::None,
        })
    }

    /// Allocates an engine-internal bookkeeping asset.
    pub(crate) fn create_engine(
        &mut self,
        length: usize,
        provenance: Provenance,
        aux: AssetAux,
    ) -> SimResult<AssetId> {
        self.insert(Asset {
            policy: PolicyMask::NONE,
            length,
            content: None,
            origin: provenance,
            static_number: None,
            otp: false,
            expires_at: None,
            aux,
        })
    }

    /// Installs a one-time-programmable catalog asset.
    pub(crate) fn create_static(
        &mut self,
        number: u8,
        policy: PolicyMask,
        content: Vec<u8>,
    ) -> SimResult<AssetId> {
        self.insert(Asset {
            policy,
            length: content.len(),
            content: Some(content),
            origin: Provenance::Secure,
            static_number: Some(number),
            otp: true,
            expires_at: None,
            aux: AssetAux::None,
        })
    }

    /// Releases an asset and scrubs its bytes.
    pub(crate) fn delete(&mut self, id: AssetId, provenance: Provenance) -> SimResult<()> {
        let asset = self.lookup(id)?;
        if asset.otp {
            return Err(SimError::InvalidAsset);
        }
        if asset.origin != provenance && !asset.policy.contains(PolicyMask::CROSS_DOMAIN) {
            return Err(SimError::AccessError);
        }
        if let Some(gone) = self.assets.remove(&id.raw()) {
            self.used -= gone.length;
        }
        Ok(())
    }

    /// Resolves a static catalog number to its asset.
    pub(crate) fn search(&mut self, number: u8) -> SimResult<(AssetId, usize)> {
        let hit = self
            .assets
            .iter()
            .find(|(_, a)| a.static_number == Some(number));
        match hit {
            Some((raw, asset)) => {
                let id = AssetId::from_raw(*raw).ok_or(SimError::InvalidAsset)?;
                Ok((id, asset.length))
            }
            None => Err(SimError::InvalidAsset),
        }
    }

    /// Drops every dynamic asset; the OTP catalog survives.
    pub(crate) fn reset(&mut self) {
        self.assets.retain(|_, a| a.otp);
        self.used = self.assets.values().map(|a| a.length).sum();
    }
}

pub(crate) fn check_aad(aad: &[u8]) -> SimResult<()> {
    if aad.len() < AAD_MIN || aad.len() > AAD_MAX {
        return Err(SimError::InvalidParameter);
    }
    Ok(())
}

pub(crate) fn asset_search(
    vault: &mut Vault,
    _provenance: Provenance,
    cmd: &AssetSearchCmd,
) -> SimResult<ServiceRes> {
    let (asset, length) = vault.search(cmd.number.get())?;
    Ok(ServiceRes::AssetSearch { asset, length })
}

pub(crate) fn asset_create(
    vault: &mut Vault,
    provenance: Provenance,
    cmd: &AssetCreateCmd,
) -> SimResult<ServiceRes> {
    let asset = vault.create_caller(cmd.policy, cmd.length, cmd.lifetime, provenance)?;
    Ok(ServiceRes::AssetCreate { asset })
}

pub(crate) fn asset_load(
    vault: &mut Vault,
    trng_ready: bool,
    provenance: Provenance,
    cmd: &AssetLoadCmd,
) -> SimResult<ServiceRes> {
    let length = vault.expect_empty(cmd.asset, provenance)?;
    let content = match &cmd.flavor {
        AssetLoadFlavor::Plaintext { data } => {
            if data.len() != length {
                return Err(SimError::InvalidLength);
            }
            data.clone()
        }
        AssetLoadFlavor::Random => {
            if !trng_ready {
                return Err(SimError::NotInitialized);
            }
            let mut bytes = vec![0u8; length];
            openssl::rand::rand_bytes(&mut bytes)?;
            bytes
        }
        AssetLoadFlavor::Derive { kdk, label } => {
            check_aad(label)?;
            let parent = vault.key_content(*kdk, PolicyMask::KEY_DERIVE, provenance)?;
            kdf_expand(&parent, label, length)
        }
        AssetLoadFlavor::Import { kek, aad, blob } => {
            check_aad(aad)?;
            let kek = vault.key_content(*kek, PolicyMask::AES_WRAP, provenance)?;
            let out = kw::blob_unwrap(&kek, aad, blob)?;
            if out.len() != length {
                return Err(SimError::InvalidLength);
            }
            out
        }
        AssetLoadFlavor::AesUnwrap { kek, blob } => {
            let kek = vault.key_content(*kek, PolicyMask::AES_WRAP, provenance)?;
            let out = kw::kwp_unwrap(&kek, blob)?;
            if out.len() != length {
                return Err(SimError::InvalidLength);
            }
            out
        }
    };
    let blob = match &cmd.export {
        Some(req) => {
            check_aad(&req.aad)?;
            if !vault.policy_of(cmd.asset)?.contains(PolicyMask::EXPORT) {
                return Err(SimError::AccessError);
            }
            let kek = vault.key_content(req.kek, PolicyMask::AES_WRAP, provenance)?;
            Some(kw::blob_wrap(&kek, &req.aad, &content)?)
        }
        None => None,
    };
    vault.fill(cmd.asset, content)?;
    Ok(ServiceRes::AssetLoad { blob })
}

pub(crate) fn asset_delete(
    vault: &mut Vault,
    provenance: Provenance,
    cmd: &AssetDeleteCmd,
) -> SimResult<ServiceRes> {
    vault.delete(cmd.asset, provenance)?;
    Ok(ServiceRes::None)
}

pub(crate) fn public_data(
    vault: &mut Vault,
    provenance: Provenance,
    cmd: &PublicDataCmd,
) -> SimResult<ServiceRes> {
    let data = vault.key_content(cmd.asset, PolicyMask::PUBLIC_DATA, provenance)?;
    Ok(ServiceRes::PublicData { data })
}

pub(crate) fn monotonic_read(
    vault: &mut Vault,
    provenance: Provenance,
    cmd: &MonotonicReadCmd,
) -> SimResult<ServiceRes> {
    let data = vault.key_content(cmd.asset, PolicyMask::MONOTONIC, provenance)?;
    Ok(ServiceRes::MonotonicRead { data })
}

pub(crate) fn monotonic_increment(
    vault: &mut Vault,
    provenance: Provenance,
    cmd: &MonotonicIncrementCmd,
) -> SimResult<ServiceRes> {
    let mut data = vault.key_content(cmd.asset, PolicyMask::MONOTONIC, provenance)?;
    for byte in data.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry {
            break;
        }
    }
    vault.update_content(cmd.asset, data)?;
    Ok(ServiceRes::None)
}

fn otp_policy(policy_number: u32) -> SimResult<PolicyMask> {
    let base = PolicyMask::SOURCE_NON_SECURE | PolicyMask::CROSS_DOMAIN;
    match policy_number {
        0 => Ok(base | PolicyMask::MONOTONIC),
        1 => Ok(base | PolicyMask::PUBLIC_DATA),
        2 => Ok(base | PolicyMask::PRIVATE_DATA),
        3 => Ok(base | PolicyMask::AES_WRAP),
        4 => Ok(base | PolicyMask::KEY_DERIVE),
        5 => Ok(base | PolicyMask::EMMC_AUTH_KEY),
        _ => Err(SimError::InvalidParameter),
    }
}

pub(crate) fn otp_write(
    vault: &mut Vault,
    provenance: Provenance,
    cmd: &OtpWriteCmd,
) -> SimResult<ServiceRes> {
    if vault.search(cmd.number.get()).is_ok() {
        tracing::debug!(number = cmd.number.get(), "catalog slot already programmed");
        return Err(SimError::InvalidState);
    }
    check_aad(&cmd.aad)?;
    let policy = otp_policy(cmd.policy_number)?;
    let (kek_id, _) = vault
        .search(PROVISIONING_KEK_NUMBER)
        .map_err(|_| SimError::NotInitialized)?;
    let kek = vault.key_content(kek_id, PolicyMask::AES_WRAP, provenance)?;
    let content = kw::blob_unwrap(&kek, &cmd.aad, &cmd.blob)?;
    vault.create_static(cmd.number.get(), policy, content)?;
    Ok(ServiceRes::None)
}

fn timer_count(timer: &TimerState) -> u32 {
    if !timer.running {
        return timer.held;
    }
    let elapsed = timer.base.elapsed();
    if timer.seconds {
        elapsed.as_secs() as u32
    } else {
        (elapsed.as_micros() / 100) as u32
    }
}

pub(crate) fn secure_timer(
    vault: &mut Vault,
    provenance: Provenance,
    asset: Option<AssetId>,
    seconds: bool,
    op: TimerOp,
) -> SimResult<ServiceRes> {
    match op {
        TimerOp::Start => {
            let id = match asset {
                Some(id) => {
                    let slot = vault.lookup(id)?;
                    let AssetAux::Timer(timer) = &mut slot.aux else {
                        return Err(SimError::InvalidAsset);
                    };
                    timer.base = Instant::now();
                    timer.seconds = seconds;
                    timer.running = true;
                    timer.held = 0;
                    id
                }
                None => vault.create_engine(
                    TIMER_FOOTPRINT,
                    provenance,
                    AssetAux::Timer(TimerState {
                        base: Instant::now(),
                        seconds,
                        running: true,
                        held: 0,
                    }),
                )?,
            };
            Ok(ServiceRes::SecureTimer(SecureTimerRes {
                asset: id,
                count: 0,
            }))
        }
        TimerOp::Stop | TimerOp::Read => {
            let id = asset.ok_or(SimError::InvalidParameter)?;
            let slot = vault.lookup(id)?;
            let AssetAux::Timer(timer) = &mut slot.aux else {
                return Err(SimError::InvalidAsset);
            };
            let count = timer_count(timer);
            if op == TimerOp::Stop {
                timer.held = count;
                timer.running = false;
            }
            Ok(ServiceRes::SecureTimer(SecureTimerRes { asset: id, count }))
        }
    }
}

/// Footprint charged for an EdDSA chaining-state asset.
pub(crate) fn eddsa_state_footprint() -> usize {
    EDDSA_STATE_FOOTPRINT
}

/// Footprint charged for an eMMC session asset.
pub(crate) fn emmc_session_footprint() -> usize {
    EMMC_SESSION_FOOTPRINT
}
