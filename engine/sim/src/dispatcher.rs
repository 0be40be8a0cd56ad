// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Engine state and command dispatch.
//!
//! [`SimCore`] is the shared half behind every channel clone: one lock, one
//! [`EngineState`], one command in flight at a time. Dispatch mirrors the
//! device firmware's outer loop: claim arbitration first, then the hold
//! gate, then the service handler for the command's opcode. Handlers report
//! failures as [`SimError`]; the dispatcher folds them into result tokens.

use parking_lot::RwLock;
use sevault_token::ClaimOp;
use sevault_token::EngineStatus;
use sevault_token::Identity;
use sevault_token::PolicyMask;
use sevault_token::ProvisionHukCmd;
use sevault_token::RandomCmd;
use sevault_token::ServiceCmd;
use sevault_token::ServiceRes;
use sevault_token::SystemInfo;
use sevault_token::TokenCmd;
use sevault_token::TokenRes;
use sevault_token::TrngConfigCmd;
use sevault_token::Version;

use crate::asym;
use crate::crypto::aead;
use crate::crypto::cipher;
use crate::crypto::hash;
use crate::crypto::kw;
use crate::crypto::mac;
use crate::emmc;
use crate::errors::SimError;
use crate::errors::SimResult;
use crate::milenage;
use crate::stream::StreamTable;
use crate::vault;
use crate::vault::Vault;
use crate::HUK_NUMBER;
use crate::MILENAGE_TEST_SET_NUMBER;
use crate::PROVISIONING_KEK_NUMBER;

/// Firmware version reported through system information.
const FIRMWARE_VERSION: Version = Version {
    major: 3,
    minor: 1,
    patch: 0,
};

/// Hardware version reported through system information.
const HARDWARE_VERSION: Version = Version {
    major: 1,
    minor: 0,
    patch: 0,
};

/// Factory provisioning key-encryption key, programmed into catalog slot 1.
const PROVISIONING_KEK: [u8; 32] = *b"sevault-sim-provisioning-kek-32b";

/// Simulator hardware unique key, programmed into catalog slot 2.
///
/// A device derives its own; the simulator uses a fixed one so derived keys
/// are reproducible across runs.
const SIM_HUK: [u8; 32] = *b"sevault-sim-hardware-unique-key!";

/// 3GPP TS 35.208 test set 1 `K || OP`, programmed into catalog slot 10.
const MILENAGE_TEST_SET: [u8; 32] = [
    0x46, 0x5b, 0x5c, 0xe8, 0xb1, 0x99, 0xb4, 0x9f, 0xaa, 0x5f, 0x0a, 0x2e, 0xe2, 0x38, 0xa6,
    0xbc, 0xcd, 0xc2, 0x02, 0xd5, 0x12, 0x3e, 0x20, 0xf6, 0x2b, 0x6d, 0x67, 0x6a, 0xc7, 0x2c,
    0xb3, 0x18,
];

/// Exclusive-access hold on the channel, reentrant for its owner.
#[derive(Debug)]
struct ClaimHold {
    identity: Identity,
    count: u32,
}

/// Everything the engine remembers between commands.
#[derive(Debug)]
pub(crate) struct EngineState {
    pub(crate) vault: Vault,
    pub(crate) streams: StreamTable,
    claim: Option<ClaimHold>,
    trng_ready: bool,
}

fn program(vault: &mut Vault, number: u8, policy: PolicyMask, content: Vec<u8>) {
    let base = PolicyMask::SOURCE_NON_SECURE | PolicyMask::CROSS_DOMAIN;
    if vault.create_static(number, policy | base, content).is_err() {
        tracing::error!(number, "factory catalog programming failed");
    }
}

impl EngineState {
    /// Fresh power-on state with the factory catalog programmed.
    pub(crate) fn boot() -> Self {
        let mut vault = Vault::new();
        program(
            &mut vault,
            PROVISIONING_KEK_NUMBER,
            PolicyMask::AES_WRAP,
            PROVISIONING_KEK.to_vec(),
        );
        program(
            &mut vault,
            HUK_NUMBER,
            PolicyMask::KEY_DERIVE,
            SIM_HUK.to_vec(),
        );
        program(
            &mut vault,
            MILENAGE_TEST_SET_NUMBER,
            PolicyMask::PRIVATE_DATA,
            MILENAGE_TEST_SET.to_vec(),
        );
        EngineState {
            vault,
            streams: StreamTable::default(),
            claim: None,
            trng_ready: false,
        }
    }

    fn arbitrate(&mut self, identity: Identity, op: ClaimOp) -> SimResult<()> {
        match op {
            ClaimOp::Claim => match &mut self.claim {
                None => {
                    self.claim = Some(ClaimHold { identity, count: 1 });
                    Ok(())
                }
                Some(hold) if hold.identity == identity => {
                    hold.count += 1;
                    Ok(())
                }
                Some(hold) => {
                    tracing::debug!(
                        holder = hold.identity.0,
                        claimant = identity.0,
                        "claim refused"
                    );
                    Err(SimError::Busy)
                }
            },
            ClaimOp::Overrule => {
                if let Some(hold) = &self.claim {
                    tracing::warn!(
                        holder = hold.identity.0,
                        claimant = identity.0,
                        "claim overruled"
                    );
                }
                self.claim = Some(ClaimHold { identity, count: 1 });
                Ok(())
            }
            ClaimOp::Release => match &mut self.claim {
                Some(hold) if hold.identity == identity => {
                    hold.count -= 1;
                    if hold.count == 0 {
                        self.claim = None;
                    }
                    Ok(())
                }
                _ => Err(SimError::InvalidParameter),
            },
        }
    }

    fn trng_config(&mut self, cmd: &TrngConfigCmd) -> SimResult<()> {
        // The sampling knobs have no software equivalent; the simulator
        // only tracks whether the generator was started.
        if cmd.load_start {
            self.trng_ready = true;
        } else if cmd.reseed && !self.trng_ready {
            return Err(SimError::NotInitialized);
        }
        Ok(())
    }

    fn random(&mut self, cmd: &RandomCmd) -> SimResult<ServiceRes> {
        if !self.trng_ready {
            return Err(SimError::NotInitialized);
        }
        if cmd.size == 0 || cmd.size > 65535 {
            return Err(SimError::InvalidLength);
        }
        let mut data = vec![0u8; cmd.size];
        openssl::rand::rand_bytes(&mut data)?;
        Ok(ServiceRes::Random { data })
    }

    fn provision_huk(&mut self, cmd: &ProvisionHukCmd) -> SimResult<ServiceRes> {
        if self.vault.search(cmd.number.get()).is_ok() {
            tracing::debug!(
                number = cmd.number.get(),
                "catalog slot already programmed"
            );
            return Err(SimError::InvalidState);
        }
        self.trng_config(&cmd.trng)?;
        if !self.trng_ready {
            return Err(SimError::NotInitialized);
        }
        let mut key = vec![0u8; if cmd.bits_128 { 16 } else { 32 }];
        openssl::rand::rand_bytes(&mut key)?;
        let policy =
            PolicyMask::KEY_DERIVE | PolicyMask::SOURCE_NON_SECURE | PolicyMask::CROSS_DOMAIN;
        let asset = self.vault.create_static(cmd.number.get(), policy, key)?;
        Ok(ServiceRes::AssetCreate { asset })
    }

    fn reset(&mut self) {
        self.vault.reset();
        self.streams.clear();
        self.claim = None;
        self.trng_ready = false;
    }

    fn service(&mut self, cmd: &TokenCmd) -> SimResult<TokenRes> {
        // Arbitration commands bypass the hold gate so a holder can always
        // be installed, stacked, or released.
        if let Some(hold) = &self.claim {
            if hold.identity != cmd.identity && !matches!(cmd.service, ServiceCmd::Claim(_)) {
                tracing::debug!(
                    holder = hold.identity.0,
                    caller = cmd.identity.0,
                    "channel is claimed"
                );
                return Err(SimError::Busy);
            }
        }
        let provenance = cmd.provenance;
        let service = match &cmd.service {
            ServiceCmd::Nop => ServiceRes::None,
            ServiceCmd::Hash(c) => hash::hash_service(self, c)?,
            ServiceCmd::Mac(c) => mac::mac_service(self, provenance, c)?,
            ServiceCmd::Cipher(c) => cipher::cipher_service(self, provenance, c)?,
            ServiceCmd::AuthCrypt(c) => aead::auth_crypt_service(self, provenance, c)?,
            ServiceCmd::AssetSearch(c) => vault::asset_search(&mut self.vault, provenance, c)?,
            ServiceCmd::AssetCreate(c) => vault::asset_create(&mut self.vault, provenance, c)?,
            ServiceCmd::AssetLoad(c) => {
                vault::asset_load(&mut self.vault, self.trng_ready, provenance, c)?
            }
            ServiceCmd::AssetDelete(c) => {
                let res = vault::asset_delete(&mut self.vault, provenance, c)?;
                // A digest or MAC chain backed by the asset dies with it.
                self.streams.drop_asset_slot(c.asset);
                res
            }
            ServiceCmd::PublicData(c) => vault::public_data(&mut self.vault, provenance, c)?,
            ServiceCmd::MonotonicRead(c) => {
                vault::monotonic_read(&mut self.vault, provenance, c)?
            }
            ServiceCmd::MonotonicIncrement(c) => {
                vault::monotonic_increment(&mut self.vault, provenance, c)?
            }
            ServiceCmd::OtpWrite(c) => vault::otp_write(&mut self.vault, provenance, c)?,
            ServiceCmd::ProvisionHuk(c) => self.provision_huk(c)?,
            ServiceCmd::SecureTimer { asset, seconds, op } => {
                vault::secure_timer(&mut self.vault, provenance, *asset, *seconds, *op)?
            }
            ServiceCmd::PkSignVerify(c) => asym::sign_verify_service(self, provenance, c)?,
            ServiceCmd::PkGenKey(c) => asym::gen_key_service(self, provenance, c)?,
            ServiceCmd::PkSharedSecret(c) => asym::shared_secret_service(self, provenance, c)?,
            ServiceCmd::PkWrap(c) => asym::wrap_service(self, provenance, c)?,
            ServiceCmd::PkEncrypt(c) => asym::encrypt_service(self, provenance, c)?,
            ServiceCmd::PkKeyCheck(c) => asym::key_check_service(self, provenance, c)?,
            ServiceCmd::AesWrap(c) => kw::aes_wrap_service(self, provenance, c)?,
            ServiceCmd::Random(c) => self.random(c)?,
            ServiceCmd::TrngConfig(c) => {
                self.trng_config(c)?;
                ServiceRes::None
            }
            ServiceCmd::Claim(op) => {
                self.arbitrate(cmd.identity, *op)?;
                ServiceRes::None
            }
            ServiceCmd::Emmc(op) => emmc::emmc_service(self, provenance, op)?,
            ServiceCmd::Milenage(op) => {
                return milenage::milenage_service(self, provenance, op)
            }
            ServiceCmd::SystemInfo => ServiceRes::SystemInfo(SystemInfo {
                firmware: FIRMWARE_VERSION,
                hardware: HARDWARE_VERSION,
                mem_size: vault::STORE_BYTES as u32,
                self_identity: cmd.identity,
                otp_anomaly: 0,
            }),
            ServiceCmd::SystemReset => {
                self.reset();
                ServiceRes::None
            }
        };
        Ok(TokenRes {
            status: EngineStatus::Success,
            service,
        })
    }
}

/// Shared engine core behind every channel clone.
#[derive(Debug)]
pub(crate) struct SimCore {
    state: RwLock<EngineState>,
}

impl Default for SimCore {
    fn default() -> Self {
        SimCore {
            state: RwLock::new(EngineState::boot()),
        }
    }
}

impl SimCore {
    /// Runs one command to completion and folds errors into the token.
    pub(crate) fn dispatch(&self, cmd: &TokenCmd) -> TokenRes {
        let mut state = self.state.write();
        let res = state
            .service(cmd)
            .unwrap_or_else(|e| TokenRes::from_status(e.into()));
        let (opcode, subcode) = cmd.opcode();
        tracing::debug!(?opcode, subcode, status = ?res.status, "token exchanged");
        res
    }
}
