// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Command tokens.
//!
//! [`TokenCmd`] is the single message type the driver submits to the engine.
//! Its [`ServiceCmd`] payload is a closed sum over every service the engine
//! offers; constructing a variant is the only way to emit the matching
//! opcode/subcode pair, so malformed combinations cannot be expressed.

use crate::AeadAlg;
use crate::AssetId;
use crate::CipherAlg;
use crate::CipherMode;
use crate::GcmSubmode;
use crate::HashAlg;
use crate::Identity;
use crate::Lifetime;
use crate::MacAlg;
use crate::PolicyMask;
use crate::Provenance;
use crate::StaticAssetNumber;

/// Engine opcode, the major command class in the token header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// No operation.
    Nop = 0,
    /// Symmetric cipher and authenticated encryption.
    Cipher = 1,
    /// Hash digests.
    Hash = 2,
    /// MAC generate and verify.
    Mac = 3,
    /// True random number services.
    Trng = 4,
    /// Special functions (Milenage).
    SpecialFunctions = 5,
    /// AES key wrap.
    AesWrap = 6,
    /// Asset store management.
    AssetManagement = 7,
    /// Authenticated unlock.
    AuthUnlock = 8,
    /// Asymmetric cryptography.
    PublicKey = 9,
    /// eMMC/RPMB authentication.
    Emmc = 10,
    /// Exclusive mailbox claim.
    Claim = 11,
    /// System information and control.
    System = 14,
}

/// Position of a streamed call within its context's lifetime.
///
/// The first half names where the state comes from, the second where it
/// goes: an `Init` source starts from the algorithm's defined initial
/// state, a `Cont` source resumes from saved state, a `Cont` target saves
/// state for a later call and a `Final` target finishes the computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// One-shot: initialize and finish in a single command.
    Init2Final,
    /// Finish a previously started computation.
    Cont2Final,
    /// First fragment of a longer stream.
    Init2Cont,
    /// Middle fragment.
    Cont2Cont,
}

impl StreamMode {
    /// True for the modes that finish the computation.
    pub fn is_final(self) -> bool {
        matches!(self, StreamMode::Init2Final | StreamMode::Cont2Final)
    }

    /// True for the modes that resume from saved state.
    pub fn resumes(self) -> bool {
        matches!(self, StreamMode::Cont2Final | StreamMode::Cont2Cont)
    }
}

/// Where a streaming context keeps its intermediate state.
///
/// The choice is made once, when the context is allocated, and never changes
/// over the context's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// No state travels with this command (one-shot modes).
    None,
    /// State rides in the token itself; the caller stores it between calls.
    Embedded(Vec<u8>),
    /// State lives in an engine-resident asset.
    Asset(AssetId),
}

impl StreamState {
    /// Asset id if the state is asset-backed.
    pub fn asset(&self) -> Option<AssetId> {
        match self {
            StreamState::Asset(id) => Some(*id),
            _ => None,
        }
    }
}

/// A key passed either by value or by asset reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyRef {
    /// Raw key bytes in the token.
    Inline(Vec<u8>),
    /// Key material held in the asset store.
    Asset(AssetId),
}

impl KeyRef {
    /// Key length in bytes when the key is inline, `None` for assets.
    pub fn inline_len(&self) -> Option<usize> {
        match self {
            KeyRef::Inline(k) => Some(k.len()),
            KeyRef::Asset(_) => None,
        }
    }
}

/// IV handling for a cipher command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IvRef {
    /// Mode carries no IV (ECB).
    None,
    /// IV travels in the token; the updated IV comes back in the result.
    Inline(Vec<u8>),
    /// IV lives in a temporary asset and never crosses the boundary.
    Asset(AssetId),
}

/// Reference MAC for a verification final.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MacRef {
    /// Expected MAC bytes in the token.
    Inline(Vec<u8>),
    /// Expected MAC held in an asset.
    Asset(AssetId),
}

/// Hash service command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashCmd {
    /// Digest algorithm.
    pub alg: HashAlg,
    /// Stream position of this fragment.
    pub mode: StreamMode,
    /// Intermediate-state carrier for the continuation modes.
    pub state: StreamState,
    /// Message fragment. Must be a block multiple unless `mode.is_final()`.
    pub data: Vec<u8>,
    /// Total message length in bytes, required by the final modes.
    pub total_len: u64,
}

/// MAC service command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacCmd {
    /// MAC algorithm.
    pub alg: MacAlg,
    /// Stream position of this fragment.
    pub mode: StreamMode,
    /// MAC key.
    pub key: KeyRef,
    /// Intermediate-state carrier for the continuation modes.
    pub state: StreamState,
    /// Message fragment. Must be a block multiple unless `mode.is_final()`.
    pub data: Vec<u8>,
    /// Total message length in bytes, required by the final modes.
    pub total_len: u64,
    /// Expected MAC; `Some` turns a final into a verification.
    pub verify: Option<MacRef>,
}

/// Symmetric cipher command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherCmd {
    /// Cipher family.
    pub alg: CipherAlg,
    /// Feedback mode.
    pub mode: CipherMode,
    /// Encrypt when true, decrypt otherwise.
    pub encrypt: bool,
    /// Cipher key. XTS keys carry both units back to back.
    pub key: KeyRef,
    /// IV carrier; [`IvRef::None`] only for ECB.
    pub iv: IvRef,
    /// Data to transform. Block-aligned except for the stream family.
    pub data: Vec<u8>,
    /// f8 freshness input.
    pub f8_fresh: Option<[u8; 8]>,
    /// f8 bearer identity (5 bits used).
    pub f8_bearer: u8,
    /// f8 direction bit.
    pub f8_direction: u8,
    /// ChaCha20 nonce length in bytes (12 or 16); ignored elsewhere.
    pub nonce_len: u8,
}

/// Authenticated encryption (AEAD) command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthCryptCmd {
    /// AEAD algorithm.
    pub alg: AeadAlg,
    /// Encrypt-and-tag when true, decrypt-and-verify otherwise.
    pub encrypt: bool,
    /// Cipher key.
    pub key: KeyRef,
    /// GCM operating submode; ignored by the other algorithms.
    pub gcm: GcmSubmode,
    /// Precomputed GHASH key for the non-autonomous GCM submodes.
    pub hash_key: Option<KeyRef>,
    /// Nonce. CCM accepts 7..=13 bytes, GCM and ChaCha20-Poly1305 take 12.
    pub nonce: Vec<u8>,
    /// Additional authenticated data.
    pub aad: Vec<u8>,
    /// Payload to transform.
    pub data: Vec<u8>,
    /// Tag length in bytes.
    pub tag_len: usize,
    /// Expected tag on decrypt; must be `None` on encrypt.
    pub tag: Option<Vec<u8>>,
}

/// Locate a static asset by its fixed number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetSearchCmd {
    /// Static asset number to look up.
    pub number: StaticAssetNumber,
}

/// Allocate an empty asset with a fixed policy and length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetCreateCmd {
    /// Usage policy, immutable after creation.
    pub policy: PolicyMask,
    /// Asset length in bytes, immutable after creation.
    pub length: usize,
    /// How long the asset may live.
    pub lifetime: Lifetime,
}

/// Release an asset and scrub its storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetDeleteCmd {
    /// Asset to delete.
    pub asset: AssetId,
}

/// How an asset gets its content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetLoadFlavor {
    /// Plaintext import over the token.
    Plaintext {
        /// Content; length must equal the asset length.
        data: Vec<u8>,
    },
    /// Fill with fresh random from the engine's TRNG.
    Random,
    /// Derive from a key-derivation key using the engine's KDF.
    Derive {
        /// Parent key-derivation key.
        kdk: AssetId,
        /// Caller's derivation label, mixed into the KDF.
        label: Vec<u8>,
    },
    /// Import a key blob produced earlier by an export.
    Import {
        /// Key-encryption key the blob was wrapped under.
        kek: AssetId,
        /// Associated data bound into the blob.
        aad: Vec<u8>,
        /// The wrapped blob.
        blob: Vec<u8>,
    },
    /// Unwrap RFC 5649 wrapped key material directly into the asset.
    AesUnwrap {
        /// AES key-wrap key.
        kek: AssetId,
        /// Wrapped key material.
        blob: Vec<u8>,
    },
}

/// Ask the engine to also return a key blob of the loaded content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReq {
    /// Key-encryption key to wrap under.
    pub kek: AssetId,
    /// Associated data bound into the blob.
    pub aad: Vec<u8>,
}

/// Load content into a created asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetLoadCmd {
    /// Target asset; must still be empty.
    pub asset: AssetId,
    /// Content source.
    pub flavor: AssetLoadFlavor,
    /// Optional key-blob export alongside the load.
    pub export: Option<ExportReq>,
}

/// Read a public-data asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicDataCmd {
    /// Asset carrying the `PUBLIC_DATA` policy.
    pub asset: AssetId,
}

/// Read a monotonic counter asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonotonicReadCmd {
    /// Counter asset.
    pub asset: AssetId,
}

/// Increment a monotonic counter asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonotonicIncrementCmd {
    /// Counter asset.
    pub asset: AssetId,
}

/// Program a key blob into one-time-programmable storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpWriteCmd {
    /// Static asset number the new item will answer to.
    pub number: StaticAssetNumber,
    /// Policy selector for the programmed item.
    pub policy_number: u32,
    /// Append a CRC so the item can be validated after programming.
    pub add_crc: bool,
    /// Key blob holding the content.
    pub blob: Vec<u8>,
    /// Associated data the blob was wrapped with.
    pub aad: Vec<u8>,
}

/// TRNG configuration and start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrngConfigCmd {
    /// Load the configuration and start the TRNG.
    pub load_start: bool,
    /// Force an immediate reseed of the DRBG.
    pub reseed: bool,
    /// Automatic reseed interval (engine-defined units).
    pub auto_seed: u8,
    /// FRO sample cycle count.
    pub sample_cycles: u16,
    /// FRO sample divider.
    pub sample_div: u8,
    /// Number of noise blocks per condensed seed block.
    pub noise_blocks: u8,
}

/// Fetch random bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomCmd {
    /// Byte count, 1..=65535.
    pub size: usize,
}

/// Provision a random hardware unique key into OTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProvisionHukCmd {
    /// Static asset number for the new root key.
    pub number: StaticAssetNumber,
    /// Use a 128-bit key instead of 256-bit.
    pub bits_128: bool,
    /// Append a CRC to the programmed item.
    pub add_crc: bool,
    /// TRNG configuration applied before sampling the key.
    pub trng: TrngConfigCmd,
}

/// Secure timer operation selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOp {
    /// (Re)start the timer from zero.
    Start,
    /// Stop the timer and report the elapsed count.
    Stop,
    /// Report the elapsed count without stopping.
    Read,
}

/// Exclusive-access arbitration operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimOp {
    /// Link the channel to this identity; fails with busy if another
    /// identity holds it.
    Claim,
    /// Seize the link even if another identity holds it.
    Overrule,
    /// Release the link; only the holder may do this.
    Release,
}

/// eMMC/RPMB authentication operations.
///
/// Request forms open a session against an authentication key and return a
/// nonce plus a state asset; verify forms check a device MAC against that
/// state. Write forms produce the MAC for outgoing frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmmcOp {
    /// Begin an authenticated read; returns nonce and state asset.
    ReadRequest {
        /// RPMB authentication key asset.
        key: AssetId,
    },
    /// Verify the MAC over read response frames.
    ReadVerify {
        /// State asset from the matching request.
        state: AssetId,
        /// Frame bytes covered by the MAC.
        data: Vec<u8>,
        /// Device MAC to check.
        mac: [u8; 32],
    },
    /// Begin an authenticated write-counter read.
    CounterRequest {
        /// RPMB authentication key asset.
        key: AssetId,
    },
    /// Verify the MAC over a write-counter response.
    CounterVerify {
        /// State asset from the matching request.
        state: AssetId,
        /// Frame bytes covered by the MAC.
        data: Vec<u8>,
        /// Device MAC to check.
        mac: [u8; 32],
    },
    /// Produce the MAC for an outgoing write frame.
    WriteRequest {
        /// State asset from a counter request.
        state: AssetId,
        /// Frame bytes to authenticate.
        data: Vec<u8>,
    },
    /// Verify the MAC over the write result frame.
    WriteVerify {
        /// State asset from the matching request.
        state: AssetId,
        /// Frame bytes covered by the MAC.
        data: Vec<u8>,
        /// Device MAC to check.
        mac: [u8; 32],
    },
}

/// Milenage (3GPP authentication and key agreement) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MilenageOp {
    /// Create an SQN administration asset bound to a static K/OP set.
    SqnAdminCreate {
        /// Static asset number of the subscriber key set.
        number: StaticAssetNumber,
        /// Enable the AMF separation-bit test behavior.
        amf_sb_test: bool,
    },
    /// Reset the sequence-number administration to its initial state.
    SqnAdminReset {
        /// SQN administration asset.
        asset: AssetId,
    },
    /// Export the administration state as a key blob.
    SqnAdminExport {
        /// SQN administration asset.
        asset: AssetId,
        /// Key-encryption key to wrap under.
        kek: AssetId,
        /// Associated data bound into the blob.
        aad: Vec<u8>,
    },
    /// AUTN verification against a static key set, no sequence tracking.
    AutnVerifyStatic {
        /// Static asset number of the subscriber key set.
        number: StaticAssetNumber,
        /// Network challenge.
        rand: [u8; 16],
        /// Authentication token to verify.
        autn: [u8; 16],
    },
    /// AUTN verification with engine-side sequence-number tracking.
    ///
    /// On a sequence failure the result carries the EMM cause and an AUTS
    /// for resynchronization.
    AutnVerifySqn {
        /// SQN administration asset.
        sqn: AssetId,
        /// Network challenge.
        rand: [u8; 16],
        /// Authentication token to verify.
        autn: [u8; 16],
    },
    /// Generate an AUTS resynchronization token.
    AutsGenerate {
        /// Static asset number of the subscriber key set.
        number: StaticAssetNumber,
        /// Network challenge.
        rand: [u8; 16],
        /// Mobile-station sequence number.
        sqn_ms: [u8; 6],
        /// Authentication management field.
        amf: [u8; 2],
    },
    /// Conformance check with caller-supplied K and OP, returns every
    /// intermediate of the f1..f5* functions.
    Conformance {
        /// Network challenge.
        rand: [u8; 16],
        /// Sequence number.
        sqn: [u8; 6],
        /// Authentication management field.
        amf: [u8; 2],
        /// Subscriber key.
        k: [u8; 16],
        /// Operator variant constant.
        op: [u8; 16],
    },
}

/// Asymmetric sign/verify flavor, with the digest it runs over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignVerifyMethod {
    /// ECDSA over the named digest.
    Ecdsa {
        /// Digest algorithm.
        hash: HashAlg,
    },
    /// DSA over the named digest.
    Dsa {
        /// Digest algorithm.
        hash: HashAlg,
    },
    /// RSASSA-PKCS#1 v1.5 over the named digest.
    RsaPkcs1 {
        /// Digest algorithm.
        hash: HashAlg,
    },
    /// RSASSA-PSS over the named digest.
    RsaPss {
        /// Digest algorithm.
        hash: HashAlg,
        /// Salt length in bytes.
        salt_len: usize,
    },
    /// First EdDSA phase; absorbs up to 96 message bytes.
    EddsaInitial,
    /// Middle EdDSA phase; absorbs message fragments into the state asset.
    EddsaUpdate,
    /// Last EdDSA phase; emits or checks the signature and consumes the
    /// state asset.
    EddsaFinal,
}

/// Asymmetric sign or verify command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkSignVerifyCmd {
    /// Operation flavor.
    pub method: SignVerifyMethod,
    /// Modulus (or curve) size in bits.
    pub modulus_bits: usize,
    /// Key asset: private to sign, public to verify. EdDSA updates take the
    /// public key regardless of direction.
    pub key: AssetId,
    /// Domain parameters asset for the discrete-log families.
    pub domain: Option<AssetId>,
    /// Intermediate digest asset or EdDSA chaining state.
    pub state: Option<AssetId>,
    /// Message fragment hashed inside the engine, at most
    /// [`MAX_PK_HASH_BYTES`](crate::MAX_PK_HASH_BYTES) bytes.
    pub data: Vec<u8>,
    /// Total message length, required once the digest finishes.
    pub total_len: u64,
    /// Signature to verify (wire vector form); `None` requests one.
    pub signature: Option<Vec<u8>>,
}

/// Key-pair generation flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenKeyMethod {
    /// Fresh ECDSA/ECDH key pair on the loaded curve.
    EcdsaPair,
    /// Public key of an existing ECDSA/ECDH private key.
    EcdsaPublic,
    /// Fresh EdDSA key pair.
    EddsaPair,
    /// Public key of an existing EdDSA private key.
    EddsaPublic,
    /// Fresh X25519 key pair.
    X25519Pair,
    /// Public key of an existing X25519 private key.
    X25519Public,
    /// Fresh Diffie-Hellman key pair.
    DhPair,
    /// Public value of an existing DH private key.
    DhPublic,
    /// Fresh DSA key pair.
    DsaPair,
    /// Public key of an existing DSA private key.
    DsaPublic,
}

/// Generate a key pair (or recover its public half) on engine-held domain
/// parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkGenKeyCmd {
    /// Generation flavor.
    pub method: GenKeyMethod,
    /// Modulus (or curve) size in bits.
    pub modulus_bits: usize,
    /// Subgroup size in bits for DH/DSA; zero elsewhere.
    pub divisor_bits: usize,
    /// Private-key asset, freshly created with a signing/agreement policy.
    pub private: AssetId,
    /// Domain parameters asset.
    pub domain: AssetId,
    /// Also wrap the new private key into a key blob.
    pub export: Option<ExportReq>,
    /// Return the public half in the result.
    pub want_public: bool,
}

/// Shared-secret derivation flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharedSecretMethod {
    /// ECDH, single key pair.
    Ecdh,
    /// ECDH, two key pairs (static plus ephemeral).
    EcdhDual,
    /// X25519.
    X25519,
    /// Finite-field DH, single key pair.
    Dh,
    /// Finite-field DH, two key pairs.
    DhDual,
}

/// Derive one or more assets from an asymmetric shared secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkSharedSecretCmd {
    /// Agreement flavor.
    pub method: SharedSecretMethod,
    /// Modulus (or curve) size in bits.
    pub modulus_bits: usize,
    /// Local private key asset.
    pub private: AssetId,
    /// Domain parameters asset.
    pub domain: AssetId,
    /// Peer public key (wire vector form).
    pub peer: Vec<u8>,
    /// Second local private key for the dual flavors.
    pub private2: Option<AssetId>,
    /// Second peer public key for the dual flavors.
    pub peer2: Option<Vec<u8>>,
    /// Caller info mixed into the engine's KDF.
    pub other_info: Vec<u8>,
    /// Assets to fill from the derived keying material.
    pub dest: Vec<AssetId>,
    /// Store the raw secret instead of KDF output; requires exactly one
    /// destination asset.
    pub save_shared: bool,
}

/// RSA wrap/unwrap flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMethod {
    /// RSAES-OAEP; the additional input is a label the engine hashes.
    OaepLabel {
        /// Mask/label digest algorithm.
        hash: HashAlg,
    },
    /// RSAES-OAEP; the additional input is the already-hashed label and
    /// must be exactly one digest long.
    OaepDigest {
        /// Mask/label digest algorithm.
        hash: HashAlg,
    },
    /// RSAES-PKCS#1 v1.5; takes no additional input.
    Pkcs1,
}

/// Wrap an asset under an RSA public key, or unwrap into one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkWrapCmd {
    /// Padding flavor.
    pub method: WrapMethod,
    /// Wrap when true, unwrap otherwise.
    pub wrap: bool,
    /// Modulus size in bits.
    pub modulus_bits: usize,
    /// RSA key asset: public to wrap, private to unwrap.
    pub key: AssetId,
    /// Asset being wrapped, or the empty asset receiving the unwrap.
    pub target: AssetId,
    /// OAEP label or label digest; empty for PKCS#1.
    pub additional: Vec<u8>,
    /// Wrapped blob to unwrap; empty on wrap.
    pub data: Vec<u8>,
}

/// Asymmetric encryption flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkEncryptMethod {
    /// EC ElGamal encryption; one point in, an ephemeral pair out.
    EccElGamalEncrypt,
    /// EC ElGamal decryption; a point pair in, the plaintext point out.
    EccElGamalDecrypt,
}

/// Asymmetric encrypt/decrypt over EC points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkEncryptCmd {
    /// Operation flavor.
    pub method: PkEncryptMethod,
    /// Curve size in bits.
    pub modulus_bits: usize,
    /// Key asset: public to encrypt, private to decrypt.
    pub key: AssetId,
    /// Curve domain parameters asset.
    pub domain: AssetId,
    /// One point (encrypt) or two (decrypt), wire vector form.
    pub data: Vec<u8>,
}

/// Key-check family selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCheckMethod {
    /// Elliptic-curve keys (ECDH/ECDSA).
    EcdhEcdsa,
    /// Finite-field keys (DH/DSA).
    DhDsa,
}

/// Check asymmetric keys against their domain parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkKeyCheckCmd {
    /// Key family.
    pub method: KeyCheckMethod,
    /// Modulus (or curve) size in bits.
    pub modulus_bits: usize,
    /// Subgroup size in bits for the finite-field family; zero elsewhere.
    pub divisor_bits: usize,
    /// Public-key asset to check.
    pub public: Option<AssetId>,
    /// Private-key asset to check, or pair-check against the public key.
    pub private: Option<AssetId>,
    /// Domain parameters asset.
    pub domain: AssetId,
}

/// RFC 5649 AES key wrap with padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AesWrapCmd {
    /// Wrap when true, unwrap otherwise.
    pub encrypt: bool,
    /// Wrapping key; policy must carry `AES_WRAP`.
    pub key: KeyRef,
    /// Key material to wrap, or the wrapped blob to unwrap.
    pub data: Vec<u8>,
}

/// The service payload: a closed sum over everything the engine can do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceCmd {
    /// Liveness probe; the engine echoes an empty success.
    Nop,
    /// Hash digest fragment.
    Hash(HashCmd),
    /// MAC fragment.
    Mac(MacCmd),
    /// Symmetric cipher transform.
    Cipher(CipherCmd),
    /// Authenticated encryption.
    AuthCrypt(AuthCryptCmd),
    /// Static asset lookup.
    AssetSearch(AssetSearchCmd),
    /// Asset allocation.
    AssetCreate(AssetCreateCmd),
    /// Asset content load.
    AssetLoad(AssetLoadCmd),
    /// Asset release.
    AssetDelete(AssetDeleteCmd),
    /// Public data read.
    PublicData(PublicDataCmd),
    /// Monotonic counter read.
    MonotonicRead(MonotonicReadCmd),
    /// Monotonic counter increment.
    MonotonicIncrement(MonotonicIncrementCmd),
    /// OTP key blob programming.
    OtpWrite(OtpWriteCmd),
    /// Random hardware unique key provisioning.
    ProvisionHuk(ProvisionHukCmd),
    /// Secure timer control.
    SecureTimer {
        /// Timer asset; `None` on start allocates one.
        asset: Option<AssetId>,
        /// Count seconds instead of ticks.
        seconds: bool,
        /// What to do with the timer.
        op: TimerOp,
    },
    /// Asymmetric sign/verify.
    PkSignVerify(PkSignVerifyCmd),
    /// Asymmetric key generation.
    PkGenKey(PkGenKeyCmd),
    /// Asymmetric shared-secret derivation.
    PkSharedSecret(PkSharedSecretCmd),
    /// RSA asset wrap/unwrap.
    PkWrap(PkWrapCmd),
    /// EC ElGamal encrypt/decrypt.
    PkEncrypt(PkEncryptCmd),
    /// Asymmetric key check.
    PkKeyCheck(PkKeyCheckCmd),
    /// AES key wrap.
    AesWrap(AesWrapCmd),
    /// Random bytes.
    Random(RandomCmd),
    /// TRNG configuration.
    TrngConfig(TrngConfigCmd),
    /// Exclusive-access arbitration.
    Claim(ClaimOp),
    /// eMMC/RPMB authentication.
    Emmc(EmmcOp),
    /// Milenage special functions.
    Milenage(MilenageOp),
    /// Engine version and identity query.
    SystemInfo,
    /// Engine reset; drops all non-OTP assets.
    SystemReset,
}

/// One command submitted to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenCmd {
    /// Caller identity stamped into the token header.
    pub identity: Identity,
    /// Host security domain the command originates from.
    pub provenance: Provenance,
    /// The requested service.
    pub service: ServiceCmd,
}

impl TokenCmd {
    /// Header opcode and subcode for this command.
    pub fn opcode(&self) -> (Opcode, u8) {
        match &self.service {
            ServiceCmd::Nop => (Opcode::Nop, 0),
            ServiceCmd::Cipher(_) => (Opcode::Cipher, 0),
            ServiceCmd::AuthCrypt(_) => (Opcode::Cipher, 1),
            ServiceCmd::Hash(_) => (Opcode::Hash, 0),
            ServiceCmd::Mac(_) => (Opcode::Mac, 0),
            ServiceCmd::Random(_) => (Opcode::Trng, 0),
            ServiceCmd::TrngConfig(_) => (Opcode::Trng, 1),
            ServiceCmd::ProvisionHuk(_) => (Opcode::Trng, 2),
            ServiceCmd::Milenage(_) => (Opcode::SpecialFunctions, 0),
            ServiceCmd::AesWrap(_) => (Opcode::AesWrap, 0),
            ServiceCmd::AssetSearch(_) => (Opcode::AssetManagement, 0),
            ServiceCmd::AssetCreate(_) => (Opcode::AssetManagement, 1),
            ServiceCmd::AssetLoad(_) => (Opcode::AssetManagement, 2),
            ServiceCmd::AssetDelete(_) => (Opcode::AssetManagement, 3),
            ServiceCmd::PublicData(_) => (Opcode::AssetManagement, 4),
            ServiceCmd::MonotonicRead(_) => (Opcode::AssetManagement, 5),
            ServiceCmd::MonotonicIncrement(_) => (Opcode::AssetManagement, 6),
            ServiceCmd::OtpWrite(_) => (Opcode::AssetManagement, 7),
            ServiceCmd::SecureTimer { .. } => (Opcode::AssetManagement, 8),
            ServiceCmd::PkSignVerify(_) => (Opcode::PublicKey, 0),
            ServiceCmd::PkGenKey(_) => (Opcode::PublicKey, 1),
            ServiceCmd::PkSharedSecret(_) => (Opcode::PublicKey, 2),
            ServiceCmd::PkWrap(_) => (Opcode::PublicKey, 3),
            ServiceCmd::PkEncrypt(_) => (Opcode::PublicKey, 4),
            ServiceCmd::PkKeyCheck(_) => (Opcode::PublicKey, 5),
            ServiceCmd::Emmc(_) => (Opcode::Emmc, 0),
            ServiceCmd::Claim(_) => (Opcode::Claim, 0),
            ServiceCmd::SystemInfo => (Opcode::System, 0),
            ServiceCmd::SystemReset => (Opcode::System, 1),
        }
    }
}
