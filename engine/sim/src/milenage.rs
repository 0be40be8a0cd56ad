// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Milenage authentication services.
//!
//! The 3GPP TS 35.205/35.206 f-functions over the AES kernel, together with
//! the sequence-number bookkeeping the engine keeps around them. Subscriber
//! key sets live in the one-time-programmable catalog as 32 bytes of
//! `K || OP` under a private-data policy; sequence trackers are small
//! engine-owned assets bound to one such slot.

use sevault_token::AssetId;
use sevault_token::EngineStatus;
use sevault_token::MilenageConformance;
use sevault_token::MilenageOp;
use sevault_token::MilenageRes;
use sevault_token::PolicyMask;
use sevault_token::Provenance;
use sevault_token::ServiceRes;
use sevault_token::StaticAssetNumber;
use sevault_token::TokenRes;

use crate::crypto::cipher::aes_block;
use crate::crypto::kw;
use crate::dispatcher::EngineState;
use crate::errors::SimError;
use crate::errors::SimResult;
use crate::vault::check_aad;
use crate::vault::AssetAux;

/// Byte length of a sequence tracker asset: the 6-byte SQN, one flag byte,
/// and the catalog slot of the subscriber set it tracks.
const TRACKER_LEN: usize = 8;

/// Tracker flag requiring the AMF separation bit on every accepted AUTN.
const FLAG_AMF_SB_TEST: u8 = 0x01;

/// Mobility-management cause reported on a sequence resynchronization
/// (3GPP TS 24.301, "synch failure").
const CAUSE_SYNCH_FAILURE: u8 = 21;

/// One subscriber's Milenage kernel: the key and the derived `OPc`.
struct Milenage {
    k: [u8; 16],
    opc: [u8; 16],
}

impl Milenage {
    /// Derives the subscriber constant `OPc = OP xor E_K(OP)`.
    fn new(k: [u8; 16], op: [u8; 16]) -> SimResult<Self> {
        let enc = aes_block(&k, &op, true)?;
        Ok(Milenage {
            k,
            opc: xor(&op, &enc),
        })
    }

    /// `TEMP = E_K(RAND xor OPc)`, shared by every f-function.
    fn temp(&self, rand: &[u8; 16]) -> SimResult<[u8; 16]> {
        aes_block(&self.k, &xor(rand, &self.opc), true)
    }

    /// f1 and f1*: the network and resynchronization authentication codes.
    fn f1(&self, rand: &[u8; 16], sqn: &[u8; 6], amf: &[u8; 2]) -> SimResult<([u8; 8], [u8; 8])> {
        let temp = self.temp(rand)?;
        let mut in1 = [0u8; 16];
        in1[..6].copy_from_slice(sqn);
        in1[6..8].copy_from_slice(amf);
        in1[8..14].copy_from_slice(sqn);
        in1[14..].copy_from_slice(amf);
        // OUT1 = E_K(TEMP xor rot(IN1 xor OPc, r1) xor c1) xor OPc with
        // r1 = 64 bits and c1 = 0.
        let x = xor(&temp, &rot(&xor(&in1, &self.opc), 8));
        let out = xor(&aes_block(&self.k, &x, true)?, &self.opc);
        let mut mac_a = [0u8; 8];
        let mut mac_s = [0u8; 8];
        mac_a.copy_from_slice(&out[..8]);
        mac_s.copy_from_slice(&out[8..]);
        Ok((mac_a, mac_s))
    }

    /// `OUTn = E_K(rot(TEMP xor OPc, rn) xor cn) xor OPc`; the rotation is
    /// in bytes and the round constant occupies the last byte.
    fn out(&self, temp: &[u8; 16], r: usize, c: u8) -> SimResult<[u8; 16]> {
        let mut x = rot(&xor(temp, &self.opc), r);
        x[15] ^= c;
        Ok(xor(&aes_block(&self.k, &x, true)?, &self.opc))
    }

    /// f2 (RES), f3 (CK), f4 (IK), and f5 (AK) off one challenge.
    fn f2345(&self, rand: &[u8; 16]) -> SimResult<([u8; 8], [u8; 16], [u8; 16], [u8; 6])> {
        let temp = self.temp(rand)?;
        let out2 = self.out(&temp, 0, 1)?;
        let ck = self.out(&temp, 4, 2)?;
        let ik = self.out(&temp, 8, 4)?;
        let mut res = [0u8; 8];
        res.copy_from_slice(&out2[8..]);
        let mut ak = [0u8; 6];
        ak.copy_from_slice(&out2[..6]);
        Ok((res, ck, ik, ak))
    }

    /// f5*: the resynchronization anonymity key.
    fn f5_star(&self, rand: &[u8; 16]) -> SimResult<[u8; 6]> {
        let out5 = self.out(&self.temp(rand)?, 12, 8)?;
        let mut ak_star = [0u8; 6];
        ak_star.copy_from_slice(&out5[..6]);
        Ok(ak_star)
    }
}

/// Byte-wise XOR of two AES blocks.
fn xor(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = a[i] ^ b[i];
    }
    out
}

/// Left-rotates a block by whole bytes; every TS 35.206 rotation amount is
/// a multiple of eight bits.
fn rot(x: &[u8; 16], bytes: usize) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = x[(i + bytes) % 16];
    }
    out
}

/// Loads the 32-byte `K || OP` subscriber set from a catalog slot.
fn subscriber_set(
    state: &mut EngineState,
    provenance: Provenance,
    number: u8,
) -> SimResult<Milenage> {
    let (asset, _) = state.vault.search(number)?;
    let content = state
        .vault
        .key_content(asset, PolicyMask::PRIVATE_DATA, provenance)?;
    if content.len() != 32 {
        tracing::debug!(number, len = content.len(), "subscriber set has the wrong shape");
        return Err(SimError::InvalidKeySize);
    }
    let mut k = [0u8; 16];
    let mut op = [0u8; 16];
    k.copy_from_slice(&content[..16]);
    op.copy_from_slice(&content[16..]);
    Milenage::new(k, op)
}

/// Sequence tracker state packed into an 8-byte engine asset.
struct SqnTracker {
    sqn: [u8; 6],
    flags: u8,
    number: u8,
}

impl SqnTracker {
    fn parse(content: &[u8]) -> SimResult<Self> {
        if content.len() != TRACKER_LEN {
            return Err(SimError::InvalidState);
        }
        let mut sqn = [0u8; 6];
        sqn.copy_from_slice(&content[..6]);
        Ok(SqnTracker {
            sqn,
            flags: content[6],
            number: content[7],
        })
    }

    fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TRACKER_LEN);
        out.extend_from_slice(&self.sqn);
        out.push(self.flags);
        out.push(self.number);
        out
    }
}

/// Loads a sequence tracker, refusing assets from the other world or of the
/// wrong shape.
fn tracker(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
) -> SimResult<SqnTracker> {
    let asset = state.vault.lookup(id)?;
    if asset.origin != provenance {
        return Err(SimError::AccessError);
    }
    let content = asset.content.clone().ok_or(SimError::InvalidState)?;
    SqnTracker::parse(&content)
}

/// Accepted AUTN with everything recovered from it.
struct AutnVector {
    res: [u8; 8],
    ck: [u8; 16],
    ik: [u8; 16],
    sqn: [u8; 6],
    amf: [u8; 2],
}

/// Checks the network authentication code inside an AUTN and unmasks the
/// sequence number.
fn verify_autn(ml: &Milenage, rand: &[u8; 16], autn: &[u8; 16]) -> SimResult<AutnVector> {
    let (res, ck, ik, ak) = ml.f2345(rand)?;
    let mut sqn = [0u8; 6];
    for (i, slot) in sqn.iter_mut().enumerate() {
        *slot = autn[i] ^ ak[i];
    }
    let mut amf = [0u8; 2];
    amf.copy_from_slice(&autn[6..8]);
    let (mac_a, _) = ml.f1(rand, &sqn, &amf)?;
    if !openssl::memcmp::eq(&mac_a, &autn[8..]) {
        tracing::debug!("AUTN network authentication code did not match");
        return Err(SimError::VerifyError);
    }
    Ok(AutnVector {
        res,
        ck,
        ik,
        sqn,
        amf,
    })
}

/// `AUTS = (SQN xor AK*) || MAC-S`.
fn build_auts(
    ml: &Milenage,
    rand: &[u8; 16],
    sqn: &[u8; 6],
    amf: &[u8; 2],
) -> SimResult<[u8; 14]> {
    let ak_star = ml.f5_star(rand)?;
    let (_, mac_s) = ml.f1(rand, sqn, amf)?;
    let mut auts = [0u8; 14];
    for i in 0..6 {
        auts[i] = sqn[i] ^ ak_star[i];
    }
    auts[6..].copy_from_slice(&mac_s);
    Ok(auts)
}

fn accept(res: MilenageRes) -> SimResult<TokenRes> {
    Ok(TokenRes {
        status: EngineStatus::Success,
        service: ServiceRes::Milenage(res),
    })
}

fn sqn_admin_create(
    state: &mut EngineState,
    provenance: Provenance,
    number: StaticAssetNumber,
    amf_sb_test: bool,
) -> SimResult<TokenRes> {
    // The subscriber set must exist and be readable before a tracker is
    // bound to it.
    subscriber_set(state, provenance, number.get())?;
    let tracker = SqnTracker {
        sqn: [0; 6],
        flags: if amf_sb_test { FLAG_AMF_SB_TEST } else { 0 },
        number: number.get(),
    };
    let id = state
        .vault
        .create_engine(TRACKER_LEN, provenance, AssetAux::None)?;
    state.vault.fill(id, tracker.pack())?;
    accept(MilenageRes::SqnAdmin {
        asset: Some(id),
        blob: Vec::new(),
    })
}

fn sqn_admin_reset(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
) -> SimResult<TokenRes> {
    let mut t = tracker(state, provenance, id)?;
    t.sqn = [0; 6];
    state.vault.update_content(id, t.pack())?;
    accept(MilenageRes::SqnAdmin {
        asset: Some(id),
        blob: Vec::new(),
    })
}

fn sqn_admin_export(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
    kek: AssetId,
    aad: &[u8],
) -> SimResult<TokenRes> {
    check_aad(aad)?;
    let t = tracker(state, provenance, id)?;
    let kek_material = state
        .vault
        .key_content(kek, PolicyMask::AES_WRAP, provenance)?;
    let blob = kw::blob_wrap(&kek_material, aad, &t.pack())?;
    accept(MilenageRes::SqnAdmin { asset: None, blob })
}

fn autn_verify_static(
    state: &mut EngineState,
    provenance: Provenance,
    number: StaticAssetNumber,
    rand: &[u8; 16],
    autn: &[u8; 16],
) -> SimResult<TokenRes> {
    let ml = subscriber_set(state, provenance, number.get())?;
    let vector = verify_autn(&ml, rand, autn)?;
    accept(MilenageRes::Autn {
        res: vector.res,
        ck: vector.ck,
        ik: vector.ik,
        sqn: vector.sqn,
        amf: vector.amf,
    })
}

fn autn_verify_sqn(
    state: &mut EngineState,
    provenance: Provenance,
    id: AssetId,
    rand: &[u8; 16],
    autn: &[u8; 16],
) -> SimResult<TokenRes> {
    let mut t = tracker(state, provenance, id)?;
    let ml = subscriber_set(state, provenance, t.number)?;
    let vector = verify_autn(&ml, rand, autn)?;
    if t.flags & FLAG_AMF_SB_TEST != 0 && vector.amf[0] & 0x80 == 0 {
        tracing::debug!("AMF separation bit required but clear");
        return Err(SimError::VerifyError);
    }
    // The 6-byte big-endian sequence number must strictly advance. A stale
    // one is answered with a resynchronization token built from the stored
    // sequence and a zero AMF (TS 33.102 section 6.3.3).
    if vector.sqn <= t.sqn {
        let auts = build_auts(&ml, rand, &t.sqn, &[0u8; 2])?;
        return Ok(TokenRes {
            status: EngineStatus::VerifyError,
            service: ServiceRes::Milenage(MilenageRes::AutnReject {
                cause: CAUSE_SYNCH_FAILURE,
                auts,
            }),
        });
    }
    t.sqn = vector.sqn;
    state.vault.update_content(id, t.pack())?;
    accept(MilenageRes::Autn {
        res: vector.res,
        ck: vector.ck,
        ik: vector.ik,
        sqn: vector.sqn,
        amf: vector.amf,
    })
}

fn auts_generate(
    state: &mut EngineState,
    provenance: Provenance,
    number: StaticAssetNumber,
    rand: &[u8; 16],
    sqn_ms: &[u8; 6],
    amf: &[u8; 2],
) -> SimResult<TokenRes> {
    let ml = subscriber_set(state, provenance, number.get())?;
    let auts = build_auts(&ml, rand, sqn_ms, amf)?;
    accept(MilenageRes::Auts { auts })
}

fn conformance(
    rand: &[u8; 16],
    sqn: &[u8; 6],
    amf: &[u8; 2],
    k: [u8; 16],
    op: [u8; 16],
) -> SimResult<TokenRes> {
    let ml = Milenage::new(k, op)?;
    let (mac_a, mac_s) = ml.f1(rand, sqn, amf)?;
    let (res, ck, ik, ak) = ml.f2345(rand)?;
    let ak_star = ml.f5_star(rand)?;
    accept(MilenageRes::Conformance(Box::new(MilenageConformance {
        res,
        ck,
        ik,
        mac_a,
        mac_s,
        ak,
        ak_star,
        opc: ml.opc,
    })))
}

/// Runs one Milenage operation.
///
/// Returns the whole result token: the sequence-tracking AUTN flavor
/// reports a stale sequence number as a verify-failure status that still
/// carries an [`MilenageRes::AutnReject`] payload.
pub(crate) fn milenage_service(
    state: &mut EngineState,
    provenance: Provenance,
    op: &MilenageOp,
) -> SimResult<TokenRes> {
    match op {
        MilenageOp::SqnAdminCreate {
            number,
            amf_sb_test,
        } => sqn_admin_create(state, provenance, *number, *amf_sb_test),
        MilenageOp::SqnAdminReset { asset } => sqn_admin_reset(state, provenance, *asset),
        MilenageOp::SqnAdminExport { asset, kek, aad } => {
            sqn_admin_export(state, provenance, *asset, *kek, aad)
        }
        MilenageOp::AutnVerifyStatic { number, rand, autn } => {
            autn_verify_static(state, provenance, *number, rand, autn)
        }
        MilenageOp::AutnVerifySqn { sqn, rand, autn } => {
            autn_verify_sqn(state, provenance, *sqn, rand, autn)
        }
        MilenageOp::AutsGenerate {
            number,
            rand,
            sqn_ms,
            amf,
        } => auts_generate(state, provenance, *number, rand, sqn_ms, amf),
        MilenageOp::Conformance {
            rand,
            sqn,
            amf,
            k,
            op,
        } => conformance(rand, sqn, amf, *k, *op),
    }
}

#[cfg(test)]
mod tests {
    use sevault_token::keyblob_len;
    use sevault_token::Lifetime;
    use test_with_tracing::test;

    use crate::MILENAGE_TEST_SET_NUMBER;

    use super::*;

    // 3GPP TS 35.208 test set 1, the set the simulator catalog ships in
    // slot 10.
    const K: &str = "465b5ce8b199b49faa5f0a2ee238a6bc";
    const RAND: &str = "23553cde8f6bd6a977b4637a5f12cabe";
    const OP: &str = "cdc202d5123e20f62b6d676ac72cb318";
    const SQN: &str = "ff9bb4d0b607";
    const AMF: &str = "b9b9";

    fn bytes<const N: usize>(hex: &str) -> [u8; N] {
        let v = hex::decode(hex).unwrap();
        let mut out = [0u8; N];
        out.copy_from_slice(&v);
        out
    }

    /// `AUTN = (SQN xor AK) || AMF || MAC-A` for test set 1.
    fn set1_autn() -> [u8; 16] {
        bytes("55f328b43577b9b94a9ffac354dfafb3")
    }

    fn slot() -> StaticAssetNumber {
        StaticAssetNumber::new(MILENAGE_TEST_SET_NUMBER).unwrap()
    }

    fn run(state: &mut EngineState, op: MilenageOp) -> SimResult<TokenRes> {
        milenage_service(state, Provenance::NonSecure, &op)
    }

    fn create_tracker(state: &mut EngineState, amf_sb_test: bool) -> AssetId {
        let res = run(
            state,
            MilenageOp::SqnAdminCreate {
                number: slot(),
                amf_sb_test,
            },
        )
        .unwrap();
        let ServiceRes::Milenage(MilenageRes::SqnAdmin {
            asset: Some(id), ..
        }) = res.service
        else {
            panic!("expected a tracker asset");
        };
        id
    }

    fn conformance_vector(
        state: &mut EngineState,
        sqn: [u8; 6],
        amf: [u8; 2],
    ) -> MilenageConformance {
        let res = run(
            state,
            MilenageOp::Conformance {
                rand: bytes(RAND),
                sqn,
                amf,
                k: bytes(K),
                op: bytes(OP),
            },
        )
        .unwrap();
        let ServiceRes::Milenage(MilenageRes::Conformance(v)) = res.service else {
            panic!("expected a conformance vector");
        };
        *v
    }

    #[test]
    fn conformance_matches_the_published_test_set() {
        let mut state = EngineState::boot();
        let v = conformance_vector(&mut state, bytes(SQN), bytes(AMF));
        assert_eq!(v.opc, bytes::<16>("cd63cb71954a9f4e48a5994e37a02baf"));
        assert_eq!(v.mac_a, bytes::<8>("4a9ffac354dfafb3"));
        assert_eq!(v.mac_s, bytes::<8>("01cfaf9ec4e871e9"));
        assert_eq!(v.res, bytes::<8>("a54211d5e3ba50bf"));
        assert_eq!(v.ck, bytes::<16>("b40ba9a3c58b2a05bbf0d987b21bf8cb"));
        assert_eq!(v.ik, bytes::<16>("f769bcd751044604127672711c6d3441"));
        assert_eq!(v.ak, bytes::<6>("aa689c648370"));
        assert_eq!(v.ak_star, bytes::<6>("451e8beca43b"));
    }

    #[test]
    fn static_autn_verification_recovers_the_vector() {
        let mut state = EngineState::boot();
        let res = run(
            &mut state,
            MilenageOp::AutnVerifyStatic {
                number: slot(),
                rand: bytes(RAND),
                autn: set1_autn(),
            },
        )
        .unwrap();
        assert!(res.is_success());
        let ServiceRes::Milenage(MilenageRes::Autn { res, ck, ik, sqn, amf }) = res.service
        else {
            panic!("expected an AUTN result");
        };
        assert_eq!(res, bytes::<8>("a54211d5e3ba50bf"));
        assert_eq!(ck, bytes::<16>("b40ba9a3c58b2a05bbf0d987b21bf8cb"));
        assert_eq!(ik, bytes::<16>("f769bcd751044604127672711c6d3441"));
        assert_eq!(sqn, bytes::<6>(SQN));
        assert_eq!(amf, bytes::<2>(AMF));

        let mut forged = set1_autn();
        forged[15] ^= 1;
        let err = run(
            &mut state,
            MilenageOp::AutnVerifyStatic {
                number: slot(),
                rand: bytes(RAND),
                autn: forged,
            },
        )
        .unwrap_err();
        assert_eq!(err, SimError::VerifyError);
    }

    #[test]
    fn sequence_tracking_accepts_once_then_resynchronizes() {
        let mut state = EngineState::boot();
        let id = create_tracker(&mut state, true);
        let first = run(
            &mut state,
            MilenageOp::AutnVerifySqn {
                sqn: id,
                rand: bytes(RAND),
                autn: set1_autn(),
            },
        )
        .unwrap();
        assert!(first.is_success());

        // The same AUTN replayed is stale; the engine answers with a
        // resynchronization token over the stored sequence number.
        let replay = run(
            &mut state,
            MilenageOp::AutnVerifySqn {
                sqn: id,
                rand: bytes(RAND),
                autn: set1_autn(),
            },
        )
        .unwrap();
        assert_eq!(replay.status, EngineStatus::VerifyError);
        let ServiceRes::Milenage(MilenageRes::AutnReject { cause, auts }) = replay.service
        else {
            panic!("expected a resynchronization token");
        };
        assert_eq!(cause, 21);
        assert_eq!(auts[..6], bytes::<6>("ba853f3c123c"));
        let expect = conformance_vector(&mut state, bytes(SQN), [0; 2]);
        assert_eq!(auts[6..], expect.mac_s);
    }

    #[test]
    fn separation_bit_is_enforced_when_the_tracker_demands_it() {
        let mut state = EngineState::boot();
        let id = create_tracker(&mut state, true);
        // A valid AUTN whose AMF has the separation bit clear.
        let amf = [0x39, 0xb9];
        let v = conformance_vector(&mut state, bytes(SQN), amf);
        let mut autn = [0u8; 16];
        autn[..6].copy_from_slice(&bytes::<6>("55f328b43577"));
        autn[6..8].copy_from_slice(&amf);
        autn[8..].copy_from_slice(&v.mac_a);
        let err = run(
            &mut state,
            MilenageOp::AutnVerifySqn {
                sqn: id,
                rand: bytes(RAND),
                autn,
            },
        )
        .unwrap_err();
        assert_eq!(err, SimError::VerifyError);
    }

    #[test]
    fn reset_rewinds_the_tracker() {
        let mut state = EngineState::boot();
        let id = create_tracker(&mut state, false);
        let autn = MilenageOp::AutnVerifySqn {
            sqn: id,
            rand: bytes(RAND),
            autn: set1_autn(),
        };
        assert!(run(&mut state, autn.clone()).unwrap().is_success());
        let stale = run(&mut state, autn.clone()).unwrap();
        assert_eq!(stale.status, EngineStatus::VerifyError);

        let reset = run(&mut state, MilenageOp::SqnAdminReset { asset: id }).unwrap();
        assert!(reset.is_success());
        assert!(run(&mut state, autn).unwrap().is_success());
    }

    #[test]
    fn auts_generation_matches_the_published_test_set() {
        let mut state = EngineState::boot();
        let res = run(
            &mut state,
            MilenageOp::AutsGenerate {
                number: slot(),
                rand: bytes(RAND),
                sqn_ms: bytes(SQN),
                amf: bytes(AMF),
            },
        )
        .unwrap();
        let ServiceRes::Milenage(MilenageRes::Auts { auts }) = res.service else {
            panic!("expected an AUTS result");
        };
        assert_eq!(auts[..6], bytes::<6>("ba853f3c123c"));
        assert_eq!(auts[6..], bytes::<8>("01cfaf9ec4e871e9"));
    }

    #[test]
    fn export_wraps_the_tracker_under_the_kek() {
        let mut state = EngineState::boot();
        let id = create_tracker(&mut state, false);
        let kek = state
            .vault
            .create_caller(
                PolicyMask::AES_WRAP | PolicyMask::SOURCE_NON_SECURE,
                32,
                Lifetime::Infinite,
                Provenance::NonSecure,
            )
            .unwrap();
        state.vault.fill(kek, vec![0x5a; 32]).unwrap();
        let res = run(
            &mut state,
            MilenageOp::SqnAdminExport {
                asset: id,
                kek,
                aad: b"sqn tracker backup".to_vec(),
            },
        )
        .unwrap();
        let ServiceRes::Milenage(MilenageRes::SqnAdmin { asset, blob }) = res.service else {
            panic!("expected an export result");
        };
        assert!(asset.is_none());
        assert_eq!(blob.len(), keyblob_len(TRACKER_LEN));
        let inner = kw::blob_unwrap(&[0x5a; 32], b"sqn tracker backup", &blob).unwrap();
        assert_eq!(inner[..6], [0; 6]);
        assert_eq!(inner[7], MILENAGE_TEST_SET_NUMBER);
    }

    #[test]
    fn trackers_stay_with_their_creator() {
        let mut state = EngineState::boot();
        let id = create_tracker(&mut state, false);
        let err = milenage_service(
            &mut state,
            Provenance::Secure,
            &MilenageOp::AutnVerifySqn {
                sqn: id,
                rand: bytes(RAND),
                autn: set1_autn(),
            },
        )
        .unwrap_err();
        assert_eq!(err, SimError::AccessError);
    }
}
