// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Shared harness for the driver integration tests: one simulated engine,
//! sessions against it, and the TRNG bring-up most flows need first.

use sevault::Provenance;
use sevault::Session;
use sevault::TrngConfigCmd;
use sevault_sim::SimChannel;
use sevault_sim::SimEngine;
use sevault_sim::SIM_ENGINE_PATH;

pub fn engine() -> SimEngine {
    SimEngine::default()
}

pub fn open(engine: &SimEngine, identity: u32) -> Session<SimChannel> {
    Session::open(engine, SIM_ENGINE_PATH, identity, Provenance::NonSecure).unwrap()
}

/// One ready-to-use session on a fresh engine with the TRNG started.
pub fn session() -> Session<SimChannel> {
    let session = open(&engine(), 1);
    start_trng(&session);
    session
}

pub fn start_trng(session: &Session<SimChannel>) {
    session.trng_config(trng_start_config()).unwrap();
}

/// The sampling configuration every test brings the generator up with.
pub fn trng_start_config() -> TrngConfigCmd {
    TrngConfigCmd {
        load_start: true,
        reseed: false,
        auto_seed: 0,
        sample_cycles: 512,
        sample_div: 0,
        noise_blocks: 8,
    }
}
