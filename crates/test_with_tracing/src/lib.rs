// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! `#[test]` attribute that turns on tracing output.
//!
//! The driver crates narrate their work through `tracing` events; this
//! wraps the standard test attribute so every test installs a subscriber
//! before its body runs. `RUST_LOG` narrows the targets the usual way;
//! without it everything logs at debug.

// Test harness code; failing loudly here beats propagating.
#![allow(clippy::expect_used)]

#[cfg(test)]
extern crate self as test_with_tracing;

pub use test_with_tracing_macro::test;
use tracing::metadata::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

#[doc(hidden)]
/// Installs the test subscriber; once per process.
pub fn init() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        let targets = match std::env::var("RUST_LOG") {
            Ok(var) => var.parse().expect("RUST_LOG must parse as tracing targets"),
            Err(_) => Targets::new().with_default(LevelFilter::DEBUG),
        };
        tracing_subscriber::fmt()
            .pretty()
            .with_ansi(false) // keep captured output free of escape codes
            .with_test_writer()
            .with_max_level(LevelFilter::TRACE)
            .finish()
            .with(targets)
            .init();
    });
}
