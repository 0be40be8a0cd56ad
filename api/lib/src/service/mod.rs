// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Auxiliary engine services.
//!
//! Everything outside the crypto surfaces lives here: random data and TRNG
//! control, monotonic counters, secure timers, one-time OTP programming,
//! raw AES key wrap, the eMMC (RPMB) protocol endpoints and the Milenage
//! authentication functions.

pub mod counter;
pub mod emmc;
pub mod keywrap;
pub mod milenage;
pub mod otp;
pub mod pubdata;
pub mod random;
pub mod timer;

pub use emmc::EmmcReadSession;
pub use emmc::EmmcWriteSession;
pub use milenage::AuthVector;
pub use milenage::AutnOutcome;
pub use milenage::SqnAdmin;
pub use timer::Timer;
