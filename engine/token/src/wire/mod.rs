// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Big-integer vector wire format.
//!
//! Large numbers cross the engine boundary as vectors of sub-vector
//! records. Each record is a 4-byte header followed by the number's bytes
//! reversed to least-significant-first and zero-padded to a 4-byte word
//! boundary:
//!
//! ```text
//! +--------------+-------+-------+----------------------------+
//! | bits (u16 LE)| index | count | value, LSB first, padded   |
//! +--------------+-------+-------+----------------------------+
//! ```
//!
//! `index`/`count` tie multi-record values together: an EC point or a DSA
//! signature is two records, a point pair four, curve domain parameters
//! seven. Application-side values are most-significant-byte-first, the
//! order the rest of the crypto ecosystem uses.
//!
//! Everything here works over plain byte slices through [`Reader`] and
//! [`Writer`]; no transport is involved.

mod cursor;
mod vector;

pub use cursor::Reader;
pub use cursor::Writer;
pub use vector::byte_len;
pub use vector::dl_domain_len;
pub use vector::ecc_domain_len;
pub use vector::get_bigint;
pub use vector::get_dl_domain;
pub use vector::get_ecc_domain;
pub use vector::get_point;
pub use vector::get_point_pair;
pub use vector::get_signature;
pub use vector::put_bigint;
pub use vector::put_dl_domain;
pub use vector::put_ecc_domain;
pub use vector::put_point;
pub use vector::put_point_pair;
pub use vector::put_signature;
pub use vector::vector_len;
pub use vector::word_len;
pub use vector::DlDomainParams;
pub use vector::EccDomainParams;
pub use vector::SubVectorHeader;

/// Wire codec failure.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Read or write ran past the end of the buffer.
    #[error("buffer exhausted, needed {needed} more bytes but only {have} remain")]
    Overrun {
        /// Bytes the operation needed.
        needed: usize,
        /// Bytes actually available.
        have: usize,
    },
    /// A bit length outside 1..=65535.
    #[error("sub-vector bit length {0} out of range")]
    BadBits(usize),
    /// A record header did not carry the expected index/count pair.
    #[error("sub-vector {index}/{count} where {expect_index}/{expect_count} was expected")]
    HeaderMismatch {
        /// Index found in the record.
        index: u8,
        /// Count found in the record.
        count: u8,
        /// Index the caller expected.
        expect_index: u8,
        /// Count the caller expected.
        expect_count: u8,
    },
}

/// Specialized result for codec operations.
pub type WireResult<T> = Result<T, WireError>;
