// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Asymmetric key operations.
//!
//! Key material stays in assets; what crosses the boundary is wire-vector
//! encoded public values, signatures and ciphertext points. Each family
//! module adds its operations onto [`Session`](crate::session::Session);
//! [`key`] holds the descriptor validation and footprints they share.
//!
//! Sign and verify take raw messages. Messages longer than one token's
//! hash capacity are absorbed into an engine-side digest first, invisibly
//! to the caller; the result equals the one-token computation.

pub mod dh;
pub mod dsa;
pub mod ecdh;
pub mod ecdsa;
pub mod eddsa;
pub mod elgamal;
pub mod key;
pub mod rsa;
pub mod x25519;

pub(crate) mod ecc;

use sevault_channel::TokenChannel;
use sevault_token::HashAlg;
use sevault_token::HashCmd;
use sevault_token::PolicyMask;
use sevault_token::ServiceCmd;
use sevault_token::StreamMode;
use sevault_token::StreamState;
use sevault_token::MAX_PK_HASH_BYTES;

use crate::asset::Asset;
use crate::error::VaultResult;
use crate::session::Session;
use crate::sym::block_cap;

pub use ecc::EccDomain;
pub use ecc::EcPoint;
pub use key::AsymFamily;
pub use key::KeyDescriptor;

/// Digest input for one asymmetric sign/verify token: an optional
/// engine-side intermediate plus the terminal fragment.
pub(crate) struct DigestInput<'s, 'm, C: TokenChannel> {
    pub state: Option<Asset<'s, C>>,
    pub tail: &'m [u8],
    pub total_len: u64,
}

/// Prepares `message` for an operation that hashes inside the engine.
///
/// A message within the per-token hash capacity travels whole. A longer one
/// is pre-absorbed through a short-lived asset-backed digest; the returned
/// tail is nonempty and within capacity, and the asset dies with the
/// returned handle once the operation consumed it.
pub(crate) fn feed_digest<'s, 'm, C: TokenChannel>(
    session: &'s Session<C>,
    hash: HashAlg,
    message: &'m [u8],
) -> VaultResult<DigestInput<'s, 'm, C>> {
    let total_len = message.len() as u64;
    if message.len() <= MAX_PK_HASH_BYTES {
        return Ok(DigestInput {
            state: None,
            tail: message,
            total_len,
        });
    }
    let block = hash.block_len();
    let absorbed = (message.len() - MAX_PK_HASH_BYTES).div_ceil(block) * block;
    let state = session.allocate_asset(
        crate::asset::source_policy(session, PolicyMask::TEMP_MAC | hash.policy_bit()),
        hash.state_len(),
        sevault_token::Lifetime::Infinite,
    )?;
    let cap = block_cap(block);
    let mut offset = 0;
    while offset < absorbed {
        let take = (absorbed - offset).min(cap);
        let mode = if offset == 0 {
            StreamMode::Init2Cont
        } else {
            StreamMode::Cont2Cont
        };
        session.exchange(ServiceCmd::Hash(HashCmd {
            alg: hash,
            mode,
            state: StreamState::Asset(state.id()),
            data: message[offset..offset + take].to_vec(),
            total_len: 0,
        }))?;
        offset += take;
    }
    Ok(DigestInput {
        state: Some(state),
        tail: &message[absorbed..],
        total_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_message_split_absorbs_the_minimum() {
        // One fewer block absorbed would leave a tail over capacity.
        let block = HashAlg::Sha512.block_len();
        for len in [MAX_PK_HASH_BYTES + 1, MAX_PK_HASH_BYTES + block + 1] {
            let absorbed = (len - MAX_PK_HASH_BYTES).div_ceil(block) * block;
            assert!(len - absorbed <= MAX_PK_HASH_BYTES);
            assert!(absorbed == block || len - (absorbed - block) > MAX_PK_HASH_BYTES);
        }
    }

    #[test]
    fn long_message_split_leaves_a_bounded_tail() {
        let block = HashAlg::Sha256.block_len();
        for len in [
            MAX_PK_HASH_BYTES + 1,
            MAX_PK_HASH_BYTES + block,
            4 * 4096 + 1,
            1 << 20,
        ] {
            let absorbed = (len - MAX_PK_HASH_BYTES).div_ceil(block) * block;
            let tail = len - absorbed;
            assert!(absorbed % block == 0);
            assert!(tail >= 1, "len {len}");
            assert!(tail <= MAX_PK_HASH_BYTES, "len {len}");
        }
    }
}
