// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! ECDH key agreement over caller-supplied Weierstrass domains.

use sevault_channel::TokenChannel;
use sevault_token::PkSharedSecretCmd;
use sevault_token::ServiceCmd;
use sevault_token::SharedSecretMethod;

use crate::asset::Asset;
use crate::asym::ecc;
use crate::asym::x25519::check_kdf_args;
use crate::asym::AsymFamily;
use crate::asym::EcPoint;
use crate::asym::KeyDescriptor;
use crate::error::VaultError;
use crate::error::VaultResult;
use crate::session::Session;

fn check_family(desc: &KeyDescriptor) -> VaultResult<()> {
    if desc.family != AsymFamily::Ecdh {
        return Err(VaultError::BadArgument);
    }
    desc.validate()
}

impl<C: TokenChannel> Session<C> {
    #[allow(clippy::too_many_arguments)]
    fn ecdh_run(
        &self,
        desc: &KeyDescriptor,
        method: SharedSecretMethod,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        peer: &EcPoint,
        second: Option<(&Asset<'_, C>, &EcPoint)>,
        other_info: &[u8],
        dests: &[&Asset<'_, C>],
        save_shared: bool,
    ) -> VaultResult<()> {
        check_family(desc)?;
        check_kdf_args(other_info, dests, save_shared, desc.secret_len())?;
        let (private2, peer2) = match second {
            Some((private2, peer2)) => (
                Some(private2.id()),
                Some(ecc::point_to_wire(desc.modulus_bits, peer2)?),
            ),
            None => (None, None),
        };
        self.exchange(ServiceCmd::PkSharedSecret(PkSharedSecretCmd {
            method,
            modulus_bits: desc.modulus_bits,
            private: private.id(),
            domain: domain.id(),
            peer: ecc::point_to_wire(desc.modulus_bits, peer)?,
            private2,
            peer2,
            other_info: other_info.to_vec(),
            dest: dests.iter().map(|a| a.id()).collect(),
            save_shared,
        }))?;
        Ok(())
    }

    /// Agrees on a shared secret with `peer` and spreads it over `dests`
    /// through the derivation function; with `save_shared` the single
    /// destination receives the raw secret (the x coordinate).
    pub fn ecdh_shared_secret(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        peer: &EcPoint,
        other_info: &[u8],
        dests: &[&Asset<'_, C>],
        save_shared: bool,
    ) -> VaultResult<()> {
        self.ecdh_run(
            desc,
            SharedSecretMethod::Ecdh,
            private,
            domain,
            peer,
            None,
            other_info,
            dests,
            save_shared,
        )
    }

    /// Dual-key agreement: both key pairs contribute, the concatenated
    /// secrets feed the derivation together.
    #[allow(clippy::too_many_arguments)]
    pub fn ecdh_dual_shared_secret(
        &self,
        desc: &KeyDescriptor,
        private: &Asset<'_, C>,
        private2: &Asset<'_, C>,
        domain: &Asset<'_, C>,
        peer: &EcPoint,
        peer2: &EcPoint,
        other_info: &[u8],
        dests: &[&Asset<'_, C>],
    ) -> VaultResult<()> {
        self.ecdh_run(
            desc,
            SharedSecretMethod::EcdhDual,
            private,
            domain,
            peer,
            Some((private2, peer2)),
            other_info,
            dests,
            false,
        )
    }
}
