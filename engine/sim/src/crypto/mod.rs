// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Symmetric services: hash, MAC, cipher, AEAD and key wrap.

pub(crate) mod aead;
pub(crate) mod cipher;
pub(crate) mod hash;
pub(crate) mod kw;
pub(crate) mod mac;
