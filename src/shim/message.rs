// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

#[cfg(test)]
use cid::Cid;
pub use fvm_shared4::message::Message;

#[cfg(test)]
use crate::utils::cid::CidCborExt as _;

pub trait MessageExt {
    /// CID of the unsigned message.
    #[cfg(test)]
    fn cid(&self) -> anyhow::Result<Cid>;
    /// DAG-CBOR encoding, as carried in `apply_messages`.
    fn marshal_cbor(&self) -> anyhow::Result<Vec<u8>>;
}

impl MessageExt for Message {
    #[cfg(test)]
    fn cid(&self) -> anyhow::Result<Cid> {
        Ok(Cid::from_cbor_blake2b256(self)?)
    }

    fn marshal_cbor(&self) -> anyhow::Result<Vec<u8>> {
        Ok(fvm_ipld_encoding::to_vec(self)?)
    }
}
