// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;

use crate::shim::{address::Address, clock::ChainEpoch, econ::TokenAmount};

/// The fields of a block header the extractor reads.
///
/// Headers are only ever received over RPC, so the CBOR form and the signature
/// fields are not modelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub miner_address: Address,
    /// Empty for the genesis block.
    pub parents: Vec<Cid>,
    pub epoch: ChainEpoch,
    /// State root before the parent tipset's messages were applied on top of it.
    pub state_root: Cid,
    pub message_receipts: Cid,
    pub messages: Cid,
    pub timestamp: u64,
    pub parent_base_fee: TokenAmount,
}
