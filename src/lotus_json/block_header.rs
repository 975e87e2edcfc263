// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;

use crate::blocks::BlockHeader;
use crate::shim::{address::Address, clock::ChainEpoch, econ::TokenAmount};
use ::cid::Cid;

/// Fields Lotus sends that are not listed here (tickets, proofs, signatures) are ignored.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockHeaderLotusJson {
    #[serde(with = "crate::lotus_json")]
    miner: Address,
    #[serde(with = "crate::lotus_json", default)]
    parents: Vec<Cid>,
    height: ChainEpoch,
    #[serde(with = "crate::lotus_json")]
    parent_state_root: Cid,
    #[serde(with = "crate::lotus_json")]
    parent_message_receipts: Cid,
    #[serde(with = "crate::lotus_json")]
    messages: Cid,
    timestamp: u64,
    #[serde(with = "crate::lotus_json")]
    parent_base_fee: TokenAmount,
}

impl HasLotusJson for BlockHeader {
    type LotusJson = BlockHeaderLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![(
            json!({
                "Miner": "f01000",
                "Parents": null,
                "Height": 0,
                "ParentStateRoot": {"/": "baeaaaaa"},
                "ParentMessageReceipts": {"/": "baeaaaaa"},
                "Messages": {"/": "baeaaaaa"},
                "Timestamp": 1598306400,
                "ParentBaseFee": "100",
            }),
            BlockHeader {
                miner_address: Address::new_id(1000),
                parents: vec![],
                epoch: 0,
                state_root: Cid::default(),
                message_receipts: Cid::default(),
                messages: Cid::default(),
                timestamp: 1598306400,
                parent_base_fee: TokenAmount::from_atto(100),
            },
        )]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        let Self {
            miner_address,
            parents,
            epoch,
            state_root,
            message_receipts,
            messages,
            timestamp,
            parent_base_fee,
        } = self;
        Self::LotusJson {
            miner: miner_address,
            parents,
            height: epoch,
            parent_state_root: state_root,
            parent_message_receipts: message_receipts,
            messages,
            timestamp,
            parent_base_fee,
        }
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        let Self::LotusJson {
            miner,
            parents,
            height,
            parent_state_root,
            parent_message_receipts,
            messages,
            timestamp,
            parent_base_fee,
        } = lotus_json;
        Self {
            miner_address: miner,
            parents,
            epoch: height,
            state_root: parent_state_root,
            message_receipts: parent_message_receipts,
            messages,
            timestamp,
            parent_base_fee,
        }
    }
}
