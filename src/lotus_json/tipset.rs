// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;

use crate::blocks::{BlockHeader, Tipset, TipsetKey};
use crate::shim::clock::ChainEpoch;

#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "TipsetFields", into = "TipsetFields")]
pub struct TipsetLotusJson(Tipset);

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TipsetFields {
    #[serde(with = "crate::lotus_json")]
    cids: TipsetKey,
    #[serde(with = "crate::lotus_json")]
    blocks: Vec<BlockHeader>,
    height: ChainEpoch,
}

impl TryFrom<TipsetFields> for TipsetLotusJson {
    type Error = anyhow::Error;

    fn try_from(value: TipsetFields) -> Result<Self, Self::Error> {
        let TipsetFields {
            cids,
            blocks,
            height,
        } = value;
        let headers = nunny::Vec::new(blocks)
            .map_err(|_| anyhow::anyhow!("tipset {cids} has no blocks"))?;
        let tipset = Tipset::new(cids, headers)?;
        anyhow::ensure!(
            tipset.epoch() == height,
            "tipset {} claims height {height} but its blocks are at {}",
            tipset.key(),
            tipset.epoch()
        );
        Ok(Self(tipset))
    }
}

impl From<TipsetLotusJson> for TipsetFields {
    fn from(TipsetLotusJson(tipset): TipsetLotusJson) -> Self {
        Self {
            cids: tipset.key().clone(),
            blocks: tipset.block_headers().iter().cloned().collect(),
            height: tipset.epoch(),
        }
    }
}

impl HasLotusJson for Tipset {
    type LotusJson = TipsetLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        use crate::shim::{address::Address, econ::TokenAmount};
        use ::cid::Cid;

        let header = BlockHeader {
            miner_address: Address::new_id(1000),
            parents: vec![Cid::default()],
            epoch: 5,
            state_root: Cid::default(),
            message_receipts: Cid::default(),
            messages: Cid::default(),
            timestamp: 1,
            parent_base_fee: TokenAmount::from_atto(100),
        };
        vec![(
            json!({
                "Cids": [{"/": "baeaaaaa"}],
                "Blocks": [{
                    "Miner": "f01000",
                    "Parents": [{"/": "baeaaaaa"}],
                    "Height": 5,
                    "ParentStateRoot": {"/": "baeaaaaa"},
                    "ParentMessageReceipts": {"/": "baeaaaaa"},
                    "Messages": {"/": "baeaaaaa"},
                    "Timestamp": 1,
                    "ParentBaseFee": "100",
                }],
                "Height": 5,
            }),
            Tipset::new(nunny::vec![Cid::default()].into(), nunny::vec![header]).unwrap(),
        )]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        TipsetLotusJson(self)
    }

    fn from_lotus_json(TipsetLotusJson(tipset): Self::LotusJson) -> Self {
        tipset
    }
}

#[test]
fn inconsistent_height_is_rejected() {
    let json = json!({
        "Cids": [{"/": "baeaaaaa"}],
        "Blocks": [{
            "Miner": "f01000",
            "Parents": null,
            "Height": 5,
            "ParentStateRoot": {"/": "baeaaaaa"},
            "ParentMessageReceipts": {"/": "baeaaaaa"},
            "Messages": {"/": "baeaaaaa"},
            "Timestamp": 1,
            "ParentBaseFee": "100",
        }],
        "Height": 6,
    });
    assert!(serde_json::from_value::<LotusJson<Tipset>>(json).is_err());
}
