// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;

use super::cid::CidLotusJson;
use crate::blocks::TipsetKey;
use ::cid::Cid;

#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<CidLotusJson>", into = "Vec<CidLotusJson>")]
pub struct TipsetKeyLotusJson(TipsetKey);

impl TryFrom<Vec<CidLotusJson>> for TipsetKeyLotusJson {
    type Error = anyhow::Error;

    fn try_from(value: Vec<CidLotusJson>) -> Result<Self, Self::Error> {
        let cids = value.into_iter().map(Cid::from_lotus_json).collect::<Vec<_>>();
        TipsetKey::try_from(cids).map(Self)
    }
}

impl From<TipsetKeyLotusJson> for Vec<CidLotusJson> {
    fn from(TipsetKeyLotusJson(key): TipsetKeyLotusJson) -> Self {
        key.into_cids()
            .into_iter()
            .map(Cid::into_lotus_json)
            .collect()
    }
}

impl HasLotusJson for TipsetKey {
    type LotusJson = TipsetKeyLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![(
            json!([{"/": "baeaaaaa"}]),
            nunny::vec![Cid::default()].into(),
        )]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        TipsetKeyLotusJson(self)
    }

    fn from_lotus_json(TipsetKeyLotusJson(key): Self::LotusJson) -> Self {
        key
    }
}

#[test]
fn empty_keys_are_rejected() {
    assert!(serde_json::from_value::<LotusJson<TipsetKey>>(json!([])).is_err());
}
