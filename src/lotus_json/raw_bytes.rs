// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;

use fvm_ipld_encoding::RawBytes;

impl HasLotusJson for RawBytes {
    type LotusJson = <Vec<u8> as HasLotusJson>::LotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        unimplemented!("shares the snapshots of Vec<u8>")
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        self.bytes().to_vec().into_lotus_json()
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        RawBytes::new(Vec::from_lotus_json(lotus_json))
    }
}

#[test]
fn snapshots() {
    assert_one_snapshot(json!("AQI="), RawBytes::new(vec![1, 2]));
    assert_one_snapshot(json!(""), RawBytes::default());
}
