// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;

use crate::shim::{address::Address, econ::TokenAmount, message::Message};
use fvm_ipld_encoding::RawBytes;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageLotusJson {
    #[serde(default)]
    version: u64,
    #[serde(with = "crate::lotus_json")]
    to: Address,
    #[serde(with = "crate::lotus_json")]
    from: Address,
    #[serde(default)]
    nonce: u64,
    #[serde(with = "crate::lotus_json", default)]
    value: TokenAmount,
    #[serde(default)]
    gas_limit: u64,
    #[serde(with = "crate::lotus_json", default)]
    gas_fee_cap: TokenAmount,
    #[serde(with = "crate::lotus_json", default)]
    gas_premium: TokenAmount,
    #[serde(default)]
    method: u64,
    #[serde(with = "crate::lotus_json", default)]
    params: RawBytes,
}

impl HasLotusJson for Message {
    type LotusJson = MessageLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![(
            json!({
                "Version": 0,
                "To": "f01001",
                "From": "f01000",
                "Nonce": 7,
                "Value": "1000",
                "GasLimit": 1000000,
                "GasFeeCap": "200",
                "GasPremium": "100",
                "Method": 0,
                "Params": "",
            }),
            Message {
                version: 0,
                from: Address::new_id(1000),
                to: Address::new_id(1001),
                sequence: 7,
                value: TokenAmount::from_atto(1000),
                method_num: 0,
                params: RawBytes::default(),
                gas_limit: 1_000_000,
                gas_fee_cap: TokenAmount::from_atto(200),
                gas_premium: TokenAmount::from_atto(100),
            },
        )]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        let Self {
            version,
            from,
            to,
            sequence,
            value,
            method_num,
            params,
            gas_limit,
            gas_fee_cap,
            gas_premium,
        } = self;
        Self::LotusJson {
            version,
            to,
            from,
            nonce: sequence,
            value,
            gas_limit,
            gas_fee_cap,
            gas_premium,
            method: method_num,
            params,
        }
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        let Self::LotusJson {
            version,
            to,
            from,
            nonce,
            value,
            gas_limit,
            gas_fee_cap,
            gas_premium,
            method,
            params,
        } = lotus_json;
        Self {
            version,
            from,
            to,
            sequence: nonce,
            value,
            method_num: method,
            params,
            gas_limit,
            gas_fee_cap,
            gas_premium,
        }
    }
}

#[test]
fn lotus_extras_are_ignored() {
    // `ChainGetMessage` includes the message CID, and omits empty params
    let parsed = serde_json::from_value::<LotusJson<Message>>(json!({
        "To": "t01001",
        "From": "t01000",
        "Nonce": 1,
        "Value": "0",
        "GasLimit": 10,
        "GasFeeCap": "1",
        "GasPremium": "1",
        "Method": 2,
        "Params": null,
        "CID": {"/": "baeaaaaa"},
    }))
    .unwrap()
    .into_inner();
    pretty_assertions::assert_eq!(parsed.method_num, 2);
    assert!(parsed.params.is_empty());
    pretty_assertions::assert_eq!(parsed.from, Address::new_id(1000));
}
