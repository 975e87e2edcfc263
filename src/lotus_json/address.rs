// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::*;

use crate::shim::address::{Address, parse_address};

/// Addresses are written with the mainnet prefix, and read with either prefix.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressLotusJson(#[serde(with = "address_string")] Address);

mod address_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        parse_address(&String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

impl HasLotusJson for Address {
    type LotusJson = AddressLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![
            (json!("f00"), Address::new_id(0)),
            (json!("f01234"), Address::new_id(1234)),
        ]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        AddressLotusJson(self)
    }

    fn from_lotus_json(AddressLotusJson(address): Self::LotusJson) -> Self {
        address
    }
}

#[test]
fn testnet_prefix_is_accepted() {
    let parsed = serde_json::from_value::<LotusJson<Address>>(json!("t0101")).unwrap();
    pretty_assertions::assert_eq!(parsed.into_inner(), Address::new_id(101));
    assert!(serde_json::from_value::<LotusJson<Address>>(json!("nonsense")).is_err());
}
