// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The test vector document, in the JSON layout of the Filecoin test-vector schema.

use std::io::Write as _;

use cid::Cid;
use flate2::{Compression, write::GzEncoder};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::lotus_json::base64_standard;
use crate::shim::{clock::ChainEpoch, econ::TokenAmount, executor::Receipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    #[default]
    Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestVector {
    pub class: Class,
    #[serde(rename = "_meta")]
    pub meta: Metadata,
    /// Gzipped `CARv1` holding every block the replay reads.
    #[serde(with = "base64_standard")]
    pub car: Vec<u8>,
    pub preconditions: Preconditions,
    pub apply_messages: Vec<ApplyMessage>,
    pub postconditions: Postconditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,
    /// Provenance records, serialized under the schema's `gen` key.
    #[serde(rename = "gen")]
    pub generation: Vec<GenerationData>,
}

/// One provenance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationData {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl GenerationData {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: None,
        }
    }

    pub fn versioned(source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: Some(version.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preconditions {
    pub epoch: ChainEpoch,
    #[serde(with = "json_number")]
    pub circ_supply: BigInt,
    #[serde(with = "json_number")]
    pub basefee: BigInt,
    pub state_tree: StateTreeRoot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTreeRoot {
    #[serde(with = "crate::lotus_json")]
    pub root_cid: Cid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyMessage {
    /// DAG-CBOR of the unsigned message.
    #[serde(with = "base64_standard")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Postconditions {
    pub state_tree: StateTreeRoot,
    pub receipts: Vec<VectorReceipt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorReceipt {
    pub exit_code: i64,
    #[serde(rename = "return", with = "base64_standard")]
    pub return_value: Vec<u8>,
    pub gas_used: u64,
}

impl From<&Receipt> for VectorReceipt {
    fn from(receipt: &Receipt) -> Self {
        Self {
            exit_code: i64::from(receipt.exit_code.value()),
            return_value: receipt.return_data.to_vec(),
            gas_used: receipt.gas_used,
        }
    }
}

impl StateTreeRoot {
    pub fn new(root_cid: Cid) -> Self {
        Self { root_cid }
    }
}

pub fn atto(amount: &TokenAmount) -> BigInt {
    amount.atto().clone()
}

impl TestVector {
    /// Two-space indented JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(self)?;
        out.push(b'\n');
        Ok(out)
    }
}

/// Gzips a `CARv1` for embedding in a vector.
pub fn compress_car(car: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(car)?;
    encoder.finish()
}

/// Arbitrary-precision integers as bare JSON numbers.
mod json_number {
    use super::*;
    use serde::{Deserializer, Serializer, de::Error as _, ser::Error as _};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        RawValue::from_string(value.to_string())
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        raw.get().parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vector() -> TestVector {
        TestVector {
            class: Class::Message,
            meta: Metadata {
                id: "(undefined)".into(),
                generation: vec![
                    GenerationData::source("network:calibnet"),
                    GenerationData::versioned("forest-tvx", "0.1.0"),
                ],
            },
            car: vec![1, 2, 3],
            preconditions: Preconditions {
                epoch: 42,
                circ_supply: "123456789012345678901234567890".parse().unwrap(),
                basefee: BigInt::from(100),
                state_tree: StateTreeRoot::new(Cid::default()),
            },
            apply_messages: vec![ApplyMessage { bytes: vec![0x8a] }],
            postconditions: Postconditions {
                state_tree: StateTreeRoot::new(Cid::default()),
                receipts: vec![VectorReceipt {
                    exit_code: 0,
                    return_value: vec![],
                    gas_used: 1234,
                }],
            },
        }
    }

    #[test]
    fn layout_matches_the_schema() {
        let value = serde_json::to_value(vector()).unwrap();
        assert_eq!(
            value,
            json!({
                "class": "message",
                "_meta": {
                    "id": "(undefined)",
                    "gen": [
                        {"source": "network:calibnet"},
                        {"source": "forest-tvx", "version": "0.1.0"},
                    ],
                },
                "car": "AQID",
                "preconditions": {
                    "epoch": 42,
                    "circ_supply": 123456789012345678901234567890_f64,
                    "basefee": 100,
                    "state_tree": {"root_cid": {"/": "baeaaaaa"}},
                },
                "apply_messages": [{"bytes": "ig=="}],
                "postconditions": {
                    "state_tree": {"root_cid": {"/": "baeaaaaa"}},
                    "receipts": [{"exit_code": 0, "return": "", "gas_used": 1234}],
                },
            })
        );
    }

    #[test]
    fn big_integers_keep_their_precision() {
        let text = String::from_utf8(vector().to_pretty_json().unwrap()).unwrap();
        assert!(text.contains(r#""circ_supply": 123456789012345678901234567890,"#));
        assert!(text.ends_with("}\n"));
        let back = serde_json::from_str::<TestVector>(&text).unwrap();
        assert_eq!(back, vector());
    }
}
