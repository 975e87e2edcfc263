// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ::cid::Cid;
use fvm_ipld_encoding::RawBytes;

use super::*;
use crate::shim::{error::ExitCode, executor::Receipt};

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptLotusJson {
    exit_code: u32,
    #[serde(with = "crate::lotus_json")]
    r#return: RawBytes,
    gas_used: u64,
    #[serde(with = "crate::lotus_json", default)] // Lotus still does `"EventsRoot": null`
    events_root: Option<Cid>,
}

impl HasLotusJson for Receipt {
    type LotusJson = ReceiptLotusJson;

    #[cfg(test)]
    fn snapshots() -> Vec<(serde_json::Value, Self)> {
        vec![
            (
                json!({
                    "ExitCode": 0,
                    "Return": "aGVsbG8gd29ybGQh",
                    "GasUsed": 0,
                    "EventsRoot": null,
                }),
                Receipt {
                    exit_code: ExitCode::new(0),
                    return_data: RawBytes::new(Vec::from_iter(*b"hello world!")),
                    gas_used: 0,
                    events_root: None,
                },
            ),
            (
                json!({
                    "ExitCode": 16,
                    "Return": "",
                    "GasUsed": 1234,
                    "EventsRoot": {
                        "/": "baeaaaaa"
                    }
                }),
                Receipt {
                    exit_code: ExitCode::USR_ILLEGAL_ARGUMENT,
                    return_data: RawBytes::default(),
                    gas_used: 1234,
                    events_root: Some(Cid::default()),
                },
            ),
        ]
    }

    fn into_lotus_json(self) -> Self::LotusJson {
        let Self {
            exit_code,
            return_data,
            gas_used,
            events_root,
        } = self;
        Self::LotusJson {
            exit_code: exit_code.value(),
            r#return: return_data,
            gas_used,
            events_root,
        }
    }

    fn from_lotus_json(lotus_json: Self::LotusJson) -> Self {
        let Self::LotusJson {
            exit_code,
            r#return,
            gas_used,
            events_root,
        } = lotus_json;
        Self {
            exit_code: ExitCode::new(exit_code),
            return_data: r#return,
            gas_used,
            events_root,
        }
    }
}
