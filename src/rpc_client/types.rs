// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::blocks::TipsetKey;
use crate::lotus_json::lotus_json_with_self;
use crate::shim::{
    address::Address, clock::ChainEpoch, econ::TokenAmount, executor::Receipt, message::Message,
};

/// Result of `Filecoin.StateSearchMsg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageLookup {
    #[serde(with = "crate::lotus_json")]
    pub message: Cid,
    #[serde(with = "crate::lotus_json")]
    pub receipt: Receipt,
    /// The tipset the message was executed in.
    #[serde(rename = "TipSet", with = "crate::lotus_json")]
    pub tipset: TipsetKey,
    pub height: ChainEpoch,
}

lotus_json_with_self!(MessageLookup);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(rename = "Cid", with = "crate::lotus_json")]
    pub cid: Cid,
    #[serde(rename = "Message", with = "crate::lotus_json")]
    pub message: Message,
}

lotus_json_with_self!(ApiMessage);

/// Only the circulating supply is consumed, the breakdown is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct CirculatingSupply {
    #[serde(with = "crate::lotus_json")]
    pub fil_circulating: TokenAmount,
}

lotus_json_with_self!(CirculatingSupply);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct VersionInfo {
    pub version: String,
}

lotus_json_with_self!(VersionInfo);

/// Result of `Filecoin.StateCall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocResult {
    pub execution_trace: ExecutionTrace,
    #[serde(default)]
    pub error: String,
}

lotus_json_with_self!(InvocResult);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionTrace {
    pub msg: TraceMessage,
    #[serde(with = "crate::lotus_json", default)]
    pub subcalls: Vec<ExecutionTrace>,
}

lotus_json_with_self!(ExecutionTrace);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TraceMessage {
    #[serde(with = "crate::lotus_json")]
    pub from: Address,
    #[serde(with = "crate::lotus_json")]
    pub to: Address,
}

impl ExecutionTrace {
    /// Senders and receivers of this call and all of its subcalls, depth-first, each
    /// address once.
    pub fn touched_addresses(&self) -> IndexSet<Address> {
        fn walk(trace: &ExecutionTrace, acc: &mut IndexSet<Address>) {
            acc.insert(trace.msg.from);
            acc.insert(trace.msg.to);
            for subcall in &trace.subcalls {
                walk(subcall, acc);
            }
        }
        let mut acc = IndexSet::new();
        walk(self, &mut acc);
        acc
    }
}
