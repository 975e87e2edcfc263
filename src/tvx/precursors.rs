// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;

use crate::rpc_client::ApiMessage;
use crate::shim::message::Message;

/// Which preceding messages of the execution tipset are replayed before the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PrecursorSelect {
    /// Every preceding message.
    All,
    /// Only preceding messages from the target's sender. Usually sufficient, since nonce
    /// effects are sender-local; switch to `all` when the receipt check fails on gas.
    #[default]
    Sender,
}

/// Result of scanning the canonical message list.
#[derive(Debug, PartialEq)]
pub struct Selection<'a> {
    /// Selected messages in canonical order. The last one is the target when `found`.
    pub related: Vec<&'a ApiMessage>,
    pub found: bool,
}

impl<'a> Selection<'a> {
    /// Everything selected before the target.
    pub fn precursors(&self) -> &[&'a ApiMessage] {
        match self.related.split_last() {
            Some((_, precursors)) if self.found => precursors,
            _ => &self.related,
        }
    }

    pub fn target(&self) -> Option<&'a ApiMessage> {
        self.found.then(|| self.related.last().copied()).flatten()
    }
}

/// Scans `canonical` in order, keeping the messages `mode` selects, up to and
/// including the target.
pub fn select_precursors<'a>(
    mode: PrecursorSelect,
    target_cid: Cid,
    target: &Message,
    canonical: &'a [ApiMessage],
) -> Selection<'a> {
    let mut related = vec![];
    for other in canonical {
        let included = match mode {
            PrecursorSelect::All => true,
            PrecursorSelect::Sender => other.message.from == target.from,
        };
        if included {
            related.push(other);
        }
        if other.cid == target_cid || &other.message == target {
            if !included {
                related.push(other);
            }
            return Selection {
                related,
                found: true,
            };
        }
    }
    Selection {
        related,
        found: false,
    }
}
