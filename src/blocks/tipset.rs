// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use anyhow::Context as _;
use cid::Cid;
use itertools::Itertools as _;
use nunny::Vec as NonEmpty;

use super::BlockHeader;
use crate::shim::{clock::ChainEpoch, econ::TokenAmount};

/// The ordered CIDs of the blocks forming a tipset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipsetKey(NonEmpty<Cid>);

impl TipsetKey {
    pub fn cids(&self) -> &NonEmpty<Cid> {
        &self.0
    }

    pub fn into_cids(self) -> NonEmpty<Cid> {
        self.0
    }

    pub fn first(&self) -> &Cid {
        self.0.first()
    }

    /// Keys are only equal when their blocks appear in the same order.
    pub fn matches(&self, cids: &[Cid]) -> bool {
        self.0.iter().eq(cids)
    }
}

impl From<NonEmpty<Cid>> for TipsetKey {
    fn from(value: NonEmpty<Cid>) -> Self {
        Self(value)
    }
}

impl TryFrom<Vec<Cid>> for TipsetKey {
    type Error = anyhow::Error;

    fn try_from(value: Vec<Cid>) -> Result<Self, Self::Error> {
        NonEmpty::new(value)
            .map(Self)
            .map_err(|_| anyhow::anyhow!("tipset key must not be empty"))
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(","))
    }
}

/// A set of blocks at the same height sharing the same parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tipset {
    key: TipsetKey,
    headers: NonEmpty<BlockHeader>,
}

impl Tipset {
    /// Pairs `headers` with the block CIDs in `key`, in order.
    pub fn new(key: TipsetKey, headers: NonEmpty<BlockHeader>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            key.cids().len() == headers.len(),
            "tipset {key} lists {} blocks but carries {} headers",
            key.cids().len(),
            headers.len()
        );
        let first = headers.first();
        for header in headers.iter() {
            anyhow::ensure!(
                header.epoch == first.epoch && header.parents == first.parents,
                "blocks of tipset {key} disagree on height or parents"
            );
        }
        Ok(Self { key, headers })
    }

    pub fn key(&self) -> &TipsetKey {
        &self.key
    }

    pub fn block_headers(&self) -> &NonEmpty<BlockHeader> {
        &self.headers
    }

    pub fn min_ticket_block(&self) -> &BlockHeader {
        self.headers.first()
    }

    pub fn epoch(&self) -> ChainEpoch {
        self.min_ticket_block().epoch
    }

    pub fn parents(&self) -> &[Cid] {
        &self.min_ticket_block().parents
    }

    /// Key of the parent tipset, if this is not the genesis tipset.
    pub fn parents_key(&self) -> anyhow::Result<TipsetKey> {
        TipsetKey::try_from(self.parents().to_vec())
            .with_context(|| format!("tipset {} has no parents", self.key))
    }

    pub fn parent_state(&self) -> &Cid {
        &self.min_ticket_block().state_root
    }

    pub fn parent_base_fee(&self) -> &TokenAmount {
        &self.min_ticket_block().parent_base_fee
    }

    pub fn min_timestamp(&self) -> u64 {
        self.headers
            .iter()
            .map(|header| header.timestamp)
            .min()
            .unwrap_or_else(|| self.min_ticket_block().timestamp)
    }
}
