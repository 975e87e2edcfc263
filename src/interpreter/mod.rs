// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The seam between the extraction pipeline and the engine that applies messages.

mod fvm4;

pub use self::fvm4::FvmExecutor;

use std::sync::Arc;

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;

use crate::shim::{
    clock::ChainEpoch, econ::TokenAmount, executor::Receipt, message::Message,
    version::NetworkVersion,
};

/// What happens to the blocks an execution writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Everything reachable from the postroot is written to the backing store before
    /// [`MessageExecutor::execute`] returns.
    #[default]
    WriteThrough,
    /// Only the postroot is computed; written blocks are discarded with the engine.
    Buffered,
}

/// Inputs of a single explicit message application.
#[derive(Debug, Clone)]
pub struct ExecuteParams<'a> {
    pub preroot: Cid,
    pub epoch: ChainEpoch,
    pub message: &'a Message,
    pub circ_supply: &'a TokenAmount,
    pub base_fee: &'a TokenAmount,
    pub network_version: NetworkVersion,
    /// Unix timestamp the engine reports for `epoch`.
    pub timestamp: u64,
    pub write_mode: WriteMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub receipt: Receipt,
    pub postroot: Cid,
}

/// Applies one message on top of a state root. Must be deterministic given identical
/// params and store contents.
pub trait MessageExecutor {
    fn execute<DB>(&self, store: &Arc<DB>, params: &ExecuteParams<'_>) -> anyhow::Result<ApplyOutcome>
    where
        DB: Blockstore + Send + Sync + 'static;
}
