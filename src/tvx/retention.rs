// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The two ways of cutting a replayable snapshot out of the full state tree.

use std::sync::Arc;

use anyhow::Context as _;
use cid::Cid;
use indexmap::IndexSet;
use tracing::info;

use super::errors::ErrorKind;
use super::surgeon::mask_state_tree;
use crate::db::ExtractionStore;
use crate::interpreter::{ExecuteParams, MessageExecutor};
use crate::shim::{address::Address, executor::Receipt};
use crate::utils::db::car_util::{write_car, write_car_including};

/// How the state snapshot embedded in a vector is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StateRetention {
    /// Keep exactly the blocks read while executing the target message.
    #[default]
    AccessedCids,
    /// Keep the full state of the actors the message touches, and nothing else.
    AccessedActors,
}

/// Output of a retention strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Retained {
    pub preroot: Cid,
    pub postroot: Cid,
    pub receipt: Receipt,
    /// Uncompressed `CARv1` rooted at `[preroot, postroot]`.
    pub car: Vec<u8>,
}

/// Executes the target once with read tracing on, then archives the preroot and
/// postroot blocks plus every block read.
pub fn retain_accessed_cids<DB: ExtractionStore>(
    store: &Arc<DB>,
    executor: &impl MessageExecutor,
    params: &ExecuteParams<'_>,
) -> Result<Retained, ErrorKind> {
    let tracer = store.read_tracer().ok_or_else(|| {
        ErrorKind::Retention(anyhow::anyhow!(
            "the block store does not support read tracing"
        ))
    })?;

    tracer.start_tracing();
    let executed = executor.execute(store, params);
    let accessed = tracer.finish_tracing();
    let outcome = executed.map_err(ErrorKind::Replay)?;
    info!(
        accessed = accessed.len(),
        postroot = %outcome.postroot,
        "traced target execution"
    );

    let mut car = vec![];
    let written = write_car_including(
        store.as_ref(),
        nunny::vec![params.preroot, outcome.postroot],
        &accessed,
        &mut car,
    )
    .context("failed to write the traced archive")
    .map_err(ErrorKind::Retention)?;
    info!(blocks = written, bytes = car.len(), "wrote traced archive");

    Ok(Retained {
        preroot: params.preroot,
        postroot: outcome.postroot,
        receipt: outcome.receipt,
        car,
    })
}

/// Masks the state tree down to `retain`, executes the target on the masked tree and
/// archives everything reachable from the masked preroot and the postroot.
pub fn retain_accessed_actors<DB: ExtractionStore>(
    store: &Arc<DB>,
    executor: &impl MessageExecutor,
    params: &ExecuteParams<'_>,
    retain: &IndexSet<Address>,
) -> Result<Retained, ErrorKind> {
    let preroot = mask_state_tree(store.as_ref(), &params.preroot, retain)
        .with_context(|| format!("failed to mask state tree {}", params.preroot))
        .map_err(ErrorKind::Retention)?;
    info!(original = %params.preroot, masked = %preroot, actors = retain.len(), "masked state tree");

    let masked = ExecuteParams {
        preroot,
        ..params.clone()
    };
    let outcome = executor.execute(store, &masked).map_err(ErrorKind::Replay)?;

    let mut car = vec![];
    let written = write_car(
        store.as_ref(),
        nunny::vec![preroot, outcome.postroot],
        &mut car,
    )
    .context("failed to write the masked archive")
    .map_err(ErrorKind::Retention)?;
    info!(blocks = written, bytes = car.len(), "wrote masked archive");

    Ok(Retained {
        preroot,
        postroot: outcome.postroot,
        receipt: outcome.receipt,
        car,
    })
}
