// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use thiserror::Error;

use super::verify::ReceiptMismatch;

/// Steps of an extraction run, in order. A failure in any step aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Resolve,
    SelectPrecursors,
    ReplayPrecursors,
    ExecuteTarget,
    VerifyReceipt,
    Assemble,
    Serialize,
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("failed to resolve message and tipsets from chain: {0:#}")]
    Resolution(anyhow::Error),
    #[error(
        "message {target} not found in the canonical messages of its execution tipset; precursors found: {found}"
    )]
    PrecursorNotFound { target: Cid, found: usize },
    #[error("message execution failed: {0:#}")]
    Replay(anyhow::Error),
    #[error("receipt sanity check failed: {0}")]
    Verification(ReceiptMismatch),
    #[error("state retention failed: {0:#}")]
    Retention(anyhow::Error),
    #[error("failed to write the test vector: {0:#}")]
    Serialization(anyhow::Error),
    #[error("extraction was cancelled")]
    Cancelled,
}

/// An [`ErrorKind`] tagged with the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage}: {kind}")]
pub struct ExtractError {
    pub stage: Stage,
    pub kind: ErrorKind,
}

impl ExtractError {
    pub fn new(stage: Stage, kind: ErrorKind) -> Self {
        Self { stage, kind }
    }
}
