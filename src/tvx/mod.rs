// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Extraction of a single on-chain message into a self-contained test vector.
//!
//! An [`Extractor`] runs the stages of [`Stage`] in order: it locates the message and
//! its tipsets, replays the messages that precede it in the execution tipset,
//! executes it under a [`StateRetention`] strategy, checks the local receipt against
//! the chain's and assembles a [`TestVector`]. Any failure aborts the run before
//! anything is written.

mod errors;
mod precursors;
mod resolver;
mod retention;
mod surgeon;
mod vector;
mod verify;

pub use self::errors::{ErrorKind, ExtractError, Stage};
pub use self::precursors::PrecursorSelect;
pub use self::retention::StateRetention;
pub use self::vector::{Class, TestVector};
pub use self::verify::ReceiptCheck;

use self::precursors::select_precursors;
use self::resolver::{Resolved, resolve};
use self::retention::{Retained, retain_accessed_actors, retain_accessed_cids};
use self::surgeon::{accessed_actors, retain_list};
use self::vector::{
    ApplyMessage, GenerationData, Metadata, Postconditions, Preconditions, StateTreeRoot,
    VectorReceipt,
};
use self::verify::check_receipt;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use cid::Cid;
use itertools::Itertools as _;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument as _, error, info, info_span, warn};

use crate::blocks::TipsetKey;
use crate::db::{ExtractionStore, MemoryDB, ProxyingStore, TracingStore};
use crate::interpreter::{ExecuteParams, MessageExecutor, WriteMode};
use crate::rpc_client::{ApiMessage, ChainApi};
use crate::shim::{
    clock::ChainEpoch,
    econ::TokenAmount,
    message::{Message, MessageExt as _},
    version::NetworkVersion,
};
use crate::utils::{db::car_util::load_car, io::write_atomically, version::TVX_VERSION_STRING};

/// Provenance source recorded for the node the vector was extracted from.
const NODE_SOURCE: &str = "github.com/filecoin-project/lotus";
const GENERATOR_SOURCE: &str = "forest-tvx";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// The message to extract.
    pub cid: Cid,
    /// A block the message was included in, to skip the message search.
    pub block: Option<Cid>,
    pub id: String,
    pub class: Class,
    /// Destination file; `None` writes to stdout.
    pub out: Option<PathBuf>,
    pub retain: StateRetention,
    pub precursor: PrecursorSelect,
}

impl ExtractOptions {
    pub fn new(cid: Cid) -> Self {
        Self {
            cid,
            block: None,
            id: "(undefined)".into(),
            class: Class::default(),
            out: None,
            retain: StateRetention::default(),
            precursor: PrecursorSelect::default(),
        }
    }
}

/// A successfully assembled vector.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub vector: TestVector,
    pub receipt_check: ReceiptCheck,
}

/// Inputs of the target's execution that are read from the chain.
struct ExecutionContext {
    epoch: ChainEpoch,
    circ_supply: TokenAmount,
    base_fee: TokenAmount,
    network_version: NetworkVersion,
    timestamp: u64,
}

impl ExecutionContext {
    fn params<'a>(&'a self, preroot: Cid, message: &'a Message) -> ExecuteParams<'a> {
        ExecuteParams {
            preroot,
            epoch: self.epoch,
            message,
            circ_supply: &self.circ_supply,
            base_fee: &self.base_fee,
            network_version: self.network_version,
            timestamp: self.timestamp,
            write_mode: WriteMode::WriteThrough,
        }
    }
}

pub struct Extractor<C, E> {
    chain: Arc<C>,
    executor: E,
    cancel: CancellationToken,
}

impl<C, E> Extractor<C, E>
where
    C: ChainApi + Send + Sync + 'static,
    E: MessageExecutor,
{
    pub fn new(chain: Arc<C>, executor: E) -> Self {
        Self {
            chain,
            executor,
            cancel: CancellationToken::new(),
        }
    }

    /// Aborts the run at the next stage boundary once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Extracts the vector and writes it to `opts.out`, or stdout.
    pub async fn run(&self, opts: &ExtractOptions) -> Result<Extraction, ExtractError> {
        let extraction = self.extract(opts).await?;
        self.checkpoint(Stage::Serialize)?;
        let _span = info_span!("serialize").entered();
        let written = extraction
            .vector
            .to_pretty_json()
            .context("failed to encode the test vector")
            .and_then(|json| write_output(opts.out.as_deref(), &json).map(|()| json.len()))
            .map_err(ErrorKind::Serialization)
            .map_err(at(Stage::Serialize))?;
        match &opts.out {
            Some(path) => info!(path = %path.display(), bytes = written, "wrote test vector"),
            None => info!(bytes = written, "wrote test vector to stdout"),
        }
        Ok(extraction)
    }

    /// Runs every stage up to and including assembly, without writing anything.
    pub async fn extract(&self, opts: &ExtractOptions) -> Result<Extraction, ExtractError> {
        self.checkpoint(Stage::Resolve)?;
        let (resolved, context) = self
            .resolve_context(opts)
            .instrument(info_span!("resolve"))
            .await
            .map_err(ErrorKind::Resolution)
            .map_err(at(Stage::Resolve))?;
        let Resolved {
            message,
            execution,
            inclusion,
        } = &resolved;

        self.checkpoint(Stage::SelectPrecursors)?;
        let canonical = self
            .chain
            .chain_get_parent_messages(*execution.key().first())
            .instrument(info_span!("select_precursors"))
            .await
            .context("failed to get parent messages")
            .map_err(ErrorKind::Resolution)
            .map_err(at(Stage::SelectPrecursors))?;
        let selection = {
            let _span = info_span!("select_precursors").entered();
            select_precursors(opts.precursor, opts.cid, message, &canonical)
        };
        let Some(target) = selection.target() else {
            return Err(ExtractError::new(
                Stage::SelectPrecursors,
                ErrorKind::PrecursorNotFound {
                    target: opts.cid,
                    found: selection.related.len(),
                },
            ));
        };
        info!(
            mode = %opts.precursor,
            target = %target.cid,
            canonical = canonical.len(),
            precursors = %selection.precursors().iter().map(|it| it.cid).join(", "),
            "selected precursor messages"
        );

        let store = ProxyingStore::new(Arc::clone(&self.chain))
            .map(|proxy| Arc::new(TracingStore::new(proxy)))
            .map_err(ErrorKind::Replay)
            .map_err(at(Stage::ReplayPrecursors))?;

        let preroot = self.replay_precursors(
            &store,
            &context,
            *inclusion.parent_state(),
            selection.precursors(),
        )?;

        self.checkpoint(Stage::ExecuteTarget)?;
        let retained = self
            .execute_target(&store, &context, opts.retain, preroot, message, inclusion.key())
            .instrument(info_span!("execute_target"))
            .await
            .map_err(at(Stage::ExecuteTarget))?;
        info!(
            preroot = %retained.preroot,
            postroot = %retained.postroot,
            exit_code = %retained.receipt.exit_code,
            gas_used = retained.receipt.gas_used,
            "executed target message"
        );
        info!(
            local_blocks = store.inner().local().len(),
            "blocks held after execution"
        );

        self.checkpoint(Stage::VerifyReceipt)?;
        let receipt_check = self
            .verify_receipt(opts.cid, execution.key(), &retained)
            .instrument(info_span!("verify_receipt"))
            .await
            .map_err(at(Stage::VerifyReceipt))?;

        self.checkpoint(Stage::Assemble)?;
        let vector = self
            .assemble(opts, &resolved, &context, retained)
            .instrument(info_span!("assemble"))
            .await
            .map_err(at(Stage::Assemble))?;
        Ok(Extraction {
            vector,
            receipt_check,
        })
    }

    fn checkpoint(&self, stage: Stage) -> Result<(), ExtractError> {
        if self.cancel.is_cancelled() {
            Err(ExtractError::new(stage, ErrorKind::Cancelled))
        } else {
            Ok(())
        }
    }

    async fn resolve_context(
        &self,
        opts: &ExtractOptions,
    ) -> anyhow::Result<(Resolved, ExecutionContext)> {
        let resolved = resolve(self.chain.as_ref(), opts.cid, opts.block).await?;
        let Resolved {
            execution,
            inclusion,
            ..
        } = &resolved;
        info!(
            execution = %execution.key(),
            execution_height = execution.epoch(),
            inclusion = %inclusion.key(),
            inclusion_height = inclusion.epoch(),
            "resolved tipsets"
        );

        let circ_supply = self
            .chain
            .state_circulating_supply(inclusion.key())
            .await
            .context("failed to get circulating supply")?;
        let network_version = self
            .chain
            .state_network_version(execution.key())
            .await
            .context("failed to get network version")?;
        let context = ExecutionContext {
            epoch: execution.epoch(),
            base_fee: inclusion.parent_base_fee().clone(),
            circ_supply,
            network_version,
            timestamp: inclusion.min_timestamp(),
        };
        info!(
            epoch = context.epoch,
            circ_supply = %context.circ_supply.atto(),
            base_fee = %context.base_fee.atto(),
            network_version = %context.network_version,
            "loaded execution context"
        );
        Ok((resolved, context))
    }

    /// Applies `precursors` in order on top of `root` and returns the resulting root.
    fn replay_precursors<DB: ExtractionStore>(
        &self,
        store: &Arc<DB>,
        context: &ExecutionContext,
        mut root: Cid,
        precursors: &[&ApiMessage],
    ) -> Result<Cid, ExtractError> {
        let _span = info_span!("replay_precursors").entered();
        info!(root = %root, count = precursors.len(), "replaying precursors");
        for (i, precursor) in precursors.iter().enumerate() {
            self.checkpoint(Stage::ReplayPrecursors)?;
            let outcome = self
                .executor
                .execute(store, &context.params(root, &precursor.message))
                .with_context(|| format!("failed to replay precursor {i} ({})", precursor.cid))
                .map_err(ErrorKind::Replay)
                .map_err(at(Stage::ReplayPrecursors))?;
            info!(
                cid = %precursor.cid,
                exit_code = %outcome.receipt.exit_code,
                postroot = %outcome.postroot,
                "replayed precursor"
            );
            root = outcome.postroot;
        }
        Ok(root)
    }

    async fn execute_target<DB: ExtractionStore>(
        &self,
        store: &Arc<DB>,
        context: &ExecutionContext,
        retention: StateRetention,
        preroot: Cid,
        message: &Message,
        inclusion: &TipsetKey,
    ) -> Result<Retained, ErrorKind> {
        let params = context.params(preroot, message);
        match retention {
            StateRetention::AccessedCids => retain_accessed_cids(store, &self.executor, &params),
            StateRetention::AccessedActors => {
                let accessed = accessed_actors(self.chain.as_ref(), message, inclusion)
                    .await
                    .map_err(ErrorKind::Retention)?;
                let retain = retain_list(accessed);
                info!(actors = %retain.iter().join(", "), "retaining actors");
                retain_accessed_actors(store, &self.executor, &params, &retain)
            }
        }
    }

    async fn verify_receipt(
        &self,
        cid: Cid,
        execution: &TipsetKey,
        retained: &Retained,
    ) -> Result<ReceiptCheck, ErrorKind> {
        let expected = self
            .chain
            .state_get_receipt(cid, execution)
            .await
            .context("failed to get the message receipt")
            .map_err(ErrorKind::Resolution)?;
        match check_receipt(expected.as_ref(), &retained.receipt) {
            Ok(ReceiptCheck::Matched) => {
                info!("local receipt matches the chain");
                Ok(ReceiptCheck::Matched)
            }
            Ok(ReceiptCheck::Skipped) => {
                warn!(
                    %cid,
                    "the chain returned no receipt for the message; using the local receipt unchecked"
                );
                Ok(ReceiptCheck::Skipped)
            }
            Err(mismatch) => {
                error!(%mismatch, "local receipt differs from the chain");
                Err(ErrorKind::Verification(mismatch))
            }
        }
    }

    async fn assemble(
        &self,
        opts: &ExtractOptions,
        resolved: &Resolved,
        context: &ExecutionContext,
        retained: Retained,
    ) -> Result<TestVector, ErrorKind> {
        let network = self
            .chain
            .state_network_name()
            .await
            .context("failed to get network name")
            .map_err(ErrorKind::Resolution)?;
        let node_version = self
            .chain
            .version()
            .await
            .context("failed to get node version")
            .map_err(ErrorKind::Resolution)?;

        let message = resolved
            .message
            .marshal_cbor()
            .map_err(ErrorKind::Serialization)?;
        let car = vector::compress_car(&retained.car)
            .context("failed to compress the archive")
            .map_err(ErrorKind::Serialization)?;
        info!(raw = retained.car.len(), compressed = car.len(), "compressed archive");
        self.check_archive(context, &resolved.message, &retained, &car)
            .await?;

        Ok(TestVector {
            class: opts.class,
            meta: Metadata {
                id: opts.id.clone(),
                generation: vec![
                    GenerationData::source(format!("network:{network}")),
                    GenerationData::source(format!("message:{}", opts.cid)),
                    GenerationData::source(format!(
                        "inclusion_tipset:{}",
                        resolved.inclusion.key()
                    )),
                    GenerationData::source(format!(
                        "execution_tipset:{}",
                        resolved.execution.key()
                    )),
                    GenerationData::versioned(NODE_SOURCE, node_version),
                    GenerationData::versioned(GENERATOR_SOURCE, TVX_VERSION_STRING.as_str()),
                ],
            },
            car,
            preconditions: Preconditions {
                epoch: context.epoch,
                circ_supply: vector::atto(&context.circ_supply),
                basefee: vector::atto(&context.base_fee),
                state_tree: StateTreeRoot::new(retained.preroot),
            },
            apply_messages: vec![ApplyMessage { bytes: message }],
            postconditions: Postconditions {
                state_tree: StateTreeRoot::new(retained.postroot),
                receipts: vec![VectorReceipt::from(&retained.receipt)],
            },
        })
    }

    /// Replays the target against nothing but the blocks of `car`, which must reproduce
    /// the retained postroot and receipt.
    async fn check_archive(
        &self,
        context: &ExecutionContext,
        message: &Message,
        retained: &Retained,
        car: &[u8],
    ) -> Result<(), ErrorKind> {
        let store = Arc::new(MemoryDB::default());
        load_car(store.as_ref(), car)
            .await
            .context("failed to load the archive")
            .map_err(ErrorKind::Retention)?;
        if store.is_empty() {
            return Err(ErrorKind::Retention(anyhow::anyhow!("the archive holds no blocks")));
        }
        let params = ExecuteParams {
            write_mode: WriteMode::Buffered,
            ..context.params(retained.preroot, message)
        };
        let outcome = self
            .executor
            .execute(&store, &params)
            .context("failed to replay the target from the archive")
            .map_err(ErrorKind::Replay)?;
        if outcome.postroot != retained.postroot || outcome.receipt != retained.receipt {
            return Err(ErrorKind::Retention(anyhow::anyhow!(
                "replaying from the archive gave postroot {} and exit code {}, expected {} and {}",
                outcome.postroot,
                outcome.receipt.exit_code,
                retained.postroot,
                retained.receipt.exit_code,
            )));
        }
        info!(blocks = store.len(), "archive replays on its own");
        Ok(())
    }
}

fn at(stage: Stage) -> impl FnOnce(ErrorKind) -> ExtractError {
    move |kind| ExtractError::new(stage, kind)
}

/// Writes the whole document in one go, to `out` or stdout.
fn write_output(out: Option<&Path>, json: &[u8]) -> anyhow::Result<()> {
    match out {
        Some(path) => write_atomically(path, json),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
