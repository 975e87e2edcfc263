// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use cid::Cid;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::interpreter::FvmExecutor;
use crate::rpc_client::{API_INFO_KEY, ApiInfo, RpcClient};
use crate::tvx::{
    Class, ExtractOptions, Extractor, PrecursorSelect, ReceiptCheck, StateRetention,
};

#[derive(Debug, clap::Args)]
pub struct ExtractCommand {
    /// Message CID to generate a test vector from
    #[arg(long)]
    cid: Cid,
    /// Optionally, the block CID the message was included in, to avoid expensive chain
    /// scanning
    #[arg(long)]
    block: Option<Cid>,
    /// Identifier to record in the vector metadata
    #[arg(long, default_value = "(undefined)")]
    id: String,
    /// Class of vector to extract
    #[arg(long, value_enum, default_value_t = Class::Message)]
    class: Class,
    /// File to write the vector to; stdout when omitted
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// State retention strategy
    #[arg(long, value_enum, default_value_t = StateRetention::AccessedCids)]
    state_retain: StateRetention,
    /// Precursor message selection mode. `sender` selects the messages from the same
    /// sender that precede the target in the canonical order; `all` selects every
    /// preceding message
    #[arg(long, value_enum, default_value_t = PrecursorSelect::Sender)]
    precursor_select: PrecursorSelect,
    /// Full node API, as `[token:]multiaddr`
    #[arg(long, env = API_INFO_KEY)]
    api: Option<String>,
}

impl ExtractCommand {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            block: self.block,
            id: self.id.clone(),
            class: self.class,
            out: self.out.clone(),
            retain: self.state_retain,
            precursor: self.precursor_select,
            ..ExtractOptions::new(self.cid)
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let api = match &self.api {
            Some(api) => api.parse::<ApiInfo>().context("invalid API info")?,
            None => ApiInfo::from_env()?,
        };
        info!(url = %api.url(), "connecting to full node");
        let client = RpcClient::connect(&api)
            .await
            .context("couldn't initialize client")?;

        let extraction = Extractor::new(Arc::new(client), FvmExecutor::default())
            .with_cancellation(cancel)
            .run(&self.options())
            .await?;
        if extraction.receipt_check == ReceiptCheck::Skipped {
            warn!("the vector's receipt was not checked against the chain");
        }
        Ok(())
    }
}
