// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use cid::Cid;
use tracing::{info, warn};

use crate::blocks::Tipset;
use crate::rpc_client::ChainApi;
use crate::shim::message::Message;

/// A message together with the tipsets that included and executed it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub message: Message,
    /// The tipset whose parents are `inclusion`; the message's effects land here.
    pub execution: Tipset,
    /// The tipset the message was mined in.
    pub inclusion: Tipset,
}

/// Locates `msg_cid` on chain. With a `block` hint the tipsets are found by height
/// around that block instead of searching for the message.
pub async fn resolve(
    chain: &impl ChainApi,
    msg_cid: Cid,
    block: Option<Cid>,
) -> anyhow::Result<Resolved> {
    let message = chain
        .chain_get_message(msg_cid)
        .await
        .with_context(|| format!("failed to fetch message {msg_cid}"))?;
    info!(%msg_cid, from = %message.from, to = %message.to, nonce = message.sequence, method = message.method_num, "found message");

    let (execution, inclusion) = match block {
        None => {
            info!("locating message in blockchain");
            let lookup = chain
                .state_search_msg(msg_cid)
                .await
                .context("failed to locate message")?
                .with_context(|| format!("message {msg_cid} was not found on chain"))?;
            info!(tipset = %lookup.tipset, height = lookup.height, exit_code = %lookup.receipt.exit_code, "located message");
            let execution = chain.chain_get_tipset(&lookup.tipset).await?;
            let inclusion = chain
                .chain_get_tipset(&execution.parents_key()?)
                .await
                .context("failed to fetch the inclusion tipset")?;
            (execution, inclusion)
        }
        Some(block) => {
            info!(%block, "message inclusion block was provided; scanning around it");
            let header = chain
                .chain_get_block(block)
                .await
                .context("failed to get block")?;
            // an empty anchor walks back from the head
            let execution = chain
                .chain_get_tipset_by_height(header.epoch + 1, None)
                .await
                .context("failed to get message execution tipset")?;
            let inclusion = chain
                .chain_get_tipset_by_height(header.epoch, Some(execution.key()))
                .await
                .context("failed to get message inclusion tipset")?;
            if !inclusion.key().cids().contains(&block) {
                warn!(%block, inclusion = %inclusion.key(), "hinted block is not part of the inclusion tipset");
            }
            (execution, inclusion)
        }
    };

    anyhow::ensure!(
        inclusion.key().matches(execution.parents()),
        "tipset {} is not the parent of execution tipset {}",
        inclusion.key(),
        execution.key()
    );
    Ok(Resolved {
        message,
        execution,
        inclusion,
    })
}
