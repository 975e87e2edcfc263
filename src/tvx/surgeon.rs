// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Builds masked state trees holding only a chosen set of actors.

use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::CborStore as _;
use indexmap::{IndexMap, IndexSet};
use multihash_codetable::Code;
use tracing::{debug, warn};

use crate::blocks::TipsetKey;
use crate::rpc_client::ChainApi;
use crate::shim::{
    actors::{
        BURNT_FUNDS_ACTOR_ADDR, INIT_ACTOR_ADDR, INIT_ACTOR_ID, InitState, REWARD_ACTOR_ADDR,
        SYSTEM_ACTOR_ADDR,
    },
    address::Address,
    message::Message,
    state_tree::{StateTree, load_state_root},
};

/// Actors every message execution touches implicitly. The system actor holds the
/// builtin-actor manifest the engine loads on startup.
pub const PROTOCOL_ACTORS: [Address; 4] = [
    SYSTEM_ACTOR_ADDR,
    INIT_ACTOR_ADDR,
    REWARD_ACTOR_ADDR,
    BURNT_FUNDS_ACTOR_ADDR,
];

/// Addresses `message` touches when executed on top of `key`: its sender and receiver,
/// then every party of its execution trace.
pub async fn accessed_actors(
    chain: &impl ChainApi,
    message: &Message,
    key: &TipsetKey,
) -> anyhow::Result<IndexSet<Address>> {
    let result = chain
        .state_call(message, key)
        .await
        .context("failed to trace message execution")?;
    if !result.error.is_empty() {
        debug!(error = %result.error, "traced execution reported an error");
    }
    let mut accessed = IndexSet::from([message.from, message.to]);
    accessed.extend(result.execution_trace.touched_addresses());
    Ok(accessed)
}

/// `accessed` followed by the [`PROTOCOL_ACTORS`] it does not already contain.
pub fn retain_list(accessed: IndexSet<Address>) -> IndexSet<Address> {
    let mut retain = accessed;
    retain.extend(PROTOCOL_ACTORS);
    retain
}

/// Writes a state tree holding only the actors in `retain`, copied verbatim from the tree
/// at `root`, and returns its root.
///
/// The init actor's address map is pruned to the retained robust addresses. Addresses
/// that do not resolve to an actor are skipped.
pub fn mask_state_tree<BS: Blockstore>(
    store: &BS,
    root: &Cid,
    retain: &IndexSet<Address>,
) -> anyhow::Result<Cid> {
    let version = load_state_root(store, root)?.version;
    let original = StateTree::new_from_root(store, root)?;

    let mut actors = IndexMap::new();
    for addr in retain {
        let Some(id) = original.lookup_id(addr)? else {
            warn!(%addr, "retained address does not resolve to an actor; skipping");
            continue;
        };
        let Some(actor) = original.get_actor_by_id(id)? else {
            warn!(%addr, id, "retained actor is missing from the state tree; skipping");
            continue;
        };
        actors.entry(id).or_insert(actor);
    }

    if let Some(init) = actors.get_mut(&INIT_ACTOR_ID) {
        let state = store
            .get_cbor::<InitState>(&init.state)?
            .context("init actor state not found")?;
        let pruned = state.retain_addresses(store, retain)?;
        init.state = store.put_cbor(&pruned, Code::Blake2b256)?;
    }

    let mut masked = StateTree::new(store, version)?;
    for (id, actor) in actors {
        masked.set_actor(id, actor);
    }
    masked.flush()
}
