// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::CborStore as _;
pub use fvm4::state_tree::ActorState;
use fvm_shared4::ActorID;
pub use fvm_shared4::state::{StateRoot, StateTreeVersion};

use crate::shim::address::Address;

/// Wraps the `fvm` v4 state tree, surfacing its errors as [`anyhow::Error`].
pub struct StateTree<S> {
    inner: fvm4::state_tree::StateTree<S>,
}

impl<S: Blockstore> StateTree<S> {
    /// Creates an empty state tree.
    pub fn new(store: S, version: StateTreeVersion) -> anyhow::Result<Self> {
        let inner = fvm4::state_tree::StateTree::new(store, version)
            .map_err(|e| anyhow::anyhow!("failed to create state tree: {e}"))?;
        Ok(Self { inner })
    }

    pub fn new_from_root(store: S, root: &Cid) -> anyhow::Result<Self> {
        let inner = fvm4::state_tree::StateTree::new_from_root(store, root)
            .map_err(|e| anyhow::anyhow!("failed to load state tree {root}: {e}"))?;
        Ok(Self { inner })
    }

    /// Resolves `addr` to an actor ID. ID addresses resolve to themselves.
    pub fn lookup_id(&self, addr: &Address) -> anyhow::Result<Option<ActorID>> {
        self.inner
            .lookup_id(addr)
            .map_err(|e| anyhow::anyhow!("failed to resolve {addr}: {e}"))
    }

    pub fn get_actor_by_id(&self, id: ActorID) -> anyhow::Result<Option<ActorState>> {
        self.inner
            .get_actor(id)
            .map_err(|e| anyhow::anyhow!("failed to load actor {id}: {e}"))
    }

    #[cfg(test)]
    pub fn get_actor(&self, addr: &Address) -> anyhow::Result<Option<ActorState>> {
        match self.lookup_id(addr)? {
            Some(id) => self.get_actor_by_id(id),
            None => Ok(None),
        }
    }

    pub fn set_actor(&mut self, id: ActorID, actor: ActorState) {
        self.inner.set_actor(id, actor)
    }

    /// Writes pending changes and returns the new root.
    pub fn flush(&mut self) -> anyhow::Result<Cid> {
        self.inner
            .flush()
            .map_err(|e| anyhow::anyhow!("failed to flush state tree: {e}"))
    }
}

/// Reads the header of the state tree rooted at `root`.
pub fn load_state_root(store: &impl Blockstore, root: &Cid) -> anyhow::Result<StateRoot> {
    store
        .get_cbor::<StateRoot>(root)?
        .with_context(|| format!("state root {root} not found"))
}
