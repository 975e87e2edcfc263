// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_hamt::{BytesKey, Hamt};
use fvm_shared4::{ActorID, HAMT_BIT_WIDTH};

use crate::shim::address::{Address, Protocol};

pub const SYSTEM_ACTOR_ID: ActorID = 0;
pub const INIT_ACTOR_ID: ActorID = 1;
pub const REWARD_ACTOR_ID: ActorID = 2;
pub const BURNT_FUNDS_ACTOR_ID: ActorID = 99;

/// First ID handed out to non-singleton actors.
#[cfg(test)]
pub const FIRST_NON_SINGLETON_ADDR: ActorID = 100;

pub const SYSTEM_ACTOR_ADDR: Address = Address::new_id(SYSTEM_ACTOR_ID);
pub const INIT_ACTOR_ADDR: Address = Address::new_id(INIT_ACTOR_ID);
pub const REWARD_ACTOR_ADDR: Address = Address::new_id(REWARD_ACTOR_ID);
pub const BURNT_FUNDS_ACTOR_ADDR: Address = Address::new_id(BURNT_FUNDS_ACTOR_ID);

/// State of the init actor, the registry mapping robust addresses to actor IDs.
#[derive(Serialize_tuple, Deserialize_tuple, Clone, Debug, PartialEq, Eq)]
pub struct InitState {
    pub address_map: Cid,
    pub next_id: ActorID,
    pub network_name: String,
}

impl InitState {
    /// Returns a copy of this state whose address map only holds the robust addresses in
    /// `retain` that are currently mapped. ID addresses in `retain` are ignored.
    pub fn retain_addresses<'a, BS: Blockstore>(
        &self,
        store: &BS,
        retain: impl IntoIterator<Item = &'a Address>,
    ) -> anyhow::Result<Self> {
        let original = self.load_map(store)?;
        let mut pruned = Hamt::<_, ActorID>::new_with_bit_width(store, HAMT_BIT_WIDTH);
        for addr in retain {
            if addr.protocol() == Protocol::ID {
                continue;
            }
            let key = addr.to_bytes();
            if let Some(id) = original.get(&key).context("failed to get address entry")? {
                pruned
                    .set(BytesKey(key), *id)
                    .context("failed to set map key")?;
            }
        }
        Ok(Self {
            address_map: pruned.flush().context("failed to store address map")?,
            next_id: self.next_id,
            network_name: self.network_name.clone(),
        })
    }

    fn load_map<'bs, BS: Blockstore>(&self, store: &'bs BS) -> anyhow::Result<Hamt<&'bs BS, ActorID>> {
        Hamt::load_with_bit_width(&self.address_map, store, HAMT_BIT_WIDTH)
            .context("failed to load address map")
    }
}

#[cfg(test)]
impl InitState {
    pub fn new<BS: Blockstore>(store: &BS, network_name: String) -> anyhow::Result<Self> {
        let address_map = Hamt::<_, ActorID>::new_with_bit_width(store, HAMT_BIT_WIDTH)
            .flush()
            .context("failed to create empty address map")?;
        Ok(Self {
            address_map,
            next_id: FIRST_NON_SINGLETON_ADDR,
            network_name,
        })
    }

    /// Resolves `addr` to an actor ID. ID addresses are returned as-is, without checking
    /// that the actor exists.
    pub fn resolve_address<BS: Blockstore>(
        &self,
        store: &BS,
        addr: &Address,
    ) -> anyhow::Result<Option<ActorID>> {
        if let Ok(id) = addr.id() {
            return Ok(Some(id));
        }
        let map = self.load_map(store)?;
        let found = map
            .get(&addr.to_bytes())
            .context("failed to get address entry")?;
        Ok(found.copied())
    }

    /// Allocates the next ID to `addr`.
    pub fn map_address_to_new_id<BS: Blockstore>(
        &mut self,
        store: &BS,
        addr: &Address,
    ) -> anyhow::Result<ActorID> {
        anyhow::ensure!(
            addr.protocol() != Protocol::ID,
            "cannot map ID address {addr}"
        );
        let id = self.next_id;
        self.next_id += 1;
        let mut map = self.load_map(store)?;
        map.set(BytesKey(addr.to_bytes()), id)
            .context("failed to set map key")?;
        self.address_map = map.flush().context("failed to store address map")?;
        Ok(id)
    }
}
