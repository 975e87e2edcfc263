// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use tokio::runtime::Handle;
use tracing::trace;

use super::MemoryDB;
use crate::rpc_client::ChainApi;
use crate::utils::cid::{is_identity, verify_block};

/// A [`Blockstore`] that serves reads from a local [`MemoryDB`] and falls back to
/// `ChainReadObj` on a miss. Fetched blocks are verified and cached; writes stay local.
///
/// Reads block the calling thread, so the store must be used from a multi-threaded
/// tokio runtime.
pub struct ProxyingStore<C> {
    local: MemoryDB,
    chain: Arc<C>,
    handle: Handle,
}

impl<C: ChainApi> ProxyingStore<C> {
    /// Must be called from within a tokio runtime.
    pub fn new(chain: Arc<C>) -> anyhow::Result<Self> {
        Ok(Self {
            local: MemoryDB::default(),
            chain,
            handle: Handle::try_current().context("no tokio runtime")?,
        })
    }

    pub fn local(&self) -> &MemoryDB {
        &self.local
    }

    fn fetch(&self, k: &Cid) -> anyhow::Result<Vec<u8>> {
        trace!(%k, "fetching block from the chain");
        let data = tokio::task::block_in_place(|| self.handle.block_on(self.chain.chain_read_obj(*k)))
            .with_context(|| format!("failed to fetch block {k}"))?;
        verify_block(k, &data)?;
        self.local.put_keyed(k, &data)?;
        Ok(data)
    }
}

impl<C: ChainApi> Blockstore for ProxyingStore<C> {
    fn get(&self, k: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        if is_identity(k) {
            return Ok(Some(k.hash().digest().to_vec()));
        }
        if let Some(data) = self.local.get(k)? {
            return Ok(Some(data));
        }
        self.fetch(k).map(Some)
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> anyhow::Result<()> {
        self.local.put_keyed(k, block)
    }

    fn has(&self, k: &Cid) -> anyhow::Result<bool> {
        if is_identity(k) || self.local.contains(k) {
            return Ok(true);
        }
        Ok(self.fetch(k).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChain;
    use multihash_codetable::{Code, MultihashDigest as _};

    fn raw(data: &[u8]) -> Cid {
        Cid::new_v1(fvm_ipld_encoding::IPLD_RAW, Code::Blake2b256.digest(data))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn misses_are_fetched_and_cached() {
        let chain = MockChain::default();
        let cid = raw(b"remote");
        chain.store().put_keyed(&cid, b"remote").unwrap();
        let store = ProxyingStore::new(Arc::new(chain)).unwrap();

        assert!(!store.local().contains(&cid));
        assert_eq!(store.get(&cid).unwrap().unwrap(), b"remote");
        assert!(store.local().contains(&cid));
        assert!(store.has(&cid).unwrap());
        assert!(!store.has(&raw(b"absent")).unwrap());
        assert!(store.get(&raw(b"absent")).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn corrupted_blocks_are_rejected() {
        let chain = MockChain::default();
        let cid = raw(b"expected");
        chain.store().put_keyed(&cid, b"tampered").unwrap();
        let store = ProxyingStore::new(Arc::new(chain)).unwrap();
        assert!(store.get(&cid).is_err());
        assert!(!store.local().contains(&cid));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_stay_local() {
        let chain = Arc::new(MockChain::default());
        let store = ProxyingStore::new(chain.clone()).unwrap();
        let cid = raw(b"local");
        store.put_keyed(&cid, b"local").unwrap();
        assert_eq!(store.get(&cid).unwrap().unwrap(), b"local");
        assert!(!chain.store().contains(&cid));
    }
}
