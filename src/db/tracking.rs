// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use parking_lot::Mutex;

use super::{CidHashSet, ReadTracing};

/// A [`Blockstore`] wrapper that records the CIDs read from the inner [`Blockstore`]
/// while tracing is active.
pub struct TracingStore<T> {
    inner: T,
    // `Some` while tracing
    accessed: Mutex<Option<CidHashSet>>,
}

impl<T> TracingStore<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            accessed: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    #[cfg(test)]
    pub fn is_tracing(&self) -> bool {
        self.accessed.lock().is_some()
    }

    fn record(&self, k: &Cid) {
        if let Some(accessed) = self.accessed.lock().as_mut() {
            accessed.insert(*k);
        }
    }
}

impl<T> ReadTracing for TracingStore<T> {
    fn start_tracing(&self) {
        *self.accessed.lock() = Some(CidHashSet::default());
    }

    fn finish_tracing(&self) -> CidHashSet {
        self.accessed.lock().take().unwrap_or_default()
    }
}

impl<T: Blockstore> Blockstore for TracingStore<T> {
    fn get(&self, k: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        let result = self.inner.get(k)?;
        if result.is_some() {
            self.record(k);
        }
        Ok(result)
    }

    fn has(&self, k: &Cid) -> anyhow::Result<bool> {
        let result = self.inner.has(k)?;
        if result {
            self.record(k);
        }
        Ok(result)
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> anyhow::Result<()> {
        self.inner.put_keyed(k, block)
    }
}
