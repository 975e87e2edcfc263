// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod memory;
mod proxy;
mod tracking;

pub use memory::MemoryDB;
pub use proxy::ProxyingStore;
pub use tracking::TracingStore;

use cid::Cid;
use fvm_ipld_blockstore::Blockstore;

use crate::rpc_client::ChainApi;

pub type CidHashSet = ahash::HashSet<Cid>;

/// Read-tracing capability of a block store.
///
/// Tracing state is one flag and one accumulator, so a traced store must not be shared
/// between concurrent executions.
pub trait ReadTracing {
    /// Clears the accumulator and starts recording successful reads.
    fn start_tracing(&self);
    /// Stops recording and returns every CID read since [`ReadTracing::start_tracing`].
    fn finish_tracing(&self) -> CidHashSet;
}

/// The block store an extraction runs against.
pub trait ExtractionStore: Blockstore + Send + Sync + 'static {
    /// Returns the read tracer, if the store supports tracing.
    fn read_tracer(&self) -> Option<&dyn ReadTracing> {
        None
    }
}

impl ExtractionStore for MemoryDB {}

impl<C> ExtractionStore for ProxyingStore<C> where C: ChainApi + Send + Sync + 'static {}

impl<T> ExtractionStore for TracingStore<T>
where
    T: Blockstore + Send + Sync + 'static,
{
    fn read_tracer(&self) -> Option<&dyn ReadTracing> {
        Some(self)
    }
}
