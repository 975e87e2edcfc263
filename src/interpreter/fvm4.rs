// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use anyhow::{Context as _, bail};
use cid::Cid;
use fvm4::{
    engine::MultiEngine,
    executor::{ApplyKind, DefaultExecutor, Executor as _},
    externs::{Chain, Consensus, Externs, Rand},
    machine::{DefaultMachine, Machine as _, NetworkConfig},
};
use fvm_ipld_blockstore::Blockstore;
use fvm_shared4::{clock::ChainEpoch, consensus::ConsensusFault};
use tracing::debug;

use super::{ApplyOutcome, ExecuteParams, MessageExecutor, WriteMode};
use crate::shim::{message::MessageExt as _, version::NetworkVersion};

/// Randomness handed to actors. Replays must not depend on beacon or ticket values.
const FIXED_RANDOMNESS: [u8; 32] = *b"i_am_random_____i_am_random_____";

type TvxMachine<DB> = DefaultMachine<Arc<DB>, ReplayExterns>;
type TvxKernel<DB> =
    fvm4::kernel::filecoin::DefaultFilecoinKernel<fvm4::call_manager::DefaultCallManager<TvxMachine<DB>>>;
type TvxExecutor<DB> = DefaultExecutor<TvxKernel<DB>>;

/// Externs for isolated replay: constant randomness, no consensus faults and no
/// access to chain history.
pub struct ReplayExterns;

impl Externs for ReplayExterns {}

impl Rand for ReplayExterns {
    fn get_chain_randomness(&self, _round: ChainEpoch) -> anyhow::Result<[u8; 32]> {
        Ok(FIXED_RANDOMNESS)
    }

    fn get_beacon_randomness(&self, _round: ChainEpoch) -> anyhow::Result<[u8; 32]> {
        Ok(FIXED_RANDOMNESS)
    }
}

impl Consensus for ReplayExterns {
    fn verify_consensus_fault(
        &self,
        _h1: &[u8],
        _h2: &[u8],
        _extra: &[u8],
    ) -> anyhow::Result<(Option<ConsensusFault>, i64)> {
        Ok((None, 0))
    }
}

impl Chain for ReplayExterns {
    fn get_tipset_cid(&self, epoch: ChainEpoch) -> anyhow::Result<Cid> {
        bail!("tipset lookups are unavailable during replay (epoch {epoch})")
    }
}

/// Applies messages with the `fvm` v4 engine.
pub struct FvmExecutor {
    engines: MultiEngine,
}

impl Default for FvmExecutor {
    fn default() -> Self {
        Self {
            engines: MultiEngine::new(1),
        }
    }
}

impl MessageExecutor for FvmExecutor {
    fn execute<DB>(&self, store: &Arc<DB>, params: &ExecuteParams<'_>) -> anyhow::Result<ApplyOutcome>
    where
        DB: Blockstore + Send + Sync + 'static,
    {
        let ExecuteParams {
            preroot,
            epoch,
            message,
            circ_supply,
            base_fee,
            network_version,
            timestamp,
            write_mode,
        } = params;
        if *network_version < NetworkVersion::V21 {
            bail!("network version {network_version} is older than the engine supports");
        }

        let config = NetworkConfig::new(*network_version);
        let engine = self.engines.get(&config)?;
        let mut context = config.for_epoch(*epoch, *timestamp, *preroot);
        context.set_base_fee((*base_fee).clone());
        context.set_circulating_supply((*circ_supply).clone());
        let machine: TvxMachine<DB> = DefaultMachine::new(&context, Arc::clone(store), ReplayExterns)
            .context("failed to create the machine")?;
        let mut executor: TvxExecutor<DB> = DefaultExecutor::new(engine, machine)?;

        let raw_length = message.marshal_cbor()?.len();
        let ret = executor
            .execute_message((*message).clone(), ApplyKind::Explicit, raw_length)
            .context("message execution failed")?;
        if let Some(failure) = &ret.failure_info {
            debug!(%failure, "message failed");
        }

        let postroot = match write_mode {
            WriteMode::WriteThrough => executor.flush()?,
            WriteMode::Buffered => executor
                .state_tree_mut()
                .flush()
                .map_err(|e| anyhow::anyhow!("failed to flush state tree: {e}"))?,
        };
        Ok(ApplyOutcome {
            receipt: ret.msg_receipt,
            postroot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDB;
    use crate::shim::{address::Address, econ::TokenAmount, message::Message};

    #[test]
    fn old_network_versions_are_rejected() {
        let message = Message {
            version: 0,
            from: Address::new_id(1000),
            to: Address::new_id(1001),
            sequence: 0,
            value: TokenAmount::from_atto(1),
            method_num: 0,
            params: Default::default(),
            gas_limit: 1_000_000,
            gas_fee_cap: TokenAmount::from_atto(1),
            gas_premium: TokenAmount::from_atto(1),
        };
        let zero = TokenAmount::from_atto(0);
        let params = ExecuteParams {
            preroot: Cid::default(),
            epoch: 10,
            message: &message,
            circ_supply: &zero,
            base_fee: &zero,
            network_version: NetworkVersion::V20,
            timestamp: 0,
            write_mode: WriteMode::WriteThrough,
        };
        let err = FvmExecutor::default()
            .execute(&Arc::new(MemoryDB::default()), &params)
            .unwrap_err();
        assert!(err.to_string().contains("older than the engine supports"));
    }

    #[test]
    fn randomness_is_fixed() {
        assert_eq!(
            ReplayExterns.get_chain_randomness(1).unwrap(),
            ReplayExterns.get_beacon_randomness(2).unwrap()
        );
    }
}
