// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! An in-memory chain, a deterministic transfer engine and state fixtures.

use std::sync::{Arc, LazyLock};

use ahash::HashMap;
use anyhow::{Context as _, bail};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::{CborStore as _, RawBytes};
use fvm_shared4::METHOD_SEND;
use multihash_codetable::{Code, MultihashDigest as _};

use crate::blocks::{BlockHeader, Tipset, TipsetKey};
use crate::db::MemoryDB;
use crate::interpreter::{ApplyOutcome, ExecuteParams, MessageExecutor, WriteMode};
use crate::rpc_client::{
    ApiMessage, ChainApi, ExecutionTrace, InvocResult, MessageLookup, TraceMessage,
};
use crate::shim::{
    actors::{
        BURNT_FUNDS_ACTOR_ADDR, BURNT_FUNDS_ACTOR_ID, INIT_ACTOR_ID, InitState, REWARD_ACTOR_ADDR,
        REWARD_ACTOR_ID, SYSTEM_ACTOR_ID,
    },
    address::Address,
    clock::ChainEpoch,
    econ::TokenAmount,
    error::ExitCode,
    executor::Receipt,
    message::{Message, MessageExt as _},
    state_tree::{ActorState, StateTree, StateTreeVersion},
    version::NetworkVersion,
};
use crate::utils::cid::IDENTITY_HASH;

/// Gas charged for every transfer that gets past the nonce check.
pub const TRANSFER_GAS: u64 = 1_000;

pub const NETWORK_NAME: &str = "testnet";
pub const INCLUSION_HEIGHT: ChainEpoch = 10;

pub static BASE_FEE: LazyLock<TokenAmount> = LazyLock::new(|| TokenAmount::from_atto(100));
pub static CIRC_SUPPLY: LazyLock<TokenAmount> =
    LazyLock::new(|| TokenAmount::from_whole(1_000_000));
pub static ACCOUNT_BALANCE: LazyLock<TokenAmount> = LazyLock::new(|| TokenAmount::from_whole(10));

pub fn dummy_cid(seed: &[u8]) -> Cid {
    Cid::new_v1(fvm_ipld_encoding::DAG_CBOR, Code::Blake2b256.digest(seed))
}

/// A builtin actor code CID. Identity-hashed, so it never needs to be stored.
fn actor_code(name: &str) -> Cid {
    let name = format!("fil/12/{name}");
    Cid::new_v1(
        fvm_ipld_encoding::IPLD_RAW,
        cid::multihash::Multihash::wrap(IDENTITY_HASH, name.as_bytes()).unwrap(),
    )
}

fn actor(
    store: &impl Blockstore,
    code: &str,
    head: &impl serde::Serialize,
    balance: TokenAmount,
) -> ActorState {
    ActorState {
        code: actor_code(code),
        state: store.put_cbor(head, Code::Blake2b256).unwrap(),
        sequence: 0,
        balance,
        delegated_address: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub robust: Address,
}

impl Account {
    pub fn id_address(&self) -> Address {
        Address::new_id(self.id)
    }
}

/// A version 5 state tree with the system, init, reward and burnt funds actors plus
/// funded secp256k1 accounts registered with the init actor.
pub struct StateFixture {
    pub root: Cid,
    pub accounts: Vec<Account>,
}

impl StateFixture {
    pub fn new<BS: Blockstore>(store: &BS, accounts: usize) -> Self {
        let zero = TokenAmount::from_atto(0);
        let mut init = InitState::new(store, NETWORK_NAME.into()).unwrap();
        let mut tree = StateTree::new(store, StateTreeVersion::V5).unwrap();
        tree.set_actor(SYSTEM_ACTOR_ID, actor(store, "system", &("system",), zero.clone()));
        tree.set_actor(
            REWARD_ACTOR_ID,
            actor(store, "reward", &("reward",), TokenAmount::from_whole(1_000)),
        );
        tree.set_actor(
            BURNT_FUNDS_ACTOR_ID,
            actor(store, "account", &(BURNT_FUNDS_ACTOR_ADDR,), zero.clone()),
        );

        let accounts = (0..accounts)
            .map(|i| {
                let robust = Address::new_secp256k1(&[i as u8 + 1; 65]).unwrap();
                let id = init.map_address_to_new_id(store, &robust).unwrap();
                tree.set_actor(
                    id,
                    actor(store, "account", &(robust,), ACCOUNT_BALANCE.clone()),
                );
                Account { id, robust }
            })
            .collect();
        tree.set_actor(INIT_ACTOR_ID, actor(store, "init", &init, zero));

        Self {
            root: tree.flush().unwrap(),
            accounts,
        }
    }
}

pub fn transfer(from: &Account, to: &Account, nonce: u64, value: u64) -> Message {
    Message {
        version: 0,
        from: from.robust,
        to: to.robust,
        sequence: nonce,
        value: TokenAmount::from_atto(value),
        method_num: METHOD_SEND,
        params: RawBytes::default(),
        gas_limit: 10_000_000,
        gas_fee_cap: TokenAmount::from_atto(200),
        gas_premium: TokenAmount::from_atto(1),
    }
}

/// Method that passes the value on to the address in the message params.
pub const METHOD_FORWARD: u64 = 2;

/// A transfer to `via` that `via` forwards to `to`, like a payment splitter would.
pub fn forward(from: &Account, via: &Account, to: &Account, nonce: u64, value: u64) -> Message {
    Message {
        method_num: METHOD_FORWARD,
        params: RawBytes::serialize(to.robust).unwrap(),
        ..transfer(from, via, nonce, value)
    }
}

/// Parameters matching the tipsets of a [`ChainFixture`].
pub fn execute_params(preroot: Cid, message: &Message) -> ExecuteParams<'_> {
    ExecuteParams {
        preroot,
        epoch: INCLUSION_HEIGHT + 1,
        message,
        circ_supply: &CIRC_SUPPLY,
        base_fee: &BASE_FEE,
        network_version: NetworkVersion::V21,
        timestamp: 0,
        write_mode: WriteMode::WriteThrough,
    }
}

/// Applies plain value transfers on real state trees.
///
/// Each transfer that passes the nonce check costs [`TRANSFER_GAS`]: the base fee part
/// is burnt and the premium part goes to the reward actor. Receivers are never created,
/// so a missing receiver fails with [`ExitCode::SYS_INVALID_RECEIVER`] and a missing
/// [`METHOD_FORWARD`] beneficiary with [`ExitCode::USR_NOT_FOUND`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferExecutor;

impl MessageExecutor for TransferExecutor {
    fn execute<DB>(&self, store: &Arc<DB>, params: &ExecuteParams<'_>) -> anyhow::Result<ApplyOutcome>
    where
        DB: Blockstore + Send + Sync + 'static,
    {
        match params.write_mode {
            WriteMode::WriteThrough => apply_transfer(store.as_ref(), params),
            WriteMode::Buffered => apply_transfer(
                &Overlay {
                    base: store.as_ref(),
                    writes: MemoryDB::default(),
                },
                params,
            ),
        }
    }
}

fn receipt(exit_code: ExitCode, gas_used: u64) -> Receipt {
    Receipt {
        exit_code,
        return_data: RawBytes::default(),
        gas_used,
        events_root: None,
    }
}

fn credit(actor: &mut ActorState, amount: &TokenAmount) {
    actor.balance = TokenAmount::from_atto(actor.balance.atto() + amount.atto());
}

fn debit(actor: &mut ActorState, amount: &TokenAmount) {
    actor.balance = TokenAmount::from_atto(actor.balance.atto() - amount.atto());
}

fn apply_transfer<BS: Blockstore>(
    store: BS,
    params: &ExecuteParams<'_>,
) -> anyhow::Result<ApplyOutcome> {
    let message = params.message;
    let mut tree = StateTree::new_from_root(store, &params.preroot)?;
    let rejected = |exit_code| -> anyhow::Result<ApplyOutcome> {
        Ok(ApplyOutcome {
            receipt: receipt(exit_code, 0),
            postroot: params.preroot,
        })
    };

    let Some(sender_id) = tree.lookup_id(&message.from)? else {
        return rejected(ExitCode::SYS_SENDER_INVALID);
    };
    let Some(mut sender) = tree.get_actor_by_id(sender_id)? else {
        return rejected(ExitCode::SYS_SENDER_INVALID);
    };
    if sender.sequence != message.sequence {
        return rejected(ExitCode::SYS_SENDER_STATE_INVALID);
    }

    let burn = TokenAmount::from_atto(params.base_fee.atto() * TRANSFER_GAS);
    let tip = TokenAmount::from_atto(message.gas_premium.atto() * TRANSFER_GAS);
    let gas_cost = TokenAmount::from_atto(burn.atto() + tip.atto());
    if sender.balance < gas_cost {
        bail!("sender {} cannot cover gas", message.from);
    }
    sender.sequence += 1;
    debit(&mut sender, &gas_cost);
    tree.set_actor(sender_id, sender.clone());

    let exit_code = match tree.lookup_id(&message.to)? {
        None => ExitCode::SYS_INVALID_RECEIVER,
        Some(_) if sender.balance < message.value => ExitCode::SYS_INSUFFICIENT_FUNDS,
        Some(receiver_id) => match beneficiary(&tree, message, receiver_id)? {
            None => ExitCode::USR_NOT_FOUND,
            Some(beneficiary_id) => {
                debit(&mut sender, &message.value);
                tree.set_actor(sender_id, sender);
                let mut beneficiary = tree
                    .get_actor_by_id(beneficiary_id)?
                    .context("beneficiary actor not found")?;
                credit(&mut beneficiary, &message.value);
                tree.set_actor(beneficiary_id, beneficiary);
                ExitCode::OK
            }
        },
    };

    for (addr, amount) in [(BURNT_FUNDS_ACTOR_ADDR, &burn), (REWARD_ACTOR_ADDR, &tip)] {
        let id = tree.lookup_id(&addr)?.context("fee recipient not found")?;
        let mut recipient = tree
            .get_actor_by_id(id)?
            .with_context(|| format!("actor {addr} not found"))?;
        credit(&mut recipient, amount);
        tree.set_actor(id, recipient);
    }

    Ok(ApplyOutcome {
        receipt: receipt(exit_code, TRANSFER_GAS),
        postroot: tree.flush()?,
    })
}

/// The actor a transfer's value ends up with: the receiver, or the address in the params
/// of a [`METHOD_FORWARD`] call. `None` if that address does not resolve.
fn beneficiary<BS: Blockstore>(
    tree: &StateTree<BS>,
    message: &Message,
    receiver_id: u64,
) -> anyhow::Result<Option<u64>> {
    if message.method_num != METHOD_FORWARD {
        return Ok(Some(receiver_id));
    }
    let to: Address = message.params.deserialize()?;
    tree.lookup_id(&to)
}

/// Reads fall through to `base`, writes are kept aside.
struct Overlay<'a, DB> {
    base: &'a DB,
    writes: MemoryDB,
}

impl<DB: Blockstore> Blockstore for Overlay<'_, DB> {
    fn get(&self, k: &Cid) -> anyhow::Result<Option<Vec<u8>>> {
        match self.writes.get(k)? {
            Some(data) => Ok(Some(data)),
            None => self.base.get(k),
        }
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> anyhow::Result<()> {
        self.writes.put_keyed(k, block)
    }
}

/// An in-memory [`ChainApi`]. `tipsets` are ordered by height and the last one is the
/// head; `store` backs `ChainReadObj`.
pub struct MockChain {
    store: Arc<MemoryDB>,
    pub tipsets: Vec<Tipset>,
    pub blocks: HashMap<Cid, BlockHeader>,
    pub messages: HashMap<Cid, Message>,
    pub lookups: HashMap<Cid, MessageLookup>,
    /// Canonical messages, keyed by the CID of a block in the executing tipset.
    pub parent_messages: HashMap<Cid, Vec<ApiMessage>>,
    pub receipts: HashMap<Cid, Receipt>,
    pub network_name: String,
    pub node_version: String,
    pub network_version: NetworkVersion,
    pub circ_supply: TokenAmount,
    /// Leaves subcalls out of `StateCall` traces.
    pub shallow_traces: bool,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            store: Arc::default(),
            tipsets: vec![],
            blocks: HashMap::default(),
            messages: HashMap::default(),
            lookups: HashMap::default(),
            parent_messages: HashMap::default(),
            receipts: HashMap::default(),
            network_name: NETWORK_NAME.into(),
            node_version: "1.23.4+mock".into(),
            network_version: NetworkVersion::V21,
            circ_supply: CIRC_SUPPLY.clone(),
            shallow_traces: false,
        }
    }
}

impl MockChain {
    pub fn store(&self) -> &Arc<MemoryDB> {
        &self.store
    }

    pub fn push_tipset(&mut self, tipset: Tipset) {
        for (cid, header) in tipset.key().cids().iter().zip(tipset.block_headers().iter()) {
            self.blocks.insert(*cid, header.clone());
        }
        self.tipsets.push(tipset);
    }

    fn find_tipset(&self, key: &TipsetKey) -> anyhow::Result<&Tipset> {
        self.tipsets
            .iter()
            .find(|ts| ts.key() == key)
            .with_context(|| format!("tipset {key} not found"))
    }
}

impl ChainApi for MockChain {
    async fn chain_get_message(&self, cid: Cid) -> anyhow::Result<Message> {
        self.messages
            .get(&cid)
            .cloned()
            .with_context(|| format!("message {cid} not found"))
    }

    async fn state_search_msg(&self, cid: Cid) -> anyhow::Result<Option<MessageLookup>> {
        Ok(self.lookups.get(&cid).cloned())
    }

    async fn chain_get_tipset(&self, key: &TipsetKey) -> anyhow::Result<Tipset> {
        self.find_tipset(key).cloned()
    }

    async fn chain_get_tipset_by_height(
        &self,
        epoch: ChainEpoch,
        anchor: Option<&TipsetKey>,
    ) -> anyhow::Result<Tipset> {
        let anchor = match anchor {
            Some(key) => self.find_tipset(key)?,
            None => self.tipsets.last().context("empty chain")?,
        };
        anyhow::ensure!(
            epoch <= anchor.epoch(),
            "looking for tipset with height greater than start point"
        );
        self.tipsets
            .iter()
            .rev()
            .find(|ts| ts.epoch() <= epoch)
            .cloned()
            .with_context(|| format!("no tipset at or below height {epoch}"))
    }

    async fn chain_get_block(&self, cid: Cid) -> anyhow::Result<BlockHeader> {
        self.blocks
            .get(&cid)
            .cloned()
            .with_context(|| format!("block {cid} not found"))
    }

    async fn chain_get_parent_messages(&self, block: Cid) -> anyhow::Result<Vec<ApiMessage>> {
        self.parent_messages
            .get(&block)
            .cloned()
            .with_context(|| format!("block {block} not found"))
    }

    async fn state_circulating_supply(&self, key: &TipsetKey) -> anyhow::Result<TokenAmount> {
        self.find_tipset(key)?;
        Ok(self.circ_supply.clone())
    }

    async fn state_get_receipt(
        &self,
        msg: Cid,
        key: &TipsetKey,
    ) -> anyhow::Result<Option<Receipt>> {
        self.find_tipset(key)?;
        Ok(self.receipts.get(&msg).cloned())
    }

    async fn state_network_name(&self) -> anyhow::Result<String> {
        Ok(self.network_name.clone())
    }

    async fn version(&self) -> anyhow::Result<String> {
        Ok(self.node_version.clone())
    }

    async fn state_network_version(&self, key: &TipsetKey) -> anyhow::Result<NetworkVersion> {
        self.find_tipset(key)?;
        Ok(self.network_version)
    }

    /// A plain transfer only touches its two parties; a forward adds one subcall.
    async fn state_call(&self, message: &Message, key: &TipsetKey) -> anyhow::Result<InvocResult> {
        self.find_tipset(key)?;
        let subcalls = match message.method_num {
            METHOD_FORWARD if !self.shallow_traces => vec![ExecutionTrace {
                msg: TraceMessage {
                    from: message.to,
                    to: message.params.deserialize()?,
                },
                subcalls: vec![],
            }],
            _ => vec![],
        };
        Ok(InvocResult {
            execution_trace: ExecutionTrace {
                msg: TraceMessage {
                    from: message.from,
                    to: message.to,
                },
                subcalls,
            },
            error: String::new(),
        })
    }

    async fn chain_read_obj(&self, cid: Cid) -> anyhow::Result<Vec<u8>> {
        self.store
            .get(&cid)?
            .with_context(|| format!("block {cid} not found"))
    }
}

fn header(epoch: ChainEpoch, parents: Vec<Cid>, state_root: Cid) -> BlockHeader {
    BlockHeader {
        miner_address: Address::new_id(1000),
        parents,
        epoch,
        state_root,
        message_receipts: dummy_cid(b"receipts"),
        messages: dummy_cid(b"messages"),
        timestamp: 1_700_000_000 + epoch as u64 * 30,
        parent_base_fee: BASE_FEE.clone(),
    }
}

fn single_block_tipset(name: &[u8], header: BlockHeader) -> Tipset {
    Tipset::new(
        TipsetKey::from(nunny::vec![dummy_cid(name)]),
        nunny::vec![header],
    )
    .unwrap()
}

/// A two-tipset chain: the inclusion tipset at [`INCLUSION_HEIGHT`] carries a batch of
/// transfers that the execution tipset, the head, applies.
pub struct ChainFixture {
    pub chain: MockChain,
    pub messages: Vec<Message>,
    pub message_cids: Vec<Cid>,
    pub inclusion: Tipset,
    pub execution: Tipset,
}

impl ChainFixture {
    /// `transfers` are `(sender, receiver, value)` triples indexing fixture accounts.
    pub fn transfers(transfers: &[(usize, usize, u64)]) -> Self {
        let accounts = transfers
            .iter()
            .map(|&(from, to, _)| from.max(to) + 1)
            .max()
            .unwrap_or(0)
            .max(2);
        Self::with_messages(accounts, |state| {
            let mut nonces = vec![0; accounts];
            transfers
                .iter()
                .map(|&(from, to, value)| {
                    let (sender, receiver) = (&state.accounts[from], &state.accounts[to]);
                    let message = transfer(sender, receiver, nonces[from], value);
                    nonces[from] += 1;
                    message
                })
                .collect()
        })
    }

    /// Includes the messages `build` returns, in order, over a state with `accounts`
    /// funded accounts.
    pub fn with_messages(
        accounts: usize,
        build: impl FnOnce(&StateFixture) -> Vec<Message>,
    ) -> Self {
        let mut chain = MockChain::default();
        let store = Arc::clone(chain.store());
        let state = StateFixture::new(store.as_ref(), accounts);
        let messages = build(&state);
        let message_cids = messages
            .iter()
            .map(|it| it.cid().unwrap())
            .collect::<Vec<_>>();

        let inclusion = single_block_tipset(
            b"inclusion",
            header(INCLUSION_HEIGHT, vec![dummy_cid(b"grandparent")], state.root),
        );
        let mut root = state.root;
        let mut receipts = vec![];
        for message in &messages {
            let outcome = TransferExecutor
                .execute(&store, &execute_params(root, message))
                .unwrap();
            root = outcome.postroot;
            receipts.push(outcome.receipt);
        }
        let execution = single_block_tipset(
            b"execution",
            header(
                INCLUSION_HEIGHT + 1,
                inclusion.key().cids().iter().copied().collect(),
                root,
            ),
        );

        for ((cid, message), receipt) in message_cids.iter().zip(&messages).zip(receipts) {
            chain.messages.insert(*cid, message.clone());
            chain.lookups.insert(
                *cid,
                MessageLookup {
                    message: *cid,
                    receipt: receipt.clone(),
                    tipset: execution.key().clone(),
                    height: execution.epoch(),
                },
            );
            chain.receipts.insert(*cid, receipt);
        }
        chain.parent_messages.insert(
            *execution.key().first(),
            message_cids
                .iter()
                .zip(&messages)
                .map(|(cid, message)| ApiMessage {
                    cid: *cid,
                    message: message.clone(),
                })
                .collect(),
        );
        chain.push_tipset(inclusion.clone());
        chain.push_tipset(execution.clone());

        Self {
            chain,
            messages,
            message_cids,
            inclusion,
            execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn transfers_move_value_and_fees() {
        let store = Arc::new(MemoryDB::default());
        let fixture = StateFixture::new(store.as_ref(), 2);
        let [alice, bob] = [fixture.accounts[0], fixture.accounts[1]];
        let message = transfer(&alice, &bob, 0, 500);
        let outcome = TransferExecutor
            .execute(&store, &execute_params(fixture.root, &message))
            .unwrap();
        assert_eq!(outcome.receipt.exit_code, ExitCode::OK);
        assert_eq!(outcome.receipt.gas_used, TRANSFER_GAS);

        let tree = StateTree::new_from_root(store.as_ref(), &outcome.postroot).unwrap();
        let sender = tree.get_actor(&alice.robust).unwrap().unwrap();
        let receiver = tree.get_actor(&bob.robust).unwrap().unwrap();
        let burnt = tree.get_actor(&BURNT_FUNDS_ACTOR_ADDR).unwrap().unwrap();
        assert_eq!(sender.sequence, 1);
        assert_eq!(
            receiver.balance,
            TokenAmount::from_atto(ACCOUNT_BALANCE.atto() + 500)
        );
        assert_eq!(burnt.balance, TokenAmount::from_atto(100 * TRANSFER_GAS));
        assert_eq!(
            sender.balance,
            TokenAmount::from_atto(ACCOUNT_BALANCE.atto() - 500 - 101 * TRANSFER_GAS)
        );
    }

    #[test]
    fn forwards_pay_the_beneficiary() {
        let store = Arc::new(MemoryDB::default());
        let fixture = StateFixture::new(store.as_ref(), 3);
        let [alice, bob, carol] = [0, 1, 2].map(|i| fixture.accounts[i]);
        let message = forward(&alice, &bob, &carol, 0, 500);
        let outcome = TransferExecutor
            .execute(&store, &execute_params(fixture.root, &message))
            .unwrap();
        assert_eq!(outcome.receipt.exit_code, ExitCode::OK);

        let tree = StateTree::new_from_root(store.as_ref(), &outcome.postroot).unwrap();
        let via = tree.get_actor(&bob.robust).unwrap().unwrap();
        let beneficiary = tree.get_actor(&carol.robust).unwrap().unwrap();
        assert_eq!(via.balance, *ACCOUNT_BALANCE);
        assert_eq!(
            beneficiary.balance,
            TokenAmount::from_atto(ACCOUNT_BALANCE.atto() + 500)
        );

        let stranger = Account {
            id: 4242,
            robust: Address::new_secp256k1(&[0xee; 65]).unwrap(),
        };
        let message = forward(&alice, &bob, &stranger, 0, 500);
        let outcome = TransferExecutor
            .execute(&store, &execute_params(fixture.root, &message))
            .unwrap();
        assert_eq!(outcome.receipt.exit_code, ExitCode::USR_NOT_FOUND);
    }

    #[tokio::test]
    async fn forward_traces_report_the_subcall() {
        let mut fixture = ChainFixture::with_messages(3, |state| {
            let [alice, bob, carol] = [0, 1, 2].map(|i| state.accounts[i]);
            vec![forward(&alice, &bob, &carol, 0, 10)]
        });
        let message = fixture.messages[0].clone();
        let key = fixture.inclusion.key().clone();
        let deep = fixture.chain.state_call(&message, &key).await.unwrap();
        assert_eq!(deep.execution_trace.touched_addresses().len(), 3);

        fixture.chain.shallow_traces = true;
        let shallow = fixture.chain.state_call(&message, &key).await.unwrap();
        assert_eq!(shallow.execution_trace.touched_addresses().len(), 2);
    }

    #[test]
    fn stale_nonces_are_rejected_without_changes() {
        let store = Arc::new(MemoryDB::default());
        let fixture = StateFixture::new(store.as_ref(), 2);
        let message = transfer(&fixture.accounts[0], &fixture.accounts[1], 3, 1);
        let outcome = TransferExecutor
            .execute(&store, &execute_params(fixture.root, &message))
            .unwrap();
        assert_eq!(outcome.receipt.exit_code, ExitCode::SYS_SENDER_STATE_INVALID);
        assert_eq!(outcome.postroot, fixture.root);
    }

    #[test]
    fn buffered_writes_leave_the_store_untouched() {
        let store = Arc::new(MemoryDB::default());
        let fixture = StateFixture::new(store.as_ref(), 2);
        let message = transfer(&fixture.accounts[0], &fixture.accounts[1], 0, 1);
        let params = execute_params(fixture.root, &message);
        let before = store.len();
        let buffered = TransferExecutor
            .execute(
                &store,
                &ExecuteParams {
                    write_mode: WriteMode::Buffered,
                    ..params.clone()
                },
            )
            .unwrap();
        assert_eq!(store.len(), before);
        assert!(!store.contains(&buffered.postroot));

        let written = TransferExecutor.execute(&store, &params).unwrap();
        assert_eq!(written, buffered);
        assert!(store.contains(&written.postroot));
    }

    #[tokio::test]
    async fn fixture_tipsets_link_up() {
        let fixture = ChainFixture::transfers(&[(0, 1, 10)]);
        assert!(fixture.inclusion.key().matches(fixture.execution.parents()));
        let head = fixture
            .chain
            .chain_get_tipset_by_height(INCLUSION_HEIGHT + 1, None)
            .await
            .unwrap();
        assert_eq!(head.key(), fixture.execution.key());
        assert!(
            fixture
                .chain
                .chain_get_tipset_by_height(INCLUSION_HEIGHT + 2, None)
                .await
                .is_err()
        );
    }
}
