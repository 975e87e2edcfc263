// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Access to a Lotus-compatible full node.
//!
//! The extractor only talks to the chain through [`ChainApi`], so tests can swap
//! in an in-memory chain. [`RpcClient`] is the JSON-RPC implementation.

mod client;
mod types;

pub use client::RpcClient;
pub use types::{ApiMessage, InvocResult, MessageLookup};
#[cfg(test)]
pub use types::{ExecutionTrace, TraceMessage};

use crate::blocks::{BlockHeader, Tipset, TipsetKey};
use crate::shim::{
    clock::ChainEpoch, econ::TokenAmount, executor::Receipt, message::Message,
    version::NetworkVersion,
};
use anyhow::Context as _;
use cid::Cid;
use multiaddr::{Multiaddr, Protocol};
use std::{env, fmt, str::FromStr};
use url::Url;

pub const API_INFO_KEY: &str = "FULLNODE_API_INFO";
pub const DEFAULT_MULTIADDRESS: &str = "/ip4/127.0.0.1/tcp/1234/http";

/// The chain lookups the extractor depends on.
///
/// Every call is a single attempt; implementations must not retry.
#[allow(async_fn_in_trait)]
pub trait ChainApi {
    async fn chain_get_message(&self, cid: Cid) -> anyhow::Result<Message>;
    /// Where the message was executed, or `None` if the node cannot find it.
    async fn state_search_msg(&self, cid: Cid) -> anyhow::Result<Option<MessageLookup>>;
    async fn chain_get_tipset(&self, key: &TipsetKey) -> anyhow::Result<Tipset>;
    /// The tipset at `epoch`, walking back from `anchor`, or from the head when `anchor`
    /// is `None`.
    async fn chain_get_tipset_by_height(
        &self,
        epoch: ChainEpoch,
        anchor: Option<&TipsetKey>,
    ) -> anyhow::Result<Tipset>;
    async fn chain_get_block(&self, cid: Cid) -> anyhow::Result<BlockHeader>;
    /// Messages executed on top of the parents of `block`, in execution order.
    async fn chain_get_parent_messages(&self, block: Cid) -> anyhow::Result<Vec<ApiMessage>>;
    async fn state_circulating_supply(&self, key: &TipsetKey) -> anyhow::Result<TokenAmount>;
    async fn state_get_receipt(&self, msg: Cid, key: &TipsetKey)
    -> anyhow::Result<Option<Receipt>>;
    async fn state_network_name(&self) -> anyhow::Result<String>;
    /// The node's version string.
    async fn version(&self) -> anyhow::Result<String>;
    async fn state_network_version(&self, key: &TipsetKey) -> anyhow::Result<NetworkVersion>;
    async fn state_call(&self, message: &Message, key: &TipsetKey) -> anyhow::Result<InvocResult>;
    async fn chain_read_obj(&self, cid: Cid) -> anyhow::Result<Vec<u8>>;
}

impl<T: ChainApi> ChainApi for std::sync::Arc<T> {
    async fn chain_get_message(&self, cid: Cid) -> anyhow::Result<Message> {
        T::chain_get_message(self, cid).await
    }
    async fn state_search_msg(&self, cid: Cid) -> anyhow::Result<Option<MessageLookup>> {
        T::state_search_msg(self, cid).await
    }
    async fn chain_get_tipset(&self, key: &TipsetKey) -> anyhow::Result<Tipset> {
        T::chain_get_tipset(self, key).await
    }
    async fn chain_get_tipset_by_height(
        &self,
        epoch: ChainEpoch,
        anchor: Option<&TipsetKey>,
    ) -> anyhow::Result<Tipset> {
        T::chain_get_tipset_by_height(self, epoch, anchor).await
    }
    async fn chain_get_block(&self, cid: Cid) -> anyhow::Result<BlockHeader> {
        T::chain_get_block(self, cid).await
    }
    async fn chain_get_parent_messages(&self, block: Cid) -> anyhow::Result<Vec<ApiMessage>> {
        T::chain_get_parent_messages(self, block).await
    }
    async fn state_circulating_supply(&self, key: &TipsetKey) -> anyhow::Result<TokenAmount> {
        T::state_circulating_supply(self, key).await
    }
    async fn state_get_receipt(
        &self,
        msg: Cid,
        key: &TipsetKey,
    ) -> anyhow::Result<Option<Receipt>> {
        T::state_get_receipt(self, msg, key).await
    }
    async fn state_network_name(&self) -> anyhow::Result<String> {
        T::state_network_name(self).await
    }
    async fn version(&self) -> anyhow::Result<String> {
        T::version(self).await
    }
    async fn state_network_version(&self, key: &TipsetKey) -> anyhow::Result<NetworkVersion> {
        T::state_network_version(self, key).await
    }
    async fn state_call(&self, message: &Message, key: &TipsetKey) -> anyhow::Result<InvocResult> {
        T::state_call(self, message, key).await
    }
    async fn chain_read_obj(&self, cid: Cid) -> anyhow::Result<Vec<u8>> {
        T::chain_read_obj(self, cid).await
    }
}

/// Token and URL of a full node.
#[derive(Clone, Debug)]
pub struct ApiInfo {
    multiaddr: Multiaddr,
    url: Url,
    pub token: Option<String>,
}

impl fmt::Display for ApiInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(token) = &self.token {
            token.fmt(f)?;
            write!(f, ":")?;
        }
        self.multiaddr.fmt(f)?;
        Ok(())
    }
}

impl FromStr for ApiInfo {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, host) = match s.split_once(':') {
            Some((token, host)) => (Some(token), host),
            None => (None, s),
        };
        let multiaddr: Multiaddr = host
            .parse()
            .with_context(|| format!("invalid multiaddr {host}"))?;
        let url = multiaddr2url(&multiaddr).context("couldn't convert multiaddr to URL")?;
        Ok(ApiInfo {
            multiaddr,
            url,
            token: token.map(String::from),
        })
    }
}

impl ApiInfo {
    /// Reads [`API_INFO_KEY`] if set, otherwise falls back to [`DEFAULT_MULTIADDRESS`].
    /// Fails if the environment variable is malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        match env::var(API_INFO_KEY) {
            Ok(it) => it
                .parse()
                .with_context(|| format!("malformed {API_INFO_KEY}")),
            Err(env::VarError::NotPresent) => DEFAULT_MULTIADDRESS.parse(),
            Err(it @ env::VarError::NotUnicode(_)) => Err(it.into()),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// `"/dns/example.com/tcp/8080/http" -> "http://example.com:8080/"`
///
/// Returns [`None`] on unsupported formats, or if there is a URL parsing error.
///
/// Note that [`Multiaddr`]s do NOT support a (URL) `path`, so that must be handled
/// out-of-band.
fn multiaddr2url(m: &Multiaddr) -> Option<Url> {
    let mut components = m.iter().peekable();
    let host = match components.next()? {
        Protocol::Dns(it) | Protocol::Dns4(it) | Protocol::Dns6(it) | Protocol::Dnsaddr(it) => {
            it.to_string()
        }
        Protocol::Ip4(it) => it.to_string(),
        Protocol::Ip6(it) => format!("[{it}]"),
        _ => return None,
    };
    let port = components
        .next_if(|it| matches!(it, Protocol::Tcp(_)))
        .and_then(|it| match it {
            Protocol::Tcp(port) => Some(port),
            _ => None,
        });
    let scheme = match components.next()? {
        Protocol::Http => "http",
        Protocol::Https => "https",
        Protocol::Ws(it) if it == "/" => "ws",
        Protocol::Wss(it) if it == "/" => "wss",
        _ => return None,
    };
    let None = components.next() else { return None };
    let parse_me = match port {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };
    parse_me.parse().ok()
}
