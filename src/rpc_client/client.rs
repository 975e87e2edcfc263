// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::marker::PhantomData;

use anyhow::Context as _;
use cid::Cid;
use http::{HeaderMap, HeaderValue, header};
use jsonrpsee::core::client::ClientT as _;
use jsonrpsee::core::traits::ToRpcParams;
use tracing::debug;

use super::types::{ApiMessage, CirculatingSupply, InvocResult, MessageLookup, VersionInfo};
use super::{ApiInfo, ChainApi};
use crate::blocks::{BlockHeader, Tipset, TipsetKey};
use crate::lotus_json::{HasLotusJson, LotusJson};
use crate::shim::{
    clock::ChainEpoch, econ::TokenAmount, executor::Receipt, message::Message,
    version::NetworkVersion,
};

/// Lotus serves its stable API under this path.
const RPC_V0_PATH: &str = "/rpc/v0";

/// An at-rest description of a remote procedure call, invoked with [`RpcClient::call`].
#[derive(Debug, Clone)]
pub struct RpcRequest<T = serde_json::Value> {
    pub method_name: &'static str,
    pub params: serde_json::Value,
    pub result_type: PhantomData<fn() -> T>,
}

impl<T> RpcRequest<T> {
    /// `params` is a tuple of the positional arguments, or `()` for none.
    pub fn new<P: HasLotusJson>(method_name: &'static str, params: P) -> anyhow::Result<Self> {
        Ok(RpcRequest {
            method_name,
            params: params
                .into_lotus_json_value()
                .with_context(|| format!("failed to serialize parameters of {method_name}"))?,
            result_type: PhantomData,
        })
    }
}

impl<T> ToRpcParams for RpcRequest<T> {
    fn to_rpc_params(self) -> Result<Option<Box<serde_json::value::RawValue>>, serde_json::Error> {
        let params = match self.params {
            serde_json::Value::Null => serde_json::Value::Array(vec![]),
            other => other,
        };
        Ok(Some(serde_json::value::to_raw_value(&params)?))
    }
}

enum ClientInner {
    Ws(jsonrpsee::ws_client::WsClient),
    Https(jsonrpsee::http_client::HttpClient),
}

/// JSON-RPC client for the Lotus v0 API.
pub struct RpcClient {
    inner: ClientInner,
}

impl RpcClient {
    pub async fn connect(api: &ApiInfo) -> anyhow::Result<Self> {
        let mut url = api.url().clone();
        url.set_path(RPC_V0_PATH);
        let headers = match &api.token {
            Some(token) => HeaderMap::from_iter([(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .context("invalid authorization token")?,
            )]),
            None => HeaderMap::new(),
        };
        let inner = match url.scheme() {
            "ws" | "wss" => ClientInner::Ws(
                jsonrpsee::ws_client::WsClientBuilder::new()
                    .set_headers(headers)
                    .build(url.as_str())
                    .await
                    .with_context(|| format!("failed to connect to {url}"))?,
            ),
            "http" | "https" => ClientInner::Https(
                jsonrpsee::http_client::HttpClientBuilder::new()
                    .set_headers(headers)
                    .build(url.as_str())
                    .with_context(|| format!("failed to create a client for {url}"))?,
            ),
            it => anyhow::bail!("unsupported URL scheme: {it}"),
        };
        debug!(%url, "connected to full node");
        Ok(Self { inner })
    }

    pub async fn call<T: HasLotusJson + Clone>(&self, req: RpcRequest<T>) -> anyhow::Result<T> {
        let method_name = req.method_name;
        let result = match &self.inner {
            ClientInner::Ws(it) => it.request::<LotusJson<T>, _>(method_name, req).await,
            ClientInner::Https(it) => it.request::<LotusJson<T>, _>(method_name, req).await,
        };
        Ok(result
            .with_context(|| format!("{method_name} failed"))?
            .into_inner())
    }
}

impl ChainApi for RpcClient {
    async fn chain_get_message(&self, cid: Cid) -> anyhow::Result<Message> {
        self.call(RpcRequest::new("Filecoin.ChainGetMessage", (cid,))?)
            .await
    }

    async fn state_search_msg(&self, cid: Cid) -> anyhow::Result<Option<MessageLookup>> {
        self.call(RpcRequest::new("Filecoin.StateSearchMsg", (cid,))?)
            .await
    }

    async fn chain_get_tipset(&self, key: &TipsetKey) -> anyhow::Result<Tipset> {
        self.call(RpcRequest::new("Filecoin.ChainGetTipSet", (key.clone(),))?)
            .await
    }

    async fn chain_get_tipset_by_height(
        &self,
        epoch: ChainEpoch,
        anchor: Option<&TipsetKey>,
    ) -> anyhow::Result<Tipset> {
        self.call(RpcRequest::new(
            "Filecoin.ChainGetTipSetByHeight",
            (epoch, anchor.cloned()),
        )?)
        .await
    }

    async fn chain_get_block(&self, cid: Cid) -> anyhow::Result<BlockHeader> {
        self.call(RpcRequest::new("Filecoin.ChainGetBlock", (cid,))?)
            .await
    }

    async fn chain_get_parent_messages(&self, block: Cid) -> anyhow::Result<Vec<ApiMessage>> {
        self.call(RpcRequest::new("Filecoin.ChainGetParentMessages", (block,))?)
            .await
    }

    async fn state_circulating_supply(&self, key: &TipsetKey) -> anyhow::Result<TokenAmount> {
        let supply: CirculatingSupply = self
            .call(RpcRequest::new(
                "Filecoin.StateVMCirculatingSupplyInternal",
                (key.clone(),),
            )?)
            .await?;
        Ok(supply.fil_circulating)
    }

    async fn state_get_receipt(
        &self,
        msg: Cid,
        key: &TipsetKey,
    ) -> anyhow::Result<Option<Receipt>> {
        self.call(RpcRequest::new("Filecoin.StateGetReceipt", (msg, key.clone()))?)
            .await
    }

    async fn state_network_name(&self) -> anyhow::Result<String> {
        self.call(RpcRequest::new("Filecoin.StateNetworkName", ())?)
            .await
    }

    async fn version(&self) -> anyhow::Result<String> {
        let version: VersionInfo = self
            .call(RpcRequest::new("Filecoin.Version", ())?)
            .await?;
        Ok(version.version)
    }

    async fn state_network_version(&self, key: &TipsetKey) -> anyhow::Result<NetworkVersion> {
        let version: u32 = self
            .call(RpcRequest::new(
                "Filecoin.StateNetworkVersion",
                (key.clone(),),
            )?)
            .await?;
        Ok(NetworkVersion::new(version))
    }

    async fn state_call(&self, message: &Message, key: &TipsetKey) -> anyhow::Result<InvocResult> {
        self.call(RpcRequest::new(
            "Filecoin.StateCall",
            (message.clone(), key.clone()),
        )?)
        .await
    }

    async fn chain_read_obj(&self, cid: Cid) -> anyhow::Result<Vec<u8>> {
        self.call(RpcRequest::new("Filecoin.ChainReadObj", (cid,))?)
            .await
    }
}
