// src/fetch/rpc.rs

use super::{clamp_limit, read_json, AssetSource, Fetched};
use crate::process::{path::array_at, NamePrecedence};
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const DEFAULT_RPC_URL: &str = "https://mainnet.helius-rpc.com/";

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: P,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnerParams<'a> {
    owner_address: &'a str,
    page: u32,
    limit: u32,
}

#[derive(Serialize)]
struct AssetParams<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<Value>,
}

/// JSON-RPC (DAS) flavour: list the owner's asset ids, then fetch each
/// asset's full record with its own `getAsset` call.
#[derive(Debug, Clone)]
pub struct RpcSource {
    endpoint: String,
    api_key: String,
    wallet: String,
    limit: u32,
}

impl RpcSource {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        wallet: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            wallet: wallet.into(),
            limit: clamp_limit(limit),
        }
    }

    fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("parsing RPC URL {}", self.endpoint))?;
        url.query_pairs_mut().append_pair("api-key", &self.api_key);
        Ok(url)
    }

    async fn call<P: Serialize>(&self, client: &Client, method: &str, params: P) -> Result<Value> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: "1",
            method,
            params,
        };
        let resp = client
            .post(self.url()?)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("POST {} to {}", method, self.endpoint))?;
        let raw = read_json(resp, method).await?;
        let parsed: RpcResponse = serde_json::from_value(raw)
            .with_context(|| format!("unexpected {} response shape", method))?;
        if let Some(err) = parsed.error.filter(|e| !e.is_null()) {
            bail!("{} returned error: {}", method, err);
        }
        Ok(parsed.result)
    }

    #[instrument(level = "debug", skip(self, client), fields(wallet = %self.wallet))]
    async fn asset_ids(&self, client: &Client) -> Result<Vec<String>> {
        let params = OwnerParams {
            owner_address: &self.wallet,
            page: 1,
            limit: self.limit,
        };
        let result = self.call(client, "getAssetsByOwner", params).await?;
        Ok(owner_asset_ids(&result))
    }
}

/// `result.items[].id`, skipping entries without a string id.
fn owner_asset_ids(result: &Value) -> Vec<String> {
    array_at(result, "items")
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

impl AssetSource for RpcSource {
    fn label(&self) -> &'static str {
        "rpc"
    }

    fn name_precedence(&self) -> NamePrecedence {
        NamePrecedence::Standard
    }

    async fn fetch(&self, client: &Client) -> Result<Fetched> {
        let ids = self.asset_ids(client).await?;
        info!(count = ids.len(), "asset ids listed");

        let mut fetched = Fetched::default();
        for id in &ids {
            let outcome = self
                .call(client, "getAsset", AssetParams { id: id.as_str() })
                .await
                .and_then(|asset| {
                    if asset.as_object().map_or(false, |m| !m.is_empty()) {
                        Ok(asset)
                    } else {
                        Err(anyhow!("getAsset returned no record"))
                    }
                });
            match outcome {
                Ok(asset) => {
                    debug!(id = %id, "asset fetched");
                    fetched.assets.push(asset);
                }
                Err(e) => {
                    let msg = format!("asset {}: {:#}", id, e);
                    warn!(error = %msg, "skipping asset");
                    fetched.errors.push(msg);
                }
            }
        }
        Ok(fetched)
    }
}
