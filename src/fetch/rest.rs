// src/fetch/rest.rs

use super::{clamp_limit, read_json, AssetSource, Fetched};
use crate::process::NamePrecedence;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const DEFAULT_REST_URL: &str = "https://api.helius.xyz/v0";

/// REST flavour: one `GET /addresses/<wallet>/nfts` returning full records.
#[derive(Debug, Clone)]
pub struct RestSource {
    base: String,
    api_key: String,
    wallet: String,
    limit: u32,
}

impl RestSource {
    pub fn new(
        base: impl Into<String>,
        api_key: impl Into<String>,
        wallet: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            base: base.into(),
            api_key: api_key.into(),
            wallet: wallet.into(),
            limit: clamp_limit(limit),
        }
    }

    fn url(&self) -> Result<Url> {
        let mut url =
            Url::parse(&self.base).with_context(|| format!("parsing REST URL {}", self.base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be used as a base URL", self.base))?
            .pop_if_empty()
            .extend(&["addresses", self.wallet.as_str(), "nfts"]);
        url.query_pairs_mut()
            .append_pair("api-key", &self.api_key)
            .append_pair("page", "1")
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }
}

/// The listing is normally a bare array; some deployments wrap it.
fn page_records(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => ["items", "nfts"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| anyhow!("NFT listing has no record array")),
        other => Err(anyhow!("NFT listing is not a JSON array: {}", other)),
    }
}

impl AssetSource for RestSource {
    fn label(&self) -> &'static str {
        "rest"
    }

    fn name_precedence(&self) -> NamePrecedence {
        NamePrecedence::WithTitle
    }

    async fn fetch(&self, client: &Client) -> Result<Fetched> {
        let resp = client
            .get(self.url()?)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("GET NFT listing from {}", self.base))?;
        let assets = page_records(read_json(resp, "NFT listing").await?)?;
        debug!(wallet = %self.wallet, count = assets.len(), "NFT listing decoded");
        Ok(Fetched {
            assets,
            errors: Vec::new(),
        })
    }
}
