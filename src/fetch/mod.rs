// src/fetch/mod.rs

use crate::process::NamePrecedence;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{error, info};

pub mod rest;
pub mod rpc;

pub use rest::RestSource;
pub use rpc::RpcSource;

/// Largest page the upstream API hands out; only page 1 is ever requested.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// What a fetch produced. Errors are carried alongside whatever assets did
/// arrive so the caller can report them without aborting the run.
#[derive(Debug, Default)]
pub struct Fetched {
    pub assets: Vec<Value>,
    pub errors: Vec<String>,
}

/// A way of pulling a wallet's NFTs out of the indexing API.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    /// Short label used in logs.
    fn label(&self) -> &'static str;

    /// Name fields this source's records are expected to carry.
    fn name_precedence(&self) -> NamePrecedence;

    async fn fetch(&self, client: &Client) -> Result<Fetched>;
}

/// Run `source`, turning any hard failure into a reported error and an empty
/// asset list.
#[tracing::instrument(level = "info", skip_all, fields(source = source.label()))]
pub async fn fetch_soft<S: AssetSource>(source: &S, client: &Client) -> Fetched {
    match source.fetch(client).await {
        Ok(fetched) => {
            info!(
                assets = fetched.assets.len(),
                errors = fetched.errors.len(),
                "fetch finished"
            );
            fetched
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "fetch failed");
            Fetched {
                assets: Vec::new(),
                errors: vec![format!("{:#}", e)],
            }
        }
    }
}

pub(crate) fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

/// Check the status and decode the body as JSON. URLs are stripped from
/// errors since they carry the API key.
pub(crate) async fn read_json(resp: Response, what: &str) -> Result<Value> {
    resp.error_for_status()
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("{} returned an error status", what))?
        .json::<Value>()
        .await
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("decoding {} response", what))
}
