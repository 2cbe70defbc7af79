// src/config.rs

use crate::{
    fetch::{rest::DEFAULT_REST_URL, rpc::DEFAULT_RPC_URL, RestSource, RpcSource, MAX_PAGE_LIMIT},
    pipeline::RunOptions,
    process::NamePrecedence,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use reqwest::Client;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// JSON-RPC: list asset ids, then fetch each asset
    Rpc,
    /// REST: one address-scoped NFT listing
    Rest,
}

/// Export a wallet's year-named NFTs (1990-2025) to CSV.
#[derive(Parser, Debug, Clone)]
#[command(name = "nftscraper", version)]
pub struct Config {
    /// Helius API key
    #[arg(long, env = "HELIUS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Solana wallet address whose NFTs are exported
    #[arg(long, env = "WALLET_ADDRESS")]
    pub wallet: String,

    /// Which upstream API shape to query
    #[arg(long, value_enum, env = "NFT_SOURCE", default_value = "rpc")]
    pub source: SourceKind,

    #[arg(long, env = "HELIUS_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    #[arg(long, env = "HELIUS_REST_URL", default_value = DEFAULT_REST_URL)]
    pub rest_url: String,

    /// Page size for the single page requested (1-1000)
    #[arg(long, default_value_t = MAX_PAGE_LIMIT)]
    pub limit: u32,

    /// Output file name; defaults to nft_metadata_<timestamp>.csv
    #[arg(long)]
    pub output: Option<String>,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Name fields to try when matching the year prefix [default: per source]
    #[arg(long, value_enum)]
    pub name_precedence: Option<NamePrecedence>,

    /// Rows of the exported file to print (0 disables the preview)
    #[arg(long, default_value_t = 10)]
    pub preview_rows: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Config {
    /// Reject blank credentials before any request goes out.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() || self.wallet.trim().is_empty() {
            bail!("Please provide both API Key and Wallet Address.");
        }
        Ok(())
    }

    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("building HTTP client")
    }

    pub fn rpc_source(&self) -> RpcSource {
        RpcSource::new(
            &self.rpc_url,
            self.api_key.trim(),
            self.wallet.trim(),
            self.limit,
        )
    }

    pub fn rest_source(&self) -> RestSource {
        RestSource::new(
            &self.rest_url,
            self.api_key.trim(),
            self.wallet.trim(),
            self.limit,
        )
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            name_precedence: self.name_precedence,
            output_dir: self.output_dir.clone(),
            filename: self.output.clone(),
        }
    }
}
