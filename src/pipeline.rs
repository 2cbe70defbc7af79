// src/pipeline.rs

use crate::{
    export::{export_csv, ExportOutcome},
    fetch::{fetch_soft, AssetSource},
    process::{filter_by_year, flatten_all, NamePrecedence},
};
use anyhow::Result;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{info, warn};

/// Knobs for one run that are not tied to the upstream source.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overrides the source's own name precedence when set.
    pub name_precedence: Option<NamePrecedence>,
    pub output_dir: PathBuf,
    pub filename: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            name_precedence: None,
            output_dir: PathBuf::from("."),
            filename: None,
        }
    }
}

/// How a run ended. Only `Exported` leaves a file behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoAssets,
    NoMatches,
    NothingToExport,
    Exported {
        path: PathBuf,
        rows: usize,
        columns: usize,
    },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub fetched: usize,
    pub matched: usize,
    pub fetch_errors: Vec<String>,
    pub outcome: RunOutcome,
}

/// fetch → year filter → flatten → CSV.
///
/// Fetch problems and empty stages end up in the report; only a failure to
/// write the output file is returned as an error.
pub async fn run<S: AssetSource>(
    source: &S,
    client: &Client,
    options: &RunOptions,
) -> Result<RunReport> {
    let fetched = fetch_soft(source, client).await;
    let mut report = RunReport {
        fetched: fetched.assets.len(),
        matched: 0,
        fetch_errors: fetched.errors,
        outcome: RunOutcome::NoAssets,
    };
    if fetched.assets.is_empty() {
        warn!("no assets found");
        return Ok(report);
    }

    let precedence = options
        .name_precedence
        .unwrap_or_else(|| source.name_precedence());
    info!(fetched = report.fetched, ?precedence, "filtering by year 1990-2025");
    let matched = filter_by_year(fetched.assets, precedence);
    report.matched = matched.len();
    if matched.is_empty() {
        warn!("no NFT names start with a year in 1990-2025");
        report.outcome = RunOutcome::NoMatches;
        return Ok(report);
    }
    info!(matched = report.matched, "NFTs matched");

    let rows = flatten_all(&matched);
    report.outcome = match export_csv(&rows, &options.output_dir, options.filename.as_deref())? {
        ExportOutcome::NothingToExport => RunOutcome::NothingToExport,
        ExportOutcome::Written {
            path,
            rows,
            columns,
        } => RunOutcome::Exported {
            path,
            rows,
            columns,
        },
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        export::read_table,
        fetch::{Fetched, RestSource, RpcSource},
    };
    use anyhow::anyhow;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tracing_subscriber::{fmt, EnvFilter};
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn init_test_logging() {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,nftscraper=debug")),
            )
            .with_test_writer()
            .try_init();
    }

    struct Canned(Result<Vec<Value>, &'static str>);

    impl AssetSource for Canned {
        fn label(&self) -> &'static str {
            "canned"
        }

        fn name_precedence(&self) -> NamePrecedence {
            NamePrecedence::Standard
        }

        async fn fetch(&self, _client: &Client) -> Result<Fetched> {
            match &self.0 {
                Ok(assets) => Ok(Fetched {
                    assets: assets.clone(),
                    errors: Vec::new(),
                }),
                Err(msg) => Err(anyhow!(*msg)),
            }
        }
    }

    fn options(dir: &std::path::Path) -> RunOptions {
        RunOptions {
            output_dir: dir.to_path_buf(),
            filename: Some("out.csv".into()),
            ..RunOptions::default()
        }
    }

    #[tokio::test]
    async fn empty_fetch_skips_export() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let report = run(&Canned(Ok(vec![])), &Client::new(), &options(dir.path())).await?;
        assert_eq!(report.outcome, RunOutcome::NoAssets);
        assert_eq!(report.fetched, 0);
        assert!(!dir.path().join("out.csv").exists());
        Ok(())
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_not_raised() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let report = run(&Canned(Err("timed out")), &Client::new(), &options(dir.path())).await?;
        assert_eq!(report.outcome, RunOutcome::NoAssets);
        assert_eq!(report.fetch_errors, vec!["timed out"]);
        Ok(())
    }

    #[tokio::test]
    async fn no_year_names_is_a_distinct_outcome() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let assets = vec![json!({"name": "2026 Future"}), json!({"name": "Plain"})];
        let report = run(&Canned(Ok(assets)), &Client::new(), &options(dir.path())).await?;
        assert_eq!(report.fetched, 2);
        assert_eq!(report.matched, 0);
        assert_eq!(report.outcome, RunOutcome::NoMatches);
        assert!(!dir.path().join("out.csv").exists());
        Ok(())
    }

    #[tokio::test]
    async fn matches_are_exported() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let assets = vec![
            json!({"id": "m1", "content": {"metadata": {"name": "1999 Relic",
                "attributes": [{"trait_type": "Rarity", "value": "Rare"}]}}}),
            json!({"id": "m2", "content": {"metadata": {"name": "2026 Future"}}}),
            json!({"id": "m3", "content": {"metadata": {"name": "2025 Edge"}},
                "grouping": [{"group_key": "collection", "group_value": "col"}]}),
        ];
        let report = run(&Canned(Ok(assets)), &Client::new(), &options(dir.path())).await?;
        let path = dir.path().join("out.csv");
        assert_eq!(report.matched, 2);
        let RunOutcome::Exported { path: written, rows, .. } = &report.outcome else {
            panic!("expected export, got {:?}", report.outcome);
        };
        assert_eq!(written, &path);
        assert_eq!(*rows, 2);

        let table = read_table(&path)?;
        let col = |name: &str| table.header.iter().position(|h| h == name).unwrap();
        assert_eq!(table.rows[0][col("mint_address")], "m1");
        assert_eq!(table.rows[0][col("trait_Rarity")], "Rare");
        assert_eq!(table.rows[0][col("collection_address")], "");
        assert_eq!(table.rows[1][col("mint_address")], "m3");
        assert_eq!(table.rows[1][col("trait_Rarity")], "");
        assert_eq!(table.rows[1][col("collection_address")], "col");
        Ok(())
    }

    #[tokio::test]
    async fn precedence_override_applies() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let assets = vec![json!({"content": {"metadata": {"title": "2010 Titled"}}})];
        let mut opts = options(dir.path());

        let report = run(&Canned(Ok(assets.clone())), &Client::new(), &opts).await?;
        assert_eq!(report.outcome, RunOutcome::NoMatches);

        opts.name_precedence = Some(NamePrecedence::WithTitle);
        let report = run(&Canned(Ok(assets)), &Client::new(), &opts).await?;
        assert_eq!(report.matched, 1);
        Ok(())
    }

    #[tokio::test]
    async fn rpc_and_rest_share_the_same_stages() -> Result<()> {
        init_test_logging();
        let record = json!({"id": "m1", "content": {"metadata": {"name": "2000 Same", "symbol": "S"}}});
        let rpc_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("api-key", "k"))
            .and(body_partial_json(json!({
                "method": "getAssetsByOwner",
                "params": {"ownerAddress": "W", "page": 1, "limit": 1000}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": {"items": [{"id": "m1"}]}})),
            )
            .expect(1)
            .mount(&rpc_server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("api-key", "k"))
            .and(body_partial_json(json!({"method": "getAsset", "params": {"id": "m1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": record})))
            .expect(1)
            .mount(&rpc_server)
            .await;

        let rest_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/addresses/W/nfts"))
            .and(query_param("api-key", "k"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([record])))
            .expect(1)
            .mount(&rest_server)
            .await;

        let dir = tempdir()?;
        let client = Client::new();
        let mut opts = options(dir.path());
        opts.filename = Some("rpc.csv".into());
        let rpc = run(&RpcSource::new(rpc_server.uri(), "k", "W", 1000), &client, &opts).await?;
        opts.filename = Some("rest.csv".into());
        let rest = run(&RestSource::new(rest_server.uri(), "k", "W", 1000), &client, &opts).await?;

        assert!(matches!(rpc.outcome, RunOutcome::Exported { .. }));
        assert!(matches!(rest.outcome, RunOutcome::Exported { .. }));
        assert_eq!(
            read_table(&dir.path().join("rpc.csv"))?,
            read_table(&dir.path().join("rest.csv"))?
        );
        rpc_server.verify().await;
        rest_server.verify().await;
        Ok(())
    }
}
