use anyhow::Result;
use clap::Parser;
use nftscraper::{
    config::{Config, SourceKind},
    export::{read_table, render_preview},
    pipeline::{self, RunOutcome, RunReport},
};
use std::{env, path::Path};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    });
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();
}

/// Preview of the exported file. The export has already succeeded, so a
/// failed read-back only costs the preview.
fn preview_text(path: &Path, preview_rows: usize) -> String {
    match read_table(path) {
        Ok(table) => format!("\n{}", render_preview(&table, preview_rows)),
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{:#}", e), "preview skipped");
            String::new()
        }
    }
}

/// Print the outcome of a run the way a user expects to see it.
fn present(report: &RunReport, preview_rows: usize) {
    for msg in &report.fetch_errors {
        error!("fetch error: {}", msg);
        eprintln!("Error fetching NFTs: {}", msg);
    }

    match &report.outcome {
        RunOutcome::NoAssets => {
            warn!("nothing fetched");
            eprintln!("No assets found or an error occurred.");
        }
        RunOutcome::NoMatches => {
            println!(
                "Fetched {} assets. Filtering by year 1990-2025...",
                report.fetched
            );
            eprintln!("No NFTs found with names starting with years 1990-2025.");
        }
        RunOutcome::NothingToExport => {
            eprintln!("No NFTs to export");
        }
        RunOutcome::Exported {
            path,
            rows,
            columns,
        } => {
            println!(
                "Fetched {} assets. Filtering by year 1990-2025...",
                report.fetched
            );
            println!("{} NFTs matched.", report.matched);
            println!("Export complete: {}", path.display());
            info!(path = %path.display(), rows, columns, "export complete");
            if preview_rows > 0 {
                print!("{}", preview_text(path, preview_rows));
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    init_logging();

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::parse();
    config.validate()?;
    info!(source = ?config.source, wallet = %config.wallet, "startup");

    let client = config.http_client()?;
    let options = config.run_options();

    // ─── 3) fetch → filter → flatten → export ───────────────────────
    let report = match config.source {
        SourceKind::Rpc => pipeline::run(&config.rpc_source(), &client, &options).await?,
        SourceKind::Rest => pipeline::run(&config.rest_source(), &client, &options).await?,
    };

    // ─── 4) report ───────────────────────────────────────────────────
    present(&report, config.preview_rows);
    info!("all done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn preview_renders_exported_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        fs::write(&path, "mint_address,name\nm1,1999 Relic\n")?;
        let text = preview_text(&path, 10);
        assert!(text.contains("mint_address | name"), "{}", text);
        assert!(text.contains("m1           | 1999 Relic"), "{}", text);
        Ok(())
    }

    #[test]
    fn unreadable_file_skips_preview() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(preview_text(&dir.path().join("gone.csv"), 10), "");
        Ok(())
    }
}
