// src/process/mod.rs
pub mod filter;
pub mod flatten;
pub mod path;
pub mod sanitize;
pub mod types;

pub use filter::{filter_by_year, resolve_name, starts_with_year, NamePrecedence};
pub use flatten::{flatten_asset, FieldSpec, FIXED_FIELDS};
pub use sanitize::sanitize;
pub use types::{Cell, FlatRow};

use serde_json::Value;
use tracing::debug;

/// Flatten every asset, in input order.
#[tracing::instrument(level = "debug", skip(assets), fields(count = assets.len()))]
pub fn flatten_all(assets: &[Value]) -> Vec<FlatRow> {
    let rows: Vec<FlatRow> = assets.iter().map(flatten_asset).collect();
    let widest = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    debug!(rows = rows.len(), widest, "flattened assets");
    rows
}
