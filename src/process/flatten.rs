// src/process/flatten.rs

use crate::process::{
    path::{array_at, lookup, to_json_text},
    sanitize::sanitize,
    types::{Cell, FlatRow},
};
use serde_json::Value;

const METADATA: &str = "content.metadata";

/// Value written when a fixed field is missing or not a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    EmptyText,
    Zero,
    False,
}

impl Fallback {
    pub fn cell(self) -> Cell {
        match self {
            Fallback::EmptyText => Cell::text(""),
            Fallback::Zero => Cell::from(0u64),
            Fallback::False => Cell::Bool(false),
        }
    }
}

/// One always-present column: where it comes from and what it defaults to.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub column: &'static str,
    pub path: &'static str,
    pub fallback: Fallback,
}

const fn field(column: &'static str, path: &'static str, fallback: Fallback) -> FieldSpec {
    FieldSpec {
        column,
        path,
        fallback,
    }
}

/// Every column a flattened row is guaranteed to carry.
pub static FIXED_FIELDS: &[FieldSpec] = &[
    field("mint_address", "id", Fallback::EmptyText),
    field("owner", "ownership.owner", Fallback::EmptyText),
    field("frozen", "ownership.frozen", Fallback::False),
    field("delegated", "ownership.delegated", Fallback::False),
    field("name", "content.metadata.name", Fallback::EmptyText),
    field("symbol", "content.metadata.symbol", Fallback::EmptyText),
    field("description", "content.metadata.description", Fallback::EmptyText),
    field("image", "content.metadata.image", Fallback::EmptyText),
    field("animation_url", "content.metadata.animation_url", Fallback::EmptyText),
    field("external_url", "content.metadata.external_url", Fallback::EmptyText),
    field("royalty_percent", "royalty.percent", Fallback::Zero),
    field("royalty_locked", "royalty.locked", Fallback::False),
    field("supply_print_max_supply", "supply.print_max_supply", Fallback::Zero),
    field("supply_print_current_supply", "supply.print_current_supply", Fallback::Zero),
    field("supply_edition_nonce", "supply.edition_nonce", Fallback::EmptyText),
];

/// Metadata keys already covered by fixed columns or trait expansion.
const CONSUMED_METADATA_KEYS: &[&str] = &[
    "name",
    "symbol",
    "description",
    "image",
    "animation_url",
    "external_url",
    "attributes",
];

impl FieldSpec {
    pub fn extract(&self, asset: &Value) -> Cell {
        lookup(asset, self.path)
            .and_then(Cell::from_scalar)
            .unwrap_or_else(|| self.fallback.cell())
    }
}

/// Free-form values (trait values, residual metadata) as cells: scalars keep
/// their type, null is empty text, nested values become JSON text.
fn loose_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::text(""),
        Value::Array(_) | Value::Object(_) => Cell::Text(to_json_text(value)),
        scalar => Cell::from_scalar(scalar).unwrap_or_else(|| Cell::text("")),
    }
}

/// Residual metadata is always emitted as text.
fn residual_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => loose_cell(other).to_string(),
    }
}

fn expand_attributes(asset: &Value, row: &mut FlatRow) {
    let attributes = array_at(asset, "content.metadata.attributes");
    for (index, attr) in attributes.iter().enumerate() {
        if !attr.is_object() {
            continue;
        }
        let trait_type = match attr.get("trait_type") {
            Some(Value::String(t)) => t.clone(),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => loose_cell(v).to_string(),
            _ => format!("attribute_{}", index),
        };
        let value = attr.get("value").map_or_else(|| Cell::text(""), loose_cell);
        row.insert(format!("trait_{}", sanitize(&trait_type)), value);
    }
}

fn collection_address(asset: &Value) -> Option<Cell> {
    array_at(asset, "grouping")
        .iter()
        .find(|group| group.get("group_key").and_then(Value::as_str) == Some("collection"))
        .map(|group| group.get("group_value").map_or_else(|| Cell::text(""), loose_cell))
}

fn residual_metadata(asset: &Value, row: &mut FlatRow) {
    let Some(metadata) = lookup(asset, METADATA).and_then(Value::as_object) else {
        return;
    };
    for (key, value) in metadata {
        if CONSUMED_METADATA_KEYS.contains(&key.as_str()) {
            continue;
        }
        row.insert(
            format!("metadata_{}", sanitize(key)),
            Cell::Text(residual_text(value)),
        );
    }
}

/// Flatten one raw asset into a single row. Never fails: every missing or
/// malformed field falls back to its documented default.
pub fn flatten_asset(asset: &Value) -> FlatRow {
    let mut row = FlatRow::new();
    for spec in FIXED_FIELDS {
        row.insert(spec.column.to_string(), spec.extract(asset));
    }
    expand_attributes(asset, &mut row);
    if let Some(address) = collection_address(asset) {
        row.insert("collection_address".to_string(), address);
    }
    residual_metadata(asset, &mut row);
    row
}
