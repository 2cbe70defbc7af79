// src/process/filter.rs

use crate::process::path::lookup;
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static YEAR_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(199[0-9]|20[01][0-9]|202[0-5])").expect("year pattern should compile")
});

/// Order in which name fields are tried when deciding what an NFT is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NamePrecedence {
    /// `content.metadata.name`, `content.name`, `name`
    Standard,
    /// Like `Standard`, with `content.metadata.title` tried after the metadata name.
    WithTitle,
}

impl NamePrecedence {
    pub fn paths(self) -> &'static [&'static str] {
        match self {
            NamePrecedence::Standard => &["content.metadata.name", "content.name", "name"],
            NamePrecedence::WithTitle => &[
                "content.metadata.name",
                "content.metadata.title",
                "content.name",
                "name",
            ],
        }
    }
}

/// First non-empty name along the precedence list. Numbers count as names.
pub fn resolve_name(asset: &Value, precedence: NamePrecedence) -> Option<String> {
    precedence.paths().iter().find_map(|path| match lookup(asset, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn starts_with_year(name: &str) -> bool {
    YEAR_PREFIX.is_match(name)
}

/// Keep only assets whose resolved name starts with a year in 1990..=2025.
/// Relative order is preserved; unnamed assets are dropped.
pub fn filter_by_year(assets: Vec<Value>, precedence: NamePrecedence) -> Vec<Value> {
    let total = assets.len();
    let kept: Vec<Value> = assets
        .into_iter()
        .filter(|asset| match resolve_name(asset, precedence) {
            Some(name) => starts_with_year(&name),
            None => false,
        })
        .collect();
    debug!(total, kept = kept.len(), ?precedence, "year filter applied");
    kept
}
