// src/process/types.rs

use serde_json::{Number, Value};
use std::{collections::BTreeMap, fmt};

/// One scalar value in a flattened row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(Number),
    Bool(bool),
}

impl Cell {
    /// Keep a JSON scalar with its own type. Null and nested values give `None`.
    pub fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Cell::Text(s.clone())),
            Value::Number(n) => Some(Cell::Number(n.clone())),
            Value::Bool(b) => Some(Cell::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Cell::Number(n.into())
    }
}

/// A flattened NFT record. Keys are kept sorted so iteration is stable.
pub type FlatRow = BTreeMap<String, Cell>;
