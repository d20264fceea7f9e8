// src/schema/types.rs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw cell as handed over by the sheet reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Empty,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Empty => Ok(()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// A worksheet as a grid of cells, exactly as read.
///
/// The header row lives somewhere inside `rows`; the normalizer is told
/// where via its `header_offset` argument. Preamble rows above it (titles,
/// notes) are never interpreted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    /// Worksheet name the grid came from, for logging only.
    pub name: String,
    pub rows: Vec<Vec<Scalar>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Scalar>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A normalized value: number, text, or the single canonical null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

static NULL: FieldValue = FieldValue::Null;

/// Canonical field name → value, in alias-table declaration order.
///
/// Every record produced from one sheet carries the same key set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord(pub IndexMap<String, FieldValue>);

impl CanonicalRecord {
    pub fn get(&self, field: &str) -> &FieldValue {
        self.0.get(field).unwrap_or(&NULL)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn all_null(&self) -> bool {
        self.0.values().all(FieldValue::is_null)
    }
}
