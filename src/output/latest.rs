use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::{fs, path::Path};
use tracing::warn;

use super::json::write_json;
use crate::process::Dataset;
use crate::schema::{FieldValue, SourceFamily, DIVIDEND_YIELD};

pub type LatestBlock = IndexMap<String, FieldValue>;

/// Contents of `latest.json`: one block per family plus a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSummary {
    #[serde(flatten)]
    pub families: IndexMap<String, LatestBlock>,
    pub last_updated: String,
}

/// Annualized trailing dividend yield in percent, from monthly figures.
pub fn dividend_yield(dividend: &FieldValue, price: &FieldValue) -> FieldValue {
    match (dividend.as_f64(), price.as_f64()) {
        (Some(d), Some(p)) if p != 0.0 => FieldValue::Number(d / p * 12.0 * 100.0),
        _ => FieldValue::Null,
    }
}

/// The family's block for its most recent record, or `None` when the
/// dataset has no rows.
pub fn latest_block(dataset: &Dataset, family: &SourceFamily) -> Option<LatestBlock> {
    let latest = dataset.latest()?;
    let mut block = IndexMap::new();
    block.insert(
        "date".to_string(),
        FieldValue::Text(latest.key.date_string.clone()),
    );
    for &field in family.latest_fields {
        let value = match (&family.latest_yield, field == DIVIDEND_YIELD) {
            (Some(y), true) => {
                dividend_yield(latest.record.get(y.dividend), latest.record.get(y.price))
            }
            (None, true) => FieldValue::Null,
            (_, false) => latest.record.get(field).clone(),
        };
        block.insert(field.to_string(), value);
    }
    Some(block)
}

/// Build the summary from datasets already in memory.
pub fn latest_summary<'a, I>(datasets: I, last_updated: DateTime<Utc>) -> LatestSummary
where
    I: IntoIterator<Item = (&'a SourceFamily, &'a Dataset)>,
{
    let families = datasets
        .into_iter()
        .filter_map(|(family, ds)| {
            latest_block(ds, family).map(|b| (family.latest_key.to_string(), b))
        })
        .collect();
    LatestSummary {
        families,
        last_updated: last_updated.to_rfc3339(),
    }
}

/// Family blocks from a previously written `latest.json`, keyed as written.
/// A missing file yields no blocks.
pub fn read_previous_blocks(path: &Path) -> Result<IndexMap<String, LatestBlock>> {
    if !path.exists() {
        return Ok(IndexMap::new());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let raw: IndexMap<String, serde_json::Value> =
        serde_json::from_str(&text).with_context(|| format!("parsing {:?}", path))?;
    Ok(raw
        .into_iter()
        .filter(|(key, _)| key != "last_updated")
        .filter_map(|(key, v)| serde_json::from_value(v).ok().map(|b| (key, b)))
        .collect())
}

/// Keep the previous block of every family in `failed`, so one bad release
/// does not blank its values. Blocks end up in `families` order; returns
/// the keys that were carried over.
pub fn carry_forward(
    summary: &mut LatestSummary,
    mut previous: IndexMap<String, LatestBlock>,
    families: &[&'static SourceFamily],
    failed: &[&str],
) -> Vec<&'static str> {
    let mut carried = Vec::new();
    let mut ordered = IndexMap::with_capacity(families.len());

    for family in families {
        let key = family.latest_key;
        if let Some(block) = summary.families.shift_remove(key) {
            ordered.insert(key.to_string(), block);
        } else if failed.contains(&family.id) {
            if let Some(block) = previous.shift_remove(key) {
                warn!(family = family.id, "keeping previous latest values");
                ordered.insert(key.to_string(), block);
                carried.push(key);
            }
        }
    }
    ordered.extend(summary.families.drain(..));
    summary.families = ordered;
    carried
}

pub fn write_latest<P: AsRef<Path>>(summary: &LatestSummary, path: P) -> Result<()> {
    write_json(summary, path)
}
