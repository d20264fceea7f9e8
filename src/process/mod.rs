// src/process/mod.rs
pub mod dataset;
pub mod date_parser;
pub mod normalize;
pub mod reader;
pub mod utils;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::path::Path;
use tracing::{error, info};

use crate::schema::{RawSheet, SourceFamily};
pub use dataset::{assemble, Dataset, DatedRecord, Metadata};
pub use date_parser::{resolve, DateEncoding, TemporalKey};
pub use normalize::normalize;

/// Normalize an in-memory sheet of `family`'s layout into a `Dataset`.
pub fn process_sheet(
    sheet: &RawSheet,
    family: &SourceFamily,
    last_updated: DateTime<Utc>,
) -> Result<Dataset> {
    let records = normalize(sheet, family.header_offset, &family.aliases)
        .with_context(|| format!("normalizing {} ({})", family.file_name, family.id))?;
    let dataset = assemble(records, family, last_updated)
        .with_context(|| format!("resolving dates in {}", family.file_name))?;
    Ok(dataset)
}

/// Read `family`'s workbook from `data_dir` and normalize it.
#[tracing::instrument(level = "info", skip(data_dir, family, last_updated), fields(family = family.id))]
pub fn process_file(
    data_dir: &Path,
    family: &SourceFamily,
    last_updated: DateTime<Utc>,
) -> Result<Dataset> {
    let path = data_dir.join(family.file_name);
    let sheet = reader::read_sheet(&path, family.sheet_name)?;
    let dataset = process_sheet(&sheet, family, last_updated)?;
    info!(
        records = dataset.metadata.total_records,
        start = ?dataset.metadata.start_date,
        end = ?dataset.metadata.end_date,
        "parsed {}",
        family.file_name
    );
    Ok(dataset)
}

/// Process every family in parallel. A failing file is logged and yields
/// `None`; it never poisons the others.
pub fn process_all<'a>(
    data_dir: &Path,
    families: &[&'a SourceFamily],
    last_updated: DateTime<Utc>,
) -> Vec<(&'a SourceFamily, Option<Dataset>)> {
    families
        .par_iter()
        .map(|&family| match process_file(data_dir, family, last_updated) {
            Ok(ds) => (family, Some(ds)),
            Err(e) => {
                error!("parsing {} failed: {:#}", family.file_name, e);
                (family, None)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldValue, Scalar, HOME_PRICE, STOCK_MARKET};
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,shillerscraper::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn t(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    fn n(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    /// Seven preamble rows then the shillerdata.com header, like `ie_data.xls`.
    fn stock_sheet() -> RawSheet {
        let mut rows: Vec<Vec<Scalar>> = (0..7).map(|_| vec![t("note")]).collect();
        rows.push(vec![
            t("Date "),
            t("P"),
            t("D"),
            t("E"),
            t("CPI"),
            t("Fraction"),
            t("Rate GS10"),
            t("Price"),
            t("CAPE"),
        ]);
        rows.push(vec![
            n(1871.01),
            n(4.44),
            n(0.26),
            n(0.4),
            n(12.46),
            n(1871.04),
            n(5.32),
            n(89.0),
            t("NA"),
        ]);
        rows.push(vec![Scalar::Empty; 9]);
        rows.push(vec![
            n(1871.1),
            n(4.5),
            n(0.26),
            n(0.4),
            n(12.6),
            n(1871.79),
            n(5.3),
            n(90.0),
            n(10.2),
        ]);
        rows.push(vec![Scalar::Empty, t("Source: S&P")]);
        RawSheet::new("Data", rows)
    }

    #[test]
    fn stock_sheet_end_to_end() -> Result<()> {
        init_test_logging();
        let ds = process_sheet(&stock_sheet(), &STOCK_MARKET, Utc::now())?;

        assert_eq!(ds.metadata.total_records, 2);
        assert_eq!(ds.metadata.start_date.as_deref(), Some("1871-01-01"));
        assert_eq!(ds.metadata.end_date.as_deref(), Some("1871-10-01"));

        let first = &ds.records[0].record;
        assert_eq!(first.get("sp500"), &FieldValue::Number(4.44));
        assert_eq!(first.get("date_fraction"), &FieldValue::Number(1871.04));
        assert_eq!(first.get("long_interest_rate"), &FieldValue::Number(5.32));
        assert_eq!(first.get("real_price"), &FieldValue::Number(89.0));
        assert_eq!(first.get("cape"), &FieldValue::Null);
        assert_eq!(first.get("tr_cape"), &FieldValue::Null);

        let expected: Vec<&str> = STOCK_MARKET.aliases.field_names().collect();
        for r in &ds.records {
            assert_eq!(r.record.keys().collect::<Vec<_>>(), expected);
        }
        Ok(())
    }

    #[test]
    fn legacy_home_price_layout() -> Result<()> {
        let mut rows: Vec<Vec<Scalar>> = vec![vec![t("Figure 3.1")], vec![], vec![]];
        rows.push(vec![
            t("Date"),
            t("Real Home Price Index"),
            t("Building Cost Index"),
            t("US Population (millions)"),
            t("Long Rate"),
        ]);
        rows.push(vec![n(1890.0), n(100.0), n(27.8), n(62.9), n(3.42)]);
        rows.push(vec![n(1891.0), n(99.1), Scalar::Empty, n(63.8), n(3.6)]);
        let sheet = RawSheet::new("Data", rows);

        let ds = process_sheet(&sheet, &HOME_PRICE, Utc::now())?;
        assert_eq!(ds.metadata.start_date.as_deref(), Some("1890-01-01"));
        assert_eq!(ds.metadata.end_date.as_deref(), Some("1891-01-01"));
        assert_eq!(ds.records[1].record.get("building_cost_index"), &FieldValue::Null);
        Ok(())
    }

    #[test]
    fn missing_files_do_not_stop_other_families() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let results = process_all(dir.path(), &[&*STOCK_MARKET, &*HOME_PRICE], Utc::now());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, ds)| ds.is_none()));
        Ok(())
    }
}
