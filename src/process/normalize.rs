use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::SourceFormatError;
use crate::process::utils::{clean_str, coerce};
use crate::schema::{AliasTable, CanonicalRecord, FieldValue, RawSheet, Scalar};

/// Fewest canonical fields that must match the header row.
pub const MIN_COVERAGE: usize = 1;

/// Render the header row into unique, trimmed labels.
///
/// Blank cells become `Unnamed: <col>`; a label seen again gets `.1`,
/// `.2`, ... appended in column order, so a sheet with two `Date` columns
/// exposes the second as `Date.1`.
pub fn header_labels(header_row: &[Scalar]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut labels = Vec::with_capacity(header_row.len());

    for (i, cell) in header_row.iter().enumerate() {
        let base = match cell {
            Scalar::Empty => format!("Unnamed: {}", i),
            other => {
                let s = clean_str(&other.to_string());
                if s.is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    s
                }
            }
        };

        let n = counts.entry(base.clone()).or_insert(0);
        let label = if *n == 0 {
            base.clone()
        } else {
            format!("{}.{}", base, n)
        };
        *n += 1;
        labels.push(label);
    }
    labels
}

/// Reconcile a raw sheet against `aliases` and emit canonical records.
///
/// Rows are emitted in source order with every declared field present.
/// Rows whose fields all come out null are dropped. Repeated dates are
/// kept as they appear.
#[tracing::instrument(level = "debug", skip(sheet, aliases), fields(sheet = %sheet.name))]
pub fn normalize(
    sheet: &RawSheet,
    header_offset: usize,
    aliases: &AliasTable,
) -> Result<Vec<CanonicalRecord>, SourceFormatError> {
    let header_row = sheet
        .rows
        .get(header_offset)
        .ok_or(SourceFormatError::HeaderOutOfRange {
            offset: header_offset,
            rows: sheet.len(),
        })?;

    let labels = header_labels(header_row);
    let index: HashMap<String, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.clone(), i))
        .collect();

    // canonical field → column, or None when no alias is present
    let columns: Vec<Option<usize>> = aliases
        .fields()
        .iter()
        .map(|alias| {
            let hit = AliasTable::resolve_column(alias, &index);
            match hit {
                Some((label, col)) => {
                    debug!(field = %alias.field, label, col, "resolved");
                }
                None => {
                    debug!(field = %alias.field, "no matching column; field will be null");
                }
            }
            hit.map(|(_, col)| col)
        })
        .collect();

    let resolved = columns.iter().filter(|c| c.is_some()).count();
    if resolved < MIN_COVERAGE {
        return Err(SourceFormatError::InsufficientCoverage {
            resolved,
            minimum: MIN_COVERAGE,
            labels,
        });
    }

    let mut records = Vec::new();
    let mut blank = 0usize;
    for row in sheet.rows.iter().skip(header_offset + 1) {
        let mut fields = IndexMap::with_capacity(aliases.len());
        for (alias, col) in aliases.fields().iter().zip(&columns) {
            let value = col
                .and_then(|c| row.get(c))
                .map(|cell| coerce(cell, &alias.field))
                .unwrap_or(FieldValue::Null);
            fields.insert(alias.field.clone(), value);
        }

        let record = CanonicalRecord(fields);
        if record.all_null() {
            blank += 1;
            continue;
        }
        records.push(record);
    }

    if let Some(required) = aliases.required() {
        if !records.is_empty() && records.iter().all(|r| r.get(required).is_null()) {
            warn!(field = required, rows = records.len(), "required field empty in every row");
            return Err(SourceFormatError::MissingRequiredField {
                field: required.to_string(),
            });
        }
    }

    debug!(
        kept = records.len(),
        blank,
        fields = aliases.len(),
        resolved,
        "normalized sheet"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AliasTable;
    use crate::schema::Scalar::Empty;

    fn n(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    fn t(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    fn aliases() -> AliasTable {
        AliasTable::builder()
            .field("date", &["Date"])
            .field("sp500", &["P", "S&P Comp."])
            .field("dividend", &["D", "Dividend"])
            .field("cape", &["CAPE"])
            .required("date")
            .build()
            .expect("test aliases")
    }

    fn sheet(rows: Vec<Vec<Scalar>>) -> RawSheet {
        let mut grid = vec![vec![t("Stock market data")], vec![Empty]];
        grid.extend(rows);
        RawSheet::new("Data", grid)
    }

    #[test]
    fn every_record_has_the_full_key_set() -> anyhow::Result<()> {
        let s = sheet(vec![
            vec![t(" Date "), t("S&P Comp."), t("Dividend")],
            vec![n(1871.01), n(4.44), n(0.26)],
            vec![n(1871.02), n(4.5), Empty],
        ]);
        let records = normalize(&s, 2, &aliases())?;
        assert_eq!(records.len(), 2);
        for r in &records {
            assert_eq!(r.keys().collect::<Vec<_>>(), vec!["date", "sp500", "dividend", "cape"]);
        }
        assert_eq!(records[0].get("cape"), &FieldValue::Null);
        assert_eq!(records[1].get("dividend"), &FieldValue::Null);
        Ok(())
    }

    #[test]
    fn blank_rows_are_dropped() -> anyhow::Result<()> {
        let s = sheet(vec![
            vec![t("Date"), t("P"), t("Notes")],
            vec![n(1871.01), n(4.44), Empty],
            vec![Empty, Empty, Empty],
            vec![Empty, t("  "), t("source: Yale")],
            vec![],
            vec![n(1871.02), n(4.5), Empty],
        ]);
        let records = normalize(&s, 2, &aliases())?;
        let dates: Vec<_> = records.iter().map(|r| r.get("date").clone()).collect();
        assert_eq!(dates, vec![FieldValue::Number(1871.01), FieldValue::Number(1871.02)]);
        Ok(())
    }

    #[test]
    fn current_label_wins_over_legacy() -> anyhow::Result<()> {
        let s = sheet(vec![
            vec![t("Date"), t("S&P Comp."), t("P")],
            vec![n(2023.01), n(1.0), n(2.0)],
        ]);
        let records = normalize(&s, 2, &aliases())?;
        assert_eq!(records[0].get("sp500"), &FieldValue::Number(2.0));
        Ok(())
    }

    #[test]
    fn sentinels_degrade_without_dropping_the_row() -> anyhow::Result<()> {
        let s = sheet(vec![
            vec![t("Date"), t("P"), t("CAPE")],
            vec![n(2023.01), t("NA"), t("not available")],
        ]);
        let records = normalize(&s, 2, &aliases())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("sp500"), &FieldValue::Null);
        assert_eq!(records[0].get("cape"), &FieldValue::Null);
        Ok(())
    }

    #[test]
    fn duplicate_labels_are_numbered() {
        let labels = header_labels(&[t("Date"), t("P"), t("Date "), Empty, t("Date")]);
        assert_eq!(labels, vec!["Date", "P", "Date.1", "Unnamed: 3", "Date.2"]);
    }

    #[test]
    fn repeated_dates_are_preserved() -> anyhow::Result<()> {
        let s = sheet(vec![
            vec![t("Date"), t("P")],
            vec![n(2023.01), n(1.0)],
            vec![n(2023.01), n(1.5)],
        ]);
        let records = normalize(&s, 2, &aliases())?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("sp500"), &FieldValue::Number(1.5));
        Ok(())
    }

    #[test]
    fn header_only_sheet_is_empty_not_an_error() -> anyhow::Result<()> {
        let s = sheet(vec![vec![t("Date"), t("P")]]);
        assert!(normalize(&s, 2, &aliases())?.is_empty());
        Ok(())
    }

    #[test]
    fn header_outside_sheet() {
        let s = sheet(vec![vec![t("Date")]]);
        assert_eq!(
            normalize(&s, 9, &aliases()),
            Err(SourceFormatError::HeaderOutOfRange { offset: 9, rows: 3 })
        );
    }

    #[test]
    fn wrong_header_row_has_no_coverage() {
        let s = sheet(vec![vec![t("Date"), t("P")], vec![n(2023.01), n(1.0)]]);
        // offset 0 points at the title row
        assert!(matches!(
            normalize(&s, 0, &aliases()),
            Err(SourceFormatError::InsufficientCoverage { resolved: 0, .. })
        ));
    }

    #[test]
    fn missing_required_field_everywhere() {
        let s = sheet(vec![vec![t("Year"), t("P")], vec![n(2023.0), n(1.0)]]);
        assert_eq!(
            normalize(&s, 2, &aliases()),
            Err(SourceFormatError::MissingRequiredField {
                field: "date".into()
            })
        );
    }

    #[test]
    fn normalizing_twice_is_identical() -> anyhow::Result<()> {
        let s = sheet(vec![
            vec![t("Date"), t("P"), t("D")],
            vec![n(1871.01), n(4.44), n(0.26)],
            vec![Empty, Empty, Empty],
            vec![n(1871.02), t("4.50"), Empty],
        ]);
        let a = serde_json::to_string(&normalize(&s, 2, &aliases())?)?;
        let b = serde_json::to_string(&normalize(&s, 2, &aliases())?)?;
        assert_eq!(a, b);
        Ok(())
    }
}
