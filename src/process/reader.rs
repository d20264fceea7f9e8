use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::{debug, warn};

use crate::schema::{RawSheet, Scalar};

fn to_scalar(cell: &Data) -> Scalar {
    match cell {
        Data::Float(f) => Scalar::Number(*f),
        Data::Int(i) => Scalar::Number(*i as f64),
        Data::String(s) => Scalar::Text(s.clone()),
        Data::Bool(b) => Scalar::Text(b.to_string()),
        Data::DateTime(dt) => Scalar::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Scalar::Text(s.clone()),
        Data::Error(_) | Data::Empty => Scalar::Empty,
    }
}

/// Convert a worksheet range into a grid anchored at cell A1.
///
/// calamine trims leading empty rows and columns off a range; they are put
/// back so header offsets count from the top of the sheet.
pub fn range_to_sheet(name: &str, range: &Range<Data>) -> RawSheet {
    let (row0, col0) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Scalar>> = vec![Vec::new(); row0];
    for row in range.rows() {
        let mut cells = vec![Scalar::Empty; col0];
        cells.extend(row.iter().map(to_scalar));
        rows.push(cells);
    }

    RawSheet::new(name, rows)
}

/// Read `sheet_name` from the workbook at `path` (`.xls`, `.xlsx`, `.ods`).
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<RawSheet> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {:?}", path))?;
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("Failed to read sheet `{}` from {:?}", sheet_name, path))?;

    let sheet = range_to_sheet(sheet_name, &range);
    if sheet.is_empty() {
        warn!(sheet = sheet_name, "worksheet has no cells");
    }
    debug!(rows = sheet.len(), "read sheet");
    Ok(sheet)
}
