use anyhow::{Context, Result};
use std::{fs, io::Write, path::Path};

use crate::process::{Dataset, DatedRecord};
use crate::schema::FieldValue;

fn cell(record: &DatedRecord, column: &str) -> String {
    let value = match column {
        "date_string" => return record.key.date_string.clone(),
        "year" => return record.key.year.to_string(),
        "month" => return record.key.month.to_string(),
        other => record.record.get(other),
    };
    match value {
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Null => String::new(),
    }
}

/// Fixed projection of `dataset` onto `columns`, in record order.
/// Nulls become empty cells.
pub fn project_rows(dataset: &Dataset, columns: &[&str]) -> Vec<Vec<String>> {
    dataset
        .records
        .iter()
        .map(|r| columns.iter().map(|c| cell(r, c)).collect())
        .collect()
}

/// Write the projection with a header row to any writer.
pub fn write_csv_to<W: Write>(dataset: &Dataset, columns: &[&str], out: W) -> Result<()> {
    let mut wtr = ::csv::Writer::from_writer(out);
    wtr.write_record(columns).context("writing CSV header")?;
    for row in project_rows(dataset, columns) {
        wtr.write_record(&row).context("writing CSV row")?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv<P: AsRef<Path>>(dataset: &Dataset, columns: &[&str], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    }
    let file = fs::File::create(path).with_context(|| format!("creating {:?}", path))?;
    write_csv_to(dataset, columns, file)
}
