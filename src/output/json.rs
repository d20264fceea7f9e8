use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

/// Pretty-print `value` to `path` via a temp file and a rename, so readers
/// never observe a half-written file.
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output.json");
    let tmp_path = dir.join(format!(".{}.tmp", file_name));

    {
        let tmp = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {:?}", tmp_path))?;
        let mut w = BufWriter::new(tmp);
        serde_json::to_writer_pretty(&mut w, value).context("serializing JSON")?;
        w.write_all(b"\n")?;
        w.flush()?;
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::assemble;
    use crate::schema::STOCK_MARKET;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn writes_envelope_atomically() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data").join("stock_market_data.json");
        let ds = assemble(Vec::new(), &STOCK_MARKET, Utc::now())?;

        write_json(&ds, &path)?;

        let text = fs::read_to_string(&path)?;
        assert!(text.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(v["metadata"]["total_records"], 0);
        assert_eq!(
            v["metadata"]["source"],
            "Robert Shiller - Yale Economics"
        );
        // no temp file left behind
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }
}
