// src/pipeline.rs
//! Glue shared by the binaries: logging setup, parse-and-write, download.

use anyhow::{bail, Result};
use chrono::Utc;
use reqwest::Client;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    config::PipelineConfig,
    fetch::{self, Change},
    output, process,
};

pub fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
}

/// Summary of a parse run.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub written: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

/// Parse every configured workbook in `download_dir` and write the JSON,
/// CSV and `latest.json` outputs. Fails only if nothing could be parsed.
pub fn parse_and_write(cfg: &PipelineConfig) -> Result<ParseReport> {
    let families = cfg.families()?;
    let now = Utc::now();
    let results = process::process_all(&cfg.download_dir, &families, now);

    let mut report = ParseReport::default();
    let mut parsed = Vec::new();
    for (family, ds) in &results {
        let Some(ds) = ds else {
            report.failed.push(family.id);
            continue;
        };

        let json_path = cfg.dataset_json_path(family);
        let csv_path = cfg.dataset_csv_path(family);
        let written = output::write_json(ds, &json_path)
            .and_then(|_| output::write_csv(ds, family.csv_columns, &csv_path));
        if ds.is_empty() {
            warn!(family = family.id, "release has no data rows yet");
        }
        match written {
            Ok(()) => {
                info!(json = %json_path.display(), csv = %csv_path.display(), "saved {}", family.id);
                report.written.push(family.id);
                parsed.push((*family, ds));
            }
            Err(e) => {
                error!("writing {} failed: {:#}", family.id, e);
                report.failed.push(family.id);
            }
        }
    }

    if report.written.is_empty() && !families.is_empty() {
        bail!("no source could be parsed ({} failed)", report.failed.len());
    }

    let mut summary = output::latest_summary(parsed, now);
    if !report.failed.is_empty() {
        match output::read_previous_blocks(&cfg.latest_path()) {
            Ok(previous) => {
                output::carry_forward(&mut summary, previous, &families, &report.failed);
            }
            Err(e) => warn!("could not read previous latest values: {:#}", e),
        }
    }
    output::write_latest(&summary, cfg.latest_path())?;
    info!(path = %cfg.latest_path().display(), "saved latest values");
    Ok(report)
}

/// Download every configured source; returns how many files changed.
pub async fn download_all(client: &Client, cfg: &PipelineConfig) -> Result<usize> {
    let results = fetch::fetch_all(client, cfg).await;
    let mut changed = 0;
    let mut failed = 0;
    for (name, res) in &results {
        match res {
            Ok(f) if f.change != Change::Unchanged => {
                info!("{} {}", f.change, name);
                changed += 1;
            }
            Ok(_) => info!("no changes to {}", name),
            Err(_) => failed += 1,
        }
    }
    if failed == results.len() && failed > 0 {
        bail!("every download failed");
    }
    info!(changed, failed, "downloads finished");
    Ok(changed)
}
