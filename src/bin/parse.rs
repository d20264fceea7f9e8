//! Parse workbooks already on disk and write the API files.
use anyhow::Result;
use shillerscraper::{config::PipelineConfig, pipeline};
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    pipeline::init_logging();

    let cfg_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = PipelineConfig::load(cfg_path.as_deref())?;
    info!(dir = %cfg.download_dir.display(), "parsing workbooks");

    let report = pipeline::parse_and_write(&cfg)?;
    for id in &report.failed {
        info!("skipped {}", id);
    }
    info!("data parsing complete: {} dataset(s) written", report.written.len());
    Ok(())
}
