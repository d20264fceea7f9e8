use anyhow::Result;
use reqwest::Client;
use shillerscraper::{config::PipelineConfig, pipeline};
use std::path::PathBuf;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    pipeline::init_logging();
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let cfg_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = PipelineConfig::load(cfg_path.as_deref())?;
    std::fs::create_dir_all(&cfg.download_dir)?;
    std::fs::create_dir_all(&cfg.output_dir)?;

    // ─── 3) download ─────────────────────────────────────────────────
    let client = Client::builder().user_agent("shillerscraper/0.1").build()?;
    match pipeline::download_all(&client, &cfg).await {
        Ok(0) => info!("no changes detected in data files"),
        Ok(n) => info!("{} file(s) changed", n),
        // parse whatever copies are already on disk
        Err(e) => error!("download step failed: {:#}", e),
    }

    // ─── 4) parse + write, off the async runtime ─────────────────────
    let report = tokio::task::spawn_blocking(move || pipeline::parse_and_write(&cfg)).await??;
    info!(written = ?report.written, failed = ?report.failed, "all done");
    Ok(())
}
