//! Fetch the source workbooks only. Exits 1 when nothing changed, so a
//! scheduler can skip the parse step.
use anyhow::Result;
use reqwest::Client;
use shillerscraper::{config::PipelineConfig, pipeline};
use std::{path::PathBuf, process::ExitCode};
use tracing::info;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    pipeline::init_logging();

    let cfg_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = PipelineConfig::load(cfg_path.as_deref())?;
    let client = Client::builder().user_agent("shillerscraper/0.1").build()?;

    let changed = pipeline::download_all(&client, &cfg).await?;
    if changed == 0 {
        info!("no changes detected in data files");
        return Ok(ExitCode::from(1));
    }
    info!("{} file(s) changed", changed);
    Ok(ExitCode::SUCCESS)
}
