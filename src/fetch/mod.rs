// src/fetch/mod.rs
//! Retrieval of publisher workbooks: link discovery, download, change detection.

pub mod download;
pub mod urls;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};
use url::Url;

use crate::config::{PipelineConfig, SourceConfig};
pub use download::{Change, Fetched};

/// Work out the URL to download for `src`, scraping its page if needed.
pub async fn resolve_source_url(
    client: &Client,
    src: &SourceConfig,
    cfg: &PipelineConfig,
) -> Result<Url> {
    if let Some(page) = &src.page {
        let family = src.family()?;
        let pattern = match &src.link_pattern {
            Some(p) => Regex::new(p).with_context(|| format!("invalid link_pattern `{}`", p))?,
            None => urls::file_link_pattern(family.file_name)?,
        };
        match urls::discover_download_url(
            client,
            page,
            &pattern,
            cfg.max_retries,
            cfg.retry_delay(),
        )
        .await
        {
            Ok(u) => return Ok(u),
            // fall through to the pinned URL when there is one
            Err(e) if src.url.is_some() => {
                error!("link discovery on {} failed, using configured url: {:#}", page, e);
            }
            Err(e) => return Err(e),
        }
    }
    let raw = src
        .url
        .as_deref()
        .with_context(|| format!("source `{}` has no url", src.family))?;
    Url::parse(raw).with_context(|| format!("parsing URL {}", raw))
}

/// Fetch every configured source with bounded concurrency.
///
/// Returns one result per source, in config order.
pub async fn fetch_all(client: &Client, cfg: &PipelineConfig) -> Vec<(String, Result<Fetched>)> {
    let sem = Arc::new(Semaphore::new(cfg.max_concurrent_downloads));
    let mut handles = Vec::with_capacity(cfg.sources.len());

    for src in cfg.sources.clone() {
        let client = client.clone();
        let cfg = cfg.clone();
        let sem = sem.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await?;
            let family = src.family()?;
            let url = resolve_source_url(&client, &src, &cfg).await?;
            let dest = cfg.download_dir.join(family.file_name);
            info!(file = family.file_name, %url, "downloading");
            download::download_file(&client, &url, &dest, cfg.max_retries, cfg.retry_delay())
                .await
        }));
    }

    let mut out = Vec::with_capacity(handles.len());
    for (src, h) in cfg.sources.iter().zip(handles) {
        let res = match h.await {
            Ok(r) => r,
            Err(join) => Err(join.into()),
        };
        if let Err(e) = &res {
            error!("fetching {} failed: {:#}", src.family, e);
        }
        out.push((src.family.clone(), res));
    }
    out
}
