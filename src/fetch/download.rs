// src/fetch/download.rs
use anyhow::{Context, Result};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{fs, time::sleep};
use tracing::{info, warn};
use url::Url;

/// What a download did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Updated,
    Unchanged,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Change::Added => "added",
            Change::Updated => "updated",
            Change::Unchanged => "unchanged",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub path: PathBuf,
    pub sha256: String,
    pub change: Change,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 of the file at `path`, or `None` if it does not exist yet.
pub async fn file_hash(path: &Path) -> Result<Option<String>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(sha256_hex(&bytes))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {:?}", path)),
    }
}

pub fn classify(old: Option<&str>, new: &str) -> Change {
    match old {
        None => Change::Added,
        Some(h) if h == new => Change::Unchanged,
        Some(_) => Change::Updated,
    }
}

async fn get_bytes(
    client: &Client,
    url: &Url,
    max_retries: usize,
    retry_delay: Duration,
) -> Result<Vec<u8>> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = async {
            let resp = client.get(url.as_str()).send().await?.error_for_status()?;
            Ok::<_, reqwest::Error>(resp.bytes().await?.to_vec())
        }
        .await;
        match result {
            Ok(bytes) => return Ok(bytes),
            Err(e) if attempt < max_retries => {
                warn!(%url, attempt, "download failed: {}", e);
                sleep(retry_delay).await;
            }
            Err(e) => return Err(e).with_context(|| format!("downloading {}", url)),
        }
    }
}

/// Download `url` to `dest`, reporting whether the content changed.
///
/// The new bytes go to a sibling temp file that is renamed over `dest`, so
/// an interrupted download never leaves a truncated workbook behind.
pub async fn download_file(
    client: &Client,
    url: &Url,
    dest: &Path,
    max_retries: usize,
    retry_delay: Duration,
) -> Result<Fetched> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let old = file_hash(dest).await?;
    let bytes = get_bytes(client, url, max_retries, retry_delay).await?;
    let sha256 = sha256_hex(&bytes);
    let change = classify(old.as_deref(), &sha256);

    if change != Change::Unchanged {
        let tmp = dest.with_extension("part");
        fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("writing {:?}", tmp))?;
        fs::rename(&tmp, dest)
            .await
            .with_context(|| format!("renaming {:?} -> {:?}", tmp, dest))?;
    }

    info!(url = %url, path = %dest.display(), bytes = bytes.len(), %change, "downloaded");
    Ok(Fetched {
        path: dest.to_path_buf(),
        sha256,
        change,
    })
}
