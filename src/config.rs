// src/config.rs
//! Run configuration: where files live and where to fetch them from.
//!
//! Sheet layouts are not configurable; they are versioned in
//! [`crate::schema::family`].

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::schema::{family, SourceFamily};

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "SHILLER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where downloaded workbooks are stored and read from.
    pub download_dir: PathBuf,
    /// Where JSON/CSV outputs go.
    pub output_dir: PathBuf,
    pub max_concurrent_downloads: usize,
    pub max_retries: usize,
    pub retry_delay_secs: u64,
    pub sources: Vec<SourceConfig>,
}

/// How to obtain one family's workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Family id or publisher file name, e.g. `stock_market_data` or `ie_data.xls`.
    pub family: String,
    /// Direct download URL.
    #[serde(default)]
    pub url: Option<String>,
    /// HTML page to scrape for the current download link.
    #[serde(default)]
    pub page: Option<String>,
    /// Regex the link's href must match; defaults to the family's file name.
    #[serde(default)]
    pub link_pattern: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            output_dir: PathBuf::from("data"),
            max_concurrent_downloads: 3,
            max_retries: 3,
            retry_delay_secs: 1,
            sources: vec![
                SourceConfig::direct(
                    "ie_data.xls",
                    "http://www.econ.yale.edu/~shiller/data/ie_data.xls",
                ),
                SourceConfig::direct(
                    "Fig3-1.xls",
                    "http://www.econ.yale.edu/~shiller/data/Fig3-1.xls",
                ),
            ],
        }
    }
}

impl SourceConfig {
    pub fn direct(family: &str, url: &str) -> Self {
        Self {
            family: family.to_string(),
            url: Some(url.to_string()),
            page: None,
            link_pattern: None,
        }
    }

    pub fn family(&self) -> Result<&'static SourceFamily> {
        family::find(&self.family)
            .with_context(|| format!("unknown source family `{}`", self.family))
    }
}

impl PipelineConfig {
    /// Load from `path`, or from `$SHILLER_CONFIG`, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let cfg = match path.map(Path::to_path_buf).or(from_env) {
            Some(p) => {
                let text = fs::read_to_string(&p)
                    .with_context(|| format!("reading config {:?}", p))?;
                Self::from_yaml(&text).with_context(|| format!("parsing config {:?}", p))?
            }
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_downloads == 0 {
            bail!("max_concurrent_downloads must be at least 1");
        }
        for src in &self.sources {
            src.family()?;
            if src.url.is_none() && src.page.is_none() {
                bail!("source `{}` needs either `url` or `page`", src.family);
            }
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Families this run touches, in config order.
    pub fn families(&self) -> Result<Vec<&'static SourceFamily>> {
        self.sources.iter().map(SourceConfig::family).collect()
    }

    pub fn dataset_json_path(&self, family: &SourceFamily) -> PathBuf {
        self.output_dir.join(format!("{}.json", family.id))
    }

    pub fn dataset_csv_path(&self, family: &SourceFamily) -> PathBuf {
        self.output_dir.join(format!("{}.csv", family.id))
    }

    pub fn latest_path(&self) -> PathBuf {
        self.output_dir.join("latest.json")
    }
}
