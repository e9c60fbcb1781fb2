// src/config.rs

use anyhow::{bail, ensure, Context, Result};
use scraper::Selector;
use serde::Deserialize;
use std::{fs, num::NonZeroUsize, path::Path, path::PathBuf, time::Duration};
use url::Url;

/// Everything a run needs. Defaults reproduce the forms listing on
/// scrapethissite.com; a YAML file may override any subset of fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub http: HttpConfig,
    pub concurrency: ConcurrencyConfig,
    pub output: OutputConfig,
    pub aggregate: AggregateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub pagination_selector: String,
    pub table_selector: String,
    /// Treat the landing page as the only page when it has no pagination control.
    pub fallback_to_landing: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.scrapethissite.com/pages/forms/".to_string(),
            pagination_selector: "ul.pagination".to_string(),
            table_selector: "table.table".to_string(),
            fallback_to_landing: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: concat!("nhlscraper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// `None` fetches every discovered page at once.
    pub max_in_flight: Option<NonZeroUsize>,
    pub run_timeout_secs: Option<u64>,
}

impl ConcurrencyConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub archive_path: PathBuf,
    pub workbook_path: PathBuf,
    pub dataset_sheet: String,
    pub aggregate_sheet: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from("output/scraped_pages.zip"),
            workbook_path: PathBuf::from("output/NHL_Stats.xlsx"),
            dataset_sheet: "NHL Stats 1990-2011".to_string(),
            aggregate_sheet: "Winner and Loser per Year".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub group_column: String,
    pub label_column: String,
    pub value_column: String,
    /// First row of the aggregate sheet.
    pub header: Vec<String>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            group_column: "Year".to_string(),
            label_column: "Team Name".to_string(),
            value_column: "Wins".to_string(),
            header: [
                "Year",
                "Winner",
                "Winner Num. of Wins",
                "Loser",
                "Loser Num. of Wins",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl PipelineConfig {
    /// Read a YAML config; missing fields keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing {:?}", path))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.source.base_url)
            .with_context(|| format!("parsing base URL {}", self.source.base_url))
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        for sel in [
            &self.source.pagination_selector,
            &self.source.table_selector,
        ] {
            if let Err(e) = Selector::parse(sel) {
                bail!("invalid CSS selector '{}': {:?}", sel, e);
            }
        }
        ensure!(
            self.aggregate.header.len() == 5,
            "aggregate.header needs exactly 5 columns, got {}",
            self.aggregate.header.len()
        );
        Ok(())
    }
}
