use crate::collection::Collection;
use crate::types::{DigestError, FetchConfig, Result};
use chrono::Duration;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Recency window as written in the configuration: a preset name or a
/// number of days.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WindowSpec {
    Days(i64),
    Named(String),
}

impl WindowSpec {
    pub fn to_duration(&self) -> Result<Duration> {
        let days = match self {
            WindowSpec::Days(days) => *days,
            WindowSpec::Named(name) => match name.trim() {
                "day" => 1,
                "week" => 7,
                "month" => 30,
                other => other.parse::<i64>().map_err(|_| {
                    DigestError::config(format!(
                        "invalid recency window '{}': expected day, week, month or a number of days",
                        other
                    ))
                })?,
            },
        };

        if days < 0 {
            return Err(DigestError::config(format!(
                "invalid recency window '{}': negative day count",
                days
            )));
        }
        Duration::try_days(days).ok_or_else(|| {
            DigestError::config(format!("invalid recency window '{}': too large", days))
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub last: Option<WindowSpec>,
    pub title: Option<String>,
    pub metadata: Option<PathBuf>,
    pub defaults: Option<PathBuf>,
    pub filters: Vec<PathBuf>,
    pub pandoc_args: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub id: String,
    pub name: String,
    /// Comma-separated source URLs.
    pub url: String,
    #[serde(default)]
    pub last: Option<WindowSpec>,
    #[serde(default)]
    pub fetch_original: bool,
    #[serde(default = "default_true")]
    pub title: bool,
    #[serde(default = "default_true")]
    pub readability: bool,
}

impl FeedConfig {
    pub fn source_urls(&self) -> Vec<String> {
        self.url
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Run configuration loaded from a TOML file. Everything that can make the
/// run fail is checked here, before any network activity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default, rename = "feed")]
    pub feeds: Vec<FeedConfig>,
}

impl DigestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DigestError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Build one collection per feed section, in file order. Fails on the
    /// first invalid window or repeated feed id.
    pub fn collections(&self) -> Result<Vec<Collection>> {
        let default_window = self
            .general
            .last
            .as_ref()
            .map(WindowSpec::to_duration)
            .transpose()?;

        let mut seen = HashSet::new();
        let mut collections = Vec::with_capacity(self.feeds.len());

        for feed in &self.feeds {
            if !seen.insert(feed.id.as_str()) {
                return Err(DigestError::config(format!("duplicate feed id '{}'", feed.id)));
            }

            let window = match &feed.last {
                Some(spec) => Some(spec.to_duration()?),
                None => default_window,
            };

            collections.push(
                Collection::new(feed.id.clone(), feed.name.clone(), feed.source_urls())
                    .with_recency_window(window)
                    .with_fetch_full_text(feed.fetch_original)
                    .with_title_block(feed.title)
                    .with_readability(feed.readability),
            );
        }

        Ok(collections)
    }
}

/// Settings that shape a run but are not part of the document.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub progress: bool,
    pub fetch: FetchConfig,
}

/// Everything handed through to the converter besides the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSettings {
    pub title: Option<String>,
    pub metadata_file: Option<PathBuf>,
    pub defaults_file: Option<PathBuf>,
    pub transforms: Vec<PathBuf>,
    pub extra_flags: Vec<String>,
    pub table_of_contents: bool,
}

impl ExportSettings {
    /// Merge the general section with command-line overrides. A title given
    /// on the command line wins; command-line flags follow configured ones.
    pub fn new(
        general: &GeneralConfig,
        title: Option<String>,
        table_of_contents: bool,
        cli_flags: &[String],
    ) -> Self {
        let mut extra_flags = general.pandoc_args.clone();
        extra_flags.extend(cli_flags.iter().cloned());

        Self {
            title: title.or_else(|| general.title.clone()),
            metadata_file: general.metadata.clone(),
            defaults_file: general.defaults.clone(),
            transforms: general.filters.clone(),
            extra_flags,
            table_of_contents,
        }
    }
}
