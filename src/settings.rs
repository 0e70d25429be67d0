//! Layered crawler configuration.
//!
//! Sources, lowest priority first: the defaults compiled in from
//! `config/default.toml`, an optional user file, then `CRAWLER__*` env vars.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::classify::StatusPolicy;

pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");
pub const USER_CONFIG_PATH: &str = "config/crawler.toml";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration field '{0}' cannot be empty")]
    EmptyRequired(&'static str),

    #[error("configuration field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub discovery: DiscoverySettings,
    pub extract: ExtractSettings,
    pub signals: SignalSettings,
    pub dedupe: DedupeSettings,
    pub output: OutputSettings,
    pub sink: SinkSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Total attempts per URL, not retries after the first.
    pub attempts: u32,
    /// Politeness delay slept before every request.
    pub delay_ms: u64,
    /// Backoff step; attempt `n` waits `n * backoff_ms` after failing.
    pub backoff_ms: u64,
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    pub max_pages: usize,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractSettings {
    pub industry_headings: Vec<String>,
    pub industry_words: Vec<String>,
    pub service_headings: Vec<String>,
    pub service_words: Vec<String>,
    pub max_list_items: usize,
    pub revenue_per_employee: u64,
    pub job_url_keywords: Vec<String>,
    pub job_titles: Vec<String>,
    pub opening_phrases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalSettings {
    #[serde(default)]
    pub status_policy: StatusPolicy,
    pub equipment: Vec<String>,
    pub target_phrases: Vec<String>,
    pub strong_targets: Vec<String>,
    pub disqualifiers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupeSettings {
    pub min_unit_len: usize,
    pub similarity: f64,
    pub max_units: usize,
    pub noise_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    pub dir: String,
    pub schema: Vec<String>,
    /// Keep each fetched page's HTML under `evidence_dir`.
    pub save_html: bool,
    pub evidence_dir: String,
    /// Run log, appended across runs; relative to `dir`.
    pub log_file: String,
}

impl OutputSettings {
    pub fn log_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.log_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SinkSettings {
    pub enabled: bool,
    pub path: String,
    pub strict: bool,
}

impl Settings {
    /// Load defaults, then `path` if it exists, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let user = path.unwrap_or_else(|| Path::new(USER_CONFIG_PATH));
        let settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(user).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("CRAWLER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Built-in defaults only, ignoring user files and the environment.
    pub fn defaults() -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(SettingsError::EmptyRequired("fetch.user_agent"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(SettingsError::OutOfRange {
                field: "fetch.timeout_secs",
                value: "0".into(),
            });
        }
        // every request waits first; the wait cannot be configured away
        if self.fetch.delay_ms == 0 {
            return Err(SettingsError::OutOfRange {
                field: "fetch.delay_ms",
                value: "0".into(),
            });
        }
        if self.fetch.attempts == 0 {
            return Err(SettingsError::OutOfRange {
                field: "fetch.attempts",
                value: "0".into(),
            });
        }
        if self.discovery.max_pages == 0 {
            return Err(SettingsError::OutOfRange {
                field: "discovery.max_pages",
                value: "0".into(),
            });
        }
        if !(self.dedupe.similarity > 0.0 && self.dedupe.similarity <= 1.0) {
            return Err(SettingsError::OutOfRange {
                field: "dedupe.similarity",
                value: self.dedupe.similarity.to_string(),
            });
        }
        if self.output.schema.is_empty() {
            return Err(SettingsError::EmptyRequired("output.schema"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_and_validate() {
        let s = Settings::defaults().unwrap();
        assert_eq!(s.fetch.attempts, 2);
        assert_eq!(s.fetch.delay(), Duration::from_millis(1000));
        assert_eq!(s.discovery.max_pages, 12);
        assert!(s.discovery.keywords.iter().any(|k| k == "careers"));
        assert_eq!(s.signals.status_policy, StatusPolicy::AmbiguityPreserving);
        assert!(s.output.schema.iter().any(|c| c == "Target Status"));
        assert!(!s.sink.enabled);
        assert!(!s.output.save_html);
        assert_eq!(s.output.log_path(), Path::new("output").join("crawler.log"));
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawler.toml");
        std::fs::write(
            &path,
            "[discovery]\nmax_pages = 3\n\n[signals]\nstatus_policy = \"qualifying_wins\"\n",
        )
        .unwrap();

        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.discovery.max_pages, 3);
        assert_eq!(s.signals.status_policy, StatusPolicy::QualifyingWins);
        // untouched keys keep their defaults
        assert_eq!(s.fetch.timeout_secs, 25);
    }

    #[test]
    fn missing_user_file_is_fine() {
        let s = Settings::load(Some(Path::new("does/not/exist.toml"))).unwrap();
        assert_eq!(s.discovery.max_pages, 12);
    }

    #[test]
    fn rejects_bad_similarity() {
        let mut s = Settings::defaults().unwrap();
        s.dedupe.similarity = 1.5;
        assert!(matches!(
            s.validate(),
            Err(SettingsError::OutOfRange { field: "dedupe.similarity", .. })
        ));
    }

    #[test]
    fn rejects_zero_politeness_delay() {
        let mut s = Settings::defaults().unwrap();
        s.fetch.delay_ms = 0;
        assert!(matches!(
            s.validate(),
            Err(SettingsError::OutOfRange { field: "fetch.delay_ms", .. })
        ));
        s.fetch.delay_ms = 1;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_empty_user_agent() {
        let mut s = Settings::defaults().unwrap();
        s.fetch.user_agent = "  ".into();
        assert!(matches!(s.validate(), Err(SettingsError::EmptyRequired("fetch.user_agent"))));
    }
}
