use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::{Path, PathBuf};

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Languages to extract from embedded tracks (ISO 639-1 or 639-3)
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Language pairs to merge, `top-bottom` (e.g. "ru-fr")
    #[serde(default = "default_merge_languages")]
    pub merge_languages: Vec<String>,

    /// Only file names matching this regex (from the start) are scanned
    #[serde(default = "default_validation_regex")]
    pub validation_regex: String,

    /// SQLite database path; defaults to the user data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Name of the pre-database JSON cache file kept in the scanned root
    #[serde(default = "default_legacy_cache_file_name")]
    pub legacy_cache_file_name: String,

    /// Merge job settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// New file watcher settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Online subtitle download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Merge job settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergeConfig {
    /// Maximum number of merge jobs running at once
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Styles of the generated dual-subtitle file
    #[serde(default)]
    pub style: StyleConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            style: StyleConfig::default(),
        }
    }
}

/// Look of the two subtitle regions in generated ASS files.
///
/// Colours use the ASS `&HAABBGGRR` notation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleConfig {
    #[serde(default = "default_font_name")]
    pub font_name: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Text colour of the upper (top language) region
    #[serde(default = "default_top_colour")]
    pub top_colour: String,

    /// Text colour of the lower (bottom language) region
    #[serde(default = "default_bottom_colour")]
    pub bottom_colour: String,

    #[serde(default = "default_outline_colour")]
    pub outline_colour: String,

    #[serde(default = "default_back_colour")]
    pub back_colour: String,

    /// Outline width in pixels
    #[serde(default = "default_outline")]
    pub outline: u32,

    /// Shadow depth in pixels
    #[serde(default = "default_shadow")]
    pub shadow: u32,

    /// Left and right margins in pixels
    #[serde(default = "default_margin_h")]
    pub margin_h: u32,

    /// Distance from the screen edge in pixels
    #[serde(default = "default_margin_v")]
    pub margin_v: u32,

    #[serde(default = "default_play_res_x")]
    pub play_res_x: u32,

    #[serde(default = "default_play_res_y")]
    pub play_res_y: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: default_font_name(),
            font_size: default_font_size(),
            top_colour: default_top_colour(),
            bottom_colour: default_bottom_colour(),
            outline_colour: default_outline_colour(),
            back_colour: default_back_colour(),
            outline: default_outline(),
            shadow: default_shadow(),
            margin_h: default_margin_h(),
            margin_v: default_margin_v(),
            play_res_x: default_play_res_x(),
            play_res_y: default_play_res_y(),
        }
    }
}

/// New file watcher settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Seconds between directory polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds a new file's size must stay unchanged before it is processed
    #[serde(default = "default_settle_interval_secs")]
    pub settle_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            settle_interval_secs: default_settle_interval_secs(),
        }
    }
}

/// Online subtitle download settings.
///
/// Subtitles of wanted languages that are neither embedded nor next to the
/// video are fetched from OpenSubtitles when an API key is set.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadConfig {
    #[serde(default = "default_download_enabled")]
    pub enabled: bool,

    /// OpenSubtitles REST API key
    #[serde(default)]
    pub api_key: String,

    /// Account used for downloads; anonymous when empty
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// REST API base URL
    #[serde(default = "default_download_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            enabled: default_download_enabled(),
            api_key: String::new(),
            username: String::new(),
            password: String::new(),
            endpoint: default_download_endpoint(),
            timeout_secs: default_download_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_languages() -> Vec<String> {
    Vec::new()
}

fn default_merge_languages() -> Vec<String> {
    Vec::new()
}

fn default_validation_regex() -> String {
    ".*".to_string()
}

fn default_legacy_cache_file_name() -> String {
    ".extractsubs".to_string()
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    52
}

fn default_top_colour() -> String {
    // yellow
    "&H0000FFFF".to_string()
}

fn default_bottom_colour() -> String {
    "&H00FFFFFF".to_string()
}

fn default_outline_colour() -> String {
    "&H00000000".to_string()
}

fn default_back_colour() -> String {
    "&H80000000".to_string()
}

fn default_outline() -> u32 {
    2
}

fn default_shadow() -> u32 {
    1
}

fn default_margin_h() -> u32 {
    60
}

fn default_margin_v() -> u32 {
    40
}

fn default_play_res_x() -> u32 {
    1920
}

fn default_play_res_y() -> u32 {
    1080
}

fn default_download_enabled() -> bool {
    true
}

fn default_download_endpoint() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_settle_interval_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Load the config file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        let config = Self::default();
        config.save(path)?;
        log::info!("Created default configuration file at {}", path.display());
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        for code in &self.languages {
            language_utils::parse_language(code)?;
        }

        language_utils::parse_language_pairs(&self.merge_languages.join(","))?;

        Regex::new(&self.validation_regex)
            .with_context(|| format!("Invalid validation regex: {}", self.validation_regex))?;

        if self.legacy_cache_file_name.trim().is_empty() {
            return Err(anyhow!("Legacy cache file name must not be empty"));
        }

        if self.merge.max_concurrent_jobs == 0 {
            return Err(anyhow!("merge.max_concurrent_jobs must be at least 1"));
        }

        let style = &self.merge.style;
        if style.font_size == 0 {
            return Err(anyhow!("merge.style.font_size must be at least 1"));
        }
        if style.play_res_x == 0 || style.play_res_y == 0 {
            return Err(anyhow!("merge.style play resolution must be non-zero"));
        }
        if style.font_name.contains(',') {
            return Err(anyhow!("merge.style.font_name must not contain commas"));
        }

        if self.watch.poll_interval_secs == 0 {
            return Err(anyhow!("watch.poll_interval_secs must be at least 1"));
        }

        if self.download.enabled {
            if !self.download.endpoint.starts_with("http://") && !self.download.endpoint.starts_with("https://") {
                return Err(anyhow!("download.endpoint must be an http(s) URL"));
            }
            if self.download.timeout_secs == 0 {
                return Err(anyhow!("download.timeout_secs must be at least 1"));
            }
        }

        Ok(())
    }

    /// Database path, falling back to the user data directory
    pub fn resolved_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        dirs::data_local_dir()
            .map(|dir| dir.join("extractsubs"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".extract-subs.sqlite3")
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            languages: default_languages(),
            merge_languages: default_merge_languages(),
            validation_regex: default_validation_regex(),
            database_path: None,
            legacy_cache_file_name: default_legacy_cache_file_name(),
            merge: MergeConfig::default(),
            watch: WatchConfig::default(),
            download: DownloadConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
