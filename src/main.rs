// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use extractsubs::app_config::{Config, LogLevel};
use extractsubs::app_controller::Controller;
use extractsubs::database::{MigrationOutcome, Repository, migrate_legacy_cache};
use extractsubs::file_utils::FileManager;
use extractsubs::merge_jobs::merge_files;
use extractsubs::providers::opensubtitles::Credentials;
use extractsubs::providers::provider_from_config;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge two SRT files into one dual-language ASS file
    Merge {
        /// Subtitle shown at the top of the screen
        #[arg(value_name = "TOP")]
        top: PathBuf,

        /// Subtitle shown at the bottom of the screen
        #[arg(value_name = "BOTTOM")]
        bottom: PathBuf,

        /// Destination .ass file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Generate shell completions for extractsubs
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// extractsubs - extract embedded subtitles and build dual-language files
///
/// Scans a video library, extracts the wanted embedded subtitle tracks of
/// Matroska files and merges language pairs into styled ASS files.
#[derive(Parser, Debug)]
#[command(name = "extractsubs")]
#[command(version)]
#[command(about = "Extract subtitles and merge them into dual-language files")]
#[command(long_about = "extractsubs scans a video library, extracts embedded subtitle tracks and merges \
language pairs into dual-language .ass files (one language at the top, one at the bottom).

EXAMPLES:
    extractsubs /media/movies                          # Scan with the default config
    extractsubs --merge-languages ru-fr,ru-en /media   # Choose the merged pairs
    extractsubs --listen-new /media                    # Keep watching for new files
    extractsubs --opensubtitles username=me,password=secret /media
    extractsubs merge movie.ru.srt movie.fr.srt movie.ru_fr.ass
    extractsubs completions bash > extractsubs.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Command line options override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Video file or directory to scan
    #[arg(value_name = "PATH")]
    input_path: Option<PathBuf>,

    /// Languages to extract, comma-separated (e.g. "en,ru,fr")
    #[arg(long, global = true)]
    languages: Option<String>,

    /// Language pairs to merge, comma-separated top-bottom (e.g. "ru-fr,ru-en")
    #[arg(long, global = true)]
    merge_languages: Option<String>,

    /// Only scan files whose name matches this regex
    #[arg(long)]
    validation_regex: Option<String>,

    /// SQLite database file
    #[arg(long, env = "EXTRACTSUBS_DB_FILE")]
    db_file: Option<PathBuf>,

    /// Keep watching the path for new files after the scan
    #[arg(long)]
    listen_new: bool,

    /// Maximum number of merge jobs running at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// OpenSubtitles account, as "username=<name>,password=<password>"
    #[arg(long, value_name = "CREDENTIALS")]
    opensubtitles: Option<String>,

    /// OpenSubtitles API key
    #[arg(long, env = "EXTRACTSUBS_OPENSUBTITLES_API_KEY", hide_env_values = true)]
    opensubtitles_api_key: Option<String>,

    /// Never download missing subtitles online
    #[arg(long)]
    no_download_subtitles_online: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

impl CommandLineOptions {
    /// Apply command line overrides on top of the config file values
    fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(languages) = &self.languages {
            config.languages = split_list(languages);
        }
        if let Some(pairs) = &self.merge_languages {
            config.merge_languages = split_list(pairs);
        }
        if let Some(regex) = &self.validation_regex {
            config.validation_regex = regex.clone();
        }
        if let Some(db_file) = &self.db_file {
            config.database_path = Some(db_file.clone());
        }
        if let Some(jobs) = self.jobs {
            config.merge.max_concurrent_jobs = jobs;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone().into();
        }
        if let Some(value) = &self.opensubtitles {
            let credentials = Credentials::parse(value)
                .ok_or_else(|| anyhow!("--opensubtitles expects username=<name>,password=<password>"))?;
            config.download.username = credentials.username;
            config.download.password = credentials.password;
        }
        if let Some(api_key) = &self.opensubtitles_api_key {
            config.download.api_key = api_key.clone();
        }
        if self.no_download_subtitles_online {
            config.download.enabled = false;
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour of a log level
    fn colour_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::colour_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "extractsubs", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    cli.apply_to(&mut config)?;
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;

    match &cli.command {
        Some(Commands::Merge { top, bottom, output }) => run_merge(config, top, bottom, output).await,
        Some(Commands::Completions { .. }) => Ok(()),
        None => {
            let input_path = cli
                .input_path
                .clone()
                .ok_or_else(|| anyhow!("PATH is required when no subcommand is specified"))?;
            run_scan(config, &input_path, cli.listen_new).await
        }
    }
}

async fn run_merge(config: Config, top: &Path, bottom: &Path, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        FileManager::ensure_dir(parent)?;
    }

    let (top, bottom, output) = (top.to_path_buf(), bottom.to_path_buf(), output.to_path_buf());
    let style = config.merge.style;

    let outcome = tokio::task::spawn_blocking(move || merge_files(&top, &bottom, &output, &style))
        .await
        .context("Merge task panicked")??;

    info!(
        "Success: {:?} ({} + {} cues)",
        outcome.output, outcome.top_cues, outcome.bottom_cues
    );
    Ok(())
}

async fn run_scan(config: Config, input_path: &Path, listen_new: bool) -> Result<()> {
    let db_path = config.resolved_database_path();
    let repo = Repository::open(&db_path)?;

    let cache_dir = if input_path.is_dir() {
        input_path
    } else {
        input_path.parent().unwrap_or(Path::new("."))
    };
    let cache_path = cache_dir.join(&config.legacy_cache_file_name);
    match migrate_legacy_cache(&repo, &cache_path).await {
        Ok(MigrationOutcome::Migrated { files }) => info!("Migrated {} files from {:?}", files, cache_path),
        Ok(_) => {}
        Err(e) => error!("Legacy cache migration failed: {:#}", e),
    }

    let provider = provider_from_config(&config.download);
    let mut controller = Controller::with_config(config, Arc::new(repo.clone()))?;
    if let Some(provider) = provider {
        info!("Downloading missing subtitles from {}", provider.name());
        controller = controller.with_provider(provider);
    }

    let summary = if listen_new {
        controller.run_and_watch(input_path).await?
    } else {
        controller.run(input_path).await?
    };

    info!("{}", summary);
    info!("Database: {}", repo.stats()?);

    Ok(())
}
