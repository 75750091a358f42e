use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use isolang::Language;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileFilter;
use crate::language_utils::{LanguagePair, parse_language_list, parse_language_pairs};
use crate::merge_jobs::{MergeJob, plan_merges, run_merge_jobs};
use crate::mkv;
use crate::providers::{SubtitleProvider, download_missing};
use crate::scanner::{
    MergedSubtitle, ScanStore, ScannedFile, Scanner, discover_sidecars, embedded_candidates,
};
use crate::watcher;

// @module: Application controller for library scans and merges

/// Counters of one scan run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub subtitles_extracted: usize,
    pub subtitles_downloaded: usize,
    pub merges_written: usize,
    pub merges_failed: usize,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0 || self.merges_failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files scanned, {} failed, {} subtitles extracted, {} downloaded, {} merged files written, {} merges failed",
            self.files_scanned,
            self.files_failed,
            self.subtitles_extracted,
            self.subtitles_downloaded,
            self.merges_written,
            self.merges_failed
        )
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    languages: Vec<Language>,
    pairs: Vec<LanguagePair>,
    filter: FileFilter,
    store: Arc<dyn ScanStore>,
    /// Source of subtitles missing locally
    provider: Option<Arc<dyn SubtitleProvider>>,
}

impl Controller {
    // @method: Create a controller from a validated configuration
    pub fn with_config(config: Config, store: Arc<dyn ScanStore>) -> Result<Self> {
        let languages = parse_language_list(&config.languages.join(","))?;
        let pairs = parse_language_pairs(&config.merge_languages.join(","))?;
        let filter = FileFilter::new(&config.validation_regex)?;

        Ok(Self {
            config,
            languages,
            pairs,
            filter,
            store,
            provider: None,
        })
    }

    /// Download wanted languages missing locally from `provider`
    pub fn with_provider(mut self, provider: Arc<dyn SubtitleProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Languages whose embedded tracks are extracted
    fn wanted_languages(&self) -> Vec<Language> {
        let mut wanted = self.languages.clone();
        for pair in &self.pairs {
            for language in [pair.top, pair.bottom] {
                if !wanted.contains(&language) {
                    wanted.push(language);
                }
            }
        }
        wanted
    }

    /// Scan `target` (a directory or one video file)
    pub async fn run(&self, target: &Path) -> Result<RunSummary> {
        let files = self.collect(target).await?;
        self.process_collected(target, files).await
    }

    async fn collect(&self, target: &Path) -> Result<Vec<PathBuf>> {
        if !target.exists() {
            return Err(anyhow!("Input path does not exist: {:?}", target));
        }

        Scanner::new(self.filter.clone()).collect(target, self.store.as_ref()).await
    }

    async fn process_collected(&self, target: &Path, files: Vec<PathBuf>) -> Result<RunSummary> {
        if files.is_empty() {
            info!("No new video files in {:?}", target);
            return Ok(RunSummary::default());
        }

        self.process_files(files).await
    }

    /// Scan `target`, then keep watching it for new files until interrupted
    pub async fn run_and_watch(&self, target: &Path) -> Result<RunSummary> {
        let files = self.collect(target).await?;
        let summary = self.process_collected(target, files.clone()).await?;
        info!("{}", summary);

        let this = self;
        watcher::watch(
            target,
            self.filter.clone(),
            self.store.as_ref(),
            &self.config.watch,
            files,
            move |files| async move {
                let summary = this.process_files(files).await?;
                info!("{}", summary);
                Ok::<(), anyhow::Error>(())
            },
        )
        .await?;

        Ok(summary)
    }

    /// Extract, discover and merge subtitles for `files`, then record each scan
    pub async fn process_files(&self, files: Vec<PathBuf>) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();
        let wanted = self.wanted_languages();

        let progress_bar = ProgressBar::new(files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let mut scanned: Vec<ScannedFile> = Vec::new();
        for path in &files {
            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            progress_bar.set_message(format!("Scanning: {}", file_name));

            match self.prepare_file(path, &wanted).await {
                Ok((mut file, extracted)) => {
                    summary.subtitles_extracted += extracted;
                    if let Some(provider) = &self.provider {
                        progress_bar.set_message(format!("Downloading: {}", file_name));
                        let downloaded = download_missing(provider.as_ref(), &file, &wanted).await;
                        summary.subtitles_downloaded += downloaded.len();
                        file.subtitles.extend(downloaded);
                    }
                    scanned.push(file);
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.files_failed += 1;
                }
            }
            progress_bar.inc(1);
        }

        progress_bar.set_message("Merging");

        let mut owners: HashMap<PathBuf, usize> = HashMap::new();
        let mut jobs: Vec<MergeJob> = Vec::new();
        for (index, file) in scanned.iter().enumerate() {
            for job in plan_merges(file, &self.pairs) {
                owners.insert(job.output.clone(), index);
                jobs.push(job);
            }
        }

        if !jobs.is_empty() {
            info!("Running {} merge jobs", jobs.len());
        }
        let results = run_merge_jobs(jobs, &self.config.merge.style, self.config.merge.max_concurrent_jobs).await;
        for (job, result) in results {
            match result {
                Ok(outcome) => {
                    summary.merges_written += 1;
                    if let Some(&index) = owners.get(&outcome.output) {
                        scanned[index].merged.push(MergedSubtitle {
                            path: outcome.output,
                            pair: job.pair,
                        });
                    }
                }
                Err(_) => summary.merges_failed += 1,
            }
        }

        for file in &scanned {
            match self.store.record_scan(file).await {
                Ok(()) => summary.files_scanned += 1,
                Err(e) => {
                    error!("Failed to record scan of {}: {:#}", file.file_name, e);
                    summary.files_failed += 1;
                }
            }
        }

        progress_bar.finish_with_message("Scan complete");

        info!(
            "Processed {} files in {}",
            files.len(),
            Self::format_duration(start_time.elapsed())
        );
        if summary.has_failures() {
            warn!("{}", summary);
        } else {
            debug!("{}", summary);
        }

        Ok(summary)
    }

    /// Extract wanted embedded tracks and discover sidecar files of one video
    async fn prepare_file(&self, path: &Path, wanted: &[Language]) -> Result<(ScannedFile, usize)> {
        let mut file = ScannedFile::from_path(path).ok_or_else(|| anyhow!("Not a file path: {:?}", path))?;
        let mut extracted = 0;

        if file.is_matroska() {
            let tracks = mkv::list_subtitle_tracks(path)
                .await
                .with_context(|| format!("Failed to list subtitle tracks of {:?}", path))?;

            let candidates = embedded_candidates(&file, &tracks, wanted);
            let missing: Vec<(u32, PathBuf)> = candidates
                .iter()
                .filter(|c| !c.exists())
                .filter_map(|c| c.track_id.map(|id| (id, c.path.clone())))
                .collect();

            if !missing.is_empty() {
                mkv::extract_tracks(path, &missing)
                    .await
                    .with_context(|| format!("Failed to extract subtitles of {:?}", path))?;
                extracted = missing.len();
            }

            file.subtitles.extend(candidates.into_iter().filter(|c| c.exists()));
        }

        let sidecars = discover_sidecars(&file)?;
        debug!(
            "{}: {} embedded, {} sidecar subtitles",
            file.file_name,
            file.subtitles.len(),
            sidecars.len()
        );
        file.subtitles.extend(sidecars);

        Ok((file, extracted))
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
