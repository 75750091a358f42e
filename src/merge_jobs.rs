/*!
 * Merge planning and parallel execution of merge jobs.
 *
 * A job is `read top -> read bottom -> merge -> write`. Jobs are independent:
 * one failing job never stops the others.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::StyleConfig;
use crate::ass_writer::AssWriter;
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::language_utils::LanguagePair;
use crate::merge::merge;
use crate::scanner::ScannedFile;
use crate::subtitle_processor::read_track;

/// One dual-language output to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    pub top: PathBuf,
    pub bottom: PathBuf,
    pub output: PathBuf,
    pub pair: LanguagePair,
}

/// Result of a successful merge job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub output: PathBuf,
    pub top_cues: usize,
    pub bottom_cues: usize,
}

/// `<dir>/<basename>.<top>_<bottom>[_<index>].ass`, indices start at 1
pub fn merged_output_path(dir: &Path, basename: &str, pair: LanguagePair, index: Option<usize>) -> PathBuf {
    let index_suffix = index.map(|i| format!("_{}", i)).unwrap_or_default();
    dir.join(format!("{}.{}{}.ass", basename, pair.file_suffix(), index_suffix))
}

/// Plan one job per (top, bottom) subtitle combination of every pair.
///
/// Existing outputs are never overwritten: the index grows until a free
/// path is found.
pub fn plan_merges(file: &ScannedFile, pairs: &[LanguagePair]) -> Vec<MergeJob> {
    let mut jobs: Vec<MergeJob> = Vec::new();

    for pair in pairs {
        let tops = file.existing_subtitles_for(pair.top);
        let bottoms = file.existing_subtitles_for(pair.bottom);

        let combinations: Vec<(&Path, &Path)> = tops
            .iter()
            .flat_map(|top| bottoms.iter().map(move |bottom| (top.path.as_path(), bottom.path.as_path())))
            .filter(|(top, bottom)| top != bottom)
            .collect();

        if combinations.is_empty() {
            debug!("No subtitles for pair {} in {}", pair, file.file_name);
            continue;
        }

        let indexed = combinations.len() > 1;
        let mut index = 1;

        for (top, bottom) in combinations {
            let output = loop {
                let candidate = merged_output_path(&file.dir, &file.basename, *pair, indexed.then_some(index));
                index += 1;

                let planned = jobs.iter().any(|job| job.output == candidate);
                if !planned && !FileManager::file_exists(&candidate) {
                    break Some(candidate);
                }
                if !indexed {
                    break None;
                }
            };

            match output {
                Some(output) => jobs.push(MergeJob {
                    top: top.to_path_buf(),
                    bottom: bottom.to_path_buf(),
                    output,
                    pair: *pair,
                }),
                None => debug!("Merged {} already exists for {}", pair, file.file_name),
            }
        }
    }

    jobs
}

/// Read both tracks, merge them and write the styled result to `output`.
///
/// Nothing is written when either input fails to read.
pub fn merge_files(top: &Path, bottom: &Path, output: &Path, style: &StyleConfig) -> Result<MergeOutcome, SubtitleError> {
    let top_track = read_track(top)?;
    let bottom_track = read_track(bottom)?;

    let merged = merge(&top_track, &bottom_track);
    AssWriter::new(style.clone()).write(&merged, output)?;

    Ok(MergeOutcome {
        output: output.to_path_buf(),
        top_cues: top_track.len(),
        bottom_cues: bottom_track.len(),
    })
}

pub fn run_merge_job(job: &MergeJob, style: &StyleConfig) -> Result<MergeOutcome, SubtitleError> {
    let outcome = merge_files(&job.top, &job.bottom, &job.output, style)?;
    info!(
        "Merged {} ({} + {} cues) into {:?}",
        job.pair, outcome.top_cues, outcome.bottom_cues, job.output
    );
    Ok(outcome)
}

/// Run jobs on blocking workers, at most `max_concurrent` at a time.
///
/// Results come back in completion order.
pub async fn run_merge_jobs(
    jobs: Vec<MergeJob>,
    style: &StyleConfig,
    max_concurrent: usize,
) -> Vec<(MergeJob, Result<MergeOutcome, SubtitleError>)> {
    let style = Arc::new(style.clone());

    stream::iter(jobs)
        .map(|job| {
            let style = style.clone();
            async move {
                let worker_job = job.clone();
                let result = tokio::task::spawn_blocking(move || run_merge_job(&worker_job, &style))
                    .await
                    .unwrap_or_else(|e| {
                        Err(SubtitleError::Io {
                            path: job.output.clone(),
                            source: io::Error::other(format!("merge worker failed: {}", e)),
                        })
                    });

                if let Err(e) = &result {
                    error!("Merge {} -> {:?} failed: {}", job.pair, job.output, e);
                }
                (job, result)
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect::<Vec<_>>()
        .await
}
