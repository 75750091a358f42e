/*!
 * Online subtitle providers.
 *
 * A provider finds and fetches one subtitle for a video in a given language.
 * The scan asks it only for wanted languages that were neither extracted from
 * the container nor found next to the video.
 */

use async_trait::async_trait;
use isolang::Language;
use log::{debug, error, info, warn};
use std::fmt::Debug;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::DownloadConfig;
use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::language_utils::short_code;
use crate::scanner::{ScannedFile, SubtitleCandidate, SubtitleSource};
use crate::subtitle_processor::parse_track;

pub mod mock;
pub mod opensubtitles;

pub use opensubtitles::OpenSubtitles;

/// Common trait for online subtitle providers
#[async_trait]
pub trait SubtitleProvider: Send + Sync + Debug {
    /// Provider name used in log messages
    fn name(&self) -> &str;

    /// Fetch SRT content for `video` in `language`.
    ///
    /// Returns `Ok(None)` when the provider has no subtitle for it.
    async fn fetch(&self, video: &Path, language: Language) -> Result<Option<String>, ProviderError>;
}

/// Build the configured provider, if downloading is enabled and possible
pub fn provider_from_config(config: &DownloadConfig) -> Option<Arc<dyn SubtitleProvider>> {
    if !config.enabled {
        debug!("Online subtitle download disabled");
        return None;
    }
    if config.api_key.trim().is_empty() {
        info!("No OpenSubtitles API key configured, missing subtitles will not be downloaded");
        return None;
    }

    Some(Arc::new(OpenSubtitles::from_config(config)))
}

/// Where a downloaded subtitle is stored: `<dir>/<basename>.<code>.srt`
pub fn download_path(file: &ScannedFile, language: Language) -> PathBuf {
    file.dir
        .join(format!("{}.{}.srt", file.basename, short_code(language)))
}

/// Download the `languages` that `file` has no subtitle for yet.
///
/// Failures are logged per language and never abort the scan. Content that
/// does not parse as SRT is discarded.
pub async fn download_missing(
    provider: &dyn SubtitleProvider,
    file: &ScannedFile,
    languages: &[Language],
) -> Vec<SubtitleCandidate> {
    let video = file.full_path();
    let mut downloaded = Vec::new();

    for &language in languages {
        if file.has_language(language) {
            continue;
        }

        let path = download_path(file, language);
        debug!("Looking for {} subtitles of {} on {}", language.to_639_3(), file.file_name, provider.name());

        match fetch_and_store(provider, &video, language, &path).await {
            Ok(true) => {
                info!("Downloaded {} subtitles: {:?}", language.to_639_3(), path);
                downloaded.push(SubtitleCandidate {
                    path,
                    language: Some(language),
                    track_id: None,
                    source: SubtitleSource::Downloaded,
                });
            }
            Ok(false) => warn!(
                "No {} subtitles found online for {}",
                language.to_639_3(),
                file.file_name
            ),
            Err(e) => error!(
                "Download of {} subtitles for {} failed: {}",
                language.to_639_3(),
                file.file_name,
                e
            ),
        }
    }

    downloaded
}

async fn fetch_and_store(
    provider: &dyn SubtitleProvider,
    video: &Path,
    language: Language,
    path: &Path,
) -> Result<bool, ProviderError> {
    let Some(content) = provider.fetch(video, language).await? else {
        return Ok(false);
    };

    let track = parse_track(&content).map_err(|e| ProviderError::ParseError(e.to_string()))?;
    if track.is_empty() {
        return Err(ProviderError::ParseError("subtitle has no cues".to_string()));
    }

    FileManager::write_atomic(path, &content)?;
    Ok(true)
}

const HASH_CHUNK_SIZE: u64 = 64 * 1024;

/// OpenSubtitles movie hash of the file at `path`, with the file size.
///
/// The hash is the file size plus the little-endian `u64` words of the first
/// and the last 64 KiB, with wrapping addition, as 16 hex digits.
pub fn movie_hash(path: &Path) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let chunk = HASH_CHUNK_SIZE.min(size);

    let mut hash = size;
    hash = hash.wrapping_add(sum_words(&mut file, chunk)?);
    file.seek(SeekFrom::Start(size - chunk))?;
    hash = hash.wrapping_add(sum_words(&mut file, chunk)?);

    Ok((format!("{:016x}", hash), size))
}

fn sum_words<R: Read>(reader: &mut R, len: u64) -> io::Result<u64> {
    let mut buffer = vec![0u8; len as usize];
    reader.read_exact(&mut buffer)?;

    Ok(buffer.chunks(8).fold(0u64, |sum, chunk| {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u64::from_le_bytes(word))
    }))
}
