/*!
 * Library scanning: which video files to process and which subtitle files
 * belong to each of them.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use isolang::Language;
use log::{debug, error};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

pub use crate::database::models::SubtitleSource;
use crate::file_utils::{FileFilter, FileManager};
use crate::language_utils::{LanguagePair, language_from_track_tags, lookup_language, short_code};
use crate::mkv::MkvTrackInfo;

/// A subtitle file that can take part in a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCandidate {
    pub path: PathBuf,
    pub language: Option<Language>,
    /// Container track id for embedded subtitles
    pub track_id: Option<u32>,
    pub source: SubtitleSource,
}

impl SubtitleCandidate {
    /// Whether the subtitle file is on disk
    pub fn exists(&self) -> bool {
        FileManager::file_exists(&self.path)
    }
}

/// A dual-language file produced for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSubtitle {
    pub path: PathBuf,
    pub pair: LanguagePair,
}

/// A video file and the subtitles found for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub dir: PathBuf,
    pub file_name: String,
    /// File name without extension
    pub basename: String,
    /// Lowercase extension without the dot
    pub extension: String,
    pub subtitles: Vec<SubtitleCandidate>,
    pub merged: Vec<MergedSubtitle>,
}

impl ScannedFile {
    /// Describe the video at `path`; `None` if it has no file name
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let file_name = path.file_name()?.to_string_lossy().to_string();
        let basename = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        Some(Self {
            dir,
            file_name,
            basename,
            extension,
            subtitles: Vec::new(),
            merged: Vec::new(),
        })
    }

    pub fn full_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Whether embedded tracks can be listed and extracted with mkvtoolnix
    pub fn is_matroska(&self) -> bool {
        self.extension == "mkv"
    }

    /// Subtitles of exactly `language` that are on disk, without duplicates
    pub fn existing_subtitles_for(&self, language: Language) -> Vec<&SubtitleCandidate> {
        let mut result: Vec<&SubtitleCandidate> = Vec::new();
        for candidate in &self.subtitles {
            if candidate.language == Some(language)
                && candidate.exists()
                && !result.iter().any(|c| c.path == candidate.path)
            {
                result.push(candidate);
            }
        }
        result
    }

    /// Whether a subtitle of `language` is on disk
    pub fn has_language(&self, language: Language) -> bool {
        !self.existing_subtitles_for(language).is_empty()
    }

    fn has_subtitle_path(&self, path: &Path) -> bool {
        self.subtitles.iter().any(|candidate| candidate.path == path)
    }
}

/// Scan state storage
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Whether the video at `path` was scanned before
    async fn is_scanned(&self, path: &Path) -> Result<bool>;

    /// Remember the outcome of scanning one video
    async fn record_scan(&self, file: &ScannedFile) -> Result<()>;
}

/// Keep characters that are safe in a file name
fn sanitize_track_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Destination of an extracted track: `<dir>/<basename>_<code>[_<name>].srt`
pub fn embedded_track_path(
    dir: &Path,
    basename: &str,
    language: Option<Language>,
    track_name: Option<&str>,
) -> PathBuf {
    let code = language.map(short_code).unwrap_or_else(|| "und".to_string());
    let name_suffix = track_name
        .map(sanitize_track_name)
        .filter(|name| !name.is_empty())
        .map(|name| format!("_{}", name))
        .unwrap_or_default();

    dir.join(format!("{}_{}{}.srt", basename, code, name_suffix))
}

/// Candidates for the embedded tracks of `file` whose language is wanted.
///
/// Tracks of unknown language and image-based tracks are skipped.
pub fn embedded_candidates(
    file: &ScannedFile,
    tracks: &[MkvTrackInfo],
    wanted: &[Language],
) -> Vec<SubtitleCandidate> {
    let mut candidates: Vec<SubtitleCandidate> = Vec::new();

    for track in tracks.iter().filter(|t| t.is_subtitle()) {
        let language = language_from_track_tags(
            track.language_ietf.as_deref(),
            track.language.as_deref(),
        );

        let Some(language) = language.filter(|l| wanted.contains(l)) else {
            debug!("Skipping track {} of {}: language not wanted", track.id, file.file_name);
            continue;
        };

        if !track.is_srt() {
            debug!(
                "Skipping track {} of {}: codec {:?} is not SRT text",
                track.id, file.file_name, track.codec_id
            );
            continue;
        }

        let path = embedded_track_path(&file.dir, &file.basename, Some(language), track.name.as_deref());
        if candidates.iter().any(|c| c.path == path) {
            debug!("Skipping track {} of {}: duplicate destination {:?}", track.id, file.file_name, path);
            continue;
        }

        candidates.push(SubtitleCandidate {
            path,
            language: Some(language),
            track_id: Some(track.id),
            source: SubtitleSource::Embedded,
        });
    }

    candidates
}

/// Language code at the start of `rest`, the stem part after `<basename>.`
fn sidecar_language(rest: &str) -> Option<Language> {
    rest.split(['.', '_']).next().and_then(lookup_language)
}

/// Subtitle files next to the video: `<basename>.<code>.srt` or `<basename>_<code>.srt`.
///
/// Paths already listed in `file.subtitles` are skipped.
pub fn discover_sidecars(file: &ScannedFile) -> Result<Vec<SubtitleCandidate>> {
    let dir = if file.dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        file.dir.as_path()
    };

    let mut found: Vec<SubtitleCandidate> = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("Failed to list directory: {:?}", dir))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_srt = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
        if !is_srt || !path.is_file() || file.has_subtitle_path(&path) {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        let Some(rest) = stem.strip_prefix(file.basename.as_str()) else {
            continue;
        };

        let language = match rest.chars().next() {
            None => None,
            Some('.') | Some('_') => sidecar_language(&rest[1..]),
            Some(_) => continue,
        };

        found.push(SubtitleCandidate {
            path,
            language,
            track_id: None,
            source: SubtitleSource::External,
        });
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

/// Finds the video files that still need a scan
#[derive(Debug, Clone)]
pub struct Scanner {
    filter: FileFilter,
}

impl Scanner {
    pub fn new(filter: FileFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Video files under `target` (a directory or a single file) not yet scanned
    pub async fn collect<S: ScanStore + ?Sized>(&self, target: &Path, store: &S) -> Result<Vec<PathBuf>> {
        let files = FileManager::find_video_files(target, &self.filter)?;
        let total = files.len();

        let mut to_scan = Vec::new();
        for path in files {
            match store.is_scanned(&path).await {
                Ok(true) => debug!("Already scanned: {:?}", path),
                Ok(false) => to_scan.push(path),
                Err(e) => {
                    error!("Scan state lookup failed for {:?}: {}", path, e);
                    to_scan.push(path);
                }
            }
        }

        debug!("{} of {} video files need a scan", to_scan.len(), total);
        Ok(to_scan)
    }
}
