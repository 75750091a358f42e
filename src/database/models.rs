/*!
 * Database entity models.
 *
 * These structures map directly to the `video_file` and `video_subtitle`
 * tables.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a subtitle file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleSource {
    /// Extracted from a track embedded in the video container
    Embedded,
    /// Sidecar file found next to the video
    External,
    /// Fetched from an online subtitle provider
    Downloaded,
    /// Dual-language file produced by a merge job
    Merge,
}

impl fmt::Display for SubtitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtitleSource::Embedded => write!(f, "embedded"),
            SubtitleSource::External => write!(f, "external"),
            SubtitleSource::Downloaded => write!(f, "downloaded"),
            SubtitleSource::Merge => write!(f, "merge"),
        }
    }
}

impl std::str::FromStr for SubtitleSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            // "file" is what the pre-database scanner stored for extracted tracks
            "embedded" | "file" => Ok(SubtitleSource::Embedded),
            "external" => Ok(SubtitleSource::External),
            "downloaded" => Ok(SubtitleSource::Downloaded),
            "merge" => Ok(SubtitleSource::Merge),
            _ => Err(anyhow::anyhow!("Invalid subtitle source: {}", s)),
        }
    }
}

/// A scanned video file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFileRecord {
    pub id: i64,
    /// Directory without trailing separator
    pub dir: String,
    pub filename: String,
    /// Scan timestamp (RFC 3339, UTC)
    pub scan_time: String,
}

impl VideoFileRecord {
    pub fn full_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.filename)
    }
}

/// A subtitle file belonging to a scanned video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSubtitleRecord {
    pub id: i64,
    pub video_file_id: i64,
    pub full_path: String,
    /// ISO 639-3 code, `und` when unknown, or `top,bottom` codes for merges
    pub language: String,
    /// Container track id for embedded subtitles
    pub track_id: Option<i64>,
    pub source: SubtitleSource,
}

/// Values for a new `video_subtitle` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideoSubtitle {
    pub full_path: String,
    pub language: String,
    pub track_id: Option<i64>,
    pub source: SubtitleSource,
}

/// Normalize a directory for storage: no trailing separator
pub fn normalize_dir(dir: &str) -> String {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() && dir.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
