use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::{Value, from_str};
use tokio::process::Command;

use crate::errors::ToolError;

// @module: Matroska track listing and extraction through mkvtoolnix

const MKVMERGE: &str = "mkvmerge";
const MKVEXTRACT: &str = "mkvextract";

// @const: mkvmerge track type of subtitle tracks
const TRACK_TYPE_SUBTITLES: &str = "subtitles";

// @const: Matroska codec id of plain UTF-8 SubRip text
const CODEC_ID_SRT: &str = "S_TEXT/UTF8";

const LIST_TIMEOUT: Duration = Duration::from_secs(60);
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(600);

/// One track as reported by `mkvmerge -J`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MkvTrackInfo {
    /// Track id as accepted by mkvextract
    pub id: u32,
    pub track_type: String,
    /// Track name (`track_name` property)
    pub name: Option<String>,
    /// Legacy ISO 639-2 language tag
    pub language: Option<String>,
    /// BCP 47 language tag
    pub language_ietf: Option<String>,
    pub codec_id: Option<String>,
}

impl MkvTrackInfo {
    pub fn is_subtitle(&self) -> bool {
        self.track_type == TRACK_TYPE_SUBTITLES
    }

    /// Whether mkvextract writes this track as SRT text
    pub fn is_srt(&self) -> bool {
        self.codec_id
            .as_deref()
            .is_none_or(|codec| codec == CODEC_ID_SRT)
    }
}

/// Parse mkvmerge's JSON identification output.
///
/// Output that is not valid JSON yields no tracks.
pub fn parse_mkvmerge_json(json: &str) -> Vec<MkvTrackInfo> {
    let value: Value = match from_str(json) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparseable mkvmerge output: {}", e);
            return Vec::new();
        }
    };

    let Some(tracks) = value.get("tracks").and_then(|t| t.as_array()) else {
        return Vec::new();
    };

    tracks
        .iter()
        .filter_map(|track| {
            let id = track.get("id").and_then(Value::as_u64)?;
            let properties = track.get("properties");
            let property = |key: &str| {
                properties
                    .and_then(|p| p.get(key))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };

            Some(MkvTrackInfo {
                id: u32::try_from(id).ok()?,
                track_type: track
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                name: property("track_name"),
                language: property("language"),
                language_ietf: property("language_ietf"),
                codec_id: property("codec_id"),
            })
        })
        .collect()
}

/// mkvtoolnix exit codes: 0 success, 1 warnings, 2 error
fn exit_ok(output: &Output) -> bool {
    matches!(output.status.code(), Some(0) | Some(1))
}

async fn run_tool(tool: &str, args: &[String], timeout: Duration) -> Result<Output, ToolError> {
    debug!("Running {} {}", tool, args.join(" "));

    let future = Command::new(tool).args(args).kill_on_drop(true).output();

    tokio::select! {
        result = future => {
            result.map_err(|e| ToolError::Spawn {
                tool: tool.to_string(),
                message: e.to_string(),
            })
        },
        _ = tokio::time::sleep(timeout) => {
            Err(ToolError::Timeout {
                tool: tool.to_string(),
                secs: timeout.as_secs(),
            })
        }
    }
}

/// List the subtitle tracks of a Matroska file
pub async fn list_subtitle_tracks<P: AsRef<Path>>(video: P) -> Result<Vec<MkvTrackInfo>, ToolError> {
    let video = video.as_ref();
    let args = vec![
        "-i".to_string(),
        "-J".to_string(),
        "--output-charset".to_string(),
        "UTF-8".to_string(),
        "--ui-language".to_string(),
        "en_US".to_string(),
        video.to_string_lossy().to_string(),
    ];

    let output = run_tool(MKVMERGE, &args, LIST_TIMEOUT).await?;

    if !exit_ok(&output) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(ToolError::Failed {
            tool: MKVMERGE.to_string(),
            code: output.status.code(),
            output: format!("{}{}", stderr.trim(), stdout.trim()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let tracks: Vec<MkvTrackInfo> = parse_mkvmerge_json(&stdout)
        .into_iter()
        .filter(MkvTrackInfo::is_subtitle)
        .collect();

    debug!("Found {} subtitle tracks in {:?}", tracks.len(), video);
    Ok(tracks)
}

/// Extract tracks to the given destinations in one mkvextract run
pub async fn extract_tracks<P: AsRef<Path>>(
    video: P,
    tracks: &[(u32, PathBuf)],
) -> Result<(), ToolError> {
    let video = video.as_ref();
    if tracks.is_empty() {
        return Ok(());
    }

    info!("Extracting {} embedded subtitles from {:?}", tracks.len(), video);

    let log_file = tempfile::NamedTempFile::new().map_err(|e| ToolError::Spawn {
        tool: MKVEXTRACT.to_string(),
        message: format!("cannot create log file: {}", e),
    })?;

    let mut args = vec!["tracks".to_string(), video.to_string_lossy().to_string()];
    args.extend(
        tracks
            .iter()
            .map(|(id, dest)| format!("{}:{}", id, dest.to_string_lossy())),
    );
    args.extend([
        "-r".to_string(),
        log_file.path().to_string_lossy().to_string(),
        "--ui-language".to_string(),
        "en_US".to_string(),
    ]);

    let output = run_tool(MKVEXTRACT, &args, EXTRACT_TIMEOUT).await?;

    if !exit_ok(&output) {
        let log_output = std::fs::read_to_string(log_file.path()).unwrap_or_default();
        error!(
            "Can't extract subtitles from {:?}, exit code {:?}",
            video,
            output.status.code()
        );
        return Err(ToolError::Failed {
            tool: MKVEXTRACT.to_string(),
            code: output.status.code(),
            output: log_output.trim().to_string(),
        });
    }

    Ok(())
}
