use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, warn};

use crate::cue::{Cue, Timestamp, Track};
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @module: Subtitle track reader (SRT cue records)

/// Read a subtitle file into a track.
///
/// Fails with `NotFound` when the path does not exist and with `ParseError`
/// when the content is not UTF-8 or cannot be decoded as cue records.
pub fn read_track<P: AsRef<Path>>(path: P) -> Result<Track, SubtitleError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SubtitleError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SubtitleError::NotFound(path.to_path_buf()),
        _ => SubtitleError::io(path, e),
    })?;

    let content = String::from_utf8(bytes).map_err(|e| {
        SubtitleError::ParseError(format!("{}: content is not valid UTF-8 ({})", path.display(), e))
    })?;

    let track = parse_track(&content).map_err(|e| match e {
        SubtitleError::ParseError(message) => {
            SubtitleError::ParseError(format!("{}: {}", path.display(), message))
        }
        other => other,
    })?;

    debug!("Read {} cues from {}", track.len(), path.display());
    Ok(track)
}

/// Parse SRT content into a track
pub fn parse_track(content: &str) -> Result<Track, SubtitleError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut cues: Vec<Cue> = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                push_block(&mut cues, &block)?;
                block.clear();
            }
            continue;
        }
        block.push((index + 1, line));
    }

    if !block.is_empty() {
        push_block(&mut cues, &block)?;
    }

    let track = Track::from_cues(cues)?;

    let overlap_count = track.overlap_count();
    if overlap_count > 0 {
        debug!("Found {} overlapping subtitle cues", overlap_count);
    }

    Ok(track)
}

/// Parse one blank-line separated block and append it to `cues`
fn push_block(cues: &mut Vec<Cue>, block: &[(usize, &str)]) -> Result<(), SubtitleError> {
    let (first_line_no, first) = block[0];
    let first = first.trim();

    let has_index = first.parse::<u64>().is_ok()
        && block.get(1).is_some_and(|(_, line)| is_timing_line(line));

    let timing_index = if is_timing_line(first) {
        0
    } else if has_index {
        1
    } else if block.len() == 1 && first.parse::<usize>().ok() == Some(cues.len() + 1) {
        return Err(SubtitleError::ParseError(format!(
            "line {}: truncated cue, index {} has no timing line",
            first_line_no, first
        )));
    } else {
        // Text after a blank line inside a cue belongs to the previous cue
        return match cues.last_mut() {
            Some(previous) => {
                warn!("Line {}: blank line inside cue text, joining with previous cue", first_line_no);
                previous
                    .lines
                    .extend(block.iter().map(|(_, line)| line.trim_end().to_string()));
                Ok(())
            }
            None => Err(SubtitleError::ParseError(format!(
                "line {}: unexpected text before the first cue: '{}'",
                first_line_no, first
            ))),
        };
    };

    let (timing_line_no, timing_line) = block[timing_index];
    let (start, end) = parse_timing_line(timing_line)
        .map_err(|e| SubtitleError::ParseError(format!("line {}: {}", timing_line_no, e)))?;

    let lines = block[timing_index + 1..]
        .iter()
        .map(|(_, line)| line.trim_end().to_string())
        .collect();

    cues.push(Cue { start, end, lines });
    Ok(())
}

fn is_timing_line(line: &str) -> bool {
    line.contains("-->")
}

/// Parse `start --> end`, ignoring any position hints after the end time
fn parse_timing_line(line: &str) -> Result<(Timestamp, Timestamp), String> {
    let (left, right) = line
        .split_once("-->")
        .ok_or_else(|| format!("missing '-->' in timing line '{}'", line.trim()))?;

    let end_token = right.split_whitespace().next().unwrap_or_default();

    let start = Timestamp::parse_srt(left).map_err(|e| e.to_string())?;
    let end = Timestamp::parse_srt(end_token).map_err(|e| e.to_string())?;

    Ok((start, end))
}

impl Track {
    /// Render the track as SRT, numbering cues from 1
    pub fn to_srt_string(&self) -> String {
        let mut output = String::new();
        for (index, cue) in self.iter().enumerate() {
            let _ = writeln!(output, "{}", index + 1);
            let _ = writeln!(output, "{} --> {}", cue.start, cue.end);
            let _ = writeln!(output, "{}", cue.text());
            let _ = writeln!(output);
        }
        output
    }

    /// Write the track to an SRT file
    pub fn write_srt<P: AsRef<Path>>(&self, path: P) -> Result<(), SubtitleError> {
        let path = path.as_ref();
        FileManager::write_atomic(path, &self.to_srt_string())
            .map_err(|e| SubtitleError::io(path, e))
    }
}
