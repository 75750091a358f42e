/*!
 * Cue model shared by the subtitle reader, the merge engine and the ASS writer.
 *
 * A `Cue` is one timed subtitle line. A `Track` is the ordered cue list read from
 * one subtitle file. A `MergedTrack` is the bilingual result of interleaving two
 * tracks under distinct `Role`s.
 */

use std::fmt;
use std::str::FromStr;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @const: SRT-style timestamp, `.` accepted as millisecond separator
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}):(\d{1,2}):(\d{1,2})[,.](\d{1,3})$").unwrap()
});

/// Non-negative time offset from the start of the video, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Zero offset
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`)
    pub fn parse_srt(value: &str) -> Result<Self, SubtitleError> {
        let value = value.trim();
        let caps = TIMESTAMP_REGEX
            .captures(value)
            .ok_or_else(|| SubtitleError::ParseError(format!("invalid timestamp '{}'", value)))?;

        let field = |idx: usize| -> u64 {
            caps.get(idx)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        let hours = field(1);
        let minutes = field(2);
        let seconds = field(3);

        // Short fractions are decimal fractions of a second: ",5" is 500ms
        let fraction = caps.get(4).map_or("0", |m| m.as_str());
        let millis = match fraction.len() {
            1 => field(4) * 100,
            2 => field(4) * 10,
            _ => field(4),
        };

        if minutes >= 60 || seconds >= 60 {
            return Err(SubtitleError::ParseError(format!(
                "invalid time components in timestamp '{}'",
                value
            )));
        }

        Ok(Timestamp(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis))
    }

    /// Format as SRT (`HH:MM:SS,mmm`)
    pub fn to_srt_string(self) -> String {
        let ms = self.0;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Format as ASS (`H:MM:SS.cc`), truncating to centiseconds
    pub fn to_ass_string(self) -> String {
        let ms = self.0;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let centis = (ms % 1_000) / 10;

        format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_srt_string())
    }
}

impl FromStr for Timestamp {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_srt(s)
    }
}

/// One timed subtitle line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Display lines, inline styling markers kept verbatim
    pub lines: Vec<String>,
}

impl Cue {
    /// Create a cue from text; embedded newlines split display lines
    pub fn new(start: Timestamp, end: Timestamp, text: &str) -> Self {
        Cue {
            start,
            end,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn from_millis(start_ms: u64, end_ms: u64, text: &str) -> Self {
        Self::new(Timestamp::from_millis(start_ms), Timestamp::from_millis(end_ms), text)
    }

    /// Text with lines joined by `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn duration_ms(&self) -> u64 {
        self.end.as_millis().saturating_sub(self.start.as_millis())
    }

    /// Whether two cues are on screen at the same time
    pub fn overlaps(&self, other: &Cue) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn has_text(&self) -> bool {
        self.lines.iter().any(|line| !line.trim().is_empty())
    }
}

/// Ordered cue sequence from one subtitle source, sorted by start time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    cues: Vec<Cue>,
}

impl Track {
    /// Empty track
    pub fn new() -> Self {
        Track { cues: Vec::new() }
    }

    /// Build a track from cues in file order.
    ///
    /// Fails with `ParseError` when a cue ends before it starts. Zero-length
    /// cues and cues without text are dropped with a warning. The result is
    /// stably sorted by start time, so ties keep their file order.
    pub fn from_cues(cues: Vec<Cue>) -> Result<Self, SubtitleError> {
        let mut kept = Vec::with_capacity(cues.len());

        for (index, cue) in cues.into_iter().enumerate() {
            if cue.end < cue.start {
                return Err(SubtitleError::ParseError(format!(
                    "cue {} ends at {} before it starts at {}",
                    index + 1,
                    cue.end,
                    cue.start
                )));
            }
            if cue.end == cue.start {
                warn!("Skipping zero-length subtitle cue {} at {}", index + 1, cue.start);
                continue;
            }
            if !cue.has_text() {
                warn!("Skipping empty subtitle cue {} at {}", index + 1, cue.start);
                continue;
            }
            kept.push(cue);
        }

        kept.sort_by_key(|cue| cue.start);

        Ok(Track { cues: kept })
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }

    /// Number of adjacent cue pairs that overlap in time
    pub fn overlap_count(&self) -> usize {
        self.cues
            .windows(2)
            .filter(|pair| pair[0].overlaps(&pair[1]))
            .count()
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

/// Screen region and source language of a cue in a merged track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Upper screen region; orders before `Bottom` on equal start times
    Top,
    /// Lower screen region
    Bottom,
}

impl Role {
    /// Name of the ASS style this role renders with
    pub fn style_name(self) -> &'static str {
        match self {
            Role::Top => "Top",
            Role::Bottom => "Bottom",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Top => write!(f, "top"),
            Role::Bottom => write!(f, "bottom"),
        }
    }
}

/// A cue tagged with the role it plays in a merged track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedCue {
    pub role: Role,
    pub cue: Cue,
}

/// Bilingual cue sequence, ordered by start time with Top before Bottom on ties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTrack {
    cues: Vec<MergedCue>,
}

impl MergedTrack {
    pub(crate) fn from_ordered(cues: Vec<MergedCue>) -> Self {
        MergedTrack { cues }
    }

    pub fn cues(&self) -> &[MergedCue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedCue> {
        self.cues.iter()
    }

    /// Cues of one role with the tag stripped, in merged order
    pub fn by_role(&self, role: Role) -> Track {
        Track {
            cues: self
                .cues
                .iter()
                .filter(|merged| merged.role == role)
                .map(|merged| merged.cue.clone())
                .collect(),
        }
    }

    pub fn count(&self, role: Role) -> usize {
        self.cues.iter().filter(|merged| merged.role == role).count()
    }
}

impl<'a> IntoIterator for &'a MergedTrack {
    type Item = &'a MergedCue;
    type IntoIter = std::slice::Iter<'a, MergedCue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}
