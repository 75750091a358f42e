/*!
 * Tests for the cue model
 */

use extractsubs::cue::{Cue, Role, Timestamp, Track};

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts: Timestamp = "01:23:45,678".parse().unwrap();
    assert_eq!(ts.as_millis(), 5_025_678);
    assert_eq!(ts.to_srt_string(), "01:23:45,678");
    assert_eq!(ts.to_ass_string(), "1:23:45.67");
}

#[test]
fn test_timestamp_parsing_withOutOfRangeMinutes_shouldFail() {
    assert!(Timestamp::parse_srt("00:75:00,000").is_err());
    assert!(Timestamp::parse_srt("garbage").is_err());
}

#[test]
fn test_timestamp_ordering_shouldFollowMillis() {
    assert!(Timestamp::from_millis(999) < Timestamp::from_millis(1_000));
    assert_eq!(Timestamp::ZERO, Timestamp::from_millis(0));
}

#[test]
fn test_cue_new_withMultilineText_shouldSplitLines() {
    let cue = Cue::from_millis(1_000, 2_500, "Hello\nthere");
    assert_eq!(cue.lines, vec!["Hello".to_string(), "there".to_string()]);
    assert_eq!(cue.text(), "Hello\nthere");
    assert_eq!(cue.duration_ms(), 1_500);
}

#[test]
fn test_cue_overlaps_withTouchingCues_shouldNotOverlap() {
    let first = Cue::from_millis(0, 1_000, "a");
    let touching = Cue::from_millis(1_000, 2_000, "b");
    let inside = Cue::from_millis(500, 700, "c");

    assert!(!first.overlaps(&touching));
    assert!(first.overlaps(&inside));
    assert!(inside.overlaps(&first));
}

#[test]
fn test_track_fromCues_withUnsortedInput_shouldSortStably() {
    let track = Track::from_cues(vec![
        Cue::from_millis(5_000, 6_000, "late"),
        Cue::from_millis(1_000, 2_000, "first"),
        Cue::from_millis(1_000, 3_000, "second"),
    ])
    .unwrap();

    let texts: Vec<String> = track.iter().map(Cue::text).collect();
    assert_eq!(texts, vec!["first", "second", "late"]);
    assert_eq!(track.overlap_count(), 1);
}

#[test]
fn test_track_fromCues_withBackwardsCue_shouldFail() {
    let result = Track::from_cues(vec![Cue::from_millis(2_000, 1_000, "backwards")]);
    assert!(result.unwrap_err().is_parse_error());
}

#[test]
fn test_track_fromCues_withZeroLengthOrBlankCue_shouldDropIt() {
    let track = Track::from_cues(vec![
        Cue::from_millis(1_000, 1_000, "flash"),
        Cue::from_millis(2_000, 3_000, "   "),
        Cue::from_millis(4_000, 5_000, "kept"),
    ])
    .unwrap();

    assert_eq!(track.len(), 1);
    assert_eq!(track.cues()[0].text(), "kept");
}

#[test]
fn test_role_ordering_shouldPlaceTopFirst() {
    assert!(Role::Top < Role::Bottom);
    assert_eq!(Role::Top.style_name(), "Top");
    assert_eq!(Role::Bottom.to_string(), "bottom");
}
