/*!
 * Tests for ASS output
 */

use anyhow::Result;
use extractsubs::app_config::StyleConfig;
use extractsubs::ass_writer::{AssStyle, AssWriter};
use extractsubs::cue::{Cue, Role, Track};
use extractsubs::merge::merge;
use std::fs;
use crate::common;

#[test]
fn test_forRole_shouldPlaceTopAboveBottom() {
    let config = StyleConfig::default();
    let top = AssStyle::for_role(Role::Top, &config);
    let bottom = AssStyle::for_role(Role::Bottom, &config);

    assert_eq!(top.name, "Top");
    assert_eq!(top.alignment, 8);
    assert_eq!(bottom.alignment, 2);
    assert_eq!(top.primary_colour, config.top_colour);
    assert_eq!(bottom.primary_colour, config.bottom_colour);
}

#[test]
fn test_render_withEmptyTrack_shouldWriteHeadersOnly() {
    let writer = AssWriter::default();
    let document = writer.render(&merge(&Track::new(), &Track::new()));

    assert!(document.starts_with("[Script Info]\n"));
    assert!(document.contains("[V4+ Styles]\n"));
    assert!(document.contains("Style: Top,"));
    assert!(document.contains("Style: Bottom,"));
    assert!(document.contains("[Events]\n"));
    assert!(!document.contains("Dialogue:"));
}

#[test]
fn test_render_withCustomStyle_shouldUseIt() {
    let style = StyleConfig {
        font_name: "DejaVu Sans".to_string(),
        play_res_x: 1280,
        play_res_y: 720,
        ..StyleConfig::default()
    };
    let writer = AssWriter::new(style);
    let document = writer.render(&merge(&Track::new(), &Track::new()));

    assert!(document.contains("PlayResX: 1280\n"));
    assert!(document.contains("PlayResY: 720\n"));
    assert!(document.contains("Style: Top,DejaVu Sans,"));
}

#[test]
fn test_write_shouldPersistOneDialoguePerCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let top = Track::from_cues(vec![Cue::from_millis(1_230, 2_000, "Line one\nLine two")])?;
    let bottom = Track::from_cues(vec![Cue::from_millis(1_500, 2_500, "Ligne")])?;
    let path = temp_dir.path().join("out.ass");

    AssWriter::default().write(&merge(&top, &bottom), &path)?;

    let content = fs::read_to_string(&path)?;
    assert!(content.contains("Dialogue: 0,0:00:01.23,0:00:02.00,Top,,0,0,0,,Line one\\NLine two\n"));
    assert!(content.contains("Dialogue: 0,0:00:01.50,0:00:02.50,Bottom,,0,0,0,,Ligne\n"));
    assert_eq!(content.matches("Dialogue:").count(), 2);

    Ok(())
}
