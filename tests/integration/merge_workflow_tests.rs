/*!
 * End-to-end merge tests through real files
 */

use anyhow::Result;
use extractsubs::app_config::StyleConfig;
use extractsubs::errors::SubtitleError;
use extractsubs::language_utils::LanguagePair;
use extractsubs::merge_jobs::{MergeJob, merge_files, run_merge_jobs};
use std::fs;
use crate::common;

#[test]
fn test_mergeFiles_withSampleTracks_shouldWriteInterleavedDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let top = common::create_test_file(temp_dir.path(), "movie.en.srt", common::ENGLISH_SRT)?;
    let bottom = common::create_test_file(temp_dir.path(), "movie.fr.srt", common::FRENCH_SRT)?;
    let output = temp_dir.path().join("movie.en_fr.ass");

    let outcome = merge_files(&top, &bottom, &output, &StyleConfig::default())?;
    assert_eq!(outcome.top_cues, 3);
    assert_eq!(outcome.bottom_cues, 2);

    let content = fs::read_to_string(&output)?;
    let dialogues: Vec<&str> = content.lines().filter(|l| l.starts_with("Dialogue:")).collect();
    assert_eq!(dialogues.len(), 5);
    assert!(dialogues[0].contains(",Top,"));
    assert!(dialogues[1].contains(",Bottom,"));
    assert!(dialogues[2].starts_with("Dialogue: 0,0:00:05.00,0:00:09.00,Top,"));
    assert!(dialogues[3].starts_with("Dialogue: 0,0:00:05.00,0:00:08.00,Bottom,"));

    Ok(())
}

#[test]
fn test_mergeFiles_withBackwardsCue_shouldFailWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let top = common::create_test_file(
        temp_dir.path(),
        "top.srt",
        "1\n00:00:04,000 --> 00:00:02,000\nBackwards\n",
    )?;
    let bottom = common::create_test_file(temp_dir.path(), "bottom.srt", common::FRENCH_SRT)?;
    let output = temp_dir.path().join("out.ass");

    let err = merge_files(&top, &bottom, &output, &StyleConfig::default()).unwrap_err();
    assert!(matches!(err, SubtitleError::ParseError(_)));
    assert!(!output.exists());

    Ok(())
}

#[test]
fn test_mergeFiles_withEmptyTracks_shouldWriteHeaderOnlyFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let top = common::create_test_file(temp_dir.path(), "top.srt", "")?;
    let bottom = common::create_test_file(temp_dir.path(), "bottom.srt", "\n")?;
    let output = temp_dir.path().join("out.ass");

    merge_files(&top, &bottom, &output, &StyleConfig::default())?;

    let content = fs::read_to_string(&output)?;
    assert!(content.contains("[Events]"));
    assert!(!content.contains("Dialogue:"));

    Ok(())
}

#[tokio::test]
async fn test_runMergeJobs_withManyJobs_shouldRunAllWithBoundedConcurrency() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let top = common::create_test_file(temp_dir.path(), "en.srt", common::ENGLISH_SRT)?;
    let bottom = common::create_test_file(temp_dir.path(), "fr.srt", common::FRENCH_SRT)?;
    let pair: LanguagePair = "en-fr".parse()?;

    let jobs: Vec<MergeJob> = (0..8)
        .map(|i| MergeJob {
            top: top.clone(),
            bottom: bottom.clone(),
            output: temp_dir.path().join(format!("out_{}.ass", i)),
            pair,
        })
        .collect();

    let results = run_merge_jobs(jobs, &StyleConfig::default(), 3).await;
    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|(_, result)| result.is_ok()));
    for i in 0..8 {
        assert!(temp_dir.path().join(format!("out_{}.ass", i)).exists());
    }

    Ok(())
}
