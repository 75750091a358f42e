/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use extractsubs::app_config::Config;
use extractsubs::app_controller::{Controller, RunSummary};
use extractsubs::database::{Repository, SubtitleSource};
use extractsubs::providers::mock::{MockBehavior, MockProvider};
use std::fs;
use std::sync::Arc;
use crate::common;

fn controller_with(merge_languages: &[&str], repo: &Repository) -> Result<Controller> {
    let mut config = Config::default();
    config.merge_languages = merge_languages.iter().map(|s| s.to_string()).collect();
    Controller::with_config(config, Arc::new(repo.clone()))
}

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let repo = Repository::new_in_memory()?;
    let controller = Controller::with_config(Config::default(), Arc::new(repo))?;
    assert!(controller.config().merge_languages.is_empty());
    assert!(controller.config().languages.is_empty());
    Ok(())
}

#[test]
fn test_controller_withInvalidPair_shouldFail() -> Result<()> {
    let repo = Repository::new_in_memory()?;
    assert!(controller_with(&["ru"], &repo).is_err());
    Ok(())
}

/// Test a full scan of a small library, then a rescan
#[test]
fn test_run_withLibrary_shouldMergeOnceAndRemember() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let season = temp_dir.path().join("season1");
    common::create_test_video(&season, "ep1.avi")?;
    common::create_test_file(&season, "ep1.en.srt", common::ENGLISH_SRT)?;
    common::create_test_file(&season, "ep1.fr.srt", common::FRENCH_SRT)?;
    common::create_test_video(&season, "ep2.mp4")?;
    common::create_test_file(&season, "ep2_en.srt", common::ENGLISH_SRT)?;

    let repo = Repository::new_in_memory()?;
    let controller = controller_with(&["en-fr"], &repo)?;

    let summary = tokio_test::block_on(controller.run(temp_dir.path()))?;
    assert_eq!(summary.files_scanned, 2);
    assert_eq!(summary.merges_written, 1);
    assert_eq!(summary.merges_failed, 0);
    assert!(season.join("ep1.en_fr.ass").exists());
    assert!(!season.join("ep2.en_fr.ass").exists());

    let content = fs::read_to_string(season.join("ep1.en_fr.ass"))?;
    assert!(content.contains("This is a test subtitle."));
    assert!(content.contains("Ceci est un sous-titre de test."));

    let again = tokio_test::block_on(controller.run(temp_dir.path()))?;
    assert_eq!(again, RunSummary::default());
    assert_eq!(repo.stats()?.video_files, 2);

    Ok(())
}

/// Test that a missing language is downloaded and merged in the same scan
#[tokio::test]
async fn test_run_withProvider_shouldDownloadOnlyMissingLanguages() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    common::create_test_video(temp_dir.path(), "ep1.avi")?;
    common::create_test_file(temp_dir.path(), "ep1.en.srt", common::ENGLISH_SRT)?;
    common::create_test_file(temp_dir.path(), "ep1.fr.srt", common::FRENCH_SRT)?;
    common::create_test_video(temp_dir.path(), "ep2.avi")?;
    common::create_test_file(temp_dir.path(), "ep2.en.srt", common::ENGLISH_SRT)?;

    let repo = Repository::new_in_memory()?;
    let provider = Arc::new(MockProvider::new(MockBehavior::Found(common::FRENCH_SRT.to_string())));
    let controller = controller_with(&["en-fr"], &repo)?.with_provider(provider.clone());

    let summary = controller.run(temp_dir.path()).await?;
    assert_eq!(summary.subtitles_downloaded, 1);
    assert_eq!(summary.merges_written, 2);
    assert_eq!(provider.request_count(), 1);
    assert!(temp_dir.path().join("ep2.fr.srt").exists());
    assert!(temp_dir.path().join("ep2.en_fr.ass").exists());

    let record = repo
        .get_video_file_by_full_path(&temp_dir.path().join("ep2.avi"))
        .await?
        .expect("ep2 recorded");
    let subtitles = repo.get_subtitles_by_video_file_id(record.id).await?;
    assert!(subtitles.iter().any(|s| s.source == SubtitleSource::Downloaded && s.language == "fra"));
    Ok(())
}

/// Test that provider failures never fail the scan
#[tokio::test]
async fn test_run_withFailingProvider_shouldStillRecordFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_video(temp_dir.path(), "ep1.avi")?;
    common::create_test_file(temp_dir.path(), "ep1.en.srt", common::ENGLISH_SRT)?;

    let repo = Repository::new_in_memory()?;
    let provider = Arc::new(MockProvider::new(MockBehavior::Failing));
    let controller = controller_with(&["en-fr"], &repo)?.with_provider(provider);

    let summary = controller.run(temp_dir.path()).await?;
    assert_eq!(summary.files_scanned, 1);
    assert_eq!(summary.subtitles_downloaded, 0);
    assert_eq!(summary.merges_written, 0);
    assert!(!summary.has_failures());
    Ok(())
}
