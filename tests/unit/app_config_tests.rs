/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use extractsubs::app_config::{Config, LogLevel};
use std::path::PathBuf;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert!(config.languages.is_empty());
    assert!(config.merge_languages.is_empty());
    assert_eq!(config.validation_regex, ".*");
    assert_eq!(config.legacy_cache_file_name, ".extractsubs");
    assert_eq!(config.merge.max_concurrent_jobs, 4);
    assert_eq!(config.merge.style.font_name, "Arial");
    assert_eq!(config.watch.poll_interval_secs, 10);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.languages = vec!["xx".to_string()];
    assert!(config.validate().is_err());
    config.languages = vec!["en".to_string()];

    config.merge_languages = vec!["ru".to_string()];
    assert!(config.validate().is_err());
    config.merge_languages = vec!["ru-fr".to_string()];

    config.validation_regex = "[".to_string();
    assert!(config.validate().is_err());
    config.validation_regex = ".*".to_string();

    config.merge.max_concurrent_jobs = 0;
    assert!(config.validate().is_err());
    config.merge.max_concurrent_jobs = 2;

    config.merge.style.font_name = "Arial,Bold".to_string();
    assert!(config.validate().is_err());
    config.merge.style.font_name = "Arial".to_string();

    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.languages, Config::default().languages);

    Ok(())
}

#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"merge_languages": ["en-fr"], "database_path": "/tmp/subs.sqlite3", "log_level": "debug"}"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.merge_languages, vec!["en-fr"]);
    assert_eq!(config.resolved_database_path(), PathBuf::from("/tmp/subs.sqlite3"));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.merge.max_concurrent_jobs, 4);

    Ok(())
}

#[test]
fn test_save_thenLoad_shouldKeepValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    let mut config = Config::default();
    config.merge.style.font_size = 40;
    config.watch.settle_interval_secs = 5;

    config.save(&path)?;
    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.merge.style, config.merge.style);
    assert_eq!(loaded.watch.settle_interval_secs, 5);

    Ok(())
}

#[test]
fn test_logLevel_parsing_shouldAcceptKnownNames() {
    assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    assert_eq!("trace".parse::<LogLevel>().unwrap().to_level_filter(), log::LevelFilter::Trace);
    assert!("loud".parse::<LogLevel>().is_err());
}
