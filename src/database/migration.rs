/*!
 * Import of the JSON scan cache used before the SQLite database existed.
 *
 * The cache lives in the scanned root (`.extractsubs` by default). Once its
 * content is imported it is marked with `migration_complete` so it is never
 * imported twice.
 */

use anyhow::{Context, Result};
use log::{error, info};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::models::{NewVideoSubtitle, SubtitleSource};
use super::repository::Repository;
use crate::file_utils::FileManager;
use crate::language_utils::lookup_language;

/// Language as stored by the legacy cache encoder
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyLanguage {
    /// `{"_type": "iso639_3_lang", "value": "fra"}`
    Tagged { value: String },
    Plain(String),
}

impl LegacyLanguage {
    fn part3(&self) -> String {
        let code = match self {
            LegacyLanguage::Tagged { value } => value,
            LegacyLanguage::Plain(value) => value,
        };
        lookup_language(code)
            .map(|language| language.to_639_3().to_string())
            .unwrap_or_else(|| code.trim().to_lowercase())
    }
}

#[derive(Debug, Deserialize)]
struct LegacySubtitle {
    srt_full_path: String,
    srt_lang_code: LegacyLanguage,
    #[serde(default)]
    srt_track_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LegacyMergedSubtitle {
    srt_full_path: String,
    lang_top: LegacyLanguage,
    lang_bot: LegacyLanguage,
}

#[derive(Debug, Deserialize)]
struct LegacyFile {
    dir: String,
    filename: String,
    #[serde(default)]
    subtitles: Vec<LegacySubtitle>,
    #[serde(default)]
    merged_subtitles: Vec<LegacyMergedSubtitle>,
}

#[derive(Debug, Deserialize)]
struct LegacyCache {
    #[serde(default)]
    files: Vec<LegacyFile>,
    #[serde(default)]
    migration_complete: bool,
}

/// What happened to a legacy cache file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No cache file at the given path
    Missing,
    /// The cache was imported earlier
    AlreadyComplete,
    /// The cache could not be decoded and was left untouched
    Malformed,
    /// The cache was imported
    Migrated { files: usize },
}

/// Import the legacy cache at `cache_path` into the database
pub async fn migrate_legacy_cache(repo: &Repository, cache_path: &Path) -> Result<MigrationOutcome> {
    if !FileManager::file_exists(cache_path) {
        return Ok(MigrationOutcome::Missing);
    }

    let content = fs::read_to_string(cache_path)
        .with_context(|| format!("Failed to read legacy cache: {:?}", cache_path))?;

    let mut document: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            error!("Open cache file {:?} error {}", cache_path, e);
            return Ok(MigrationOutcome::Malformed);
        }
    };

    let cache: LegacyCache = match serde_json::from_value(document.clone()) {
        Ok(cache) => cache,
        Err(e) => {
            error!("Unexpected legacy cache layout in {:?}: {}", cache_path, e);
            return Ok(MigrationOutcome::Malformed);
        }
    };

    if cache.migration_complete {
        return Ok(MigrationOutcome::AlreadyComplete);
    }

    for file in &cache.files {
        let mut rows: Vec<NewVideoSubtitle> = file
            .subtitles
            .iter()
            .map(|subtitle| NewVideoSubtitle {
                full_path: subtitle.srt_full_path.clone(),
                language: subtitle.srt_lang_code.part3(),
                track_id: subtitle.srt_track_id,
                source: SubtitleSource::Embedded,
            })
            .collect();

        rows.extend(file.merged_subtitles.iter().map(|merged| NewVideoSubtitle {
            full_path: merged.srt_full_path.clone(),
            language: format!("{},{}", merged.lang_top.part3(), merged.lang_bot.part3()),
            track_id: None,
            source: SubtitleSource::Merge,
        }));

        let record = repo.import_video_file(&file.dir, &file.filename, rows).await?;
        info!("Migrated {} from legacy cache, id: {}", record.filename, record.id);
    }

    if let Value::Object(map) = &mut document {
        map.insert("migration_complete".to_string(), Value::Bool(true));
    }
    let updated = serde_json::to_string_pretty(&document).context("Failed to serialize legacy cache")?;
    FileManager::write_atomic(cache_path, &updated)
        .with_context(|| format!("Failed to update legacy cache: {:?}", cache_path))?;

    Ok(MigrationOutcome::Migrated {
        files: cache.files.len(),
    })
}
