/*!
 * Tests for the scan database
 */

use anyhow::Result;
use extractsubs::database::{
    MigrationOutcome, NewVideoSubtitle, Repository, SubtitleSource, migrate_legacy_cache,
};
use extractsubs::language_utils::{LanguagePair, parse_language};
use extractsubs::scanner::{MergedSubtitle, ScanStore, ScannedFile, SubtitleCandidate};
use std::fs;
use std::path::{Path, PathBuf};
use crate::common;

fn scanned_movie() -> ScannedFile {
    let mut file = ScannedFile::from_path("/media/movies/movie.mkv").unwrap();
    file.subtitles.push(SubtitleCandidate {
        path: PathBuf::from("/media/movies/movie_ru.srt"),
        language: Some(parse_language("ru").unwrap()),
        track_id: Some(3),
        source: SubtitleSource::Embedded,
    });
    file.subtitles.push(SubtitleCandidate {
        path: PathBuf::from("/media/movies/movie.srt"),
        language: None,
        track_id: None,
        source: SubtitleSource::External,
    });
    file.merged.push(MergedSubtitle {
        path: PathBuf::from("/media/movies/movie.ru_fr.ass"),
        pair: "ru-fr".parse::<LanguagePair>().unwrap(),
    });
    file
}

#[tokio::test]
async fn test_scanStore_recordScan_shouldMarkFileScanned() -> Result<()> {
    let repo = Repository::new_in_memory()?;
    let path = Path::new("/media/movies/movie.mkv");
    assert!(!repo.is_scanned(path).await?);

    repo.record_scan(&scanned_movie()).await?;
    assert!(repo.is_scanned(path).await?);

    let record = repo.get_video_file_by_full_path(path).await?.expect("recorded");
    assert_eq!(record.full_path(), PathBuf::from("/media/movies/movie.mkv"));

    let subtitles = repo.get_subtitles_by_video_file_id(record.id).await?;
    assert_eq!(subtitles.len(), 2);
    assert_eq!(subtitles[0].language, "rus");
    assert_eq!(subtitles[0].track_id, Some(3));
    assert_eq!(subtitles[1].language, "und");
    assert_eq!(subtitles[1].source, SubtitleSource::External);

    let merged = repo.get_merged_subtitles_by_video_file_id(record.id).await?;
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].language, "rus,fra");

    Ok(())
}

#[tokio::test]
async fn test_createVideoSubtitle_shouldAttachToFile() -> Result<()> {
    let repo = Repository::new_in_memory()?;
    let file = repo.create_video_file("/media", "clip.avi").await?;

    repo.create_video_subtitle(
        file.id,
        NewVideoSubtitle {
            full_path: "/media/clip.en.srt".to_string(),
            language: "eng".to_string(),
            track_id: None,
            source: SubtitleSource::External,
        },
    )
    .await?;

    let stats = repo.stats()?;
    assert_eq!(stats.video_files, 1);
    assert_eq!(stats.subtitles, 1);
    assert_eq!(stats.merged_subtitles, 0);
    assert_eq!(repo.get_all_video_files().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_repository_open_shouldPersistAcrossConnections() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("db").join(".extract-subs.sqlite3");

    {
        let repo = Repository::open(&db_path)?;
        repo.record_scan(&scanned_movie()).await?;
    }

    let reopened = Repository::open(&db_path)?;
    assert!(reopened.is_scanned(Path::new("/media/movies/movie.mkv")).await?);

    Ok(())
}

#[tokio::test]
async fn test_migrateLegacyCache_withPlainLanguageCodes_shouldImport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let cache_path = common::create_test_file(
        temp_dir.path(),
        ".extractsubs",
        r#"{"files": [{"dir": "/media", "filename": "a.mkv",
            "subtitles": [{"srt_full_path": "/media/a_fr.srt", "srt_lang_code": "fre"}]}]}"#,
    )?;
    let repo = Repository::new_in_memory()?;

    let outcome = migrate_legacy_cache(&repo, &cache_path).await?;
    assert_eq!(outcome, MigrationOutcome::Migrated { files: 1 });

    let record = repo
        .get_video_file_by_full_path(Path::new("/media/a.mkv"))
        .await?
        .expect("migrated");
    let subtitles = repo.get_subtitles_by_video_file_id(record.id).await?;
    assert_eq!(subtitles[0].language, "fra");

    let updated: serde_json::Value = serde_json::from_str(&fs::read_to_string(&cache_path)?)?;
    assert_eq!(updated["migration_complete"], serde_json::Value::Bool(true));

    Ok(())
}

#[tokio::test]
async fn test_repository_open_withUnversionedDatabase_shouldKeepRecordingScans() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join(".extract-subs.sqlite3");

    {
        let conn = rusqlite::Connection::open(&db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS video_file (
                id INTEGER PRIMARY KEY,
                dir TEXT NOT NULL,
                filename TEXT NOT NULL,
                scan_time TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS video_subtitle (
                id integer PRIMARY key,
                video_file_id integer not NULL,
                full_path TEXT NOT NULL,
                language_iso639_3 TEXT NOT NULL,
                track_id INTEGER,
                source TEXT NOT NULL,
                FOREIGN KEY(video_file_id) REFERENCES video_file(id));
            INSERT INTO video_file (dir, filename, scan_time) VALUES ('/media', 'old.mkv', '2021-03-04T05:06:07');
            INSERT INTO video_subtitle (video_file_id, full_path, language_iso639_3, track_id, source)
                VALUES (1, '/media/old.ru_fr.ass', 'rus,fra', NULL, 'Merge');
            "#,
        )?;
    }

    let repo = Repository::open(&db_path)?;
    assert!(repo.is_scanned(Path::new("/media/old.mkv")).await?);

    let old = repo
        .get_video_file_by_full_path(Path::new("/media/old.mkv"))
        .await?
        .expect("kept");
    let merged = repo.get_merged_subtitles_by_video_file_id(old.id).await?;
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].source, SubtitleSource::Merge);

    repo.record_scan(&scanned_movie()).await?;
    assert!(repo.is_scanned(Path::new("/media/movies/movie.mkv")).await?);
    assert_eq!(repo.stats()?.video_files, 2);

    Ok(())
}
