/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for the scan database,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

use super::connection::{DatabaseConnection, DatabaseStats};
use super::models::{
    NewVideoSubtitle, SubtitleSource, VideoFileRecord, VideoSubtitleRecord, normalize_dir,
};
use crate::scanner::{ScanStore, ScannedFile};

/// Language value stored for subtitles of unknown language
const UNKNOWN_LANGUAGE: &str = "und";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new(path)?))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Video files
    // =========================================================================

    /// Insert a scanned video file
    pub async fn create_video_file(&self, dir: &str, filename: &str) -> Result<VideoFileRecord> {
        let dir = normalize_dir(dir);
        let filename = filename.to_string();

        self.db
            .execute_async(move |conn| Self::insert_video_file_sync(conn, &dir, &filename))
            .await
    }

    /// Find a video file by its full path
    pub async fn get_video_file_by_full_path(&self, path: &Path) -> Result<Option<VideoFileRecord>> {
        let Some((dir, filename)) = split_full_path(path) else {
            return Ok(None);
        };

        self.db
            .execute_async(move |conn| Self::find_video_file_sync(conn, &dir, &filename))
            .await
    }

    /// List every scanned video file
    pub async fn get_all_video_files(&self) -> Result<Vec<VideoFileRecord>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, dir, filename, scan_time FROM video_file ORDER BY dir, filename",
                )?;
                let rows = stmt
                    .query_map([], video_file_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    // =========================================================================
    // Subtitles
    // =========================================================================

    /// Insert a subtitle row for a video file
    pub async fn create_video_subtitle(
        &self,
        video_file_id: i64,
        subtitle: NewVideoSubtitle,
    ) -> Result<VideoSubtitleRecord> {
        self.db
            .execute_async(move |conn| Self::insert_subtitle_sync(conn, video_file_id, &subtitle))
            .await
    }

    /// Extracted and discovered subtitles of a video file
    pub async fn get_subtitles_by_video_file_id(
        &self,
        video_file_id: i64,
    ) -> Result<Vec<VideoSubtitleRecord>> {
        self.query_subtitles(video_file_id, false).await
    }

    /// Merged dual-language subtitles of a video file
    pub async fn get_merged_subtitles_by_video_file_id(
        &self,
        video_file_id: i64,
    ) -> Result<Vec<VideoSubtitleRecord>> {
        self.query_subtitles(video_file_id, true).await
    }

    async fn query_subtitles(&self, video_file_id: i64, merged: bool) -> Result<Vec<VideoSubtitleRecord>> {
        let sql = if merged {
            "SELECT id, video_file_id, full_path, language, track_id, source
             FROM video_subtitle WHERE video_file_id = ?1 AND source = 'merge' ORDER BY id"
        } else {
            "SELECT id, video_file_id, full_path, language, track_id, source
             FROM video_subtitle WHERE video_file_id = ?1 AND source != 'merge' ORDER BY id"
        };

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt
                    .query_map(params![video_file_id], subtitle_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// Store a video file with all its subtitles in one transaction.
    ///
    /// An existing row for the same path is replaced, including its subtitles.
    pub async fn import_video_file(
        &self,
        dir: &str,
        filename: &str,
        subtitles: Vec<NewVideoSubtitle>,
    ) -> Result<VideoFileRecord> {
        let dir = normalize_dir(dir);
        let filename = filename.to_string();

        self.db
            .transaction_async(move |tx| {
                if let Some(existing) = Self::find_video_file_sync(tx, &dir, &filename)? {
                    debug!("Replacing previous scan of {}/{}", dir, filename);
                    tx.execute("DELETE FROM video_subtitle WHERE video_file_id = ?1", params![existing.id])?;
                    tx.execute("DELETE FROM video_file WHERE id = ?1", params![existing.id])?;
                }

                let record = Self::insert_video_file_sync(tx, &dir, &filename)?;
                for subtitle in &subtitles {
                    Self::insert_subtitle_sync(tx, record.id, subtitle)?;
                }
                Ok(record)
            })
            .await
    }

    /// Record the outcome of scanning one video file
    pub async fn record_scanned_file(&self, file: &ScannedFile) -> Result<VideoFileRecord> {
        let mut rows: Vec<NewVideoSubtitle> = file
            .subtitles
            .iter()
            .map(|candidate| NewVideoSubtitle {
                full_path: candidate.path.to_string_lossy().to_string(),
                language: candidate
                    .language
                    .map(|language| language.to_639_3().to_string())
                    .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
                track_id: candidate.track_id.map(i64::from),
                source: candidate.source,
            })
            .collect();

        rows.extend(file.merged.iter().map(|merged| NewVideoSubtitle {
            full_path: merged.path.to_string_lossy().to_string(),
            language: merged.pair.storage_code(),
            track_id: None,
            source: SubtitleSource::Merge,
        }));

        self.import_video_file(&file.dir.to_string_lossy(), &file.file_name, rows)
            .await
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.db.stats()
    }

    // =========================================================================
    // Synchronous helpers, usable inside transactions
    // =========================================================================

    fn insert_video_file_sync(conn: &Connection, dir: &str, filename: &str) -> Result<VideoFileRecord> {
        let scan_time = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO video_file (dir, filename, scan_time) VALUES (?1, ?2, ?3)",
            params![dir, filename, scan_time],
        )?;

        Ok(VideoFileRecord {
            id: conn.last_insert_rowid(),
            dir: dir.to_string(),
            filename: filename.to_string(),
            scan_time,
        })
    }

    fn find_video_file_sync(conn: &Connection, dir: &str, filename: &str) -> Result<Option<VideoFileRecord>> {
        let record = conn
            .query_row(
                "SELECT id, dir, filename, scan_time FROM video_file WHERE dir = ?1 AND filename = ?2",
                params![dir, filename],
                video_file_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn insert_subtitle_sync(
        conn: &Connection,
        video_file_id: i64,
        subtitle: &NewVideoSubtitle,
    ) -> Result<VideoSubtitleRecord> {
        conn.execute(
            r#"
            INSERT INTO video_subtitle (video_file_id, full_path, language, track_id, source)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                video_file_id,
                subtitle.full_path,
                subtitle.language,
                subtitle.track_id,
                subtitle.source.to_string(),
            ],
        )?;

        Ok(VideoSubtitleRecord {
            id: conn.last_insert_rowid(),
            video_file_id,
            full_path: subtitle.full_path.clone(),
            language: subtitle.language.clone(),
            track_id: subtitle.track_id,
            source: subtitle.source,
        })
    }
}

#[async_trait]
impl ScanStore for Repository {
    async fn is_scanned(&self, path: &Path) -> Result<bool> {
        Ok(self.get_video_file_by_full_path(path).await?.is_some())
    }

    async fn record_scan(&self, file: &ScannedFile) -> Result<()> {
        self.record_scanned_file(file).await?;
        Ok(())
    }
}

/// Split a path into the stored `(dir, filename)` pair
fn split_full_path(path: &Path) -> Option<(String, String)> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let dir = path
        .parent()
        .map(|parent| normalize_dir(&parent.to_string_lossy()))
        .unwrap_or_default();
    Some((dir, filename))
}

fn video_file_from_row(row: &Row<'_>) -> rusqlite::Result<VideoFileRecord> {
    Ok(VideoFileRecord {
        id: row.get(0)?,
        dir: row.get(1)?,
        filename: row.get(2)?,
        scan_time: row.get(3)?,
    })
}

fn subtitle_from_row(row: &Row<'_>) -> rusqlite::Result<VideoSubtitleRecord> {
    Ok(VideoSubtitleRecord {
        id: row.get(0)?,
        video_file_id: row.get(1)?,
        full_path: row.get(2)?,
        language: row.get(3)?,
        track_id: row.get(4)?,
        source: row
            .get::<_, String>(5)?
            .parse()
            .unwrap_or(SubtitleSource::External),
    })
}
