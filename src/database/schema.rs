/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the scan tables and upgrades
 * databases created before the schema was versioned.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Enforced per connection, not stored in the file
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        if table_exists(conn, "video_subtitle")? {
            info!("Upgrading unversioned scan database to schema v{}", SCHEMA_VERSION);
            upgrade_unversioned_tables(conn)?;
        } else {
            info!("Initializing database schema v{}", SCHEMA_VERSION);
        }
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get(0),
        )
        .with_context(|| format!("Failed to check {} table existence", name))?;
    Ok(exists)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns.iter().any(|name| name == column))
}

/// Bring tables written by the earlier scanner (no `schema_version` table)
/// to the current layout.
///
/// That scanner named the language column `language_iso639_3` and stored the
/// sources `FILE` and `Merge`.
fn upgrade_unversioned_tables(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    if column_exists(&tx, "video_subtitle", "language_iso639_3")? {
        tx.execute_batch("ALTER TABLE video_subtitle RENAME COLUMN language_iso639_3 TO language;")
            .context("Failed to rename video_subtitle.language_iso639_3")?;
    }

    tx.execute_batch(
        r#"
        UPDATE video_subtitle SET source = 'embedded' WHERE lower(source) = 'file';
        UPDATE video_subtitle SET source = lower(source) WHERE source != lower(source);
        "#,
    )
    .context("Failed to normalize video_subtitle sources")?;

    tx.commit()?;
    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS video_file (
            id INTEGER PRIMARY KEY,
            dir TEXT NOT NULL,
            filename TEXT NOT NULL,
            scan_time TEXT NOT NULL,
            UNIQUE(dir, filename)
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS video_subtitle (
            id INTEGER PRIMARY KEY,
            video_file_id INTEGER NOT NULL REFERENCES video_file(id) ON DELETE CASCADE,
            full_path TEXT NOT NULL,
            language TEXT NOT NULL,
            track_id INTEGER,
            source TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_video_subtitle_file ON video_subtitle(video_file_id);
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}
