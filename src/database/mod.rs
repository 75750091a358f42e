/*!
 * Database module for persistent scan state.
 *
 * This module provides SQLite-based persistence for:
 * - Scanned video files, so unchanged libraries are not scanned twice
 * - Extracted, discovered and merged subtitle files per video
 * - Import of the legacy JSON scan cache
 */

pub mod connection;
pub mod migration;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use migration::{MigrationOutcome, migrate_legacy_cache};
pub use models::{NewVideoSubtitle, SubtitleSource, VideoFileRecord, VideoSubtitleRecord};
pub use repository::Repository;
