/*!
 * Tests for file system utilities
 */

use anyhow::Result;
use extractsubs::file_utils::{FileFilter, FileManager, is_video_file};
use std::fs;
use std::path::Path;
use crate::common;

#[test]
fn test_isVideoFile_shouldCheckExtensionCaseInsensitively() {
    assert!(is_video_file("movie.mkv"));
    assert!(is_video_file("MOVIE.MPEG"));
    assert!(is_video_file("clip.avi"));
    assert!(!is_video_file("movie.srt"));
    assert!(!is_video_file("movie"));
}

#[test]
fn test_fileFilter_withRegex_shouldMatchFromStartOfName() -> Result<()> {
    let filter = FileFilter::new("Show")?;
    assert!(filter.accepts("/media/Show.S01E01.mkv"));
    assert!(!filter.accepts("/media/My.Show.S01E01.mkv"));
    assert!(!filter.accepts("/media/Show.S01E01.srt"));
    Ok(())
}

#[test]
fn test_fileFilter_withInvalidRegex_shouldFail() {
    assert!(FileFilter::new("(unclosed").is_err());
}

#[test]
fn test_fileFilter_shouldRejectSystemFolders() {
    let filter = FileFilter::accept_all();
    assert!(!filter.accepts("/share/@Recycle/movie.mkv"));
    assert!(!filter.accepts("/share/@Recently-Snapshot/GMT+01/movie.mkv"));
    assert!(filter.accepts("/share/movies/movie.mkv"));
}

#[test]
fn test_findVideoFiles_shouldWalkTreeSortedAndSkipSystemFolders() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_video(root, "b.mkv")?;
    common::create_test_video(root, "a.mp4")?;
    common::create_test_video(root, "season/c.avi")?;
    common::create_test_video(root, "@Recycle/old.mkv")?;
    common::create_test_subtitle(root, "a.en.srt")?;

    let files = FileManager::find_video_files(root, &FileFilter::accept_all())?;
    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
        .collect();

    let nested = Path::new("season").join("c.avi").to_string_lossy().to_string();
    assert_eq!(names, vec!["a.mp4".to_string(), "b.mkv".to_string(), nested]);
    Ok(())
}

#[test]
fn test_findVideoFiles_withSingleFile_shouldReturnIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_video(temp_dir.path(), "movie.mkv")?;

    let files = FileManager::find_video_files(&video, &FileFilter::accept_all())?;
    assert_eq!(files, vec![video]);
    Ok(())
}

#[test]
fn test_writeAtomic_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.txt");

    FileManager::write_atomic(&path, "first")?;
    FileManager::write_atomic(&path, "second")?;

    assert_eq!(fs::read_to_string(&path)?, "second");
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);
    Ok(())
}

#[test]
fn test_ensureDir_shouldCreateNestedDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    assert!(nested.is_dir());
    assert!(!FileManager::file_exists(&nested));
    Ok(())
}
