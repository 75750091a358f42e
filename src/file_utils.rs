use anyhow::{Context, Result};
use log::warn;
use regex::Regex;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::{DirEntry, WalkDir};

// @module: File and directory utilities

// @const: Video containers the scanner looks at
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mkv", "mp4", "avi", "mpg", "mpeg"];

// @const: NAS housekeeping folders that never hold library content
const SYSTEM_FOLDERS: [&str; 2] = ["@Recycle", "@Recently-Snapshot"];

/// Decides which files in the library are scanned
#[derive(Debug, Clone)]
pub struct FileFilter {
    validation: Option<Regex>,
}

impl FileFilter {
    /// Build a filter; the pattern must match from the start of the file name
    pub fn new(pattern: &str) -> Result<Self> {
        let validation = Regex::new(&format!("^(?:{})", pattern))
            .with_context(|| format!("Invalid validation regex: {}", pattern))?;
        Ok(Self {
            validation: Some(validation),
        })
    }

    /// Filter accepting every supported video file
    pub fn accept_all() -> Self {
        Self { validation: None }
    }

    pub fn accepts<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();

        if is_in_system_folder(path) || !is_video_file(path) {
            return false;
        }

        match &self.validation {
            Some(validation) => path
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|name| validation.is_match(name)),
            None => true,
        }
    }
}

/// Whether the path has a supported video extension
pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}

fn is_system_folder_name(name: &str) -> bool {
    SYSTEM_FOLDERS.iter().any(|folder| name.starts_with(folder))
}

fn is_in_system_folder(path: &Path) -> bool {
    path.parent().is_some_and(|parent| {
        parent
            .components()
            .any(|component| component.as_os_str().to_str().is_some_and(is_system_folder_name))
    })
}

fn is_walkable(entry: &DirEntry) -> bool {
    !(entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(is_system_folder_name))
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find the video files accepted by `filter` under `root`.
    ///
    /// `root` may also be a single file. Unreadable entries are logged and
    /// skipped. Results are sorted by path.
    pub fn find_video_files<P: AsRef<Path>>(root: P, filter: &FileFilter) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();

        if !root.exists() {
            return Err(anyhow::anyhow!("Path does not exist: {:?}", root));
        }

        if root.is_file() {
            return Ok(if filter.accepts(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let mut result = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_walkable)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_file() && filter.accepts(path) {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Replace `path` with `content` in one step.
    ///
    /// The content goes to a temporary file in the destination directory which
    /// is then renamed over `path`; on failure the destination is untouched.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}
