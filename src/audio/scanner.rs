use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::AudioFormat;

/// Finds playable files under a directory so they can be added by path.
#[derive(Clone, Default)]
pub struct MusicScanner;

impl MusicScanner {
    pub fn new() -> Self {
        Self
    }

    /// Every supported audio file below `path`, sorted by path.
    pub fn scan_directory<P: AsRef<Path>>(&self, path: P) -> Vec<PathBuf> {
        let root = path.as_ref();
        if !root.is_dir() {
            warn!("Not a directory, skipping scan: {}", root.display());
            return Vec::new();
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            // Skip hidden files (dotfiles)
            if path.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with('.')) {
                continue;
            }

            // Empty files can never decode
            if fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true) {
                continue;
            }

            if AudioFormat::from_path(path).is_supported() {
                found.push(path.to_path_buf());
            }
        }

        found.sort();
        debug!("Scanned {}: {} audio files", root.display(), found.len());
        found
    }

    pub fn scan_directories(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths.iter().flat_map(|path| self.scan_directory(path)).collect()
    }

}
