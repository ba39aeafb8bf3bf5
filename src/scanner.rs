//! # Directory Scanner
//!
//! Discovers compression candidates below a root directory.
//!
//! ## Rules:
//! - Directories are descended into only when scanning recursively
//! - Regular files qualify when their name ends with the source extension and
//!   does not look like an already compressed file
//! - Anything else (sockets, broken links, ...) is ignored
//!
//! Directories that cannot be listed contribute no candidates; the scan logs
//! them and moves on. Symlinks are followed, `walkdir` reports link loops as
//! errors which are handled the same way.
//!
//! Entries are yielded sorted by file name so repeated runs see the same order.

use crate::config::RunConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Snapshot of a candidate taken at scan time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub is_file: bool,
}

/// Walks a source tree and filters candidates
pub struct DirectoryScanner<'a> {
    config: &'a RunConfig,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Collect all candidate sources below `root_dir`
    pub fn scan(&self, root_dir: &Path, recursive: bool) -> Vec<SourceFile> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut candidates = Vec::new();

        for entry in WalkDir::new(root_dir)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let location = e.path().unwrap_or(root_dir).display().to_string();
                    warn!("Skipping unreadable entry {}: {}", location, e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.config.is_candidate_name(&name) {
                if name.ends_with(&self.config.source_extension) {
                    debug!("Ignoring already compressed file {}", entry.path().display());
                }
                continue;
            }

            match entry.metadata().map_err(io::Error::from).and_then(|m| m.modified()) {
                Ok(modified) => candidates.push(SourceFile {
                    path: entry.into_path(),
                    modified,
                    is_file: true,
                }),
                Err(e) => warn!("Cannot read modification time of {}: {}", entry.path().display(), e),
            }
        }

        debug!("Found {} candidates in {}", candidates.len(), root_dir.display());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "function f(a) { return a + 1; }").unwrap();
    }

    fn names(files: &[SourceFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_filters_by_extension_and_compressed_name() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("app.js"));
        touch(&temp_dir.path().join("app.min.js"));
        touch(&temp_dir.path().join("vendor-min.js"));
        touch(&temp_dir.path().join("style.css"));
        touch(&temp_dir.path().join("data.json"));

        let config = RunConfig::default();
        let found = DirectoryScanner::new(&config).scan(temp_dir.path(), true);

        assert_eq!(names(&found), vec!["app.js"]);
        assert!(found[0].is_file);
    }

    #[test]
    fn test_only_compressed_files_yield_nothing() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("a.min.js"));

        let config = RunConfig::default();
        assert!(DirectoryScanner::new(&config).scan(temp_dir.path(), true).is_empty());
    }

    #[test]
    fn test_recursion_flag() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("a.js"));
        touch(&temp_dir.path().join("nested/b.js"));
        touch(&temp_dir.path().join("nested/deeper/c.js"));

        let config = RunConfig::default();
        let scanner = DirectoryScanner::new(&config);

        assert_eq!(names(&scanner.scan(temp_dir.path(), false)), vec!["a.js"]);
        assert_eq!(names(&scanner.scan(temp_dir.path(), true)), vec!["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_directory_named_like_source_is_not_a_candidate() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("modules.js")).unwrap();
        touch(&temp_dir.path().join("modules.js/inner.js"));

        let config = RunConfig::default();
        let found = DirectoryScanner::new(&config).scan(temp_dir.path(), true);
        assert_eq!(names(&found), vec!["inner.js"]);
    }

    #[test]
    fn test_missing_root_yields_no_candidates() {
        let temp_dir = TempDir::new().unwrap();
        let config = RunConfig::default();
        let found = DirectoryScanner::new(&config).scan(&temp_dir.path().join("missing"), true);
        assert!(found.is_empty());
    }

    #[test]
    fn test_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["zeta.js", "alpha.js", "mid.js"] {
            touch(&temp_dir.path().join(name));
        }

        let config = RunConfig::default();
        let found = DirectoryScanner::new(&config).scan(temp_dir.path(), false);
        assert_eq!(names(&found), vec!["alpha.js", "mid.js", "zeta.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_does_not_hang() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("sub/a.js"));
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("sub/loop")).unwrap();

        let config = RunConfig::default();
        let found = DirectoryScanner::new(&config).scan(temp_dir.path(), true);
        assert_eq!(names(&found), vec!["a.js"]);
    }
}
