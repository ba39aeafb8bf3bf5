//! # Path Utilities
//!
//! Pure helpers for deriving output paths and recognizing compressed files.
//! Nothing in here touches the filesystem.

use std::path::{Path, PathBuf};

/// Suffixes that mark a file as an already minified artifact
pub const DEFAULT_COMPRESSED_SUFFIXES: [&str; 4] = [".min.js", "-min.js", ".minified.js", "-minified.js"];

/// Output path derivation and compressed-name matching
pub struct PathUtil;

impl PathUtil {
    /// Remove the final `.ext` of the last path component.
    ///
    /// A dot that appears before the last separator (`/` or `\`) belongs to a
    /// directory name and is left alone, so `dir.v2/file` is returned unchanged.
    /// Only the last extension goes: `a.b.js` becomes `a.b`.
    pub fn strip_extension(path: &str) -> &str {
        let Some(dot) = path.rfind('.') else {
            return path;
        };
        match path.rfind(['/', '\\']) {
            Some(sep) if sep > dot => path,
            _ => &path[..dot],
        }
    }

    /// Whether `filename` ends with one of the compressed-name suffixes (case-sensitive)
    pub fn is_already_compressed<S: AsRef<str>>(filename: &str, suffixes: &[S]) -> bool {
        suffixes.iter().any(|suffix| filename.ends_with(suffix.as_ref()))
    }

    /// `strip_extension(source) + target_suffix`
    pub fn derive_destination(source: &Path, target_suffix: &str) -> PathBuf {
        match source.to_str() {
            Some(path) => PathBuf::from(format!("{}{}", Self::strip_extension(path), target_suffix)),
            None => {
                // Non UTF-8 path: only the file name can carry the extension
                let mut name = source.file_stem().unwrap_or_default().to_os_string();
                name.push(target_suffix);
                source.with_file_name(name)
            }
        }
    }
}
