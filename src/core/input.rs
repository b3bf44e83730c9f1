//! Scan targets and input directory discovery.

use crate::core::error::ScanError;
use crate::core::hasher::FileHasher;
use crate::core::types::ContentHash;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One file submitted to the appliance.
///
/// The content hash is computed lazily, at most once, and never changes
/// afterwards.
///
/// # Examples
///
/// ```rust
/// use scanrelay::core::ScanTarget;
///
/// let target = ScanTarget::from_path("/srv/inbox/invoice.pdf");
/// assert_eq!(target.name(), "invoice.pdf");
/// assert!(target.content_hash().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ScanTarget {
    name: String,
    path: PathBuf,
    hash: OnceLock<ContentHash>,
}

impl ScanTarget {
    /// Creates a target with an explicit display name.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            hash: OnceLock::new(),
        }
    }

    /// Creates a target named after the last component of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, path)
    }

    /// Returns the display name used in logs and result file names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path of the file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the content hash, if it has been computed.
    pub fn content_hash(&self) -> Option<&ContentHash> {
        self.hash.get()
    }

    /// Returns the content hash, computing it on first use.
    pub fn fingerprint(&self, hasher: &FileHasher) -> Result<&ContentHash, ScanError> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let hash = hasher.hash_file(&self.path)?;
        Ok(self.hash.get_or_init(|| hash))
    }
}

/// Lists the regular files directly inside `dir` as scan targets.
///
/// Subdirectories are skipped. Targets are sorted by name so repeated runs
/// over the same directory process files in the same order.
pub fn discover_targets(dir: &Path) -> Result<Vec<ScanTarget>, ScanError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ScanError::FileNotFound {
                path: dir.display().to_string(),
            }
        } else {
            ScanError::Io(e)
        }
    })?;

    let mut targets = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            targets.push(ScanTarget::from_path(path));
        } else {
            tracing::debug!(path = %path.display(), "Skipping non-file entry");
        }
    }

    targets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_computed_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"first").unwrap();

        let target = ScanTarget::from_path(&path);
        let hasher = FileHasher::new();
        let first = target.fingerprint(&hasher).unwrap().clone();

        // Changing the bytes on disk must not change an already computed hash.
        std::fs::write(&path, b"second").unwrap();
        let second = target.fingerprint(&hasher).unwrap();

        assert_eq!(&first, second);
        assert_eq!(target.content_hash(), Some(&first));
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let target = ScanTarget::new("ghost", "/no/such/file");
        let result = target.fingerprint(&FileHasher::new());
        assert!(matches!(result, Err(ScanError::FileNotFound { .. })));
        assert!(target.content_hash().is_none());
    }

    #[test]
    fn test_discover_targets_sorted_and_files_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.bin"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let targets = discover_targets(dir.path()).unwrap();
        let names: Vec<&str> = targets.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["a.txt", "b.bin"]);
    }

    #[test]
    fn test_discover_targets_missing_dir() {
        let result = discover_targets(Path::new("/no/such/dir"));
        assert!(matches!(result, Err(ScanError::FileNotFound { .. })));
    }
}
