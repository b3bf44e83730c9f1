//! Streaming content fingerprints.
//!
//! The appliance keys its verdict cache by MD5, so that is the only digest
//! computed here. Files are streamed in fixed-size blocks and never loaded
//! into memory whole.

use crate::core::error::ScanError;
use crate::core::types::ContentHash;

use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;

/// Default block size used when streaming a file through the digest.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Computes content hashes for scan targets.
///
/// # Examples
///
/// ```rust
/// use scanrelay::core::FileHasher;
///
/// let hasher = FileHasher::new();
/// let hash = hasher.hash_bytes(b"hello world");
/// assert_eq!(hash.as_str(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
/// ```
#[derive(Debug, Clone)]
pub struct FileHasher {
    block_size: usize,
}

impl Default for FileHasher {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl FileHasher {
    /// Creates a new `FileHasher` with the default block size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the streaming block size. Zero is bumped to one byte.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Returns the streaming block size.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hashes an in-memory buffer.
    pub fn hash_bytes(&self, data: &[u8]) -> ContentHash {
        ContentHash::new(format!("{:x}", Md5::digest(data)))
    }

    /// Hashes the file at `path`, streaming it block by block.
    pub fn hash_file(&self, path: &Path) -> Result<ContentHash, ScanError> {
        let mut file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ScanError::Io(e)
            }
        })?;

        self.hash_reader(&mut file)
    }

    /// Hashes everything a reader yields.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> Result<ContentHash, ScanError> {
        let mut digest = Md5::new();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScanError::Io(e)),
            };
            digest.update(&buffer[..bytes_read]);
        }

        Ok(ContentHash::new(format!("{:x}", digest.finalize())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_hash_known_vector() {
        let hasher = FileHasher::new();
        assert_eq!(
            hasher.hash_bytes(b"").as_str(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );

        let mut reader = std::io::Cursor::new(b"abc".to_vec());
        assert_eq!(
            hasher.hash_reader(&mut reader).unwrap().as_str(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_hash_ignores_name_and_path() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.bin");
        let second = dir.path().join("nested-second.dat");
        std::fs::write(&first, b"identical payload").unwrap();
        std::fs::write(&second, b"identical payload").unwrap();

        let hasher = FileHasher::new();
        assert_eq!(
            hasher.hash_file(&first).unwrap(),
            hasher.hash_file(&second).unwrap()
        );
    }

    #[test]
    fn test_block_size_does_not_change_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let mut file = std::fs::File::create(&path).unwrap();
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        file.write_all(&payload).unwrap();
        drop(file);

        let streamed_small = FileHasher::new().with_block_size(1024).hash_file(&path).unwrap();
        let streamed_large = FileHasher::new().hash_file(&path).unwrap();
        let in_memory = FileHasher::new().hash_bytes(&payload);

        assert_eq!(streamed_small, in_memory);
        assert_eq!(streamed_large, in_memory);
    }

    #[test]
    fn test_hash_different_data() {
        let hasher = FileHasher::new();
        assert_ne!(hasher.hash_bytes(b"data1"), hasher.hash_bytes(b"data2"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let hasher = FileHasher::new();
        let err = hasher
            .hash_file(Path::new("/definitely/not/here.bin"))
            .unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound { .. }));
    }

    #[test]
    fn test_zero_block_size_is_clamped() {
        assert_eq!(FileHasher::new().with_block_size(0).block_size(), 1);
    }
}
