//! Filesystem result writer.

use crate::core::{ScanError, ScanResponse};
use crate::output::traits::ResultStore;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Suffix appended to a target's display name to form its result file name.
pub const RESULT_SUFFIX: &str = ".response.txt";

/// Writes each response as compact JSON to
/// `<output_dir>/<name>.response.txt`.
///
/// # Directory Structure
///
/// ```text
/// output/
/// ├── a.txt.response.txt
/// └── invoice.pdf.response.txt
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemResultWriter {
    output_dir: PathBuf,
}

impl FilesystemResultWriter {
    /// Creates a writer for an existing directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Creates the output directory if it is absent, then returns a writer
    /// for it.
    pub fn create(output_dir: impl Into<PathBuf>) -> Result<Self, ScanError> {
        let output_dir = output_dir.into();
        if !output_dir.is_dir() {
            tracing::info!(dir = %output_dir.display(), "Creating output directory");
            std::fs::create_dir_all(&output_dir).map_err(|e| ScanError::WriteFailed {
                path: output_dir.clone(),
                source: e,
            })?;
        }
        Ok(Self::new(output_dir))
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the result file path for the target called `name`.
    pub fn result_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", name, RESULT_SUFFIX))
    }
}

#[async_trait]
impl ResultStore for FilesystemResultWriter {
    async fn write(&self, name: &str, response: &ScanResponse) -> Result<String, ScanError> {
        let path = self.result_path(name);
        let content = serde_json::to_string(response)
            .map_err(|e| ScanError::internal(format!("failed to encode response: {}", e)))?;

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ScanError::WriteFailed {
                path: path.clone(),
                source: e,
            })?;

        tracing::debug!(path = %path.display(), "Wrote scan response");
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StatusLabel;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let writer = FilesystemResultWriter::new(temp_dir.path());

        let first = ScanResponse::from_parts(StatusLabel::NotFound, None);
        writer.write("a.txt", &first).await.unwrap();

        let second = ScanResponse::from_parts(StatusLabel::Found, Some("EICAR-Test"));
        let location = writer.write("a.txt", &second).await.unwrap();

        let path = temp_dir.path().join("a.txt.response.txt");
        assert_eq!(location, path.display().to_string());

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: ScanResponse = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, second);
        assert!(!content.contains('\n'));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let writer = FilesystemResultWriter::new(temp_dir.path().join("missing"));

        let response = ScanResponse::from_parts(StatusLabel::Found, None);
        let err = writer.write("a.txt", &response).await.unwrap_err();
        assert!(matches!(err, ScanError::WriteFailed { .. }));
    }

    #[test]
    fn test_create_makes_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("results").join("today");

        let writer = FilesystemResultWriter::create(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(
            writer.result_path("x.bin"),
            dir.join("x.bin.response.txt")
        );
    }
}
