//! Core types used throughout the scanrelay library.
//!
//! This module defines the content hash, the appliance status labels that
//! drive every branch of a scan, and the verdict classification derived
//! from a final response.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower-case hex MD5 digest of a file's content.
///
/// This is the key the appliance uses for its verdict cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wraps an already hex-encoded digest, normalizing it to lower case.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into().to_ascii_lowercase())
    }

    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "md5:{}", self.0)
    }
}

/// The `status.label` of an appliance response.
///
/// Only three labels change control flow. Anything else the appliance
/// reports is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusLabel {
    /// A verdict exists for the hash.
    Found,
    /// No verdict yet; the file is unknown or still being scanned.
    NotFound,
    /// The upload was accepted and a verdict will follow.
    UploadSuccess,
    /// Any other appliance-defined label.
    Other(String),
}

impl StatusLabel {
    /// Returns the wire form of the label.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found => "FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::UploadSuccess => "UPLOAD_SUCCESS",
            Self::Other(label) => label,
        }
    }

    /// Returns `true` for `FOUND`.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found)
    }

    /// Returns `true` for `NOT_FOUND`.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<&str> for StatusLabel {
    fn from(label: &str) -> Self {
        match label {
            "FOUND" => Self::Found,
            "NOT_FOUND" => Self::NotFound,
            "UPLOAD_SUCCESS" => Self::UploadSuccess,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for StatusLabel {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<StatusLabel> for String {
    fn from(label: StatusLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which branch of the protocol produced a target's final response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPath {
    /// The cache query already had a verdict; nothing was uploaded.
    Cached,
    /// The upload response was final (no polling).
    Uploaded,
    /// The verdict came from post-upload polling.
    Polled,
}

impl fmt::Display for ScanPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => write!(f, "cached"),
            Self::Uploaded => write!(f, "uploaded"),
            Self::Polled => write!(f, "polled"),
        }
    }
}

/// Classification of a final response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Verdict {
    /// `FOUND` with a non-empty signature name.
    Malicious {
        /// The AV signature that matched.
        signature: String,
    },
    /// `FOUND` without a signature name.
    Clean,
    /// `NOT_FOUND`: no verdict was available in time.
    Pending,
    /// Any other label; reported as-is.
    Other {
        /// The label the appliance returned.
        label: String,
    },
}

impl Verdict {
    /// Classifies a label and optional signature name.
    pub fn classify(label: &StatusLabel, signature: Option<&str>) -> Self {
        match label {
            StatusLabel::Found => match signature {
                Some(sig) if !sig.is_empty() => Self::Malicious {
                    signature: sig.to_string(),
                },
                _ => Self::Clean,
            },
            StatusLabel::NotFound => Self::Pending,
            other => Self::Other {
                label: other.as_str().to_string(),
            },
        }
    }

    /// Returns `true` for `Malicious`.
    pub fn is_malicious(&self) -> bool {
        matches!(self, Self::Malicious { .. })
    }

    /// Returns `true` for `Clean`.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malicious { .. } => write!(f, "malicious"),
            Self::Clean => write!(f, "clean"),
            Self::Pending => write!(f, "pending"),
            Self::Other { .. } => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_parsing() {
        assert_eq!(StatusLabel::from("FOUND"), StatusLabel::Found);
        assert_eq!(StatusLabel::from("NOT_FOUND"), StatusLabel::NotFound);
        assert_eq!(StatusLabel::from("UPLOAD_SUCCESS"), StatusLabel::UploadSuccess);
        assert_eq!(
            StatusLabel::from("PARTIALLY_FOUND"),
            StatusLabel::Other("PARTIALLY_FOUND".into())
        );
        assert_eq!(StatusLabel::Other("X".into()).as_str(), "X");
    }

    #[test]
    fn test_status_label_serde() {
        let json = serde_json::to_string(&StatusLabel::UploadSuccess).unwrap();
        assert_eq!(json, "\"UPLOAD_SUCCESS\"");
        let back: StatusLabel = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert!(back.is_pending());
    }

    #[test]
    fn test_verdict_classification() {
        assert_eq!(
            Verdict::classify(&StatusLabel::Found, Some("EICAR-Test")),
            Verdict::Malicious {
                signature: "EICAR-Test".into()
            }
        );
        assert!(Verdict::classify(&StatusLabel::Found, Some("")).is_clean());
        assert_eq!(
            Verdict::classify(&StatusLabel::Found, Some("  ")),
            Verdict::Malicious {
                signature: "  ".into()
            }
        );
        assert!(Verdict::classify(&StatusLabel::Found, None).is_clean());
        assert_eq!(
            Verdict::classify(&StatusLabel::NotFound, Some("ignored")),
            Verdict::Pending
        );
        assert_eq!(
            Verdict::classify(&StatusLabel::Other("FILE_TYPE_NOT_SUPPORTED".into()), None),
            Verdict::Other {
                label: "FILE_TYPE_NOT_SUPPORTED".into()
            }
        );
    }

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new("00AB0F");
        assert_eq!(hash.as_str(), "00ab0f");
        assert_eq!(format!("{}", hash), "md5:00ab0f");
    }
}
