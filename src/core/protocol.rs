//! Wire format of the appliance API.
//!
//! Requests:
//!
//! ```text
//! {"request": [{"features": ["av"], "md5": "<hex digest>"}]}
//! ```
//!
//! Responses:
//!
//! ```text
//! {"response": [{"status": {"label": "FOUND"},
//!                "av": {"malware_info": {"signature_name": "EICAR-Test"}}}]}
//! ```
//!
//! Only `status.label` is interpreted. The rest of a response is carried
//! through untouched so the persisted result is exactly what the appliance
//! said.

use crate::core::error::ScanError;
use crate::core::types::{ContentHash, StatusLabel};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

/// Feature name requested for every call.
pub const AV_FEATURE: &str = "av";

/// One entry of a request's `request` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEntry {
    /// Requested appliance features.
    pub features: Vec<String>,

    /// Content hash; present on queries, absent on uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}

/// A request body for the `query` and `upload` endpoints.
///
/// Built fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    request: Vec<RequestEntry>,
}

impl ScanRequest {
    /// A cache or poll query for `hash`.
    pub fn query(hash: &ContentHash) -> Self {
        Self::build(Some(hash.as_str().to_string()))
    }

    /// The metadata part of an upload. Never carries a hash; the appliance
    /// identifies the file from the uploaded bytes.
    pub fn upload() -> Self {
        Self::build(None)
    }

    fn build(md5: Option<String>) -> Self {
        Self {
            request: vec![RequestEntry {
                features: vec![AV_FEATURE.to_string()],
                md5,
            }],
        }
    }

    /// Returns the hash carried by the request, if any.
    pub fn md5(&self) -> Option<&str> {
        self.request.first().and_then(|e| e.md5.as_deref())
    }

    /// Returns the request entries.
    pub fn entries(&self) -> &[RequestEntry] {
        &self.request
    }

    /// Serializes the request body.
    pub fn to_json(&self) -> Result<String, ScanError> {
        serde_json::to_string(self)
            .map_err(|e| ScanError::internal(format!("failed to encode request: {}", e)))
    }
}

/// An appliance reply.
///
/// Serializes back to exactly the JSON it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResponse {
    raw: Value,
    label: StatusLabel,
}

impl ScanResponse {
    /// Parses a response body returned by `endpoint`.
    pub fn from_json(endpoint: &str, raw: Value) -> Result<Self, ScanError> {
        let label = first_entry(&raw)
            .and_then(|r| r.get("status"))
            .and_then(|s| s.get("label"))
            .and_then(|l| l.as_str())
            .map(StatusLabel::from)
            .ok_or_else(|| ScanError::ambiguous(endpoint, "missing response[0].status.label"))?;

        Ok(Self { raw, label })
    }

    /// Parses a raw response body returned by `endpoint`.
    pub fn from_slice(endpoint: &str, body: &[u8]) -> Result<Self, ScanError> {
        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| ScanError::ambiguous(endpoint, format!("invalid JSON: {}", e)))?;
        Self::from_json(endpoint, raw)
    }

    /// Builds a response locally with the given label and optional AV
    /// signature. Used by test doubles.
    pub fn from_parts(label: StatusLabel, signature: Option<&str>) -> Self {
        let mut entry = json!({ "status": { "label": label.as_str() } });
        if let Some(sig) = signature {
            entry["av"] = json!({ "malware_info": { "signature_name": sig } });
        }
        Self {
            raw: json!({ "response": [entry] }),
            label,
        }
    }

    /// Returns the status label.
    pub fn label(&self) -> &StatusLabel {
        &self.label
    }

    /// Returns `av.malware_info.signature_name`, if present.
    pub fn signature_name(&self) -> Option<&str> {
        first_entry(&self.raw)
            .and_then(|r| r.get("av"))
            .and_then(|av| av.get("malware_info"))
            .and_then(|m| m.get("signature_name"))
            .and_then(|s| s.as_str())
    }

    /// Returns `status.message`, if the appliance sent one.
    pub fn status_message(&self) -> Option<&str> {
        first_entry(&self.raw)
            .and_then(|r| r.get("status"))
            .and_then(|s| s.get("message"))
            .and_then(|m| m.as_str())
    }

    /// Returns the untouched response body.
    pub fn as_json(&self) -> &Value {
        &self.raw
    }
}

fn first_entry(raw: &Value) -> Option<&Value> {
    raw.get("response").and_then(|r| r.get(0))
}

impl Serialize for ScanResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScanResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::from_json("stored", raw).map_err(serde::de::Error::custom)
    }
}
