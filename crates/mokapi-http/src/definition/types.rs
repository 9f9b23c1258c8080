//! Type definitions for mock endpoint definitions.
//!
//! This module contains the on-disk/wire record, the runtime `Definition`
//! with its freshness marker, and the error type shared by the registry,
//! loader, watcher and resolver.

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// ============================================================================
// Wire Types
// ============================================================================

/// Definition record as written in definition files and accepted by the
/// management API.
///
/// `response_payload` is kept as raw JSON text so it can be replayed
/// byte-for-byte without a parse/serialize round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub endpoint: String,
    pub method: String,
    pub response_status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_payload: Option<Box<RawValue>>,
}

// ============================================================================
// Freshness Tracking
// ============================================================================

/// Size and modification time of a definition file at the time it was last
/// sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessMarker {
    pub len: u64,
    /// `None` on platforms that do not report modification times
    pub modified: Option<SystemTime>,
}

impl FreshnessMarker {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }

    /// Stat `path` and build a marker from the result
    pub fn sample(path: &Path) -> Result<Self, DefinitionError> {
        std::fs::metadata(path)
            .map(|metadata| Self::from_metadata(&metadata))
            .map_err(|source| DefinitionError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })
    }
}

// ============================================================================
// Definition
// ============================================================================

/// Payload replayed when a record carries no `response_payload`
const NULL_PAYLOAD: &[u8] = b"null";

/// One configured mock response.
///
/// Everything except the freshness marker is fixed at construction. The
/// marker sits behind a mutex so the watcher can update it while the
/// definition is shared with request handlers.
#[derive(Debug)]
pub struct Definition {
    pub endpoint: String,
    /// Always upper-case
    pub method: String,
    pub response_status_code: u16,
    pub response_payload: Bytes,
    /// File this definition was loaded from; `None` for API-injected definitions
    pub source_path: Option<PathBuf>,
    freshness: Mutex<Option<FreshnessMarker>>,
}

impl Definition {
    /// Build a definition from a decoded record.
    ///
    /// `origin` names where the record came from and is only used in error
    /// messages. `freshness` is attached when `source_path` is set.
    pub fn from_record(
        record: DefinitionRecord,
        origin: &str,
        source_path: Option<PathBuf>,
        freshness: Option<FreshnessMarker>,
    ) -> Result<Self, DefinitionError> {
        let malformed = |reason: &str| DefinitionError::MalformedDefinition {
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        if record.endpoint.trim().is_empty() {
            return Err(malformed("endpoint must not be empty"));
        }
        if record.method.trim().is_empty() {
            return Err(malformed("method must not be empty"));
        }
        if hyper::StatusCode::from_u16(record.response_status_code).is_err() {
            return Err(malformed(&format!(
                "invalid response_status_code {}",
                record.response_status_code
            )));
        }

        let response_payload = match record.response_payload {
            Some(raw) => Bytes::copy_from_slice(raw.get().as_bytes()),
            None => Bytes::from_static(NULL_PAYLOAD),
        };
        let freshness = source_path.as_ref().and(freshness);

        Ok(Self {
            endpoint: record.endpoint,
            method: record.method.to_uppercase(),
            response_status_code: record.response_status_code,
            response_payload,
            source_path,
            freshness: Mutex::new(freshness),
        })
    }

    /// Decode a definition from raw JSON bytes.
    pub fn from_slice(
        raw: &[u8],
        origin: &str,
        source_path: Option<PathBuf>,
        freshness: Option<FreshnessMarker>,
    ) -> Result<Self, DefinitionError> {
        let record: DefinitionRecord =
            serde_json::from_slice(raw).map_err(|e| DefinitionError::MalformedDefinition {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_record(record, origin, source_path, freshness)
    }

    /// Composite registry key for this definition
    pub fn key(&self) -> String {
        composite_key(&self.method, &self.endpoint)
    }

    /// Last sampled freshness marker
    pub fn freshness(&self) -> Option<FreshnessMarker> {
        *self.freshness.lock()
    }

    /// Re-stat the source file and report whether it drifted from the stored
    /// marker. The marker is replaced with the fresh sample on every
    /// successful call, so a second call without an intervening write
    /// returns `false`.
    ///
    /// API-injected definitions never change.
    pub fn has_changed(&self) -> Result<bool, DefinitionError> {
        let Some(path) = self.source_path.as_deref() else {
            return Ok(false);
        };

        let current = FreshnessMarker::sample(path)?;
        let previous = self.freshness.lock().replace(current);
        Ok(previous != Some(current))
    }
}

/// Build the `METHOD:target` key used for exact-match lookups
pub fn composite_key(method: &str, target: &str) -> String {
    format!("{}:{}", method, target)
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("Invalid definitions path {}: {reason}", .path.display())]
    InvalidSourcePath { path: PathBuf, reason: String },
    #[error("Malformed definition in {origin}: {reason}")]
    MalformedDefinition { origin: String, reason: String },
    #[error(
        "The endpoint {key} is already used and set up{}",
        clash_location(.existing, .duplicate)
    )]
    DuplicateEndpoint {
        key: String,
        /// File the registered definition was loaded from
        existing: Option<PathBuf>,
        /// File of the rejected definition
        duplicate: Option<PathBuf>,
    },
    #[error("Definition source {} unavailable: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No definition found for {method} {target}")]
    DefinitionNotFound { method: String, target: String },
}

fn clash_location(existing: &Option<PathBuf>, duplicate: &Option<PathBuf>) -> String {
    match (existing, duplicate) {
        (Some(existing), Some(duplicate)) => format!(
            " (in {}, first defined in {})",
            duplicate.display(),
            existing.display()
        ),
        (None, Some(duplicate)) => format!(" (in {})", duplicate.display()),
        (Some(existing), None) => format!(" (first defined in {})", existing.display()),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(method: &str, status: u16, payload: Option<&str>) -> DefinitionRecord {
        DefinitionRecord {
            endpoint: "/test".to_string(),
            method: method.to_string(),
            response_status_code: status,
            response_payload: payload.map(|p| RawValue::from_string(p.to_string()).unwrap()),
        }
    }

    #[test]
    fn test_method_is_uppercased() {
        let def = Definition::from_record(record("post", 200, None), "test", None, None).unwrap();
        assert_eq!(def.method, "POST");
        assert_eq!(def.key(), "POST:/test");
    }

    #[test]
    fn test_payload_kept_verbatim() {
        let payload = r#"{ "b": 1,   "a": [1, 2] }"#;
        let def =
            Definition::from_record(record("GET", 200, Some(payload)), "test", None, None).unwrap();
        assert_eq!(def.response_payload, Bytes::from(payload));
    }

    #[test]
    fn test_missing_payload_replays_null() {
        let def = Definition::from_slice(
            br#"{"endpoint":"/a","method":"get","response_status_code":200}"#,
            "test",
            None,
            None,
        )
        .unwrap();
        assert_eq!(def.response_payload, Bytes::from_static(b"null"));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = Definition::from_slice(b"{not json", "broken.json", None, None).unwrap_err();
        assert!(matches!(err, DefinitionError::MalformedDefinition { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let err = Definition::from_slice(br#"{"endpoint":"/a"}"#, "test", None, None).unwrap_err();
        assert!(matches!(err, DefinitionError::MalformedDefinition { .. }));
    }

    #[test]
    fn test_invalid_status_is_malformed() {
        let err = Definition::from_record(record("GET", 42, None), "test", None, None).unwrap_err();
        assert!(matches!(err, DefinitionError::MalformedDefinition { .. }));
    }

    #[test]
    fn test_empty_method_is_malformed() {
        let err = Definition::from_record(record("  ", 200, None), "test", None, None).unwrap_err();
        assert!(matches!(err, DefinitionError::MalformedDefinition { .. }));
    }

    #[test]
    fn test_api_definition_never_changes() {
        let def = Definition::from_record(record("GET", 200, None), "api", None, None).unwrap();
        assert!(def.freshness().is_none());
        assert!(!def.has_changed().unwrap());
    }

    #[test]
    fn test_has_changed_true_then_false() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"first").unwrap();
        let marker = FreshnessMarker::sample(file.path()).unwrap();
        let def = Definition::from_record(
            record("GET", 200, None),
            "test",
            Some(file.path().to_path_buf()),
            Some(marker),
        )
        .unwrap();

        assert!(!def.has_changed().unwrap());

        file.write_all(b" and some more bytes").unwrap();
        file.flush().unwrap();

        assert!(def.has_changed().unwrap());
        assert!(!def.has_changed().unwrap());
    }

    #[test]
    fn test_has_changed_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.json");
        let def = Definition::from_record(record("GET", 200, None), "test", Some(path), None)
            .unwrap();

        let err = def.has_changed().unwrap_err();
        assert!(matches!(err, DefinitionError::SourceUnavailable { .. }));
    }
}
