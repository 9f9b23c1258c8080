//! Loading definitions from files on disk.

use super::types::{Definition, DefinitionError, FreshnessMarker};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load a single definition file.
///
/// The file is stat'd before its content is read: a write that lands
/// between the two shows up as drift on the next watch pass instead of
/// being masked by a marker newer than the content.
pub fn load_definition_from_file(path: &Path) -> Result<Definition, DefinitionError> {
    let unavailable = |source: std::io::Error| DefinitionError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(unavailable)?;
    let freshness = FreshnessMarker::from_metadata(&file.metadata().map_err(unavailable)?);

    let mut content = Vec::new();
    file.read_to_end(&mut content).map_err(unavailable)?;

    Definition::from_slice(
        &content,
        &path.display().to_string(),
        Some(path.to_path_buf()),
        Some(freshness),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_ping_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "ping.json",
            r#"{"endpoint":"/ping","method":"get","response_status_code":204,"response_payload":{}}"#,
        );

        let def = load_definition_from_file(&path).unwrap();
        assert_eq!(def.endpoint, "/ping");
        assert_eq!(def.method, "GET");
        assert_eq!(def.response_status_code, 204);
        assert_eq!(&def.response_payload[..], b"{}");
        assert_eq!(def.source_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_freshness_matches_file() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"{"endpoint":"/a","method":"POST","response_status_code":201,"response_payload":[1,2,3]}"#;
        let path = write(dir.path(), "a.json", content);

        let def = load_definition_from_file(&path).unwrap();
        let marker = def.freshness().unwrap();
        assert_eq!(marker.len, content.len() as u64);
        assert_eq!(marker, FreshnessMarker::sample(&path).unwrap());
        assert!(!def.has_changed().unwrap());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.json", r#"{"endpoint": "/a", "method": "#);

        let err = load_definition_from_file(&path).unwrap_err();
        assert!(matches!(err, DefinitionError::MalformedDefinition { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_definition_from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, DefinitionError::SourceUnavailable { .. }));
    }
}
