//! Registry - keyed store of definitions.
//!
//! The entry set lives behind `RwLock<Arc<..>>`. Readers clone the `Arc`
//! (or look up under the read lock), a reload builds a complete new map and
//! swaps the pointer in one write, and single inserts go through
//! `Arc::make_mut` so outstanding snapshots are never mutated.

use crate::definition::{load_definition_from_file, Definition, DefinitionError};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Entry set of a registry, keyed by `METHOD:endpoint`
pub type DefinitionMap = HashMap<String, Arc<Definition>>;

/// Keyed collection of definitions, either file-backed or API-backed
#[derive(Debug)]
pub struct Registry {
    /// Definitions directory; `None` for registries not backed by files
    source_root: Option<PathBuf>,
    entries: RwLock<Arc<DefinitionMap>>,
}

impl Registry {
    /// Create an empty registry that loads from `root`
    pub fn file_backed(root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: Some(root.into()),
            entries: RwLock::new(Arc::new(DefinitionMap::new())),
        }
    }

    /// Create an empty registry with no backing directory, as used for
    /// definitions added through the management API
    pub fn in_memory() -> Self {
        Self {
            source_root: None,
            entries: RwLock::new(Arc::new(DefinitionMap::new())),
        }
    }

    pub fn source_root(&self) -> Option<&Path> {
        self.source_root.as_deref()
    }

    /// Check that the source root exists and is a directory
    pub fn check_source_valid(&self) -> Result<&Path, DefinitionError> {
        let Some(root) = self.source_root.as_deref() else {
            return Err(DefinitionError::InvalidSourcePath {
                path: PathBuf::new(),
                reason: "registry is not file-backed".to_string(),
            });
        };

        let metadata = std::fs::metadata(root).map_err(|e| DefinitionError::InvalidSourcePath {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(DefinitionError::InvalidSourcePath {
                path: root.to_path_buf(),
                reason: "path to definitions is a file".to_string(),
            });
        }
        Ok(root)
    }

    /// Rebuild the entry set from the source directory.
    ///
    /// The new set is assembled off to the side and only swapped in once
    /// every file has loaded without error, so a failed reload leaves the
    /// current entries untouched. Returns the number of loaded definitions.
    pub fn load(&self) -> Result<usize, DefinitionError> {
        let root = self.check_source_valid()?;

        let mut entries = DefinitionMap::new();
        for path in list_definition_files(root)? {
            let definition = load_definition_from_file(&path)?;
            insert_unique(&mut entries, Arc::new(definition))?;
        }

        let count = entries.len();
        *self.entries.write() = Arc::new(entries);
        debug!(path = %root.display(), definitions = count, "Definitions loaded");
        Ok(count)
    }

    /// Insert a definition, rejecting a key that is already registered
    pub fn add(&self, definition: Definition) -> Result<(), DefinitionError> {
        let mut entries = self.entries.write();
        insert_unique(Arc::make_mut(&mut *entries), Arc::new(definition))
    }

    /// Insert a definition, replacing any entry with the same key.
    /// Returns the replaced definition.
    pub fn upsert(&self, definition: Definition) -> Option<Arc<Definition>> {
        let key = definition.key();
        let mut entries = self.entries.write();
        Arc::make_mut(&mut *entries).insert(key, Arc::new(definition))
    }

    /// Exact-match lookup by composite key
    pub fn lookup(&self, key: &str) -> Option<Arc<Definition>> {
        self.entries.read().get(key).cloned()
    }

    /// Current entry set. Later reloads and inserts do not affect it.
    pub fn snapshot(&self) -> Arc<DefinitionMap> {
        Arc::clone(&*self.entries.read())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether the files in the source directory differ from the files the
    /// current entry set was loaded from (a file was added or removed).
    pub fn source_files_changed(&self) -> Result<bool, DefinitionError> {
        let root = self.check_source_valid()?;
        let on_disk: HashSet<PathBuf> = list_definition_files(root)?.into_iter().collect();

        let snapshot = self.snapshot();
        let loaded: HashSet<&Path> = snapshot
            .values()
            .filter_map(|def| def.source_path.as_deref())
            .collect();

        Ok(on_disk.len() != loaded.len()
            || on_disk.iter().any(|path| !loaded.contains(path.as_path())))
    }
}

/// Insert into `entries`, failing on an existing key
fn insert_unique(
    entries: &mut DefinitionMap,
    definition: Arc<Definition>,
) -> Result<(), DefinitionError> {
    let key = definition.key();
    if let Some(existing) = entries.get(&key) {
        return Err(DefinitionError::DuplicateEndpoint {
            key,
            existing: existing.source_path.clone(),
            duplicate: definition.source_path.clone(),
        });
    }
    entries.insert(key, definition);
    Ok(())
}

/// Regular files directly inside `root`, sorted by name
fn list_definition_files(root: &Path) -> Result<Vec<PathBuf>, DefinitionError> {
    let unavailable = |source: std::io::Error| DefinitionError::SourceUnavailable {
        path: root.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(root).map_err(unavailable)? {
        let path = entry.map_err(unavailable)?.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-file entry in definitions directory");
        }
    }
    files.sort();
    Ok(files)
}
