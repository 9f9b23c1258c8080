//! Request to definition resolution.

use super::core::Registry;
use crate::definition::{composite_key, Definition, DefinitionError};
use std::sync::Arc;

/// Finds the definition answering a request across the API-backed and
/// file-backed registries.
#[derive(Debug, Clone)]
pub struct Resolver {
    api_definitions: Arc<Registry>,
    file_definitions: Arc<Registry>,
}

impl Resolver {
    pub fn new(api_definitions: Arc<Registry>, file_definitions: Arc<Registry>) -> Self {
        Self {
            api_definitions,
            file_definitions,
        }
    }

    pub fn api_definitions(&self) -> &Arc<Registry> {
        &self.api_definitions
    }

    pub fn file_definitions(&self) -> &Arc<Registry> {
        &self.file_definitions
    }

    /// Resolve a request.
    ///
    /// `target` is the request target including the query string, `path`
    /// the path alone. Query-inclusive keys are tried before path-only keys,
    /// and at each level the API registry is consulted before the file
    /// registry. The first hit wins.
    pub fn resolve(
        &self,
        method: &str,
        target: &str,
        path: &str,
    ) -> Result<Arc<Definition>, DefinitionError> {
        let with_query = composite_key(method, target);
        let path_only = composite_key(method, path);

        let found = [
            (&self.api_definitions, &with_query),
            (&self.file_definitions, &with_query),
            (&self.api_definitions, &path_only),
            (&self.file_definitions, &path_only),
        ]
        .into_iter()
        .find_map(|(registry, key)| registry.lookup(key));

        found.ok_or_else(|| DefinitionError::DefinitionNotFound {
            method: method.to_string(),
            target: target.to_string(),
        })
    }
}
