//! Mock endpoint definitions.
//!
//! - `types`: `Definition`, the `DefinitionRecord` wire shape, freshness
//!   markers and `DefinitionError`
//! - `loader`: reading one definition file from disk

mod loader;
mod types;

pub use loader::load_definition_from_file;
pub use types::{composite_key, Definition, DefinitionError, DefinitionRecord, FreshnessMarker};
