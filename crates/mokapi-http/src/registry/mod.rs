//! Definition registries and request resolution.
//!
//! This module provides:
//! - `Registry`: keyed definition store, file-backed or API-backed
//! - `Resolver`: request matching across both registries
//! - `ChangeWatcher`: background drift detection and reload for the
//!   file-backed registry
//!
//! ## Module Structure
//!
//! - `core`: the `Registry` store and directory loading
//! - `resolver`: match precedence
//! - `watcher`: the polling reload task

mod core;
mod resolver;
mod watcher;


pub use self::core::{DefinitionMap, Registry};
pub use resolver::Resolver;
pub use watcher::{ChangeWatcher, ScanOutcome, DEFAULT_CHECK_INTERVAL, MIN_CHECK_INTERVAL};
