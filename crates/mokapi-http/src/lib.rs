// Library exports for the binary and integration tests

pub mod config;
pub mod definition;
pub mod registry;
pub mod transport;

pub use definition::{Definition, DefinitionError};
pub use registry::{ChangeWatcher, Registry, Resolver};
pub use transport::MockServer;
