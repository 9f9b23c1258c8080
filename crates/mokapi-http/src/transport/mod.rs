//! HTTP transport for MokAPI.
//!
//! Serves two things on one listener:
//! - the management API (`GET /mokapi/stats`, `POST /mokapi/add`)
//! - replay of the definition resolved for every other request

mod handlers;
mod router;
mod server;
mod types;

pub use router::{request_path, request_target};
pub use server::MockServer;
pub use types::{AddDefinitionResponse, StatsResponse, JSON_CONTENT_TYPE};
