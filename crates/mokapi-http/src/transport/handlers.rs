//! Request handlers: management endpoints and mock replay.

use crate::definition::{Definition, DefinitionError};
use crate::registry::Resolver;
use crate::transport::types::{
    build_response_with_headers, error_response, json_response, AddDefinitionResponse,
    StatsResponse, JSON_CONTENT_TYPE,
};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::{debug, info};

/// GET /mokapi/stats - Definition counts per registry
pub fn handle_stats(resolver: &Resolver) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &StatsResponse {
            api_definitions: resolver.api_definitions().len(),
            file_definitions: resolver.file_definitions().len(),
        },
    )
}

/// POST /mokapi/add - Add a definition to the API registry.
///
/// An existing definition with the same key is overwritten.
pub fn handle_add(body: &[u8], resolver: &Resolver) -> Response<Full<Bytes>> {
    let definition = match Definition::from_slice(body, "request body", None, None) {
        Ok(d) => d,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let key = definition.key();
    let replaced = resolver.api_definitions().upsert(definition).is_some();
    info!(key = %key, replaced, "API definition added");

    json_response(StatusCode::OK, &AddDefinitionResponse { key, replaced })
}

/// Replay the definition matching the request, or 404
pub fn handle_mock(
    method: &str,
    target: &str,
    path: &str,
    resolver: &Resolver,
) -> Response<Full<Bytes>> {
    match resolver.resolve(method, target, path) {
        Ok(definition) => {
            let status = StatusCode::from_u16(definition.response_status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            build_response_with_headers(
                status,
                [("Content-Type", JSON_CONTENT_TYPE)],
                definition.response_payload.clone(),
            )
        }
        Err(e @ DefinitionError::DefinitionNotFound { .. }) => {
            debug!("{}", e);
            error_response(StatusCode::NOT_FOUND, &e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}
