//! Route dispatch for the mock server.
//!
//! Management routes under `/mokapi` are matched first so a definition can
//! never shadow them. Every other request goes to the resolver.

use crate::registry::Resolver;
use crate::transport::handlers;
use crate::transport::types::{collect_body, error_response};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode, Uri};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    resolver: Arc<Resolver>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let target = request_target(req.uri());
    let path = request_path(req.uri());

    debug!("{} {}", method, target);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/mokapi/stats") => handlers::handle_stats(&resolver),
        (&Method::POST, "/mokapi/add") => match collect_body(req).await {
            Ok(body) => handlers::handle_add(&body, &resolver),
            Err(e) => error_response(StatusCode::BAD_REQUEST, &e),
        },
        _ => handlers::handle_mock(method.as_str(), &target, &path, &resolver),
    };
    Ok(response)
}

/// Request target as received: path plus query string
pub fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Percent-decoded request path without the query string.
/// Falls back to the raw path when it does not decode to UTF-8.
pub fn request_path(uri: &Uri) -> String {
    let raw = uri.path();
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_target_keeps_query() {
        let uri: Uri = "/x?q=1&b=%20".parse().unwrap();
        assert_eq!(request_target(&uri), "/x?q=1&b=%20");

        let uri: Uri = "/plain".parse().unwrap();
        assert_eq!(request_target(&uri), "/plain");
    }

    #[test]
    fn test_request_target_absolute_form() {
        let uri: Uri = "http://example.com/x?q=1".parse().unwrap();
        assert_eq!(request_target(&uri), "/x?q=1");
        assert_eq!(request_path(&uri), "/x");
    }

    #[test]
    fn test_request_path_is_decoded() {
        let uri: Uri = "/a%20b/c?x=%20".parse().unwrap();
        assert_eq!(request_path(&uri), "/a b/c");
    }

    #[test]
    fn test_request_path_invalid_utf8_falls_back() {
        let uri: Uri = "/bad%FF".parse().unwrap();
        assert_eq!(request_path(&uri), "/bad%FF");
    }
}
