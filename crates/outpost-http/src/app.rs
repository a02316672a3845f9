//! Axum application assembly
//!
//! Turns a mounted route table into a router and wraps it in the standard
//! middleware stack.

use crate::config::AppOptions;
use crate::docs::{docs_router, openapi_document};
use crate::error::request_id_middleware;
use crate::handlers::{call_tool, run_entrypoint};
use axum::{
    Router, middleware,
    routing::{MethodFilter, on},
};
use outpost_core::{Method, RouteEntry, RouteHandler, RouteTable, TagEntry};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// Bytes a client percent-encodes inside a path segment, plus `%` itself
/// so a literal percent sign in a name survives the round trip.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%');

/// The path a route is matched on.
///
/// Request paths are matched before percent-decoding, so each segment of the
/// documented path is encoded the way a client sends it: `/weather bot` is
/// served at `/weather%20bot`.
pub(crate) fn route_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Create the router for a route table with all middleware applied
pub fn build_router(routes: &RouteTable, tags: &[TagEntry], options: &AppOptions) -> Router {
    let mut router = routes.iter().fold(Router::new().without_v07_checks(), |router, route| {
        router.merge(route_router(route))
    });

    if options.enable_docs {
        router = router.merge(docs_router(openapi_document(routes, tags, options), options));
    }

    let mut router = router
        .layer(RequestBodyLimitLayer::new(options.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            options.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware));

    if options.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Segments such as `:lookup` are literal here, not 0.7-style captures.
fn route_router(route: &RouteEntry) -> Router {
    let filter = match route.method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
    };
    let path = route_path(&route.path);
    match &route.handler {
        RouteHandler::Entrypoint(entrypoint) => Router::new()
            .without_v07_checks()
            .route(&path, on(filter, run_entrypoint))
            .with_state(Arc::clone(entrypoint)),
        RouteHandler::Tool(tool) => Router::new()
            .without_v07_checks()
            .route(&path, on(filter, call_tool))
            .with_state(tool.clone()),
    }
}
