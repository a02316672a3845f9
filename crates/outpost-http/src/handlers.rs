//! HTTP handlers for mounted callables
//!
//! Each mounted route carries its callable as router state; the handlers
//! only translate between HTTP and [`ExecutionResult`].

use crate::error::{ErrorCode, ErrorResponse, RequestIdExtension};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Extensions, StatusCode},
    response::{IntoResponse, Json, Response},
};
use outpost_core::{Entrypoint, ExecutionResult, ToolRef};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Query parameters accepted by an entrypoint route
#[derive(Debug, Default, Deserialize)]
pub struct EntrypointQuery {
    /// Text handed to the entrypoint
    pub input_text: Option<String>,
}

/// GET /{base} - run the component's entrypoint
pub async fn run_entrypoint(
    State(entrypoint): State<Arc<dyn Entrypoint>>,
    extensions: Extensions,
    Query(query): Query<EntrypointQuery>,
) -> Response {
    let started = Instant::now();
    let result = entrypoint.run(query.input_text).await;
    debug!(
        elapsed = ?started.elapsed(),
        success = result.is_success(),
        "Entrypoint completed"
    );
    result_response(result, extensions.get::<RequestIdExtension>())
}

/// POST /{base}/tools/{name} - call a tool with the JSON request body
///
/// An empty body is passed to the tool as `null`.
pub async fn call_tool(
    State(tool): State<ToolRef>,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    let request_id = extensions.get::<RequestIdExtension>();
    let input = match parse_body(&body) {
        Ok(input) => input,
        Err(e) => {
            return ErrorResponse::new(ErrorCode::InvalidJson, format!("invalid JSON body: {e}"))
                .with_request_id(request_id)
                .into_response();
        }
    };

    let started = Instant::now();
    let result = tool.call(input).await;
    debug!(
        tool = tool.name(),
        elapsed = ?started.elapsed(),
        success = result.is_success(),
        "Tool call completed"
    );
    result_response(result, request_id)
}

fn parse_body(body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
}

fn result_response(result: ExecutionResult, request_id: Option<&RequestIdExtension>) -> Response {
    match result {
        ExecutionResult::Success { output } => (StatusCode::OK, Json(output)).into_response(),
        ExecutionResult::Failure { reason } => ErrorResponse::from(&reason)
            .with_request_id(request_id)
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_and_blank_bodies_are_null() {
        assert_eq!(parse_body(b"").unwrap(), Value::Null);
        assert_eq!(parse_body(b"  \n").unwrap(), Value::Null);
    }

    #[test]
    fn json_bodies_are_parsed() {
        assert_eq!(parse_body(br#"{"q":"rust"}"#).unwrap(), json!({ "q": "rust" }));
        assert!(parse_body(b"{not json").is_err());
    }
}
