//! API documentation
//!
//! Builds the OpenAPI document for a mounted route table and serves it
//! together with a Swagger UI page.

use crate::config::AppOptions;
use axum::{
    Router,
    extract::State,
    response::{Html, Json},
    routing::get,
};
use outpost_core::{Method, RouteEntry, RouteHandler, RouteTable, TagEntry};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use utoipa::openapi::{
    OpenApi, OpenApiBuilder, Required,
    info::InfoBuilder,
    path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathsBuilder},
    request_body::RequestBody,
    response::ResponseBuilder,
    tag::{Tag, TagBuilder},
};

/// Build the OpenAPI document describing every mounted route.
pub fn openapi_document(routes: &RouteTable, tags: &[TagEntry], options: &AppOptions) -> OpenApi {
    let mut info = InfoBuilder::new()
        .title(options.title.clone())
        .version(options.version.clone());
    if !options.description.is_empty() {
        info = info.description(Some(options.description.clone()));
    }

    let paths = routes
        .iter()
        .fold(PathsBuilder::new(), |paths, route| {
            paths.path(route.path.clone(), path_item(route))
        })
        .build();

    OpenApiBuilder::new()
        .info(info.build())
        .paths(paths)
        .tags(Some(tags.iter().map(doc_tag).collect::<Vec<Tag>>()))
        .build()
}

fn doc_tag(entry: &TagEntry) -> Tag {
    let mut tag = TagBuilder::new().name(entry.name.clone());
    if !entry.description.is_empty() {
        tag = tag.description(Some(entry.description.clone()));
    }
    tag.build()
}

fn path_item(route: &RouteEntry) -> PathItem {
    let operation = OperationBuilder::new()
        .tags(Some(route.tags.clone()))
        .summary(Some(route.summary.clone()))
        .operation_id(Some(operation_id(route)))
        .response(
            "200",
            ResponseBuilder::new()
                .description("Successful Response")
                .build(),
        )
        .response(
            "422",
            ResponseBuilder::new()
                .description("The callable rejected its input")
                .build(),
        );

    let operation = match &route.handler {
        RouteHandler::Entrypoint(_) => operation.parameter(
            ParameterBuilder::new()
                .name("input_text")
                .parameter_in(ParameterIn::Query)
                .required(Required::False)
                .description(Some("Text handed to the entrypoint"))
                .build(),
        ),
        RouteHandler::Tool(tool) => match tool_request_body(tool.input_schema()) {
            Some(body) => operation.request_body(Some(body)),
            None => operation,
        },
    };

    let method = match route.method {
        Method::Get => HttpMethod::Get,
        Method::Post => HttpMethod::Post,
    };
    PathItem::new(method, operation.build())
}

fn operation_id(route: &RouteEntry) -> String {
    let path: String = route
        .path
        .trim_start_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}", route.method.as_str().to_lowercase(), path)
}

fn tool_request_body(schema: Option<serde_json::Value>) -> Option<RequestBody> {
    let schema = schema.unwrap_or_else(|| json!({}));
    let body = json!({
        "description": "JSON input passed to the tool",
        "content": { "application/json": { "schema": schema } }
    });
    match serde_json::from_value(body) {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(error = %e, "Tool input schema is not a valid OpenAPI schema, omitting it");
            None
        }
    }
}

#[derive(Clone)]
struct DocsState {
    spec: Arc<OpenApi>,
    openapi_path: Arc<str>,
}

/// Router serving the OpenAPI document and Swagger UI.
pub fn docs_router(spec: OpenApi, options: &AppOptions) -> Router {
    let state = DocsState {
        spec: Arc::new(spec),
        openapi_path: Arc::from(options.openapi_path.as_str()),
    };
    Router::new()
        .without_v07_checks()
        .route(&options.openapi_path, get(openapi_spec))
        .route(&options.docs_path, get(swagger_ui))
        .with_state(state)
}

/// GET /openapi.json - OpenAPI specification endpoint
async fn openapi_spec(State(state): State<DocsState>) -> Json<OpenApi> {
    Json(state.spec.as_ref().clone())
}

/// GET /docs - Swagger UI for interactive API documentation
async fn swagger_ui(State(state): State<DocsState>) -> Html<String> {
    Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <title>{title} - API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        SwaggerUIBundle({{
            url: '{url}',
            dom_id: '#swagger-ui',
            presets: [
                SwaggerUIBundle.presets.apis,
                SwaggerUIBundle.SwaggerUIStandalonePreset
            ]
        }});
    </script>
</body>
</html>
        "#,
        title = state.spec.info.title,
        url = state.openapi_path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::{Application, Component, ExecutionResult, RouterOptions, callable, entrypoint_fn};

    async fn fetch_data(input: serde_json::Value) -> ExecutionResult {
        ExecutionResult::success(input)
    }

    fn mounted() -> outpost_core::Mount {
        Application::builder(entrypoint_fn(|_| async { ExecutionResult::success("ok") }))
            .name("Foo")
            .description("Foo application")
            .callable(callable(fetch_data))
            .build()
            .mount(&RouterOptions::default())
            .unwrap()
    }

    #[test]
    fn document_lists_every_route_with_its_tag() {
        let mount = mounted();
        let doc = openapi_document(&mount.routes, &[mount.tag.clone()], &AppOptions::default());
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["paths"]["/foo"]["get"]["tags"], json!(["Foo"]));
        assert_eq!(
            json["paths"]["/foo/tools/fetch_data"]["post"]["tags"],
            json!(["fetch_data"])
        );
        assert_eq!(
            json["paths"]["/foo"]["get"]["operationId"],
            json!("get_foo")
        );
        assert_eq!(json["tags"][0]["name"], json!("Foo"));
        assert_eq!(json["tags"][0]["description"], json!("Foo application"));
    }

    #[test]
    fn operation_ids_are_path_derived() {
        let mount = mounted();
        let ids: Vec<String> = mount.routes.iter().map(operation_id).collect();
        assert_eq!(ids, vec!["get_foo", "post_foo_tools_fetch_data"]);
    }
}
