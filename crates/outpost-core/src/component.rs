//! Deployable components.
//!
//! Three variants share the [`Component`] capability set: [`Application`],
//! [`Model`] and [`Function`]. Only applications can currently be mounted.

use crate::error::MountError;
use crate::routes::{
    Method, Mount, RouteEntry, RouteHandler, RouteTable, RouterOptions, TagEntry, base_path,
    validate_segment,
};
use crate::tool::{Callable, Entrypoint, Tool, ToolRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Variant of a deployable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Application,
    Model,
    Function,
}

impl ComponentKind {
    /// Variant tag; its lower-cased form is the fallback URL namespace.
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::Application => "AIApplication",
            ComponentKind::Model => "AIModel",
            ComponentKind::Function => "AIFunction",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Something that can be exposed over HTTP.
pub trait Component: Send + Sync {
    fn kind(&self) -> ComponentKind;

    /// The component's name, `None` when absent or empty.
    fn name(&self) -> Option<&str>;

    fn description(&self) -> &str {
        ""
    }

    /// Derive the component's routes.
    ///
    /// Must be called at most once per deployment; the result owns the
    /// route table and the documentation tag for the component.
    fn mount(&self, options: &RouterOptions) -> Result<Mount, MountError>;
}

fn non_empty(name: &Option<String>) -> Option<&str> {
    name.as_deref().filter(|name| !name.is_empty())
}

/// An agent-like application: an entrypoint plus an ordered set of tools.
#[derive(Clone)]
pub struct Application {
    name: Option<String>,
    description: String,
    entrypoint: Arc<dyn Entrypoint>,
    tools: Vec<ToolRef>,
}

impl Application {
    pub fn builder<E: Entrypoint + 'static>(entrypoint: E) -> ApplicationBuilder {
        ApplicationBuilder {
            name: None,
            description: String::new(),
            entrypoint: Arc::new(entrypoint),
            tools: Vec::new(),
        }
    }

    pub fn entrypoint(&self) -> &Arc<dyn Entrypoint> {
        &self.entrypoint
    }

    pub fn tools(&self) -> &[ToolRef] {
        &self.tools
    }

    /// Tag under which the entrypoint and the application are documented.
    fn label(&self) -> &str {
        non_empty(&self.name).unwrap_or(self.kind().tag())
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl Component for Application {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Application
    }

    fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn mount(&self, options: &RouterOptions) -> Result<Mount, MountError> {
        options.validate()?;
        let base = base_path(self);
        validate_segment(&base)?;

        let label = self.label();
        let mut routes = RouteTable::new();

        let entry = RouteEntry {
            method: Method::Get,
            path: options.path(&format!("/{base}")),
            tags: options.tags_with(label),
            summary: format!("Run {label}"),
            handler: RouteHandler::Entrypoint(Arc::clone(&self.entrypoint)),
        };
        debug!(method = %entry.method, path = %entry.path, "Registering entrypoint route");
        routes.insert(entry)?;

        for tool in &self.tools {
            let tool_name = tool.name();
            validate_segment(tool_name)?;
            let entry = RouteEntry {
                method: Method::Post,
                path: options.path(&format!("/{base}/tools/{tool_name}")),
                tags: options.tags_with(tool_name),
                summary: if tool.description().is_empty() {
                    format!("Call {tool_name}")
                } else {
                    tool.description().to_string()
                },
                handler: RouteHandler::Tool(tool.clone()),
            };
            debug!(method = %entry.method, path = %entry.path, "Registering tool route");
            routes.insert(entry)?;
        }

        info!(
            component = label,
            base_path = %base,
            routes = routes.len(),
            "Mounted application"
        );

        Ok(Mount {
            base_path: base,
            routes,
            tag: TagEntry::new(label, self.description.clone()),
        })
    }
}

/// Builder for [`Application`].
pub struct ApplicationBuilder {
    name: Option<String>,
    description: String,
    entrypoint: Arc<dyn Entrypoint>,
    tools: Vec<ToolRef>,
}

impl ApplicationBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a tool carrying its own name.
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(ToolRef::named(tool));
        self
    }

    /// Add a bare callable, named after its identifier.
    pub fn callable<C: Callable + 'static>(mut self, callable: C) -> Self {
        self.tools.push(ToolRef::bare(callable));
        self
    }

    pub fn tool_ref(mut self, tool: ToolRef) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn build(self) -> Application {
        Application {
            name: self.name,
            description: self.description,
            entrypoint: self.entrypoint,
            tools: self.tools,
        }
    }
}

/// A structured-output model component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub name: Option<String>,
    pub instructions: String,
    /// JSON Schema of the structure the model produces.
    pub schema: Option<Value>,
}

impl Component for Model {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Model
    }

    fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    fn description(&self) -> &str {
        &self.instructions
    }

    fn mount(&self, _options: &RouterOptions) -> Result<Mount, MountError> {
        Err(MountError::UnsupportedComponent { kind: self.kind() })
    }
}

/// A single AI-backed function component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Function {
    pub name: Option<String>,
    pub description: String,
    /// JSON Schema of the function's parameters.
    pub signature: Option<Value>,
}

impl Component for Function {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Function
    }

    fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn mount(&self, _options: &RouterOptions) -> Result<Mount, MountError> {
        Err(MountError::UnsupportedComponent { kind: self.kind() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ExecutionResult, callable, entrypoint_fn};
    use async_trait::async_trait;
    use rstest::rstest;

    struct SearchTool;

    #[async_trait]
    impl Tool for SearchTool {
        fn name(&self) -> &str {
            "search"
        }

        fn description(&self) -> &str {
            "Search the knowledge base"
        }

        async fn call(&self, input: Value) -> ExecutionResult {
            ExecutionResult::success(input)
        }
    }

    async fn fetch_data(input: Value) -> ExecutionResult {
        ExecutionResult::success(input)
    }

    fn app() -> ApplicationBuilder {
        Application::builder(entrypoint_fn(|input: Option<String>| async move {
            ExecutionResult::success(input.unwrap_or_default())
        }))
    }

    #[test]
    fn named_app_with_one_tool_mounts_two_routes() {
        let app = app().name("Foo").tool(SearchTool).build();
        let mount = app.mount(&RouterOptions::default()).unwrap();

        assert_eq!(mount.base_path, "foo");
        assert_eq!(
            mount.routes.keys(),
            vec![
                (Method::Get, "/foo".to_string()),
                (Method::Post, "/foo/tools/search".to_string()),
            ]
        );
        let get = mount.routes.get(Method::Get, "/foo").unwrap();
        assert_eq!(get.tag(), "Foo");
        let post = mount.routes.get(Method::Post, "/foo/tools/search").unwrap();
        assert_eq!(post.tag(), "search");
        assert_eq!(post.summary, "Search the knowledge base");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn unnamed_app_uses_variant_tag(#[case] name: Option<&str>) {
        let mut builder = app();
        if let Some(name) = name {
            builder = builder.name(name);
        }
        let mount = builder.build().mount(&RouterOptions::default()).unwrap();
        assert_eq!(mount.base_path, "aiapplication");
        assert_eq!(mount.routes.keys(), vec![(Method::Get, "/aiapplication".to_string())]);
        assert_eq!(mount.tag.name, "AIApplication");
    }

    #[test]
    fn bare_callable_is_mounted_under_its_ident() {
        let app = app().name("Data").callable(callable(fetch_data)).build();
        let mount = app.mount(&RouterOptions::default()).unwrap();
        assert!(mount.routes.get(Method::Post, "/data/tools/fetch_data").is_some());
    }

    #[test]
    fn tools_keep_declaration_order() {
        let app = app()
            .name("Ordered")
            .callable(callable(fetch_data))
            .tool(SearchTool)
            .build();
        let paths: Vec<String> = app
            .mount(&RouterOptions::default())
            .unwrap()
            .routes
            .iter()
            .map(|route| route.path.clone())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/ordered",
                "/ordered/tools/fetch_data",
                "/ordered/tools/search"
            ]
        );
    }

    #[test]
    fn tag_entry_describes_application() {
        let app = app().name("Foo").description("Does foo things").build();
        let mount = app.mount(&RouterOptions::default()).unwrap();
        assert_eq!(mount.tag, TagEntry::new("Foo", "Does foo things"));
    }

    #[test]
    fn router_options_prefix_and_tags_apply_to_every_route() {
        let app = app().name("Foo").tool(SearchTool).build();
        let options = RouterOptions::default().with_prefix("/api").with_tag("public");
        let mount = app.mount(&options).unwrap();
        assert_eq!(
            mount.routes.keys(),
            vec![
                (Method::Get, "/api/foo".to_string()),
                (Method::Post, "/api/foo/tools/search".to_string()),
            ]
        );
        for route in &mount.routes {
            assert_eq!(route.tags.first().map(String::as_str), Some("public"));
        }
    }

    #[test]
    fn duplicate_tool_names_fail_the_mount() {
        let app = app().name("Foo").tool(SearchTool).tool(SearchTool).build();
        let err = app.mount(&RouterOptions::default()).unwrap_err();
        assert_eq!(
            err,
            MountError::DuplicateRoute {
                method: Method::Post,
                path: "/foo/tools/search".into()
            }
        );
    }

    #[test]
    fn multi_word_names_keep_their_raw_path() {
        let app = app().name("Weather Bot").tool(SearchTool).build();
        let mount = app.mount(&RouterOptions::default()).unwrap();
        assert_eq!(mount.base_path, "weather bot");
        assert_eq!(
            mount.routes.keys(),
            vec![
                (Method::Get, "/weather bot".to_string()),
                (Method::Post, "/weather bot/tools/search".to_string()),
            ]
        );
        assert_eq!(mount.tag.name, "Weather Bot");
    }

    #[test]
    fn tool_with_empty_name_is_rejected() {
        let app = app()
            .name("Foo")
            .callable(crate::tool::callable_named("", fetch_data))
            .build();
        assert!(matches!(
            app.mount(&RouterOptions::default()),
            Err(MountError::InvalidName { .. })
        ));
    }

    #[test]
    fn model_and_function_are_unsupported() {
        let model = Model {
            name: Some("Weather".into()),
            ..Model::default()
        };
        let err = model.mount(&RouterOptions::default()).unwrap_err();
        assert_eq!(
            err,
            MountError::UnsupportedComponent {
                kind: ComponentKind::Model
            }
        );

        let function = Function::default();
        let err = function.mount(&RouterOptions::default()).unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "mounting a AIFunction component is not implemented");
    }

    #[test]
    fn base_path_falls_back_per_variant() {
        assert_eq!(base_path(&Model::default()), "aimodel");
        assert_eq!(base_path(&Function::default()), "aifunction");
    }
}
