//! Callables exposed by a deployed component.
//!
//! An [`Application`](crate::Application) carries one [`Entrypoint`] and an
//! ordered list of tools. A tool is either a [`Tool`] that carries its own
//! explicit name, or a bare [`Callable`] whose name is the identifier of the
//! function it wraps.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Categorized failure reasons for a callable invocation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// Invalid or malformed input provided to the callable
    InvalidInput {
        /// Description of what was invalid
        message: String,
    },
    /// Required resource not found
    NotFound {
        /// What was not found
        resource: String,
    },
    /// Permission denied or unauthorized access
    PermissionDenied {
        /// What operation was denied
        message: String,
    },
    /// Timeout exceeded
    Timeout {
        /// What operation timed out
        operation: String,
    },
    /// Internal error or unexpected state
    InternalError {
        /// Description of the internal error
        message: String,
    },
    /// Callable-specific failure
    Custom {
        /// Error category or code
        category: String,
        /// Error message
        message: String,
    },
}

impl FailureReason {
    /// Get a human-readable error message
    pub fn message(&self) -> String {
        match self {
            FailureReason::InvalidInput { message } => format!("Invalid input: {}", message),
            FailureReason::NotFound { resource } => format!("Not found: {}", resource),
            FailureReason::PermissionDenied { message } => {
                format!("Permission denied: {}", message)
            }
            FailureReason::Timeout { operation } => format!("Timeout: {}", operation),
            FailureReason::InternalError { message } => format!("Internal error: {}", message),
            FailureReason::Custom { category, message } => format!("{}: {}", category, message),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// The result of invoking an entrypoint or a tool.
///
/// Either a JSON output or a structured failure; there is no state in which
/// a result is both.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The callable completed with the given JSON output.
    Success { output: Value },

    /// The callable failed with a structured reason.
    Failure { reason: FailureReason },
}

impl ExecutionResult {
    /// Create a successful result from anything convertible to JSON.
    pub fn success(output: impl Into<Value>) -> Self {
        ExecutionResult::Success {
            output: output.into(),
        }
    }

    /// Create a failed result with a structured reason.
    pub fn failed(reason: FailureReason) -> Self {
        ExecutionResult::Failure { reason }
    }

    /// Create a failed result from a plain error message.
    ///
    /// The message is wrapped in `FailureReason::InternalError`.
    pub fn failure(error_message: impl Into<String>) -> Self {
        ExecutionResult::Failure {
            reason: FailureReason::InternalError {
                message: error_message.into(),
            },
        }
    }

    /// Create a failed result for input the callable cannot accept.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ExecutionResult::Failure {
            reason: FailureReason::InvalidInput {
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure { .. })
    }

    /// Get the success output if available.
    pub fn success_output(&self) -> Option<&Value> {
        match self {
            ExecutionResult::Success { output } => Some(output),
            ExecutionResult::Failure { .. } => None,
        }
    }

    /// Get the failure reason if available.
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::Failure { reason } => Some(reason),
        }
    }

    /// Convert to a `Result`, keeping the structured failure reason.
    pub fn into_result(self) -> Result<Value, FailureReason> {
        match self {
            ExecutionResult::Success { output } => Ok(output),
            ExecutionResult::Failure { reason } => Err(reason),
        }
    }
}

/// The primary callable of an application, exposed as a `GET` endpoint.
///
/// `input_text` is the optional `input_text` query parameter of the request.
#[async_trait]
pub trait Entrypoint: Send + Sync {
    async fn run(&self, input_text: Option<String>) -> ExecutionResult;
}

/// Adapter turning an async function into an [`Entrypoint`].
pub struct FnEntrypoint<F> {
    f: F,
}

/// Wrap an async function or closure as an application entrypoint.
pub fn entrypoint_fn<F, Fut>(f: F) -> FnEntrypoint<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecutionResult> + Send + 'static,
{
    FnEntrypoint { f }
}

#[async_trait]
impl<F, Fut> Entrypoint for FnEntrypoint<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecutionResult> + Send + 'static,
{
    async fn run(&self, input_text: Option<String>) -> ExecutionResult {
        (self.f)(input_text).await
    }
}

/// A tool that carries its own explicit name.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use outpost_core::{ExecutionResult, Tool};
/// use serde_json::{Value, json};
///
/// struct DoubleTool;
///
/// #[async_trait]
/// impl Tool for DoubleTool {
///     fn name(&self) -> &str {
///         "double"
///     }
///
///     fn description(&self) -> &str {
///         "Multiplies a number by 2"
///     }
///
///     async fn call(&self, input: Value) -> ExecutionResult {
///         match input.as_f64() {
///             Some(num) => ExecutionResult::success(json!(num * 2.0)),
///             None => ExecutionResult::invalid_input("expected a number"),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name used in the tool's endpoint path and documentation tag.
    fn name(&self) -> &str;

    /// Human-readable description shown in the API documentation.
    fn description(&self) -> &str {
        ""
    }

    /// JSON Schema for the request body, if the tool declares one.
    fn input_schema(&self) -> Option<Value> {
        None
    }

    /// Execute the tool with the JSON request body (`null` when empty).
    async fn call(&self, input: Value) -> ExecutionResult;
}

/// A bare callable registered as a tool without an explicit name.
///
/// Its endpoint is named after [`Callable::ident`].
#[async_trait]
pub trait Callable: Send + Sync {
    /// The callable's own identifier.
    fn ident(&self) -> &str;

    async fn call(&self, input: Value) -> ExecutionResult;
}

/// Adapter turning an async function into a [`Callable`].
pub struct FnCallable<F> {
    ident: String,
    f: F,
}

impl<F> fmt::Debug for FnCallable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCallable")
            .field("ident", &self.ident)
            .finish_non_exhaustive()
    }
}

/// Wrap a function item as a bare callable named after the function.
///
/// `callable(fetch_data)` yields the identifier `fetch_data`. Closures have
/// no name of their own and are identified as `closure`; use
/// [`callable_named`] for those.
pub fn callable<F, Fut>(f: F) -> FnCallable<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecutionResult> + Send + 'static,
{
    FnCallable {
        ident: fn_ident::<F>(),
        f,
    }
}

/// Wrap a function or closure as a bare callable with the given identifier.
pub fn callable_named<F, Fut>(ident: impl Into<String>, f: F) -> FnCallable<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecutionResult> + Send + 'static,
{
    FnCallable {
        ident: ident.into(),
        f,
    }
}

#[async_trait]
impl<F, Fut> Callable for FnCallable<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecutionResult> + Send + 'static,
{
    fn ident(&self) -> &str {
        &self.ident
    }

    async fn call(&self, input: Value) -> ExecutionResult {
        (self.f)(input).await
    }
}

/// Last path segment of a function item's type name.
fn fn_ident<F>() -> String {
    let full = std::any::type_name::<F>();
    if full.contains("{{closure}}") {
        return "closure".to_string();
    }
    let path = full.split('<').next().unwrap_or(full);
    match path.rsplit("::").next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => "closure".to_string(),
    }
}

/// A tool as registered on an application.
#[derive(Clone)]
pub enum ToolRef {
    /// A tool with an explicit name.
    Named(Arc<dyn Tool>),
    /// A bare callable, named by its own identifier.
    Bare(Arc<dyn Callable>),
}

impl ToolRef {
    pub fn named<T: Tool + 'static>(tool: T) -> Self {
        ToolRef::Named(Arc::new(tool))
    }

    pub fn bare<C: Callable + 'static>(callable: C) -> Self {
        ToolRef::Bare(Arc::new(callable))
    }

    /// The explicit tool name, or the callable's identifier for bare tools.
    pub fn name(&self) -> &str {
        match self {
            ToolRef::Named(tool) => tool.name(),
            ToolRef::Bare(callable) => callable.ident(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ToolRef::Named(tool) => tool.description(),
            ToolRef::Bare(_) => "",
        }
    }

    pub fn input_schema(&self) -> Option<Value> {
        match self {
            ToolRef::Named(tool) => tool.input_schema(),
            ToolRef::Bare(_) => None,
        }
    }

    pub async fn call(&self, input: Value) -> ExecutionResult {
        match self {
            ToolRef::Named(tool) => tool.call(input).await,
            ToolRef::Bare(callable) => callable.call(input).await,
        }
    }
}

impl fmt::Debug for ToolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolRef::Named(tool) => f.debug_tuple("Named").field(&tool.name()).finish(),
            ToolRef::Bare(callable) => f.debug_tuple("Bare").field(&callable.ident()).finish(),
        }
    }
}

impl From<Arc<dyn Tool>> for ToolRef {
    fn from(tool: Arc<dyn Tool>) -> Self {
        ToolRef::Named(tool)
    }
}

impl From<Arc<dyn Callable>> for ToolRef {
    fn from(callable: Arc<dyn Callable>) -> Self {
        ToolRef::Bare(callable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        async fn call(&self, input: Value) -> ExecutionResult {
            ExecutionResult::success(json!({ "echo": input }))
        }
    }

    async fn fetch_data(input: Value) -> ExecutionResult {
        ExecutionResult::success(input)
    }

    #[tokio::test]
    async fn named_tool_can_echo_input() {
        let tool = ToolRef::named(EchoTool);
        let result = tool.call(json!("Outpost")).await;
        assert_eq!(result.success_output(), Some(&json!({ "echo": "Outpost" })));
        assert!(result.is_success());
    }

    #[test]
    fn named_tool_reports_explicit_name() {
        assert_eq!(ToolRef::named(EchoTool).name(), "echo");
    }

    #[test]
    fn bare_function_is_named_after_itself() {
        let tool = ToolRef::bare(callable(fetch_data));
        assert_eq!(tool.name(), "fetch_data");
        assert_eq!(tool.description(), "");
    }

    #[test]
    fn bare_closure_falls_back_to_generic_ident() {
        let tool = callable(|input: Value| async move { ExecutionResult::success(input) });
        assert_eq!(tool.ident(), "closure");
    }

    #[test]
    fn callable_named_overrides_ident() {
        let tool = callable_named("lookup", |_input: Value| async {
            ExecutionResult::success(Value::Null)
        });
        assert_eq!(tool.ident(), "lookup");
    }

    #[tokio::test]
    async fn entrypoint_fn_receives_query_text() {
        let entrypoint = entrypoint_fn(|input: Option<String>| async move {
            ExecutionResult::success(input.unwrap_or_default())
        });
        let result = entrypoint.run(Some("hi".into())).await;
        assert_eq!(result.into_result(), Ok(json!("hi")));
    }

    #[test]
    fn failure_reason_messages() {
        let result = ExecutionResult::invalid_input("not a number");
        assert!(result.is_failure());
        assert_eq!(
            result.failure_reason().map(FailureReason::message),
            Some("Invalid input: not a number".to_string())
        );
        assert_eq!(
            ExecutionResult::failure("boom").failure_reason().map(|r| r.to_string()),
            Some("Internal error: boom".to_string())
        );
    }
}
