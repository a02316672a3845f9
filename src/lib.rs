//! # Outpost
//!
//! Outpost serves an AI application component over HTTP. Mounting an
//! [`Application`] exposes its entrypoint at `GET /{name}` and each of its
//! tools at `POST /{name}/tools/{tool}`, documented with OpenAPI.
//!
//! ## Quick Start
//!
//! ```no_run
//! use outpost::{Application, Deployment, DeploymentOptions, ExecutionResult, ServerOverrides};
//! use outpost::entrypoint_fn;
//!
//! let app = Application::builder(entrypoint_fn(|input: Option<String>| async move {
//!     ExecutionResult::success(format!("Echo: {}", input.unwrap_or_default()))
//! }))
//! .name("Echo")
//! .build();
//!
//! let options = DeploymentOptions {
//!     server: ServerOverrides::new().port(9000),
//!     ..DeploymentOptions::default()
//! };
//! Deployment::new(&app, options).expect("echo mounts").serve();
//! ```

// ============================================================================
// Module aliases for namespaced access
// ============================================================================

pub use outpost_core as core;
pub use outpost_http as http;

// ============================================================================
// Components and callables
// ============================================================================

pub use outpost_core::{Application, ApplicationBuilder, Component, ComponentKind, Function, Model};

pub use outpost_core::{
    Callable, Entrypoint, ExecutionResult, FailureReason, Tool, ToolRef, callable, callable_named,
    entrypoint_fn,
};

// ============================================================================
// Routes
// ============================================================================

pub use outpost_core::{Method, Mount, MountError, RouteEntry, RouteTable, RouterOptions, TagEntry};

// ============================================================================
// Deployment and server
// ============================================================================

pub use outpost_http::{
    AppOptions, ConfigError, DeployError, Deployment, DeploymentOptions, ServeError, Server,
    ServerConfig, ServerOverrides,
};
