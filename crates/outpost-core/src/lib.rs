//! # Outpost Core
//!
//! Component model for Outpost deployments: the deployable component
//! variants, the callables they expose, and the derivation of a route table
//! from a component.
//!
//! ## Mounting
//!
//! ```rust
//! use outpost_core::{Application, Component, ExecutionResult, Method, RouterOptions, entrypoint_fn};
//!
//! let app = Application::builder(entrypoint_fn(|input: Option<String>| async move {
//!     ExecutionResult::success(format!("Echo: {}", input.unwrap_or_default()))
//! }))
//! .name("Echo")
//! .description("Repeats what it is told")
//! .build();
//!
//! let mount = app.mount(&RouterOptions::default()).expect("application mounts");
//! assert_eq!(mount.routes.keys(), vec![(Method::Get, "/echo".to_string())]);
//! ```

/// Deployable component variants and the mounting capability.
pub mod component;
/// Errors raised while mounting.
pub mod error;
/// Route table, documentation tags and router options.
pub mod routes;
/// Entrypoints, tools and bare callables.
pub mod tool;

pub use component::{Application, ApplicationBuilder, Component, ComponentKind, Function, Model};
pub use error::MountError;
pub use routes::{
    Method, Mount, RouteEntry, RouteHandler, RouteTable, RouterOptions, TagEntry, base_path,
};
pub use tool::{
    Callable, Entrypoint, ExecutionResult, FailureReason, FnCallable, FnEntrypoint, Tool,
    ToolRef, callable, callable_named, entrypoint_fn,
};
