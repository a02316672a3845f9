//! # Outpost HTTP
//!
//! Exposes an Outpost component over HTTP using Axum: mounts its routes,
//! generates OpenAPI documentation and runs the server.
//!
//! ## Modules
//!
//! - **[deployment]**: the [`Deployment`] object tying everything together
//! - **[server]**: bind configuration and the server loop
//! - **[config]**: application options and environment loading
//! - **[docs]**: OpenAPI document and Swagger UI
//! - **[handlers]**: HTTP handlers for entrypoints and tools

/// Axum router assembly and middleware.
pub mod app;
/// Application options and environment configuration.
pub mod config;
/// Deployment of a component.
pub mod deployment;
/// OpenAPI document and Swagger UI.
pub mod docs;
/// Error types, HTTP error bodies and request IDs.
pub mod error;
/// Handlers for mounted callables.
pub mod handlers;
/// Server configuration and lifecycle.
pub mod server;
/// Graceful shutdown signals.
pub mod shutdown;

pub use config::{AppOptions, AppOptionsBuilder, ConfigError};
pub use deployment::{Deployment, DeploymentOptions};
pub use error::{DeployError, ErrorCode, ErrorResponse, RequestIdExtension};
pub use server::{
    BoundServer, DEFAULT_HOST, DEFAULT_PORT, ServeError, Server, ServerConfig, ServerOverrides,
};
pub use shutdown::shutdown_signal;
