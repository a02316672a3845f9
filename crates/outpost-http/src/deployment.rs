//! # Deployment
//!
//! A [`Deployment`] exposes one component over HTTP. Construction mounts the
//! component's routes exactly once, assembles the axum application and
//! resolves the server configuration; the server itself starts only when
//! [`Deployment::serve`] or [`Deployment::run`] is called.
//!
//! ```no_run
//! use outpost_core::{Application, ExecutionResult, entrypoint_fn};
//! use outpost_http::{Deployment, DeploymentOptions, ServerOverrides};
//!
//! let app = Application::builder(entrypoint_fn(|input: Option<String>| async move {
//!     ExecutionResult::success(input.unwrap_or_default())
//! }))
//! .name("Echo")
//! .build();
//!
//! let options = DeploymentOptions {
//!     server: ServerOverrides::new().port(9000),
//!     ..DeploymentOptions::default()
//! };
//! let deployment = Deployment::new(&app, options).expect("echo mounts");
//! deployment.serve(); // blocks until SIGINT/SIGTERM
//! ```

use crate::app::{build_router, route_path};
use crate::config::AppOptions;
use crate::error::DeployError;
use crate::server::{ServeError, Server, ServerConfig, ServerOverrides};
use crate::shutdown::shutdown_signal;
use axum::Router;
use outpost_core::{Component, ComponentKind, Mount, RouteTable, RouterOptions, TagEntry};
use std::future::Future;
use tracing::{error, info};

/// Construction parameters of a [`Deployment`].
#[derive(Debug, Clone, Default)]
pub struct DeploymentOptions {
    /// Options of the HTTP application
    pub app: AppOptions,
    /// Prefix and tags applied to every mounted route
    pub router: RouterOptions,
    /// Overrides merged onto the default bind configuration
    pub server: ServerOverrides,
}

/// A component mounted on an HTTP application, ready to be served.
#[derive(Debug)]
pub struct Deployment {
    kind: ComponentKind,
    mount: Mount,
    openapi_tags: Vec<TagEntry>,
    app: Router,
    server_config: ServerConfig,
}

impl Deployment {
    /// Mount `component` and build the application around it.
    ///
    /// # Errors
    ///
    /// - [`DeployError::Mount`] when the component cannot be mounted; model
    ///   and function components are always rejected this way
    /// - [`DeployError::RouteConflict`] when a mounted route shadows a
    ///   documentation route
    /// - [`DeployError::Config`] when the application options fail
    ///   [`AppOptions::validate`] or a server override is invalid
    pub fn new<C: Component + ?Sized>(
        component: &C,
        options: DeploymentOptions,
    ) -> Result<Self, DeployError> {
        options.app.validate()?;

        let kind = component.kind();
        let mount = component.mount(&options.router).inspect_err(|e| {
            error!(component = %kind, error = %e, "Failed to mount component");
        })?;

        if options.app.enable_docs {
            let reserved = [&options.app.docs_path, &options.app.openapi_path];
            if let Some(route) = mount
                .routes
                .iter()
                .find(|route| reserved.contains(&&route_path(&route.path)))
            {
                return Err(DeployError::RouteConflict {
                    path: route.path.clone(),
                });
            }
        }

        let mut openapi_tags = options.app.openapi_tags.clone();
        openapi_tags.push(mount.tag.clone());

        let server_config = ServerConfig::from_overrides(&options.server)?;
        let app = build_router(&mount.routes, &openapi_tags, &options.app);

        info!(
            component = %kind,
            base_path = %mount.base_path,
            routes = mount.routes.len(),
            bind = %server_config.bind_addr(),
            "Deployment ready"
        );

        Ok(Self {
            kind,
            mount,
            openapi_tags,
            app,
            server_config,
        })
    }

    /// Mount `component` with default options.
    pub fn with_defaults<C: Component + ?Sized>(component: &C) -> Result<Self, DeployError> {
        Self::new(component, DeploymentOptions::default())
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn base_path(&self) -> &str {
        &self.mount.base_path
    }

    /// The mounted routes, in registration order.
    pub fn routes(&self) -> &RouteTable {
        &self.mount.routes
    }

    /// Documentation groups: the pre-existing ones followed by the component's.
    pub fn openapi_tags(&self) -> &[TagEntry] {
        &self.openapi_tags
    }

    /// The assembled axum application.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server_config
    }

    /// The application paired with its server configuration.
    pub fn server(&self) -> Server {
        Server::new(self.server_config.clone(), self.router())
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(&self) -> Result<(), ServeError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `signal` completes.
    pub async fn run_until<F>(&self, signal: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.server().bind().await?.run(signal).await
    }

    /// Blocking serve that reports failures to the caller.
    ///
    /// Starts a multi-threaded tokio runtime and blocks on [`Deployment::run`].
    /// Must not be called from within an async runtime.
    pub fn try_serve(&self) -> Result<(), ServeError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ServeError::NestedRuntime);
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(ServeError::Runtime)?;
        runtime.block_on(self.run())
    }

    /// Blocking serve that never fails.
    ///
    /// Any error is logged and the call returns normally; use
    /// [`Deployment::try_serve`] to observe failures.
    pub fn serve(&self) {
        if let Err(e) = self.try_serve() {
            error!(error = %e, "Error while serving the application: {e}");
        }
    }
}
