//! Server adapter
//!
//! Merges caller overrides onto the default bind configuration and runs the
//! assembled axum application on a tokio listener.

use crate::config::{ConfigError, get_env_string, get_env_u16};
use crate::shutdown::shutdown_signal;
use axum::Router;
use serde_json::{Map, Value};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port
pub const DEFAULT_PORT: u16 = 8000;

const HOST: &str = "host";
const PORT: &str = "port";
const SHUTDOWN_TIMEOUT: &str = "timeout_graceful_shutdown";
const APP: &str = "app";

/// Errors raised while running the server
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("blocking serve() called from within an async runtime; use run() instead")]
    NestedRuntime,
}

/// Flat server option overrides, keyed by option name.
///
/// Recognized keys are `host`, `port` and `timeout_graceful_shutdown`;
/// any other key fails [`ServerConfig::from_overrides`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerOverrides(Map<String, Value>);

impl ServerOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn host(self, host: impl Into<String>) -> Self {
        self.set(HOST, host.into())
    }

    #[must_use]
    pub fn port(self, port: u16) -> Self {
        self.set(PORT, port)
    }

    #[must_use]
    pub fn shutdown_timeout(self, timeout: Duration) -> Self {
        self.set(SHUTDOWN_TIMEOUT, timeout.as_secs())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layer `other` on top of `self`; keys in `other` win.
    #[must_use]
    pub fn merge(mut self, other: ServerOverrides) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Read `OUTPOST_HOST`, `OUTPOST_PORT` and `OUTPOST_SHUTDOWN_TIMEOUT`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` when the port is not a valid `u16`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut overrides = Self::new();
        if let Some(host) = get_env_string("OUTPOST_HOST") {
            overrides = overrides.host(host);
        }
        if let Some(port) = get_env_u16("OUTPOST_PORT")? {
            overrides = overrides.port(port);
        }
        if let Some(timeout) = get_env_string("OUTPOST_SHUTDOWN_TIMEOUT") {
            overrides = overrides.set(SHUTDOWN_TIMEOUT, timeout);
        }
        Ok(overrides)
    }
}

impl From<Map<String, Value>> for ServerOverrides {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ServerOverrides {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolved server configuration, fixed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on connection draining after a shutdown signal.
    pub shutdown_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            shutdown_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Merge overrides onto the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidOption` when a recognized option has a
    /// value of the wrong type or range, or when a key is not recognized.
    pub fn from_overrides(overrides: &ServerOverrides) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (key, value) in &overrides.0 {
            match key.as_str() {
                HOST => config.host = parse_host(value)?,
                PORT => config.port = parse_port(value)?,
                SHUTDOWN_TIMEOUT => config.shutdown_timeout = parse_timeout(value)?,
                APP => {
                    return Err(invalid(
                        APP,
                        "the application is provided by the deployment",
                    ));
                }
                _ => {
                    return Err(invalid(
                        key,
                        "unknown server option; expected host, port or timeout_graceful_shutdown",
                    ));
                }
            }
        }

        Ok(config)
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidOption {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_host(value: &Value) -> Result<String, ConfigError> {
    match value.as_str() {
        Some(host) if !host.trim().is_empty() => Ok(host.trim().to_string()),
        Some(_) => Err(invalid(HOST, "host must not be empty")),
        None => Err(invalid(HOST, format!("expected a string, got {value}"))),
    }
}

fn parse_port(value: &Value) -> Result<u16, ConfigError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(PORT, format!("expected a port number 0-65535, got {value}")))
}

fn parse_timeout(value: &Value) -> Result<Option<Duration>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(|secs| Some(Duration::from_secs(secs)))
            .ok_or_else(|| invalid(SHUTDOWN_TIMEOUT, format!("expected whole seconds, got {n}"))),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<u64>() {
                return Ok(Some(Duration::from_secs(secs)));
            }
            humantime::parse_duration(s)
                .map(Some)
                .map_err(|e| invalid(SHUTDOWN_TIMEOUT, format!("invalid duration '{s}': {e}")))
        }
        other => Err(invalid(
            SHUTDOWN_TIMEOUT,
            format!("expected seconds or a duration string, got {other}"),
        )),
    }
}

/// An application paired with its server configuration.
#[derive(Debug, Clone)]
pub struct Server {
    config: ServerConfig,
    app: Router,
}

impl Server {
    pub fn new(config: ServerConfig, app: Router) -> Self {
        Self { config, app }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address.
    pub async fn bind(self) -> Result<BoundServer, ServeError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        Ok(BoundServer {
            listener,
            local_addr,
            app: self.app,
            shutdown_timeout: self.config.shutdown_timeout,
        })
    }

    /// Bind and serve until SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<(), ServeError> {
        self.bind().await?.run(shutdown_signal()).await
    }
}

/// A server holding a bound listener, ready to accept connections.
#[derive(Debug)]
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
    shutdown_timeout: Option<Duration>,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `signal` completes, then drain open connections.
    ///
    /// With a shutdown timeout configured, draining stops after that long.
    pub async fn run<F>(self, signal: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr, "Serving application");

        let draining = Arc::new(Notify::new());
        let trigger = Arc::clone(&draining);
        let server = axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move {
                signal.await;
                trigger.notify_one();
            })
            .into_future();

        match self.shutdown_timeout {
            None => server.await?,
            Some(timeout) => {
                tokio::pin!(server);
                tokio::select! {
                    result = &mut server => result?,
                    _ = async {
                        draining.notified().await;
                        tokio::time::sleep(timeout).await;
                    } => {
                        warn!(?timeout, "Graceful shutdown timed out, dropping open connections");
                    }
                }
            }
        }

        info!(addr = %self.local_addr, "Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_without_overrides() {
        let config = ServerConfig::from_overrides(&ServerOverrides::new()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.shutdown_timeout, None);
    }

    #[test]
    fn port_override_keeps_default_host() {
        let overrides = ServerOverrides::new().set("port", 9000);
        let config = ServerConfig::from_overrides(&overrides).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn port_accepts_numeric_string() {
        let overrides = ServerOverrides::new().set("port", "9001");
        assert_eq!(ServerConfig::from_overrides(&overrides).unwrap().port, 9001);
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let overrides = ServerOverrides::new().set("port", 70000);
        let err = ServerConfig::from_overrides(&overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref key, .. } if key == "port"));
    }

    #[test]
    fn app_key_is_reserved() {
        let overrides = ServerOverrides::new().set("app", "other");
        assert!(ServerConfig::from_overrides(&overrides).is_err());
    }

    #[test]
    fn unknown_options_are_rejected() {
        let overrides = ServerOverrides::new().port(9000).set("log_level", "debug");
        let err = ServerConfig::from_overrides(&overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref key, .. } if key == "log_level"));
    }

    #[test]
    fn shutdown_timeout_accepts_seconds_and_humantime() {
        let secs = ServerOverrides::new().set("timeout_graceful_shutdown", 5);
        assert_eq!(
            ServerConfig::from_overrides(&secs).unwrap().shutdown_timeout,
            Some(Duration::from_secs(5))
        );

        let human = ServerOverrides::new().set("timeout_graceful_shutdown", "1m 30s");
        assert_eq!(
            ServerConfig::from_overrides(&human).unwrap().shutdown_timeout,
            Some(Duration::from_secs(90))
        );

        let bad = ServerOverrides::new().set("timeout_graceful_shutdown", "soon");
        assert!(ServerConfig::from_overrides(&bad).is_err());
    }

    #[test]
    fn later_overrides_win_on_merge() {
        let merged = ServerOverrides::new()
            .host("127.0.0.1")
            .port(1)
            .merge(ServerOverrides::new().port(2));
        assert_eq!(merged.get("host"), Some(&json!("127.0.0.1")));
        assert_eq!(merged.get("port"), Some(&json!(2)));
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let config = ServerConfig {
            host: "::1".into(),
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(config.bind_addr(), "[::1]:8080");
    }

    #[tokio::test]
    async fn bind_reports_address_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port,
            ..ServerConfig::default()
        };
        let err = Server::new(config, Router::new()).bind().await.unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }));
    }

    #[tokio::test]
    async fn run_stops_when_signal_completes() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            shutdown_timeout: Some(Duration::from_secs(1)),
            ..ServerConfig::default()
        };
        let bound = Server::new(config, Router::new()).bind().await.unwrap();
        assert_ne!(bound.local_addr().port(), 0);
        bound.run(async {}).await.unwrap();
    }
}
