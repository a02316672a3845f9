//! # Application Configuration
//!
//! Options for the HTTP application assembled around a mounted component,
//! loadable from environment variables so a deployment can be tuned without
//! a rebuild.
//!
//! ## Environment Variables
//!
//! ### Application
//! - `OUTPOST_ENABLE_DOCS` - Serve the OpenAPI document and Swagger UI (default: true)
//! - `OUTPOST_ENABLE_CORS` - Enable permissive CORS (default: false)
//! - `OUTPOST_REQUEST_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `OUTPOST_MAX_BODY_SIZE` - Maximum request body size in bytes (default: 16777216 / 16MB)
//!
//! ### Server
//! - `OUTPOST_HOST` - Bind address (default: 0.0.0.0)
//! - `OUTPOST_PORT` - Bind port (default: 8000)
//! - `OUTPOST_SHUTDOWN_TIMEOUT` - Graceful shutdown timeout, seconds or humantime (`30s`)
//!
//! The server variables are read by [`ServerOverrides::from_env`](crate::ServerOverrides::from_env).

use outpost_core::TagEntry;
use std::env;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Invalid server option '{key}': {message}")]
    InvalidOption { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Options for the HTTP application wrapping a component.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Title of the generated API documentation
    pub title: String,
    /// Version reported in the API documentation
    pub version: String,
    /// Description of the API
    pub description: String,
    /// Documentation groups present before the component is mounted
    pub openapi_tags: Vec<TagEntry>,
    /// Serve the OpenAPI document and Swagger UI
    pub enable_docs: bool,
    /// Path of the Swagger UI page
    pub docs_path: String,
    /// Path of the OpenAPI document
    pub openapi_path: String,
    /// Enable permissive CORS for cross-origin requests
    pub enable_cors: bool,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            title: "Outpost".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: String::new(),
            openapi_tags: Vec::new(),
            enable_docs: true,
            docs_path: "/docs".to_string(),
            openapi_path: "/openapi.json".to_string(),
            enable_cors: false,
            request_timeout_secs: 30,
            max_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl AppOptions {
    /// Create a builder with default values
    #[must_use]
    pub fn builder() -> AppOptionsBuilder {
        AppOptionsBuilder::default()
    }

    /// Load options from environment variables on top of the defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value
    /// or if the resulting options fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        AppOptionsBuilder::from_env()?.build()
    }

    /// Check the options for values the application cannot be built with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be greater than 0".to_string(),
            ));
        }
        if self.max_body_size > 100 * 1024 * 1024 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be <= 100MB".to_string(),
            ));
        }
        for (name, path) in [
            ("docs_path", &self.docs_path),
            ("openapi_path", &self.openapi_path),
        ] {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be an absolute path, got '{path}'"
                )));
            }
            if path.contains(['{', '}']) || path.chars().any(char::is_whitespace) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a literal path, got '{path}'"
                )));
            }
        }
        if self.enable_docs && self.docs_path == self.openapi_path {
            return Err(ConfigError::ValidationError(
                "docs_path and openapi_path must differ".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`AppOptions`] with environment variable support
#[derive(Debug, Clone, Default)]
pub struct AppOptionsBuilder {
    options: AppOptions,
}

impl AppOptionsBuilder {
    /// Start from the defaults and apply any `OUTPOST_*` application variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparsable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(docs) = get_env_bool("OUTPOST_ENABLE_DOCS")? {
            builder = builder.enable_docs(docs);
        }
        if let Some(cors) = get_env_bool("OUTPOST_ENABLE_CORS")? {
            builder = builder.enable_cors(cors);
        }
        if let Some(timeout) = get_env_u64("OUTPOST_REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout_secs(timeout);
        }
        if let Some(max_size) = get_env_usize("OUTPOST_MAX_BODY_SIZE")? {
            builder = builder.max_body_size(max_size);
        }

        Ok(builder)
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.options.title = title.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.options.version = version.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.options.description = description.into();
        self
    }

    /// Add a documentation group that exists independently of the component
    #[must_use]
    pub fn openapi_tag(mut self, tag: TagEntry) -> Self {
        self.options.openapi_tags.push(tag);
        self
    }

    #[must_use]
    pub fn enable_docs(mut self, enable: bool) -> Self {
        self.options.enable_docs = enable;
        self
    }

    #[must_use]
    pub fn docs_path(mut self, path: impl Into<String>) -> Self {
        self.options.docs_path = path.into();
        self
    }

    #[must_use]
    pub fn openapi_path(mut self, path: impl Into<String>) -> Self {
        self.options.openapi_path = path.into();
        self
    }

    #[must_use]
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.options.enable_cors = enable;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, timeout: u64) -> Self {
        self.options.request_timeout_secs = timeout;
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.options.max_body_size = size;
        self
    }

    pub fn build(self) -> Result<AppOptions, ConfigError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

// Environment variable helper functions

pub(crate) fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

pub(crate) fn get_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        Err(_) => Ok(None),
    }
}

pub(crate) fn get_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid integer value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

pub(crate) fn get_env_u16(key: &str) -> Result<Option<u16>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid port value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid size value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
