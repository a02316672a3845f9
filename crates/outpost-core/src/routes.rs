//! Route table produced by mounting a component.
//!
//! The table is framework-agnostic: it records which callable answers which
//! method and path, and which documentation tags it belongs to. The HTTP
//! crate turns it into an axum router.

use crate::component::Component;
use crate::error::MountError;
use crate::tool::{Entrypoint, ToolRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// HTTP methods used by mounted routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The callable behind a route.
#[derive(Clone)]
pub enum RouteHandler {
    Entrypoint(Arc<dyn Entrypoint>),
    Tool(ToolRef),
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteHandler::Entrypoint(_) => f.write_str("Entrypoint"),
            RouteHandler::Tool(tool) => f.debug_tuple("Tool").field(tool).finish(),
        }
    }
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    /// Documentation tags; router-wide tags first, the route's own tag last.
    pub tags: Vec<String>,
    pub summary: String,
    pub handler: RouteHandler,
}

impl RouteEntry {
    /// The tag derived from the mounted callable itself.
    pub fn tag(&self) -> &str {
        self.tags.last().map(String::as_str).unwrap_or_default()
    }
}

/// Ordered set of routes, keyed by `(method, path)`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route, rejecting a second registration of the same
    /// method and path.
    pub fn insert(&mut self, entry: RouteEntry) -> Result<(), MountError> {
        if self.get(entry.method, &entry.path).is_some() {
            return Err(MountError::DuplicateRoute {
                method: entry.method,
                path: entry.path,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, method: Method, path: &str) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .find(|entry| entry.method == method && entry.path == path)
    }

    /// Routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// `(method, path)` pairs in registration order.
    pub fn keys(&self) -> Vec<(Method, String)> {
        self.entries
            .iter()
            .map(|entry| (entry.method, entry.path.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteEntry;
    type IntoIter = std::slice::Iter<'a, RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Documentation group attached to the application's tag metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub description: String,
}

impl TagEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Options applied to every route of a mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Path prefix such as `/api/v1`; empty for none.
    pub prefix: String,
    /// Tags attached to every mounted route ahead of the route's own tag.
    pub tags: Vec<String>,
}

impl RouterOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), MountError> {
        if self.prefix.is_empty() {
            return Ok(());
        }
        let reason = if !self.prefix.starts_with('/') {
            Some("must start with '/'")
        } else if self.prefix.ends_with('/') {
            Some("must not end with '/'")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(MountError::InvalidPrefix {
                prefix: self.prefix.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn path(&self, relative: &str) -> String {
        format!("{}{}", self.prefix, relative)
    }

    pub(crate) fn tags_with(&self, own: &str) -> Vec<String> {
        let mut tags = self.tags.clone();
        tags.push(own.to_string());
        tags
    }
}

/// Everything a successful mount produces.
#[derive(Debug, Clone)]
pub struct Mount {
    /// Lower-cased namespace of the component, as documented.
    pub base_path: String,
    pub routes: RouteTable,
    /// Documentation group describing the component.
    pub tag: TagEntry,
}

/// Derive the URL namespace of a component.
///
/// The lower-cased component name, or the lower-cased variant tag when the
/// component has no name.
pub fn base_path<C: Component + ?Sized>(component: &C) -> String {
    match component.name() {
        Some(name) => name.to_lowercase(),
        None => component.kind().tag().to_lowercase(),
    }
}

/// Check that a name can be used as a path segment.
///
/// Any non-empty name is routable; characters that are special in a URL
/// are percent-encoded when the route is registered.
pub(crate) fn validate_segment(name: &str) -> Result<(), MountError> {
    if name.is_empty() {
        return Err(MountError::InvalidName {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    Ok(())
}
