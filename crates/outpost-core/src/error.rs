//! Errors raised while mounting a component.

use crate::component::ComponentKind;
use crate::routes::Method;
use thiserror::Error;

/// Failure to derive or register the routes of a component.
///
/// Mounting is all-or-nothing: when any of these is returned no route table
/// exists for the component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    /// The component variant cannot be exposed over HTTP.
    #[error("mounting a {} component is not implemented", kind.tag())]
    UnsupportedComponent { kind: ComponentKind },

    /// A tool name is empty, so it has no endpoint of its own.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The router prefix is not of the form `/segment[/segment...]`.
    #[error("invalid router prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },

    /// Two callables resolved to the same method and path.
    #[error("route {method} {path} is registered more than once")]
    DuplicateRoute { method: Method, path: String },
}

impl MountError {
    /// Whether this error signals an unsupported component variant.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MountError::UnsupportedComponent { .. })
    }
}
