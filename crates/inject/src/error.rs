//! Errors raised while binding or resolving services.
//!
//! Every variant is a wiring mistake. They are raised at resolution time and
//! are not meant to be recovered from at the call site.

use thiserror::Error;

use crate::token::Token;

/// Unified error type for container operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContainerError {
    /// `get` on a token with no binding.
    #[error("Unknown binding: {0}")]
    UnknownBinding(Token),

    /// A required constructor dependency has no binding.
    #[error("Cannot inject {token} into parameter {index} of {target}: no binding")]
    Injection {
        target: &'static str,
        index: usize,
        token: Token,
    },

    /// Injection metadata leaves a hole in the parameter list.
    #[error("No token declared for parameter {index} of {target}")]
    UnspecifiedParameter { target: &'static str, index: usize },

    /// The bound value is not of the requested type.
    #[error("Binding {token} does not hold a {expected}")]
    TypeMismatch {
        token: Token,
        expected: &'static str,
    },

    /// A constructor asked for more arguments than were supplied.
    #[error("Missing argument {index} for {target}")]
    MissingArgument { target: &'static str, index: usize },

    /// A constructor argument is not of the requested type.
    #[error("Argument {index} of {target} is not a {expected}")]
    ArgumentType {
        target: &'static str,
        index: usize,
        expected: &'static str,
    },

    /// A singleton factory re-entered its own resolution.
    #[error("Circular dependency while resolving {0}")]
    CircularDependency(Token),

    /// A constructor or factory rejected its inputs.
    #[error("Failed to construct {target}: {reason}")]
    Construction { target: &'static str, reason: String },
}

impl ContainerError {
    pub fn unknown_binding(token: impl Into<Token>) -> Self {
        Self::UnknownBinding(token.into())
    }

    /// Creates a construction error for a constructor that cannot proceed.
    ///
    /// # Example
    /// ```ignore
    /// if width == 0 {
    ///     return Err(ContainerError::construction::<Self>("width must be positive"));
    /// }
    /// ```
    pub fn construction<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Construction {
            target: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// The token that had no binding, for unknown-binding and injection errors.
    pub fn missing_token(&self) -> Option<&Token> {
        match self {
            Self::UnknownBinding(token) | Self::Injection { token, .. } => Some(token),
            _ => None,
        }
    }
}
