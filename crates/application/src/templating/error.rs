//! Render error taxonomy
//!
//! Two kinds reach callers: syntax errors caught while parsing an
//! expression, and failures raised by a tag evaluator. Both carry the
//! offending expression text. Every kind is terminal for the current
//! render call and none is retried; recovery belongs to the caller.

use thiserror::Error;

/// Errors surfaced by a render call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The template contains a malformed expression. The message names
    /// the next expected token.
    #[error("syntax error in `{expression}`: {message}")]
    TemplateSyntax {
        /// The offending expression text.
        expression: String,
        /// What the parser expected next.
        message: String,
    },

    /// A tag evaluator failed.
    #[error("tag `{expression}` failed: {source}")]
    Extension {
        /// The offending tag invocation text.
        expression: String,
        /// The underlying evaluator failure.
        #[source]
        source: ExtensionError,
    },
}

impl RenderError {
    /// Builds a syntax error for the given expression snippet.
    #[must_use]
    pub fn syntax(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateSyntax {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// The expression text the error points at.
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::TemplateSyntax { expression, .. } | Self::Extension { expression, .. } => {
                expression
            }
        }
    }
}

/// Failures raised by tag evaluators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// The tag name is not registered.
    #[error("unknown tag `{0}`")]
    UnknownExtension(String),

    /// A tag argument is missing or has the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced request has no stored response yet, or the
    /// referenced entity does not exist.
    #[error("no response for request `{0}`")]
    Reference(String),

    /// The body filter is invalid or matched nothing.
    #[error("filter error: {0}")]
    Filter(String),

    /// A request property refers back to itself while being rendered.
    #[error("cyclic reference: {0}")]
    CyclicReference(String),

    /// Base64 input could not be decoded, or bytes were not valid text.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The document store failed during evaluation.
    #[error("store error: {0}")]
    Store(String),

    /// A render performed inside a tag failed. The inner error is
    /// carried unchanged so it keeps its kind when it reaches the
    /// caller.
    #[error(transparent)]
    Nested(Box<RenderError>),
}

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
