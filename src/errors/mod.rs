//! Error categories used to decide whether a failure aborts a batch.
//!
//! Bulk operations collect per-item failures and keep going; only a
//! [`ErrorCategory::Fatal`] error stops them. Errors that were never
//! categorized count as validation failures.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Internal or system failure; the batch cannot continue.
    Fatal,
    /// Bad input (malformed frontmatter, invalid name, name conflict).
    Validation,
    /// A filesystem resource could not be read, written or removed.
    Resource,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fatal => "fatal",
            Self::Validation => "validation",
            Self::Resource => "resource",
        };
        f.write_str(s)
    }
}

/// An error tagged with its [`ErrorCategory`] and an optional context string.
#[derive(Debug)]
pub struct TypedError {
    pub category: ErrorCategory,
    pub source: anyhow::Error,
    pub context: String,
}

impl TypedError {
    pub fn new(
        category: ErrorCategory,
        source: impl Into<anyhow::Error>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            category,
            source: source.into(),
            context: context.into(),
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category == ErrorCategory::Fatal
    }
}

impl fmt::Display for TypedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}: {}", self.context, self.source)
        }
    }
}

impl std::error::Error for TypedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

pub fn fatal(source: impl Into<anyhow::Error>, context: impl Into<String>) -> TypedError {
    TypedError::new(ErrorCategory::Fatal, source, context)
}

pub fn validation(source: impl Into<anyhow::Error>, context: impl Into<String>) -> TypedError {
    TypedError::new(ErrorCategory::Validation, source, context)
}

pub fn resource(source: impl Into<anyhow::Error>, context: impl Into<String>) -> TypedError {
    TypedError::new(ErrorCategory::Resource, source, context)
}

/// Category of an arbitrary error. Anything not wrapped in a [`TypedError`]
/// is treated as a validation failure.
#[must_use]
pub fn category_of(err: &anyhow::Error) -> ErrorCategory {
    err.chain()
        .find_map(|e| e.downcast_ref::<TypedError>())
        .map_or(ErrorCategory::Validation, |t| t.category)
}

#[must_use]
pub fn is_fatal(err: &anyhow::Error) -> bool {
    category_of(err) == ErrorCategory::Fatal
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
