//! Serializable cause chains
//!
//! `ErrorCause` captures an underlying failure as plain data so that a
//! [`CoreError`](crate::error::CoreError) can be serialized, transmitted, and
//! reconstructed without losing diagnostic context. Foreign errors enter the
//! chain through [`ErrorCause::from_error`] (walking `source()`) or
//! `From<&anyhow::Error>` (walking `chain()`).

use serde::{Deserialize, Serialize};

/// A single link in a serializable cause chain
///
/// Unlike `std::error::Error::source`, which yields trait objects that cannot
/// be compared or serialized, an `ErrorCause` is pure data: a kind name, a
/// message, an optional machine code, and an optional nested cause.
///
/// # Examples
///
/// ```rust
/// use trellis_core::ErrorCause;
///
/// let io = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let cause = ErrorCause::from_error(&io);
/// assert_eq!(cause.message, "file not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCause {
    /// Kind name of the underlying error (e.g. `"ConfigError"`, `"Error"`)
    pub name: String,
    /// Human-readable message of the underlying error
    pub message: String,
    /// Machine-readable code, when the underlying error carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Nested cause, when the underlying error had one itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorCause>>,
}

impl ErrorCause {
    /// Creates a cause with the given kind name and message
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            code: None,
            cause: None,
        }
    }

    /// Attaches a machine-readable code to this cause
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches a nested cause
    pub fn with_cause(mut self, cause: ErrorCause) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Builds a cause chain from any standard error, following `source()`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_core::ErrorCause;
    ///
    /// let io = std::io::Error::other("disk detached");
    /// let cause = ErrorCause::from_error(&io);
    /// assert_eq!(cause.name, "Error");
    /// assert_eq!(cause.message, "disk detached");
    /// ```
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            name: "Error".to_string(),
            message: err.to_string(),
            code: None,
            cause: err.source().map(|s| Box::new(Self::from_error(s))),
        }
    }
}

impl std::fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl From<&anyhow::Error> for ErrorCause {
    fn from(err: &anyhow::Error) -> Self {
        let messages: Vec<String> = err.chain().map(|e| e.to_string()).collect();
        let mut cause: Option<Box<ErrorCause>> = None;
        for message in messages.into_iter().rev() {
            cause = Some(Box::new(ErrorCause {
                name: "Error".to_string(),
                message,
                code: None,
                cause,
            }));
        }
        match cause {
            Some(outermost) => *outermost,
            None => ErrorCause::new("Error", err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ErrorCause {
    fn from(err: anyhow::Error) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_creation() {
        let cause = ErrorCause::new("ServiceError", "backend unavailable").with_code("SERVICE_DOWN");
        assert_eq!(cause.name, "ServiceError");
        assert_eq!(cause.message, "backend unavailable");
        assert_eq!(cause.code.as_deref(), Some("SERVICE_DOWN"));
        assert!(cause.cause.is_none());
    }

    #[test]
    fn test_from_error_follows_sources() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "outer failed")
            }
        }
        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::other("inner failed"));
        let cause = ErrorCause::from_error(&err);
        assert_eq!(cause.message, "outer failed");
        let nested = cause.cause.expect("nested cause");
        assert_eq!(nested.message, "inner failed");
        assert!(nested.cause.is_none());
    }

    #[test]
    fn test_from_anyhow_follows_chain() {
        let base = anyhow::anyhow!("root failure");
        let wrapped = base.context("while scanning");
        let cause = ErrorCause::from(&wrapped);
        assert_eq!(cause.message, "while scanning");
        assert_eq!(cause.cause.expect("chained cause").message, "root failure");
    }

    #[test]
    fn test_serde_round_trip() {
        let cause = ErrorCause::new("ConfigError", "bad manifest")
            .with_code("CONFIG_INVALID")
            .with_cause(ErrorCause::new("Error", "unexpected token"));

        let json = serde_json::to_value(&cause).expect("serialize");
        assert_eq!(json["name"], "ConfigError");
        assert_eq!(json["cause"]["message"], "unexpected token");
        // optional fields are omitted, not null
        assert!(json["cause"].get("code").is_none());

        let back: ErrorCause = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, cause);
    }

    #[test]
    fn test_display() {
        let cause = ErrorCause::new("AuthError", "token expired");
        assert_eq!(cause.to_string(), "AuthError: token expired");
    }
}
