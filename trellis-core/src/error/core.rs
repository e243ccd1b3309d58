//! The `CoreError` taxonomy
//!
//! All container failures share one structured shape: a [`ErrorKind`], a
//! stable `PREFIX_CODE` code, a human message, an opaque details map, an
//! optional [`ErrorCause`] chain, and a status code. `ValidationError`
//! additionally carries per-field validation records.

use crate::error::cause::ErrorCause;
use serde_json::{Map, Value};
use std::fmt;

/// Result alias used throughout the Trellis crates
pub type CoreResult<T> = Result<T, CoreError>;

/// The kind of a [`CoreError`]
///
/// Each kind fixes the wire name, the code prefix, and the default status
/// code of the errors it classifies.
///
/// # Examples
///
/// ```rust
/// use trellis_core::ErrorKind;
///
/// assert_eq!(ErrorKind::Config.name(), "ConfigError");
/// assert_eq!(ErrorKind::Validation.default_status_code(), 400);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Misregistration, dependency cycles, invalid configuration
    Config,
    /// Component-internal initialization failures
    Module,
    /// Lifecycle and resolution problems
    Service,
    /// Schema validation failures with per-field details
    Validation,
    /// Network-level failures
    Network,
    /// Authentication failures
    Auth,
    /// Authorization failures
    Access,
}

impl ErrorKind {
    /// Wire name of the kind (e.g. `"ConfigError"`)
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Config => "ConfigError",
            ErrorKind::Module => "ModuleError",
            ErrorKind::Service => "ServiceError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Auth => "AuthError",
            ErrorKind::Access => "AccessError",
        }
    }

    /// Short tag prefixed onto every code of this kind
    pub fn prefix(self) -> &'static str {
        match self {
            ErrorKind::Config => "CONFIG",
            ErrorKind::Module => "MODULE",
            ErrorKind::Service => "SERVICE",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Network => "NETWORK",
            ErrorKind::Auth => "AUTH",
            ErrorKind::Access => "ACCESS",
        }
    }

    /// Status code used when none is supplied explicitly
    pub fn default_status_code(self) -> u16 {
        match self {
            ErrorKind::Config | ErrorKind::Module => 500,
            ErrorKind::Service | ErrorKind::Network => 503,
            ErrorKind::Validation => 400,
            ErrorKind::Auth => 401,
            ErrorKind::Access => 403,
        }
    }

    /// Resolves a kind from its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ConfigError" => Some(ErrorKind::Config),
            "ModuleError" => Some(ErrorKind::Module),
            "ServiceError" => Some(ErrorKind::Service),
            "ValidationError" => Some(ErrorKind::Validation),
            "NetworkError" => Some(ErrorKind::Network),
            "AuthError" => Some(ErrorKind::Auth),
            "AccessError" => Some(ErrorKind::Access),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The structured error type for all container operations
///
/// # Examples
///
/// ```rust
/// use trellis_core::{CoreError, ErrorKind};
///
/// let error = CoreError::config("ALREADY_REGISTERED", "Component cache is already registered");
/// assert_eq!(error.code(), "CONFIG_ALREADY_REGISTERED");
/// assert_eq!(error.status_code(), 500);
/// assert_eq!(error.kind(), ErrorKind::Config);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CoreError {
    kind: ErrorKind,
    code: String,
    message: String,
    details: Map<String, Value>,
    cause: Option<Box<ErrorCause>>,
    status_code: u16,
    validation_errors: Vec<Value>,
}

impl CoreError {
    /// Creates an error of the given kind
    ///
    /// The final code is `<PREFIX>_<code>` where the prefix is fixed by the
    /// kind; the status code starts at the kind's default.
    pub fn new(kind: ErrorKind, code: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: format!("{}_{}", kind.prefix(), code.as_ref()),
            message: message.into(),
            details: Map::new(),
            cause: None,
            status_code: kind.default_status_code(),
            validation_errors: Vec::new(),
        }
    }

    /// Creates a `ConfigError`
    pub fn config(code: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, code, message)
    }

    /// Creates a `ModuleError`
    pub fn module(code: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Module, code, message)
    }

    /// Creates a `ServiceError`
    pub fn service(code: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, code, message)
    }

    /// Creates a `ValidationError`
    ///
    /// Anything but a JSON array coerces to the empty record list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_core::CoreError;
    /// use serde_json::json;
    ///
    /// let error = CoreError::validation("INVALID_CONFIG", "missing fields", json!("oops"));
    /// assert!(error.validation_errors().is_empty());
    ///
    /// let error = CoreError::validation(
    ///     "INVALID_CONFIG",
    ///     "missing fields",
    ///     json!([{ "field": "name", "rule": "required" }]),
    /// );
    /// assert_eq!(error.validation_errors().len(), 1);
    /// ```
    pub fn validation(
        code: impl AsRef<str>,
        message: impl Into<String>,
        validation_errors: impl Into<Value>,
    ) -> Self {
        Self::new(ErrorKind::Validation, code, message).with_validation_errors(validation_errors)
    }

    /// Creates a `NetworkError`
    ///
    /// The status code stays at 503 unless a numeric `statusCode` entry
    /// arrives later via [`with_details`](Self::with_details).
    pub fn network(code: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, code, message)
    }

    /// Creates an `AuthError`
    pub fn auth(code: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, code, message)
    }

    /// Creates an `AccessError`
    pub fn access(code: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Access, code, message)
    }

    /// Attaches an opaque details map
    ///
    /// A `NetworkError` adopts a numeric `statusCode` entry from the details
    /// as its own status code.
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        if self.kind == ErrorKind::Network
            && let Some(status) = details.get("statusCode").and_then(Value::as_u64)
            && let Ok(status) = u16::try_from(status)
        {
            self.status_code = status;
        }
        self.details = details;
        self
    }

    /// Attaches an underlying cause
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_core::{CoreError, ErrorCause};
    ///
    /// let io = std::io::Error::other("permission denied");
    /// let error = CoreError::service("DISCOVERY_FAILED", "Failed to discover plugin components")
    ///     .with_cause(ErrorCause::from_error(&io));
    /// assert!(error.cause().is_some());
    /// ```
    pub fn with_cause(mut self, cause: impl Into<ErrorCause>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }

    /// Overrides the status code
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Replaces the validation records; non-array input coerces to `[]`
    pub fn with_validation_errors(mut self, validation_errors: impl Into<Value>) -> Self {
        self.validation_errors = match validation_errors.into() {
            Value::Array(records) => records,
            _ => Vec::new(),
        };
        self
    }

    /// The error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The kind's wire name
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The full `PREFIX_CODE` code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The status code
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The opaque details map
    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    /// The underlying cause, if any
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_deref()
    }

    /// The validation records (empty for non-validation kinds)
    pub fn validation_errors(&self) -> &[Value] {
        &self.validation_errors
    }

    /// Serializes the error to its JSON wire format
    ///
    /// The cause chain is serialized recursively; `validationErrors` appears
    /// only on `ValidationError`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_core::CoreError;
    ///
    /// let json = CoreError::auth("TOKEN_EXPIRED", "session token expired").to_json();
    /// assert_eq!(json["name"], "AuthError");
    /// assert_eq!(json["code"], "AUTH_TOKEN_EXPIRED");
    /// assert_eq!(json["statusCode"], 401);
    /// ```
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), Value::String(self.name().to_string()));
        obj.insert("code".to_string(), Value::String(self.code.clone()));
        obj.insert("message".to_string(), Value::String(self.message.clone()));
        obj.insert("statusCode".to_string(), Value::from(self.status_code));
        obj.insert("details".to_string(), Value::Object(self.details.clone()));
        if let Some(cause) = &self.cause {
            obj.insert(
                "cause".to_string(),
                serde_json::to_value(cause).unwrap_or(Value::Null),
            );
        }
        if self.kind == ErrorKind::Validation {
            obj.insert(
                "validationErrors".to_string(),
                Value::Array(self.validation_errors.clone()),
            );
        }
        Value::Object(obj)
    }

    /// Reconstructs an error from its JSON wire format
    ///
    /// Absent fields fall back to defaults: an unknown or missing `name`
    /// yields `ServiceError`, a missing `code` becomes `<PREFIX>_UNKNOWN`,
    /// and a missing or non-array `validationErrors` coerces to `[]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trellis_core::{CoreError, ErrorKind};
    /// use serde_json::json;
    ///
    /// let error = CoreError::from_json(&json!({ "name": "ValidationError", "code": "VALIDATION_X" }));
    /// assert_eq!(error.kind(), ErrorKind::Validation);
    /// assert!(error.validation_errors().is_empty());
    /// ```
    pub fn from_json(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        let kind = obj
            .get("name")
            .and_then(Value::as_str)
            .and_then(ErrorKind::from_name)
            .unwrap_or(ErrorKind::Service);
        let code = obj
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_UNKNOWN", kind.prefix()));
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status_code = obj
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or_else(|| kind.default_status_code());
        let details = obj
            .get("details")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let cause = obj
            .get("cause")
            .and_then(|c| serde_json::from_value::<ErrorCause>(c.clone()).ok())
            .map(Box::new);
        let validation_errors = match obj.get("validationErrors") {
            Some(Value::Array(records)) => records.clone(),
            _ => Vec::new(),
        };

        Self {
            kind,
            code,
            message,
            details,
            cause,
            status_code,
            validation_errors,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CoreError {}

impl From<&CoreError> for ErrorCause {
    fn from(err: &CoreError) -> Self {
        ErrorCause {
            name: err.name().to_string(),
            message: err.message.clone(),
            code: Some(err.code.clone()),
            cause: err.cause.clone(),
        }
    }
}

impl From<CoreError> for ErrorCause {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_defaults() {
        let cases = [
            (ErrorKind::Config, "ConfigError", "CONFIG", 500),
            (ErrorKind::Module, "ModuleError", "MODULE", 500),
            (ErrorKind::Service, "ServiceError", "SERVICE", 503),
            (ErrorKind::Validation, "ValidationError", "VALIDATION", 400),
            (ErrorKind::Network, "NetworkError", "NETWORK", 503),
            (ErrorKind::Auth, "AuthError", "AUTH", 401),
            (ErrorKind::Access, "AccessError", "ACCESS", 403),
        ];
        for (kind, name, prefix, status) in cases {
            assert_eq!(kind.name(), name);
            assert_eq!(kind.prefix(), prefix);
            assert_eq!(kind.default_status_code(), status);
            assert_eq!(ErrorKind::from_name(name), Some(kind));
        }
        assert_eq!(ErrorKind::from_name("SomethingElse"), None);
    }

    #[test]
    fn test_code_prefixing() {
        let error = CoreError::service("UNKNOWN_COMPONENT", "Component db is not registered");
        assert_eq!(error.code(), "SERVICE_UNKNOWN_COMPONENT");
        assert_eq!(error.status_code(), 503);
        assert_eq!(error.to_string(), "SERVICE_UNKNOWN_COMPONENT: Component db is not registered");
    }

    #[test]
    fn test_network_status_from_details() {
        let mut details = Map::new();
        details.insert("statusCode".to_string(), json!(429));
        let error = CoreError::network("RATE_LIMITED", "upstream throttled").with_details(details);
        assert_eq!(error.status_code(), 429);

        let error = CoreError::network("TIMEOUT", "upstream timed out");
        assert_eq!(error.status_code(), 503);

        // non-numeric statusCode entries are ignored
        let mut details = Map::new();
        details.insert("statusCode".to_string(), json!("teapot"));
        let error = CoreError::network("ODD", "odd reply").with_details(details);
        assert_eq!(error.status_code(), 503);
    }

    #[test]
    fn test_validation_coercion() {
        for bad in [json!("oops"), json!(17), json!({ "a": 1 }), Value::Null] {
            let error = CoreError::validation("INVALID_CONFIG", "bad config", bad);
            assert!(error.validation_errors().is_empty());
        }

        let error = CoreError::validation(
            "INVALID_CONFIG",
            "bad config",
            json!([{ "field": "name" }, { "field": "enabled" }]),
        );
        assert_eq!(error.validation_errors().len(), 2);
    }

    #[test]
    fn test_json_round_trip_simple() {
        let error = CoreError::access("FORBIDDEN", "operator role required");
        let back = CoreError::from_json(&error.to_json());
        assert_eq!(back, error);
    }

    #[test]
    fn test_json_round_trip_full() {
        let mut details = Map::new();
        details.insert("component".to_string(), json!("cache"));
        let error = CoreError::config("MISSING_DEPENDENCY", "Dependency store required by cache is not registered")
            .with_details(details)
            .with_cause(
                ErrorCause::new("Error", "store crate not linked")
                    .with_cause(ErrorCause::new("Error", "symbol not found")),
            );

        let json = error.to_json();
        assert_eq!(json["cause"]["cause"]["message"], "symbol not found");
        let back = CoreError::from_json(&json);
        assert_eq!(back, error);
    }

    #[test]
    fn test_json_round_trip_validation() {
        let error = CoreError::validation(
            "INVALID_CONFIG",
            "2 fields failed validation",
            json!([{ "field": "name", "rule": "required" }, { "field": "port", "rule": "integer" }]),
        );
        let json = error.to_json();
        assert_eq!(json["validationErrors"].as_array().map(Vec::len), Some(2));
        let back = CoreError::from_json(&json);
        assert_eq!(back, error);
    }

    #[test]
    fn test_from_json_defaults() {
        let error = CoreError::from_json(&json!({}));
        assert_eq!(error.kind(), ErrorKind::Service);
        assert_eq!(error.code(), "SERVICE_UNKNOWN");
        assert_eq!(error.message(), "");
        assert_eq!(error.status_code(), 503);
        assert!(error.details().is_empty());
        assert!(error.cause().is_none());

        // validationErrors of the wrong shape coerces to []
        let error = CoreError::from_json(&json!({
            "name": "ValidationError",
            "code": "VALIDATION_INVALID_CONFIG",
            "validationErrors": "not-a-list",
        }));
        assert!(error.validation_errors().is_empty());
        assert_eq!(error.status_code(), 400);
    }

    #[test]
    fn test_core_error_as_cause() {
        let inner = CoreError::module("INIT_FAILED", "cache warm-up failed");
        let outer = CoreError::service("STARTUP_ABORTED", "container start-up aborted")
            .with_cause(&inner);
        let cause = outer.cause().expect("cause");
        assert_eq!(cause.name, "ModuleError");
        assert_eq!(cause.code.as_deref(), Some("MODULE_INIT_FAILED"));
    }
}
