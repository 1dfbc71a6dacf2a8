//! # Error Types
//!
//! Three families of failure, each with its own type so callers can never confuse
//! a programmer mistake with bad user input:
//!
//! - [`ConfigError`] - startup-time, fatal. Raised while controllers are resolved and
//!   their routes registered. The server must not start when one is returned.
//! - [`RuleDefinitionError`] - a validation rule whose options make no sense
//!   (a `Range` with neither bounds nor predicate, an inverted bound, a bad regex).
//!   Always a defect in the model definition.
//! - [`SchemaError`] - per-request failure of the validator itself (as opposed to a
//!   failed [`ValidationReport`](crate::validator::ValidationReport)).
//!
//! Everything that reaches an HTTP client is an [`ApplicationError`].

use thiserror::Error;

use crate::rules::RuleKind;

/// Fixed message returned when an endpoint requires authentication but neither the
/// endpoint nor the server supplies an authentication method.
pub const MISSING_AUTH_METHOD: &str = "Unable to register route. Authenticate was specified in the controller endpoint, but no authentication method was provided by the server or endpoint";

/// Fixed message for a controller instance registered without controller options.
pub const INVALID_CONTROLLER: &str = "Controllers must be registered with controller options";

/// Startup-time configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A controller instance was handed to the server but its type never had
    /// controller options defined in the metadata registry.
    #[error("{}: {owner}", INVALID_CONTROLLER)]
    MissingControllerOptions { owner: String },

    /// An endpoint annotation references a member the controller does not expose
    /// (renamed or removed method).
    #[error("function name <{member}> derived from endpoint metadata is not a member of controller {owner}")]
    UnknownEndpointMember { owner: String, member: String },

    /// No explicit route and the type name does not contain `Controller`.
    #[error("Cannot implicitly determine a controller route for {owner}. Please specify a route within the controller options, or ensure \"Controller\" appears in the type name.")]
    UnderivableRoute { owner: String },

    /// `authenticate` requested with no auth method on the endpoint or the server.
    #[error("{}", MISSING_AUTH_METHOD)]
    MissingAuthMethod { route: String },

    /// A composed route could not be compiled into a matcher.
    #[error("invalid route pattern {route}: {source}")]
    InvalidRoutePattern {
        route: String,
        #[source]
        source: regex::Error,
    },

    /// A CORS policy that browsers would reject (wildcard origin with credentials).
    #[error(transparent)]
    Cors(#[from] crate::server::CorsConfigError),

    /// A model instance could not be captured as a JSON template.
    #[error("unable to capture body model for {owner}: {source}")]
    BodyModel {
        owner: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    RuleDefinition(#[from] RuleDefinitionError),
}

/// A rule whose options cannot be interpreted.
#[derive(Debug, Error)]
pub enum RuleDefinitionError {
    /// Options are neither a `{min, max}` bound object nor a known predicate.
    #[error("Invalid validator parameters supplied to {kind} rule on {field}: {detail}")]
    InvalidOptions {
        kind: RuleKind,
        field: String,
        detail: String,
    },

    #[error("{kind} rule on {field} has min {min} greater than max {max}")]
    InvertedBounds {
        kind: RuleKind,
        field: String,
        min: f64,
        max: f64,
    },

    #[error("RegexMatch rule on {field} has an invalid pattern: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown rule '{name}' on {field}")]
    UnknownRule { field: String, name: String },

    #[error("model {model} field {field} references unknown model {target}")]
    UnknownModel {
        model: String,
        field: String,
        target: String,
    },

    #[error("model {model} field {field} nests a model that contains {model} again")]
    CyclicModel { model: String, field: String },
}

/// The validator could not complete, distinct from "the payload is invalid".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// A `Range` rule met a non-numeric value, or a `StringLength` rule a non-string.
    #[error("Value provided for {kind} rule on {field} is not a {expected} type")]
    ValueType {
        kind: RuleKind,
        field: String,
        expected: &'static str,
    },

    /// The body model factory failed to produce a template.
    #[error("unable to construct body model {owner}: {message}")]
    ModelConstruction { owner: String, message: String },
}

/// An error carrying an HTTP status, converted into a response by an error handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApplicationError {
    pub status: u16,
    pub name: String,
    pub message: String,
}

impl ApplicationError {
    pub const DEFAULT_MESSAGE: &'static str = "Something went wrong. Please try again.";

    #[must_use]
    pub fn new(status: u16, name: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            name: name.to_string(),
            message: if message.is_empty() {
                Self::DEFAULT_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, "BadRequestError", message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, "UnauthorizedError", message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, "ForbiddenError", message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "NotFoundError", message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, "ConflictError", message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, "ApplicationError", message)
    }
}

impl From<SchemaError> for ApplicationError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::ValueType { .. } => Self::new(400, "SchemaError", err.to_string()),
            SchemaError::ModelConstruction { .. } => Self::internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApplicationError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApplicationError>() {
            Ok(app) => app,
            Err(other) => Self::internal(other.to_string()),
        }
    }
}
