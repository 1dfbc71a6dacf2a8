use http::Method;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::request::HttpRequest;
use super::response::HttpResponse;

/// A CORS policy browsers would refuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorsConfigError {
    #[error("CORS configuration error: Cannot use wildcard origin (*) with credentials. When allow_credentials is true, you must specify exact origins.")]
    WildcardWithCredentials,
    #[error("CORS configuration error: Invalid origin pattern '{pattern}'")]
    InvalidOriginPattern { pattern: String },
}

/// How the `Origin` header is checked.
#[derive(Clone)]
pub enum OriginValidation {
    Exact(Vec<String>),
    Wildcard,
    Regex(Vec<Regex>),
}

impl std::fmt::Debug for OriginValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginValidation::Exact(origins) => f.debug_tuple("Exact").field(origins).finish(),
            OriginValidation::Wildcard => write!(f, "Wildcard"),
            OriginValidation::Regex(patterns) => f
                .debug_tuple("Regex")
                .field(&patterns.iter().map(|re| re.as_str()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl OriginValidation {
    fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginValidation::Exact(origins) => origins.iter().any(|o| o == origin),
            OriginValidation::Wildcard => true,
            OriginValidation::Regex(patterns) => patterns.iter().any(|re| re.is_match(origin)),
        }
    }
}

/// CORS headers attached to the responses of one route.
///
/// Applied after the endpoint runs, to success and error responses alike. An
/// `OPTIONS` request carrying `Access-Control-Request-Method` additionally gets
/// the allowed methods, headers and max age.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origin_validation: OriginValidation,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    max_age: Option<u32>,
}

impl CorsPolicy {
    /// Only the listed origins; `"*"` anywhere in the list means any origin.
    #[must_use]
    pub fn new(origins: &[&str]) -> Self {
        let origin_validation = if origins.contains(&"*") {
            OriginValidation::Wildcard
        } else {
            OriginValidation::Exact(origins.iter().map(|o| o.to_string()).collect())
        };
        Self {
            origin_validation,
            ..Self::permissive()
        }
    }

    /// Origins matching any of the regex patterns.
    pub fn with_patterns(patterns: &[&str]) -> Result<Self, CorsConfigError> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|_| CorsConfigError::InvalidOriginPattern {
                    pattern: p.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            origin_validation: OriginValidation::Regex(compiled),
            ..Self::permissive()
        })
    }

    /// Any origin, common methods, no credentials.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            origin_validation: OriginValidation::Wildcard,
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allow_credentials: false,
            expose_headers: Vec::new(),
            max_age: None,
        }
    }

    #[must_use]
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.allowed_headers = headers.iter().map(|h| h.to_string()).collect();
        self
    }

    #[must_use]
    pub fn allowed_methods(mut self, methods: &[Method]) -> Self {
        self.allowed_methods = methods.to_vec();
        self
    }

    #[must_use]
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.expose_headers = headers.iter().map(|h| h.to_string()).collect();
        self
    }

    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Result<Self, CorsConfigError> {
        self.allow_credentials = allow;
        self.validate()?;
        Ok(self)
    }

    /// Checked again when the server registers routes.
    pub fn validate(&self) -> Result<(), CorsConfigError> {
        if self.allow_credentials && matches!(self.origin_validation, OriginValidation::Wildcard) {
            return Err(CorsConfigError::WildcardWithCredentials);
        }
        Ok(())
    }

    /// Add CORS headers for an allowed cross-origin request.
    pub fn apply(&self, request: &HttpRequest, response: &mut HttpResponse) {
        let Some(origin) = request.get_header("origin") else {
            return;
        };
        if !self.origin_validation.is_allowed(origin) {
            debug!(origin = %origin, "CORS origin not allowed");
            return;
        }

        let allow_origin = if matches!(self.origin_validation, OriginValidation::Wildcard)
            && !self.allow_credentials
        {
            "*".to_string()
        } else {
            origin.to_string()
        };
        response.set_header("access-control-allow-origin", allow_origin);
        response.set_header("vary", "Origin".to_string());
        if self.allow_credentials {
            response.set_header("access-control-allow-credentials", "true".to_string());
        }
        if !self.expose_headers.is_empty() {
            response.set_header("access-control-expose-headers", self.expose_headers.join(", "));
        }

        let preflight = request.method == Method::OPTIONS
            && request.get_header("access-control-request-method").is_some();
        if preflight {
            response.set_header(
                "access-control-allow-methods",
                self.allowed_methods
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            response.set_header("access-control-allow-headers", self.allowed_headers.join(", "));
            if let Some(age) = self.max_age {
                response.set_header("access-control-max-age", age.to_string());
            }
        }
    }
}
