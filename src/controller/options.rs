use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;
use crate::route::trim_route;
use crate::server::{CorsPolicy, HttpContext, HttpResponse};
use crate::validator::ModelRef;

/// HTTP verbs an endpoint can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Connect,
    Options,
    Trace,
}

impl HttpVerb {
    pub const ALL: [HttpVerb; 9] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Patch,
        HttpVerb::Delete,
        HttpVerb::Head,
        HttpVerb::Connect,
        HttpVerb::Options,
        HttpVerb::Trace,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Head => "HEAD",
            HttpVerb::Connect => "CONNECT",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::Trace => "TRACE",
        }
    }

    #[must_use]
    pub fn method(self) -> Method {
        match self {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Patch => Method::PATCH,
            HttpVerb::Delete => Method::DELETE,
            HttpVerb::Head => Method::HEAD,
            HttpVerb::Connect => Method::CONNECT,
            HttpVerb::Options => Method::OPTIONS,
            HttpVerb::Trace => Method::TRACE,
        }
    }

    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        Self::ALL.into_iter().find(|verb| verb.method() == *method)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpVerb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported HTTP verb: {s}"))
    }
}

/// Content types an endpoint can require of its requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Json,
    FormData,
    UrlEncoded,
    /// Documents that any content type is accepted; installs no guard.
    Any,
}

impl ContentType {
    #[must_use]
    pub fn media_type(self) -> Option<&'static str> {
        match self {
            ContentType::Json => Some("application/json"),
            ContentType::FormData => Some("multipart/form-data"),
            ContentType::UrlEncoded => Some("application/x-www-form-urlencoded"),
            ContentType::Any => None,
        }
    }

    /// Compare against a `Content-Type` header, ignoring parameters such as
    /// `charset` or `boundary` and letter case.
    #[must_use]
    pub fn accepts(self, header: Option<&str>) -> bool {
        let Some(expected) = self.media_type() else {
            return true;
        };
        header
            .map(media_type_of)
            .is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
    }
}

/// `application/json; charset=utf-8` -> `application/json`
#[must_use]
pub fn media_type_of(header: &str) -> &str {
    header.split(';').next().unwrap_or(header).trim()
}

/// Options declared on a controller type.
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    pub route: Option<String>,
    /// Keep the derived route's letter case instead of lowercasing it.
    pub preserve_case: bool,
}

impl ControllerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, route: &str) -> Self {
        self.route = Some(trim_route(route).to_string());
        self
    }

    #[must_use]
    pub fn preserve_case(mut self, preserve: bool) -> Self {
        self.preserve_case = preserve;
        self
    }
}

/// Authentication step run before an endpoint. `Err` short-circuits to the
/// endpoint's error handler.
pub type AuthFn = Arc<dyn Fn(&HttpContext) -> Result<(), ApplicationError> + Send + Sync>;

/// Turns an error raised anywhere in a route pipeline into the response.
pub type ErrorHandlerFn = Arc<dyn Fn(&ApplicationError, &HttpContext) -> HttpResponse + Send + Sync>;

/// Per-endpoint CORS setting, taking precedence over the server default.
#[derive(Debug, Clone)]
pub enum CorsOverride {
    Policy(CorsPolicy),
    /// No CORS headers on this endpoint even when the server has a default policy.
    Disabled,
}

/// Options declared on one controller member for one verb.
#[derive(Clone, Default)]
pub struct EndpointOptions {
    pub route: Option<String>,
    pub params: Option<String>,
    pub content_type: Option<ContentType>,
    pub body: Option<ModelRef>,
    pub authenticate: bool,
    pub auth_method: Option<AuthFn>,
    pub error_handler: Option<ErrorHandlerFn>,
    pub cors: Option<CorsOverride>,
}

impl EndpointOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the member-name route segment. An empty route falls back to the
    /// member name, or to an empty segment for `default`.
    #[must_use]
    pub fn route(mut self, route: &str) -> Self {
        self.route = Some(trim_route(route).to_string());
        self
    }

    /// Express-style parameter suffix, e.g. `:id/:value?`.
    #[must_use]
    pub fn params(mut self, params: &str) -> Self {
        self.params = Some(trim_route(params).to_string());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    #[must_use]
    pub fn from_body(mut self, model: ModelRef) -> Self {
        self.body = Some(model);
        self
    }

    #[must_use]
    pub fn authenticate(mut self, authenticate: bool) -> Self {
        self.authenticate = authenticate;
        self
    }

    #[must_use]
    pub fn auth_method<F>(mut self, auth: F) -> Self
    where
        F: Fn(&HttpContext) -> Result<(), ApplicationError> + Send + Sync + 'static,
    {
        self.auth_method = Some(Arc::new(auth));
        self
    }

    #[must_use]
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ApplicationError, &HttpContext) -> HttpResponse + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn cors(mut self, cors: CorsOverride) -> Self {
        self.cors = Some(cors);
        self
    }
}

impl fmt::Debug for EndpointOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointOptions")
            .field("route", &self.route)
            .field("params", &self.params)
            .field("content_type", &self.content_type)
            .field("body", &self.body)
            .field("authenticate", &self.authenticate)
            .field("auth_method", &self.auth_method.as_ref().map(|_| "<function>"))
            .field("error_handler", &self.error_handler.as_ref().map(|_| "<function>"))
            .field("cors", &self.cors)
            .finish()
    }
}
