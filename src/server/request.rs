use std::sync::Arc;

use http::Method;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use tracing::debug;

use crate::controller::ContentType;
use crate::error::ApplicationError;
use crate::router::ParamVec;

/// Maximum inline headers before the header list spills to the heap.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage. Names are lowercase; values are kept as received.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request as seen by guards, validators and endpoints.
///
/// Host adapters build one with [`HttpRequest::parse`] from raw parts, or with the
/// builder methods when the body is already decoded.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    pub headers: HeaderVec,
    /// Filled in by the router on a match.
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    /// Decoded body: JSON, or an object of strings for urlencoded forms.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// `target` may carry a query string (`/products?limit=10`).
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            headers: HeaderVec::new(),
            path_params: ParamVec::new(),
            query_params: query.map(parse_query_params).unwrap_or_default(),
            body: None,
        }
    }

    /// Build a request from raw HTTP parts, decoding the body by content type.
    ///
    /// JSON and urlencoded bodies are decoded; other bodies (multipart) are left to
    /// the host adapter and `body` stays `None`. Malformed JSON is a 400.
    pub fn parse(
        method: Method,
        target: &str,
        headers: &[(&str, &str)],
        raw_body: &[u8],
    ) -> Result<Self, ApplicationError> {
        let mut request = Self::new(method, target);
        for (name, value) in headers {
            request = request.with_header(name, value);
        }

        if raw_body.is_empty() {
            return Ok(request);
        }

        let content_type = request.content_type();
        if ContentType::Json.accepts(content_type) {
            let body: Value = serde_json::from_slice(raw_body).map_err(|err| {
                debug!(error = %err, "JSON body parse failed");
                ApplicationError::bad_request(format!("Invalid JSON body: {err}"))
            })?;
            request.body = Some(body);
        } else if ContentType::UrlEncoded.accepts(content_type) {
            let form: Map<String, Value> = url::form_urlencoded::parse(raw_body)
                .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                .collect();
            request.body = Some(Value::Object(form));
        }

        debug!(
            method = %request.method,
            path = %request.path,
            body_size_bytes = raw_body.len(),
            decoded = request.body.is_some(),
            "request body read"
        );
        Ok(request)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.to_string()));
        self
    }

    /// Attach a JSON body, adding `content-type: application/json` if none is set.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        if self.content_type().is_none() {
            self = self.with_header("content-type", "application/json");
        }
        self.body = Some(body);
        self
    }

    /// Attach a decoded body without touching headers.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Header lookup, case-insensitive. Last occurrence wins.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rfind(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// Path parameter lookup. Last occurrence wins.
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameter lookup. Last occurrence wins (`?limit=10&limit=20` is 20).
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode a query string (without the leading `?`).
#[must_use]
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::<str>::from(&*k), v.into_owned()))
        .collect()
}
