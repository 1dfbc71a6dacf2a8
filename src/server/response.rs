use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApplicationError;

use super::context::HttpContext;
use super::request::HeaderVec;

/// Response produced by an endpoint, a guard, or an error handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderVec,
    /// `None` for bodiless responses (204, 304).
    pub body: Option<Value>,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Option<Value>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with `content-type: application/json`.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, Some(body))
    }

    /// Serialize `body` into a JSON response.
    pub fn json_of<T: Serialize>(status: u16, body: &T) -> Result<Self, ApplicationError> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApplicationError::internal(format!("unable to serialize response: {err}")))?;
        Ok(Self::json(status, value))
    }

    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    #[must_use]
    pub fn created(body: Value) -> Self {
        Self::json(201, body)
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204, HeaderVec::new(), None)
    }

    #[must_use]
    pub fn not_modified() -> Self {
        Self::new(304, HeaderVec::new(), None)
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rfind(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace any existing header with the same name.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value));
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value.to_string());
        self
    }

    /// Body serialized for the wire; empty for bodiless responses.
    #[must_use]
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            None => Vec::new(),
            Some(Value::String(s)) => s.clone().into_bytes(),
            Some(other) => other.to_string().into_bytes(),
        }
    }
}

/// Wire form of an [`ApplicationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultErrorResponse {
    pub name: String,
    pub message: String,
    pub status: u16,
}

impl From<&ApplicationError> for DefaultErrorResponse {
    fn from(err: &ApplicationError) -> Self {
        Self {
            name: err.name.clone(),
            message: err.message.clone(),
            status: err.status,
        }
    }
}

/// Error handler used when neither the endpoint nor the server supplies one.
#[must_use]
pub fn default_error_handler(err: &ApplicationError, _ctx: &HttpContext) -> HttpResponse {
    let body = DefaultErrorResponse::from(err);
    HttpResponse::json(
        err.status,
        serde_json::json!({
            "name": body.name,
            "message": body.message,
            "status": body.status,
        }),
    )
}
