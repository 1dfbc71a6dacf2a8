use crate::ids::{ControllerId, RequestId};

use super::request::HttpRequest;

/// Per-request context handed to auth methods, endpoints and error handlers.
#[derive(Debug, Clone)]
pub struct HttpContext {
    pub request: HttpRequest,
    pub request_id: RequestId,
    /// Controller the matched route belongs to; `None` before routing succeeds.
    pub controller_id: Option<ControllerId>,
}

impl HttpContext {
    /// Context for a request, reusing an inbound `x-request-id` when it is a ULID.
    #[must_use]
    pub fn new(request: HttpRequest) -> Self {
        let request_id = RequestId::from_header_or_new(request.get_header("x-request-id"));
        Self {
            request,
            request_id,
            controller_id: None,
        }
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.request.get_path_param(name)
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.request.get_query_param(name)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.get_header(name)
    }

    #[must_use]
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.request.body.as_ref()
    }
}
