//! # Dispatch Adapter
//!
//! Binds resolved controllers to routes and runs requests through them.
//!
//! The adapter is transport-neutral: it consumes an [`HttpRequest`] and produces an
//! [`HttpResponse`]. Binding those to a socket is left to the host HTTP server.
//!
//! ```rust,ignore
//! let mut server = ApiServer::new(ServerConfig::from_env(), ServerOptions::new())
//!     .with_registry(registry);
//! server.controller(ProductsController::default());
//! server.register_controllers()?;
//!
//! let response = server.handle(HttpRequest::new(Method::GET, "/products/7"));
//! ```

mod context;
mod core;
mod cors;
mod request;
mod response;

pub use context::HttpContext;
pub use core::{ApiServer, RouteInfo, RouteTable, ServerOptions, CONTENT_TYPE_NOT_ALLOWED};
pub use cors::{CorsConfigError, CorsPolicy, OriginValidation};
pub use request::{parse_query_params, HeaderVec, HttpRequest, MAX_INLINE_HEADERS};
pub use response::{default_error_handler, DefaultErrorResponse, HttpResponse};
