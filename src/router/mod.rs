//! # Router Module
//!
//! Matches request paths against the composed routes of registered endpoints.
//!
//! Routes use express-style patterns (`/products/:id?`). At registration each
//! pattern is compiled into a regex; at request time routes are tried in
//! registration order and the first match wins, returning the captured path
//! parameters.
//!
//! Matching is case-insensitive unless the server is configured for
//! case-sensitive routing, and a trailing slash on the request path is ignored.
//!
//! ```rust,ignore
//! let mut router = Router::new(false);
//! router.insert(Method::GET, "/products/:id?", 0)?;
//! let m = router.route(&Method::GET, "/Products/7").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("7"));
//! ```

mod core;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
