//! Router core module - request path matching.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use std::sync::Arc;

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use tracing::{debug, warn};

pub const MAX_INLINE_PARAMS: usize = 8;

/// Path or query parameters. Names are shared with the compiled route.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A successful match: which registered target, and the captured parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Index passed to [`Router::insert`].
    pub target: usize,
    pub pattern: Arc<str>,
    pub path_params: ParamVec,
}

impl RouteMatch {
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    method: Method,
    pattern: Arc<str>,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    target: usize,
}

/// Ordered route table. The first registered route that matches wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
    case_sensitive: bool,
}

impl Router {
    #[must_use]
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            routes: Vec::new(),
            case_sensitive,
        }
    }

    /// Compile `pattern` and register it for `method`. A pattern whose requests
    /// an earlier route already matches is still registered, with a warning.
    pub fn insert(&mut self, method: Method, pattern: &str, target: usize) -> Result<(), regex::Error> {
        let (regex, param_names) = Self::path_to_regex(pattern, self.case_sensitive)?;
        if let Some(existing) = self.shadowed_by(&method, pattern) {
            warn!(
                method = %method,
                pattern = %pattern,
                shadowed_by = %existing,
                "route is shadowed by an earlier registration"
            );
        }
        self.routes.push(CompiledRoute {
            method,
            pattern: Arc::from(pattern),
            regex,
            param_names,
            target,
        });
        Ok(())
    }

    /// Match a request. `HEAD` falls back to `GET` routes when no `HEAD` route matches.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let found = self.find(method, path).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET, path)
            } else {
                None
            }
        });

        match &found {
            Some(m) => debug!(method = %method, path = %path, route_pattern = %m.pattern, path_params = ?m.path_params, "Route matched"),
            None => debug!(method = %method, path = %path, "No route matched"),
        }
        found
    }

    fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                let captures = route.regex.captures(path)?;
                let path_params = route
                    .param_names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        captures
                            .get(i + 1)
                            .map(|m| (Arc::clone(name), m.as_str().to_string()))
                    })
                    .collect();
                Some(RouteMatch {
                    target: route.target,
                    pattern: Arc::clone(&route.pattern),
                    path_params,
                })
            })
    }

    /// The earliest registered pattern for `method` that matches the path
    /// `pattern` describes, with every parameter filled in by its own name.
    #[must_use]
    pub fn shadowed_by(&self, method: &Method, pattern: &str) -> Option<&str> {
        let sample: String = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => format!("/{}", param.trim_end_matches('?')),
                None => format!("/{segment}"),
            })
            .collect();
        let sample = if sample.is_empty() { "/".to_string() } else { sample };

        self.routes
            .iter()
            .find(|route| route.method == *method && route.regex.is_match(&sample))
            .map(|route| route.pattern.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Compile an express-style pattern: `:name` is a parameter, `:name?` an
    /// optional one. A trailing slash on the request path is tolerated.
    pub(crate) fn path_to_regex(
        path: &str,
        case_sensitive: bool,
    ) -> Result<(Regex, Vec<Arc<str>>), regex::Error> {
        let mut pattern = String::with_capacity(path.len() + 16);
        if !case_sensitive {
            pattern.push_str("(?i)");
        }
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches(':').count());

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if let Some(param) = segment.strip_prefix(':') {
                match param.strip_suffix('?') {
                    Some(name) => {
                        pattern.push_str("(?:/([^/]+?))?");
                        param_names.push(Arc::from(name));
                    }
                    None => {
                        pattern.push_str("/([^/]+?)");
                        param_names.push(Arc::from(param));
                    }
                }
            } else {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push_str("/?$");
        Ok((Regex::new(&pattern)?, param_names))
    }
}
