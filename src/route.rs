//! Route composition.
//!
//! A route is `/<prefix>/<controller>/<endpoint>/<params>` with empty parts
//! skipped. Every part is trimmed of leading and trailing slashes first, so the
//! result never contains `//` and never ends with `/` (except the bare root).

use crate::controller::ControllerOptions;
use crate::error::ConfigError;

const CONTROLLER_SUFFIX: &str = "Controller";

/// Strip leading and trailing `/`.
#[must_use]
pub fn trim_route(route: &str) -> &str {
    route.trim_matches('/')
}

/// Join the route parts of one endpoint into a registrable path.
#[must_use]
pub fn compose(prefix: &str, controller: &str, endpoint: &str, params: Option<&str>) -> String {
    let parts = [prefix, controller, endpoint, params.unwrap_or("")];
    let mut route = String::new();
    for part in parts.iter().map(|p| trim_route(p)).filter(|p| !p.is_empty()) {
        route.push('/');
        route.push_str(part);
    }
    if route.is_empty() {
        route.push('/');
    }
    route
}

/// Route segment for a controller type.
///
/// An explicit route wins; otherwise the type name up to the first `Controller`
/// (`ProductsController` -> `products`). Lowercased unless `preserve_case`.
pub fn controller_route(type_name: &str, options: &ControllerOptions) -> Result<String, ConfigError> {
    let route = match options.route.as_deref().map(trim_route) {
        Some(explicit) if !explicit.is_empty() => explicit,
        _ => match type_name.find(CONTROLLER_SUFFIX) {
            Some(index) => &type_name[..index],
            None => {
                return Err(ConfigError::UnderivableRoute {
                    owner: type_name.to_string(),
                })
            }
        },
    };
    Ok(if options.preserve_case {
        route.to_string()
    } else {
        route.to_lowercase()
    })
}
