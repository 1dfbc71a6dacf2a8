use std::fmt;

use tracing::debug;

use crate::error::{ApplicationError, ConfigError};
use crate::metadata::{MetadataRegistry, OwnerType};
use crate::route::controller_route;
use crate::server::{HttpContext, HttpResponse};
use crate::validator::BodySchema;

use super::options::{AuthFn, ContentType, ControllerOptions, CorsOverride, ErrorHandlerFn, HttpVerb};

/// Outcome of an endpoint invocation.
pub type EndpointResult = Result<HttpResponse, ApplicationError>;

/// Name of the member that becomes an implicit `GET` on the controller root.
pub const DEFAULT_MEMBER: &str = "default";

/// A controller instance the server can dispatch to.
///
/// Members are looked up by name at request time, so an endpoint annotation is
/// only ever bound to a member the controller actually exposes. Implementations
/// are usually generated with [`controller_methods!`](crate::controller_methods).
pub trait Controller: Send + Sync + 'static {
    /// Names of every invocable member.
    fn members(&self) -> &'static [&'static str];

    /// Invoke `member`. `None` when the controller has no such member.
    fn invoke(&self, member: &str, ctx: &HttpContext) -> Option<EndpointResult>;
}

/// Implement the body of [`Controller`] for a list of inherent methods with the
/// signature `fn(&self, &HttpContext) -> EndpointResult`.
///
/// ```ignore
/// impl Controller for ProductsController {
///     declroute::controller_methods!(default, delete, post);
/// }
/// ```
#[macro_export]
macro_rules! controller_methods {
    ($($method:ident),* $(,)?) => {
        fn members(&self) -> &'static [&'static str] {
            &[$(stringify!($method)),*]
        }

        fn invoke(
            &self,
            member: &str,
            ctx: &$crate::server::HttpContext,
        ) -> ::std::option::Option<$crate::controller::EndpointResult> {
            match member {
                $(stringify!($method) => ::std::option::Option::Some(self.$method(ctx)),)*
                _ => ::std::option::Option::None,
            }
        }
    };
}

/// One resolved endpoint: a controller member bound to one verb.
#[derive(Clone)]
pub struct EndpointDescriptor {
    pub member: String,
    pub verb: HttpVerb,
    /// Endpoint route segment: explicit route, member name, or empty for the
    /// default member.
    pub route: String,
    pub params: Option<String>,
    pub content_type: Option<ContentType>,
    pub body: Option<BodySchema>,
    pub authenticate: bool,
    pub auth_method: Option<AuthFn>,
    pub error_handler: Option<ErrorHandlerFn>,
    pub cors: Option<CorsOverride>,
    /// Synthesized for an unannotated `default` member.
    pub implicit: bool,
}

impl fmt::Debug for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDescriptor")
            .field("member", &self.member)
            .field("verb", &self.verb)
            .field("route", &self.route)
            .field("params", &self.params)
            .field("content_type", &self.content_type)
            .field("body", &self.body)
            .field("authenticate", &self.authenticate)
            .field("auth_method", &self.auth_method.as_ref().map(|_| "<function>"))
            .field("error_handler", &self.error_handler.as_ref().map(|_| "<function>"))
            .field("cors", &self.cors)
            .field("implicit", &self.implicit)
            .finish()
    }
}

impl EndpointDescriptor {
    fn implicit_default() -> Self {
        Self {
            member: DEFAULT_MEMBER.to_string(),
            verb: HttpVerb::Get,
            route: String::new(),
            params: None,
            content_type: None,
            body: None,
            authenticate: false,
            auth_method: None,
            error_handler: None,
            cors: None,
            implicit: true,
        }
    }
}

/// Every endpoint of a controller, in declaration order.
///
/// Members that carry no endpoint annotation are never exposed, with one exception:
/// a `default` member without annotations becomes `GET` on the controller root.
pub fn resolve_endpoints(
    registry: &MetadataRegistry,
    owner: &OwnerType,
    controller: &dyn Controller,
) -> Result<Vec<EndpointDescriptor>, ConfigError> {
    let members = controller.members();
    let mut endpoints = Vec::new();

    for (member, verb, options) in registry.endpoints(owner) {
        if !members.contains(&member) {
            return Err(ConfigError::UnknownEndpointMember {
                owner: owner.name().to_string(),
                member: member.to_string(),
            });
        }

        let route = match options.route.as_deref() {
            Some(route) if !route.is_empty() => route.to_string(),
            _ if member == DEFAULT_MEMBER => String::new(),
            _ => member.to_string(),
        };

        endpoints.push(EndpointDescriptor {
            member: member.to_string(),
            verb,
            route,
            params: options.params.clone().filter(|p| !p.is_empty()),
            content_type: options.content_type,
            body: options.body.clone().map(|model| model.into_schema()),
            authenticate: options.authenticate,
            auth_method: options.auth_method.clone(),
            error_handler: options.error_handler.clone(),
            cors: options.cors.clone(),
            implicit: false,
        });
    }

    let default_declared = endpoints.iter().any(|e| e.member == DEFAULT_MEMBER);
    if !default_declared && members.contains(&DEFAULT_MEMBER) {
        debug!(controller = %owner, "implicit GET for default member");
        endpoints.push(EndpointDescriptor::implicit_default());
    }

    Ok(endpoints)
}

/// A controller with its options, resolved route and endpoints.
#[derive(Clone, Debug)]
pub struct ControllerDescriptor {
    pub owner: OwnerType,
    pub options: ControllerOptions,
    pub route: String,
    pub endpoints: Vec<EndpointDescriptor>,
}

/// Resolve everything the server needs to register a controller's routes.
pub fn describe_controller(
    registry: &MetadataRegistry,
    owner: &OwnerType,
    controller: &dyn Controller,
) -> Result<ControllerDescriptor, ConfigError> {
    let options = registry
        .controller_options(owner)
        .cloned()
        .ok_or_else(|| ConfigError::MissingControllerOptions {
            owner: owner.name().to_string(),
        })?;
    let route = controller_route(owner.name(), &options)?;
    let endpoints = resolve_endpoints(registry, owner, controller)?;
    Ok(ControllerDescriptor {
        owner: owner.clone(),
        options,
        route,
        endpoints,
    })
}
