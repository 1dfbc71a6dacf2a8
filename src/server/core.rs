use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::config::ServerConfig;
use crate::controller::{
    describe_controller, AuthFn, ContentType, Controller, CorsOverride, EndpointResult,
    ErrorHandlerFn, HttpVerb,
};
use crate::error::{ApplicationError, ConfigError};
use crate::ids::ControllerId;
use crate::metadata::{self, MetadataRegistry, OwnerType};
use crate::route::{compose, trim_route};
use crate::router::Router;
use crate::validator::{validate_body, BodySchema};

use super::context::HttpContext;
use super::cors::CorsPolicy;
use super::request::HttpRequest;
use super::response::{default_error_handler, HttpResponse};

/// Message of the 400 returned when a content-type guard rejects a request.
pub const CONTENT_TYPE_NOT_ALLOWED: &str = "Supplied header content-type not allowed";

/// Server-wide defaults, overridable per endpoint.
#[derive(Clone, Default)]
pub struct ServerOptions {
    /// Takes precedence over [`ServerConfig::route_prefix`].
    pub route_prefix: Option<String>,
    pub auth_method: Option<AuthFn>,
    pub error_handler: Option<ErrorHandlerFn>,
    pub cors: Option<CorsPolicy>,
}

impl ServerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route_prefix(mut self, prefix: &str) -> Self {
        self.route_prefix = Some(trim_route(prefix).to_string());
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
    pub fn cors(mut self, policy: CorsPolicy) -> Self {
        self.cors = Some(policy);
        self
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("route_prefix", &self.route_prefix)
            .field("auth_method", &self.auth_method.as_ref().map(|_| "<function>"))
            .field("error_handler", &self.error_handler.as_ref().map(|_| "<function>"))
            .field("cors", &self.cors)
            .finish()
    }
}

/// One registered route as reported by [`ApiServer::routes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub verb: HttpVerb,
    pub route: String,
    pub controller: String,
    pub controller_id: ControllerId,
    pub member: String,
    pub authenticate: bool,
    pub content_type: Option<ContentType>,
    pub body_model: Option<String>,
    pub cors: bool,
}

pub type RouteTable = Vec<RouteInfo>;

struct RegisteredController {
    id: ControllerId,
    owner: OwnerType,
    instance: Arc<dyn Controller>,
}

/// Everything that runs for one route, fixed at registration.
struct RoutePipeline {
    info: RouteInfo,
    cors: Option<CorsPolicy>,
    auth: Option<AuthFn>,
    content_type: Option<ContentType>,
    body: Option<BodySchema>,
    error_handler: ErrorHandlerFn,
}

/// In-process dispatch adapter.
///
/// Controllers are added with [`ApiServer::controller`], then
/// [`ApiServer::register_controllers`] resolves their metadata into routes. A host
/// HTTP server turns each incoming request into an [`HttpRequest`] and writes back
/// the [`HttpResponse`] returned by [`ApiServer::handle`].
///
/// Per matched route the pipeline is: auth, content-type guard, body validation,
/// endpoint. Any error goes to the endpoint's error handler (else the server's,
/// else [`default_error_handler`]); CORS headers are then added to whatever
/// response came out.
pub struct ApiServer {
    config: ServerConfig,
    options: ServerOptions,
    registry: Arc<MetadataRegistry>,
    controllers: Vec<RegisteredController>,
    registered_upto: usize,
    pipelines: Vec<RoutePipeline>,
    router: Router,
}

impl ApiServer {
    /// A server reading metadata from the process-wide registry.
    #[must_use]
    pub fn new(config: ServerConfig, options: ServerOptions) -> Self {
        let router = Router::new(config.case_sensitive_routing);
        Self {
            config,
            options,
            registry: metadata::global(),
            controllers: Vec::new(),
            registered_upto: 0,
            pipelines: Vec::new(),
            router,
        }
    }

    /// Use an explicit registry instead of the process-wide one.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Add a controller instance. Ids are assigned from 1 in call order.
    pub fn controller<C: Controller>(&mut self, instance: C) -> ControllerId {
        self.controller_with_owner(OwnerType::of::<C>(), Arc::new(instance))
    }

    /// Add a controller whose metadata lives under an explicit owner.
    pub fn controller_with_owner(
        &mut self,
        owner: OwnerType,
        instance: Arc<dyn Controller>,
    ) -> ControllerId {
        let id = ControllerId(self.controllers.len() as u32 + 1);
        debug!(controller = %owner, controller_id = %id, "controller added");
        self.controllers.push(RegisteredController {
            id,
            owner,
            instance,
        });
        id
    }

    /// Resolve every controller added since the last call into routes.
    ///
    /// Either all of them register or none do: on error the route table is
    /// unchanged and the server must not be started.
    pub fn register_controllers(&mut self) -> Result<(), ConfigError> {
        if let Some(cors) = &self.options.cors {
            cors.validate()?;
        }

        let prefix = match self.options.route_prefix.as_deref() {
            Some(prefix) => trim_route(prefix).to_string(),
            None => self.config.route_prefix().to_string(),
        };
        let mut router = self.router.clone();
        let mut pipelines: Vec<RoutePipeline> = Vec::new();
        let base = self.pipelines.len();

        for controller in &self.controllers[self.registered_upto..] {
            let described =
                describe_controller(&self.registry, &controller.owner, controller.instance.as_ref())?;

            for endpoint in described.endpoints {
                let route = compose(
                    &prefix,
                    &described.route,
                    &endpoint.route,
                    endpoint.params.as_deref(),
                );

                let auth = if endpoint.authenticate {
                    let auth = endpoint
                        .auth_method
                        .or_else(|| self.options.auth_method.clone())
                        .ok_or_else(|| ConfigError::MissingAuthMethod {
                            route: route.clone(),
                        })?;
                    Some(auth)
                } else {
                    None
                };

                let cors = match endpoint.cors {
                    Some(CorsOverride::Policy(policy)) => {
                        policy.validate()?;
                        Some(policy)
                    }
                    Some(CorsOverride::Disabled) => {
                        debug!(route = %route, "Cors policy explicitly ignored for route");
                        None
                    }
                    None => self.options.cors.clone(),
                };

                let error_handler: ErrorHandlerFn = endpoint
                    .error_handler
                    .or_else(|| self.options.error_handler.clone())
                    .unwrap_or_else(|| Arc::new(default_error_handler));

                router
                    .insert(endpoint.verb.method(), &route, base + pipelines.len())
                    .map_err(|source| ConfigError::InvalidRoutePattern {
                        route: route.clone(),
                        source,
                    })?;

                let info = RouteInfo {
                    verb: endpoint.verb,
                    route,
                    controller: controller.owner.name().to_string(),
                    controller_id: controller.id,
                    member: endpoint.member,
                    authenticate: auth.is_some(),
                    content_type: endpoint.content_type,
                    body_model: endpoint.body.as_ref().map(|b| b.owner().name().to_string()),
                    cors: cors.is_some(),
                };
                if self.config.verbose_routes {
                    info!(verb = %info.verb, route = %info.route, controller = %info.controller, member = %info.member, "route registered");
                } else {
                    debug!(verb = %info.verb, route = %info.route, controller = %info.controller, member = %info.member, "route registered");
                }

                pipelines.push(RoutePipeline {
                    info,
                    cors,
                    auth,
                    content_type: endpoint.content_type.filter(|ct| *ct != ContentType::Any),
                    body: endpoint.body,
                    error_handler,
                });
            }
        }

        let added = pipelines.len();
        self.router = router;
        self.pipelines.extend(pipelines);
        self.registered_upto = self.controllers.len();
        info!(
            routes_added = added,
            routes_total = self.pipelines.len(),
            controllers = self.controllers.len(),
            "controllers registered"
        );
        Ok(())
    }

    /// Registered routes sorted by route, then verb.
    #[must_use]
    pub fn routes(&self) -> RouteTable {
        let mut table: RouteTable = self.pipelines.iter().map(|p| p.info.clone()).collect();
        table.sort_by(|a, b| a.route.cmp(&b.route).then(a.verb.cmp(&b.verb)));
        table
    }

    /// Dispatch one request through its route pipeline.
    #[must_use]
    pub fn handle(&self, request: HttpRequest) -> HttpResponse {
        let started = Instant::now();
        let mut ctx = HttpContext::new(request);
        let span = info_span!(
            "request",
            request_id = %ctx.request_id,
            method = %ctx.request.method,
            path = %ctx.request.path
        );
        let _entered = span.enter();

        let matched = self
            .router
            .route(&ctx.request.method, &ctx.request.path)
            .and_then(|m| self.pipelines.get(m.target).map(|p| (m, p)));

        let mut response = match matched {
            Some((route_match, pipeline)) => {
                ctx.request.path_params = route_match.path_params;
                ctx.controller_id = Some(pipeline.info.controller_id);
                let mut response = match self.run_pipeline(pipeline, &ctx) {
                    Ok(response) => response,
                    Err(err) => {
                        if err.status >= 500 {
                            error!(status = err.status, error = %err, route = %pipeline.info.route, "endpoint failed");
                        } else {
                            debug!(status = err.status, error = %err, route = %pipeline.info.route, "request rejected");
                        }
                        (pipeline.error_handler)(&err, &ctx)
                    }
                };
                if let Some(cors) = &pipeline.cors {
                    cors.apply(&ctx.request, &mut response);
                }
                response
            }
            None => {
                let err = ApplicationError::not_found(format!(
                    "Cannot {} {}",
                    ctx.request.method, ctx.request.path
                ));
                let mut response = match &self.options.error_handler {
                    Some(handler) => handler(&err, &ctx),
                    None => default_error_handler(&err, &ctx),
                };
                if let Some(cors) = &self.options.cors {
                    cors.apply(&ctx.request, &mut response);
                }
                response
            }
        };

        response.set_header("x-request-id", ctx.request_id.to_string());
        info!(
            status = response.status,
            latency_us = started.elapsed().as_micros() as u64,
            "request complete"
        );
        response
    }

    fn run_pipeline(&self, pipeline: &RoutePipeline, ctx: &HttpContext) -> EndpointResult {
        if let Some(auth) = &pipeline.auth {
            auth(ctx)?;
        }

        if let Some(content_type) = pipeline.content_type {
            if !content_type.accepts(ctx.request.content_type()) {
                return Err(ApplicationError::bad_request(CONTENT_TYPE_NOT_ALLOWED));
            }
        }

        if let Some(schema) = &pipeline.body {
            validate_body(&ctx.request, schema, &self.registry)?;
        }

        let controller = self
            .controllers
            .iter()
            .find(|c| c.id == pipeline.info.controller_id)
            .ok_or_else(|| {
                ApplicationError::internal("Unable to find matching controller corresponding to endpoint")
            })?;

        let member = pipeline.info.member.as_str();
        match catch_unwind(AssertUnwindSafe(|| controller.instance.invoke(member, ctx))) {
            Ok(Some(result)) => result,
            Ok(None) => {
                warn!(controller = %controller.owner, member = %member, "endpoint member disappeared");
                Err(ApplicationError::internal(format!(
                    "The endpoint function {member} is not a member of the controller"
                )))
            }
            Err(panic) => {
                error!(
                    controller = %controller.owner,
                    member = %member,
                    panic_message = ?panic,
                    "Endpoint panicked"
                );
                Err(ApplicationError::internal(""))
            }
        }
    }
}

impl fmt::Debug for ApiServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiServer")
            .field("config", &self.config)
            .field("options", &self.options)
            .field("controllers", &self.controllers.len())
            .field("routes", &self.pipelines.len())
            .finish()
    }
}
