//! # declroute
//!
//! **declroute** turns declarative controller metadata into HTTP routes and validates
//! request bodies against registered models before an endpoint runs.
//!
//! ## Overview
//!
//! Controllers, their endpoints and the field rules of body models are declared in a
//! [`MetadataRegistry`]. At startup the [`ApiServer`] resolves that metadata into a
//! deterministic route table; per request it runs auth, the content-type guard and
//! body validation, then invokes the controller member bound to the matched route.
//!
//! ## Architecture
//!
//! - **[`rules`]** - field rule vocabulary (`Required`, `Range`, `StringLength`, ...)
//! - **[`metadata`]** - the metadata registry and its builders
//! - **[`controller`]** - the [`Controller`] trait and endpoint resolution
//! - **[`route`]** - route composition
//! - **[`validator`]** - schema validation of request bodies
//! - **[`router`]** - express-style path matching
//! - **[`server`]** - the in-process dispatch adapter
//! - **[`schema_file`]** - models declared in YAML/JSON files
//! - **[`config`]** / **[`logging`]** - server settings and tracing setup
//!
//! ## Example
//!
//! ```rust,ignore
//! use declroute::{
//!     controller_methods, ApiServer, Controller, ControllerOptions, EndpointOptions,
//!     EndpointResult, HttpContext, HttpResponse, HttpVerb, MetadataRegistry, ModelRef,
//!     Rule, ServerConfig, ServerOptions,
//! };
//!
//! #[derive(Default, serde::Serialize)]
//! struct Product {
//!     id: u32,
//!     name: String,
//! }
//!
//! struct ProductsController;
//!
//! impl ProductsController {
//!     fn default(&self, ctx: &HttpContext) -> EndpointResult {
//!         Ok(HttpResponse::ok(serde_json::json!({ "id": ctx.path_param("id") })))
//!     }
//!     fn create(&self, ctx: &HttpContext) -> EndpointResult {
//!         Ok(HttpResponse::created(ctx.body().cloned().unwrap_or_default()))
//!     }
//! }
//!
//! impl Controller for ProductsController {
//!     controller_methods!(default, create);
//! }
//!
//! let mut registry = MetadataRegistry::new();
//! registry
//!     .controller::<ProductsController>(ControllerOptions::new())
//!     .endpoint("default", HttpVerb::Get, EndpointOptions::new().params(":id?"))
//!     .endpoint(
//!         "create",
//!         HttpVerb::Post,
//!         EndpointOptions::new().from_body(ModelRef::constructor::<Product>()),
//!     );
//! registry.model::<Product>().rule("id", Rule::Required)?;
//!
//! let mut server = ApiServer::new(ServerConfig::from_env(), ServerOptions::new())
//!     .with_registry(std::sync::Arc::new(registry));
//! server.controller(ProductsController);
//! server.register_controllers()?;
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod logging;
pub mod metadata;
pub mod route;
pub mod router;
pub mod rules;
pub mod schema_file;
pub mod server;
pub mod validator;

pub use config::ServerConfig;
pub use controller::{
    Controller, ControllerOptions, ContentType, CorsOverride, EndpointOptions, EndpointResult,
    HttpVerb,
};
pub use error::{ApplicationError, ConfigError, RuleDefinitionError, SchemaError};
pub use ids::{ControllerId, RequestId};
pub use metadata::{MetadataRegistry, OwnerType};
pub use rules::Rule;
pub use schema_file::ModelFile;
pub use server::{
    ApiServer, CorsPolicy, HttpContext, HttpRequest, HttpResponse, RouteInfo, RouteTable,
    ServerOptions,
};
pub use validator::{ModelRef, ValidationReport};
