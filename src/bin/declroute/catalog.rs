//! Controllers and models the CLI routes and validates against.

use std::sync::Arc;

use declroute::rules::NumericBound;
use declroute::{
    controller_methods, ApiServer, ApplicationError, ContentType, Controller, ControllerOptions,
    CorsPolicy, EndpointOptions, EndpointResult, HttpContext, HttpResponse, HttpVerb,
    MetadataRegistry, ModelFile, ModelRef, Rule, RuleDefinitionError, ServerConfig, ServerOptions,
};
use http::Method;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: f64,
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExampleObject {
    pub id: i64,
    pub value: String,
}

fn products() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            name: "Tomato Soup".to_string(),
            price: 199.0,
            category: "Groceries".to_string(),
        },
        Product {
            id: 2,
            name: "Hammer".to_string(),
            price: 1499.0,
            category: "Home Improvement".to_string(),
        },
    ]
}

pub struct TestController;

impl TestController {
    fn test_get(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!("GET works")))
    }

    fn test_post(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!("POST works")))
    }

    fn post_json_echo(&self, ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(ctx.body().cloned().unwrap_or_default()))
    }

    fn overwritten_route(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!("ok")))
    }

    fn get_with_params(&self, ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!({
            "id": ctx.path_param("id"),
            "value": ctx.path_param("value"),
        })))
    }

    fn post_with_schema_validation(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!("formatting good")))
    }

    fn post_with_url_encoded(&self, ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(ctx.body().cloned().unwrap_or_default()))
    }

    fn should_not_register(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::no_content())
    }
}

impl Controller for TestController {
    controller_methods!(
        test_get,
        test_post,
        post_json_echo,
        overwritten_route,
        get_with_params,
        post_with_schema_validation,
        post_with_url_encoded,
        should_not_register,
    );
}

pub struct ProductsController;

impl ProductsController {
    /// One member serving every verb; the method picks the behaviour.
    fn default(&self, ctx: &HttpContext) -> EndpointResult {
        match ctx.request.method {
            Method::POST => Ok(HttpResponse::created(ctx.body().cloned().unwrap_or_default())),
            Method::PUT => Ok(HttpResponse::ok(json!("PUT ok"))),
            Method::DELETE => Ok(HttpResponse::ok(json!("DELETE ok"))),
            _ => self.find(ctx.path_param("id")),
        }
    }

    fn find(&self, id: Option<&str>) -> EndpointResult {
        let Some(id) = id else {
            return HttpResponse::json_of(200, &products());
        };
        let id: u32 = id
            .parse()
            .map_err(|_| ApplicationError::bad_request("supplied product id not a number type"))?;
        match products().into_iter().find(|p| p.id == id) {
            Some(product) => HttpResponse::json_of(200, &product),
            None => Err(ApplicationError::not_found(format!("no product with id {id}"))),
        }
    }
}

impl Controller for ProductsController {
    controller_methods!(default);
}

pub struct CustomRouteController;

impl CustomRouteController {
    fn default(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!("custom route")))
    }
}

impl Controller for CustomRouteController {
    controller_methods!(default);
}

/// Metadata for every catalog controller and model.
pub fn registry() -> Result<MetadataRegistry, RuleDefinitionError> {
    let mut registry = MetadataRegistry::new();

    registry
        .controller::<TestController>(ControllerOptions::new())
        .endpoint("test_get", HttpVerb::Get, EndpointOptions::new())
        .endpoint(
            "test_post",
            HttpVerb::Post,
            EndpointOptions::new().content_type(ContentType::Any),
        )
        .endpoint("post_json_echo", HttpVerb::Post, EndpointOptions::new())
        .endpoint(
            "overwritten_route",
            HttpVerb::Get,
            EndpointOptions::new().route("OverrideRoute"),
        )
        .endpoint(
            "get_with_params",
            HttpVerb::Get,
            EndpointOptions::new()
                .route("GetWithParams")
                .params(":id/:value?"),
        )
        .endpoint(
            "post_with_schema_validation",
            HttpVerb::Post,
            EndpointOptions::new().from_body(ModelRef::constructor::<ExampleObject>()),
        )
        .endpoint(
            "post_with_url_encoded",
            HttpVerb::Post,
            EndpointOptions::new().content_type(ContentType::UrlEncoded),
        );

    let product = || ModelRef::constructor::<Product>();
    registry
        .controller::<ProductsController>(ControllerOptions::new())
        .endpoint("default", HttpVerb::Get, EndpointOptions::new().params(":id?"))
        .endpoint("default", HttpVerb::Delete, EndpointOptions::new().params(":id"))
        .endpoint("default", HttpVerb::Post, EndpointOptions::new().from_body(product()))
        .endpoint("default", HttpVerb::Put, EndpointOptions::new().from_body(product()));

    registry.controller::<CustomRouteController>(ControllerOptions::new().route("/TestRoute/"));

    registry
        .model::<ExampleObject>()
        .rule("id", Rule::Required)?
        .rule("id", Rule::range(1.0, 5.0))?
        .rule("value", Rule::Email)?;
    registry
        .model::<Product>()
        .rule("price", Rule::Range(NumericBound::predicate(|n| n >= 0.0)))?;

    Ok(registry)
}

/// Look up a body model by name: catalog models first, then the model file.
pub fn model_ref(name: &str, models: Option<&ModelFile>) -> Option<ModelRef> {
    match name {
        "Product" => Some(ModelRef::constructor::<Product>()),
        "ExampleObject" => Some(ModelRef::constructor::<ExampleObject>()),
        other => models.and_then(|file| file.model_ref(other)),
    }
}

/// A server with every catalog controller added, not yet registered.
pub fn server(config: ServerConfig, registry: MetadataRegistry) -> ApiServer {
    let options = ServerOptions::new().cors(CorsPolicy::permissive());
    let mut server = ApiServer::new(config, options).with_registry(Arc::new(registry));
    server.controller(TestController);
    server.controller(ProductsController);
    server.controller(CustomRouteController);
    server
}
