#![allow(dead_code)]

use std::sync::Arc;

use declroute::{
    controller_methods, ApiServer, ApplicationError, ContentType, Controller, ControllerOptions,
    EndpointOptions, EndpointResult, HttpContext, HttpRequest, HttpResponse, HttpVerb,
    MetadataRegistry, ModelRef, Rule, ServerConfig, ServerOptions,
};
use http::Method;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExampleObject {
    pub id: i64,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: f64,
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

    fn fails(&self, _ctx: &HttpContext) -> EndpointResult {
        Err(ApplicationError::conflict("already exists"))
    }

    fn panics(&self, _ctx: &HttpContext) -> EndpointResult {
        panic!("endpoint blew up")
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
        fails,
        panics,
        should_not_register,
    );
}

pub struct ProductsController;

impl ProductsController {
    fn default(&self, ctx: &HttpContext) -> EndpointResult {
        match ctx.request.method {
            Method::DELETE => Ok(HttpResponse::ok(json!("DELETE ok"))),
            Method::POST => Ok(HttpResponse::created(json!("POST ok"))),
            _ => Ok(HttpResponse::ok(json!({ "id": ctx.path_param("id") }))),
        }
    }
}

impl Controller for ProductsController {
    controller_methods!(default);
}

/// Only a `default` member, no endpoint annotations.
pub struct CustomRouteController;

impl CustomRouteController {
    fn default(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!("custom")))
    }
}

impl Controller for CustomRouteController {
    controller_methods!(default);
}

/// Never declared in any registry.
pub struct InvalidController;

impl InvalidController {
    fn default(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::no_content())
    }
}

impl Controller for InvalidController {
    controller_methods!(default);
}

/// Declares an authenticated endpoint.
pub struct InvalidAuthRouteController;

impl InvalidAuthRouteController {
    fn test_auth(&self, _ctx: &HttpContext) -> EndpointResult {
        Ok(HttpResponse::ok(json!("authenticated")))
    }
}

impl Controller for InvalidAuthRouteController {
    controller_methods!(test_auth);
}

pub fn registry() -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();

    registry
        .controller::<TestController>(ControllerOptions::new())
        .endpoint("test_get", HttpVerb::Get, EndpointOptions::new())
        .endpoint(
            "test_post",
            HttpVerb::Post,
            EndpointOptions::new().content_type(ContentType::Any),
        )
        .endpoint(
            "post_json_echo",
            HttpVerb::Post,
            EndpointOptions::new().content_type(ContentType::Json),
        )
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
        )
        .endpoint("fails", HttpVerb::Get, EndpointOptions::new())
        .endpoint("panics", HttpVerb::Get, EndpointOptions::new());

    registry
        .controller::<ProductsController>(ControllerOptions::new())
        .endpoint("default", HttpVerb::Get, EndpointOptions::new().params(":id?"))
        .endpoint("default", HttpVerb::Delete, EndpointOptions::new().params(":id"))
        .endpoint(
            "default",
            HttpVerb::Post,
            EndpointOptions::new().from_body(ModelRef::constructor::<Product>()),
        );

    registry.controller::<CustomRouteController>(ControllerOptions::new().route("/TestRoute/"));

    registry
        .controller::<InvalidAuthRouteController>(ControllerOptions::new())
        .endpoint(
            "test_auth",
            HttpVerb::Post,
            EndpointOptions::new().authenticate(true),
        );

    registry
        .model::<ExampleObject>()
        .rule("id", Rule::Required)
        .unwrap()
        .rule("id", Rule::range(1.0, 5.0))
        .unwrap()
        .rule("value", Rule::Required)
        .unwrap()
        .rule("value", Rule::string_length(1, 5))
        .unwrap();

    registry
}

/// A registered server over the fixture registry with `TestController`,
/// `ProductsController` and `CustomRouteController`.
pub fn server(options: ServerOptions) -> ApiServer {
    server_with_config(ServerConfig::default(), options)
}

pub fn server_with_config(config: ServerConfig, options: ServerOptions) -> ApiServer {
    let mut server = ApiServer::new(config, options).with_registry(Arc::new(registry()));
    server.controller(TestController);
    server.controller(ProductsController);
    server.controller(CustomRouteController);
    server.register_controllers().unwrap();
    server
}

pub fn get(path: &str) -> HttpRequest {
    HttpRequest::new(Method::GET, path)
}

pub fn post_json(path: &str, body: Value) -> HttpRequest {
    HttpRequest::new(Method::POST, path).with_json(body)
}

pub fn body_message(response: &HttpResponse) -> String {
    response
        .body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
