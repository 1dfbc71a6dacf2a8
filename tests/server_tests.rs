mod common;

use std::sync::Arc;

use common::{
    body_message, get, post_json, registry, server, server_with_config, InvalidAuthRouteController,
    InvalidController, TestController,
};
use declroute::error::MISSING_AUTH_METHOD;
use declroute::server::CONTENT_TYPE_NOT_ALLOWED;
use declroute::{
    ApiServer, ApplicationError, ConfigError, ControllerId, ControllerOptions, CorsOverride,
    CorsPolicy, EndpointOptions, HttpRequest, HttpResponse, HttpVerb, ServerConfig, ServerOptions,
};
use http::Method;
use serde_json::json;

#[test]
fn test_route_table_is_composed_and_sorted() {
    let server = server(ServerOptions::new());
    let routes: Vec<(HttpVerb, String)> = server
        .routes()
        .into_iter()
        .map(|r| (r.verb, r.route))
        .collect();

    assert!(routes.contains(&(HttpVerb::Get, "/test/test_get".to_string())));
    assert!(routes.contains(&(HttpVerb::Get, "/test/OverrideRoute".to_string())));
    assert!(routes.contains(&(HttpVerb::Get, "/test/GetWithParams/:id/:value?".to_string())));
    assert!(routes.contains(&(HttpVerb::Get, "/products/:id?".to_string())));
    assert!(routes.contains(&(HttpVerb::Delete, "/products/:id".to_string())));
    assert!(routes.contains(&(HttpVerb::Post, "/products".to_string())));
    assert!(routes.contains(&(HttpVerb::Get, "/testroute".to_string())));
    assert!(!routes.iter().any(|(_, r)| r.contains("should_not_register")));

    let mut sorted = routes.clone();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    assert_eq!(routes, sorted);
}

#[test]
fn test_controller_ids_are_sequential() {
    let server = server(ServerOptions::new());
    let table = server.routes();
    let id_of = |controller: &str| {
        table
            .iter()
            .find(|r| r.controller == controller)
            .map(|r| r.controller_id)
    };
    assert_eq!(id_of("TestController"), Some(ControllerId(1)));
    assert_eq!(id_of("ProductsController"), Some(ControllerId(2)));
    assert_eq!(id_of("CustomRouteController"), Some(ControllerId(3)));
}

#[test]
fn test_get_dispatches_to_member() {
    let server = server(ServerOptions::new());
    let res = server.handle(get("/test/test_get"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body, Some(json!("GET works")));
    assert!(res.get_header("x-request-id").is_some());
}

#[test]
fn test_inbound_request_id_is_kept() {
    let server = server(ServerOptions::new());
    let id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    let res = server.handle(get("/test/test_get").with_header("X-Request-Id", id));
    assert_eq!(res.get_header("x-request-id"), Some(id));
}

#[test]
fn test_routing_ignores_case_by_default() {
    let server = server(ServerOptions::new());
    assert_eq!(server.handle(get("/TEST/OVERRIDEROUTE")).status, 200);
    assert_eq!(server.handle(get("/TestRoute")).status, 200);
}

#[test]
fn test_case_sensitive_routing() {
    let config = ServerConfig {
        case_sensitive_routing: true,
        ..ServerConfig::default()
    };
    let server = server_with_config(config, ServerOptions::new());
    assert_eq!(server.handle(get("/test/OverrideRoute")).status, 200);
    assert_eq!(server.handle(get("/test/overrideroute")).status, 404);
}

#[test]
fn test_path_params_reach_the_endpoint() {
    let server = server(ServerOptions::new());

    let res = server.handle(get("/test/GetWithParams/7"));
    assert_eq!(res.body, Some(json!({"id": "7", "value": null})));

    let res = server.handle(get("/test/GetWithParams/7/abc"));
    assert_eq!(res.body, Some(json!({"id": "7", "value": "abc"})));

    let res = server.handle(get("/products"));
    assert_eq!(res.body, Some(json!({"id": null})));
}

#[test]
fn test_one_member_serves_each_declared_verb() {
    let server = server(ServerOptions::new());
    let res = server.handle(HttpRequest::new(Method::DELETE, "/products/1"));
    assert_eq!(res.body, Some(json!("DELETE ok")));

    // DELETE is declared with a mandatory id
    assert_eq!(server.handle(HttpRequest::new(Method::DELETE, "/products")).status, 404);

    let res = server.handle(post_json("/products", json!({"id": 1, "name": "x", "price": 2.5})));
    assert_eq!(res.status, 201);
}

#[test]
fn test_head_falls_back_to_get() {
    let server = server(ServerOptions::new());
    assert_eq!(server.handle(HttpRequest::new(Method::HEAD, "/test/test_get")).status, 200);
}

#[test]
fn test_unmatched_route_is_404() {
    let server = server(ServerOptions::new());
    let res = server.handle(get("/test/should_not_register"));
    assert_eq!(res.status, 404);
    assert_eq!(body_message(&res), "Cannot GET /test/should_not_register");
    assert_eq!(res.body.as_ref().unwrap()["name"], "NotFoundError");
}

#[test]
fn test_content_type_guard_rejects_before_endpoint() {
    let server = server(ServerOptions::new());
    let req = HttpRequest::new(Method::POST, "/test/post_json_echo")
        .with_header("content-type", "multipart/form-data; boundary=abc")
        .with_body(json!({"a": 1}));
    let res = server.handle(req);
    assert_eq!(res.status, 400);
    assert_eq!(body_message(&res), CONTENT_TYPE_NOT_ALLOWED);

    let res = server.handle(post_json("/test/post_json_echo", json!({"a": 1})));
    assert_eq!(res.status, 200);
    assert_eq!(res.body, Some(json!({"a": 1})));
}

#[test]
fn test_any_content_type_installs_no_guard() {
    let server = server(ServerOptions::new());
    let req = HttpRequest::new(Method::POST, "/test/test_post").with_header("content-type", "text/plain");
    assert_eq!(server.handle(req).status, 200);
}

#[test]
fn test_url_encoded_body_is_decoded() {
    let server = server(ServerOptions::new());
    let req = HttpRequest::parse(
        Method::POST,
        "/test/post_with_url_encoded",
        &[("Content-Type", "application/x-www-form-urlencoded")],
        b"name=Hammer&category=Home+Improvement",
    )
    .unwrap();
    let res = server.handle(req);
    assert_eq!(res.status, 200);
    assert_eq!(
        res.body,
        Some(json!({"name": "Hammer", "category": "Home Improvement"}))
    );
}

#[test]
fn test_body_validation_runs_before_endpoint() {
    let server = server(ServerOptions::new());

    let res = server.handle(post_json(
        "/test/post_with_schema_validation",
        json!({"id": 3, "value": "ok"}),
    ));
    assert_eq!(res.status, 200);
    assert_eq!(res.body, Some(json!("formatting good")));

    let res = server.handle(post_json(
        "/test/post_with_schema_validation",
        json!({"id": 0, "value": ""}),
    ));
    assert_eq!(res.status, 400);
    assert_eq!(
        body_message(&res),
        "Model Validation Error(s):\n\
         Invalid parameters in request: Invalid format parameter [id] was not supplied, \
         Invalid format parameter [value] was not supplied"
    );
}

#[test]
fn test_malformed_json_is_rejected_by_parse() {
    let err = HttpRequest::parse(
        Method::POST,
        "/test/post_json_echo",
        &[("content-type", "application/json")],
        b"{not json",
    )
    .unwrap_err();
    assert_eq!(err.status, 400);
}

#[test]
fn test_endpoint_errors_use_default_handler() {
    let server = server(ServerOptions::new());
    let res = server.handle(get("/test/fails"));
    assert_eq!(res.status, 409);
    assert_eq!(
        res.body,
        Some(json!({"name": "ConflictError", "message": "already exists", "status": 409}))
    );
}

#[test]
fn test_panicking_endpoint_becomes_500() {
    let server = server(ServerOptions::new());
    let res = server.handle(get("/test/panics"));
    assert_eq!(res.status, 500);
    assert_eq!(body_message(&res), ApplicationError::DEFAULT_MESSAGE);
}

#[test]
fn test_server_error_handler_replaces_default() {
    let options = ServerOptions::new().error_handler(|err, _ctx| {
        HttpResponse::json(err.status, json!({ "error": err.message }))
    });
    let server = server(options);

    let res = server.handle(get("/test/fails"));
    assert_eq!(res.body, Some(json!({"error": "already exists"})));

    let res = server.handle(get("/nowhere"));
    assert_eq!(res.status, 404);
    assert_eq!(res.body, Some(json!({"error": "Cannot GET /nowhere"})));
}

#[test]
fn test_endpoint_error_handler_wins_over_server() {
    let mut registry = registry();
    registry
        .controller::<TestController>(ControllerOptions::new())
        .endpoint(
            "fails",
            HttpVerb::Get,
            EndpointOptions::new().error_handler(|_err, _ctx| HttpResponse::json(418, json!("teapot"))),
        );
    let options = ServerOptions::new()
        .error_handler(|err, _ctx| HttpResponse::json(err.status, json!("server")));
    let mut server = ApiServer::new(ServerConfig::default(), options).with_registry(Arc::new(registry));
    server.controller(TestController);
    server.register_controllers().unwrap();

    let res = server.handle(get("/test/fails"));
    assert_eq!(res.status, 418);
    assert_eq!(res.body, Some(json!("teapot")));
}

#[test]
fn test_auth_without_method_fails_registration() {
    let mut server =
        ApiServer::new(ServerConfig::default(), ServerOptions::new()).with_registry(Arc::new(registry()));
    server.controller(TestController);
    server.controller(InvalidAuthRouteController);

    let err = server.register_controllers().unwrap_err();
    assert!(matches!(err, ConfigError::MissingAuthMethod { ref route } if route == "/invalidauthroute/test_auth"));
    assert_eq!(err.to_string(), MISSING_AUTH_METHOD);
    assert!(server.routes().is_empty());
}

#[test]
fn test_server_auth_method_guards_endpoint() {
    let options = ServerOptions::new().auth_method(|ctx| match ctx.header("authorization") {
        Some("Bearer ok") => Ok(()),
        _ => Err(ApplicationError::unauthorized("missing token")),
    });
    let mut server =
        ApiServer::new(ServerConfig::default(), options).with_registry(Arc::new(registry()));
    server.controller(InvalidAuthRouteController);
    server.register_controllers().unwrap();
    assert!(server.routes()[0].authenticate);

    let res = server.handle(HttpRequest::new(Method::POST, "/invalidauthroute/test_auth"));
    assert_eq!(res.status, 401);
    assert_eq!(body_message(&res), "missing token");

    let res = server.handle(
        HttpRequest::new(Method::POST, "/invalidauthroute/test_auth")
            .with_header("Authorization", "Bearer ok"),
    );
    assert_eq!(res.status, 200);
}

#[test]
fn test_controller_without_options_fails_registration() {
    let mut server =
        ApiServer::new(ServerConfig::default(), ServerOptions::new()).with_registry(Arc::new(registry()));
    server.controller(InvalidController);
    let err = server.register_controllers().unwrap_err();
    assert!(matches!(err, ConfigError::MissingControllerOptions { .. }));
}

#[test]
fn test_registration_is_incremental() {
    let mut server =
        ApiServer::new(ServerConfig::default(), ServerOptions::new()).with_registry(Arc::new(registry()));
    server.controller(common::CustomRouteController);
    server.register_controllers().unwrap();
    assert_eq!(server.routes().len(), 1);

    let id = server.controller(common::ProductsController);
    assert_eq!(id, ControllerId(2));
    server.register_controllers().unwrap();
    assert_eq!(server.routes().len(), 4);
    assert_eq!(server.handle(get("/testroute")).status, 200);
    assert_eq!(server.handle(get("/products/2")).body, Some(json!({"id": "2"})));
}

#[test]
fn test_route_prefix_is_prepended() {
    let server = server(ServerOptions::new().route_prefix("/api/"));
    assert_eq!(server.handle(get("/api/test/test_get")).status, 200);
    assert_eq!(server.handle(get("/test/test_get")).status, 404);
}

#[test]
fn test_cors_headers_follow_server_policy() {
    let server = server(ServerOptions::new().cors(CorsPolicy::permissive()));
    let res = server.handle(get("/test/test_get").with_header("Origin", "https://app.example"));
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));

    let res = server.handle(get("/missing").with_header("Origin", "https://app.example"));
    assert_eq!(res.status, 404);
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));
}

#[test]
fn test_endpoint_cors_override_and_disable() {
    let mut registry = registry();
    registry
        .controller::<TestController>(ControllerOptions::new())
        .endpoint(
            "test_get",
            HttpVerb::Get,
            EndpointOptions::new().cors(CorsOverride::Disabled),
        )
        .endpoint(
            "overwritten_route",
            HttpVerb::Get,
            EndpointOptions::new()
                .route("OverrideRoute")
                .cors(CorsOverride::Policy(CorsPolicy::new(&["https://only.example"]))),
        );
    let options = ServerOptions::new().cors(CorsPolicy::permissive());
    let mut server = ApiServer::new(ServerConfig::default(), options).with_registry(Arc::new(registry));
    server.controller(TestController);
    server.register_controllers().unwrap();

    let res = server.handle(get("/test/test_get").with_header("Origin", "https://app.example"));
    assert_eq!(res.status, 200);
    assert!(res.get_header("access-control-allow-origin").is_none());

    let res = server.handle(get("/test/OverrideRoute").with_header("Origin", "https://only.example"));
    assert_eq!(
        res.get_header("access-control-allow-origin"),
        Some("https://only.example")
    );

    let res = server.handle(get("/test/OverrideRoute").with_header("Origin", "https://app.example"));
    assert!(res.get_header("access-control-allow-origin").is_none());
}

#[test]
fn test_credentialed_policy_echoes_origin() {
    let policy = CorsPolicy::new(&["https://a.example"])
        .allow_credentials(true)
        .unwrap();
    let server = server(ServerOptions::new().cors(policy));
    let res = server.handle(get("/test/test_get").with_header("Origin", "https://a.example"));
    assert_eq!(res.get_header("access-control-allow-origin"), Some("https://a.example"));
    assert_eq!(res.get_header("access-control-allow-credentials"), Some("true"));
}
