//! Route table construction and the axum entry point that drives it.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;
use waypoint_core::{BodySchema, Bound, CoreError, QueryParam, RouteMatch, RouteSpec, RouteTable};

use crate::{
    config::GatewayConfig,
    error::GatewayError,
    handlers::{self, HandlerResult, ModelName},
};

// ── Shared state ─────────────────────────────────────────────────────────────

/// A handler as stored in the route table.
pub type Handler = fn(&Bound) -> HandlerResult;

/// The shared, immutable route table.
pub type Api = Arc<RouteTable<Handler>>;

// ── Route table ───────────────────────────────────────────────────────────────

/// Build the API's route table.
///
/// # Errors
/// Returns a [`CoreError`] if any declaration is invalid or ambiguous.
pub fn api_table() -> Result<RouteTable<Handler>, CoreError> {
    let model_template = format!("/models/{{model_name:enum({})}}", ModelName::members());
    let q = || QueryParam::str("q").optional();
    let short = || QueryParam::bool("short").with_default(false);

    Ok(RouteTable::<Handler>::builder()
        .route(RouteSpec::get("/"), handlers::root)?
        .route(RouteSpec::get("/user/me"), handlers::user_me)?
        .route(RouteSpec::get("/user/{user_id:int}"), handlers::user_by_id)?
        .route(RouteSpec::get(model_template), handlers::model)?
        .route(RouteSpec::get("/files/{file_path:path}"), handlers::file_path)?
        .route(
            RouteSpec::get("/items/")
                .query(QueryParam::int("skip").with_default(0_i64))
                .query(QueryParam::int("limit").with_default(10_i64)),
            handlers::list_items,
        )?
        .route(RouteSpec::get("/query/{item_id}").query(q()), handlers::query_item)?
        .route(
            RouteSpec::get("/query2/{item_id}").query(q()).query(short()),
            handlers::query_item_verbose,
        )?
        .route(
            RouteSpec::get("/users/{user_id:int}/items/{item_id}")
                .query(q())
                .query(short()),
            handlers::user_item,
        )?
        .route(
            RouteSpec::get("/query-items/{item_id}").query(QueryParam::str("needy")),
            handlers::needy_item,
        )?
        .route(RouteSpec::post("/items/").body(BodySchema::Item), handlers::create_item)?
        .route(RouteSpec::post("/cart/").body(BodySchema::Item), handlers::add_to_cart)?
        .route(
            RouteSpec::get("/new-items/").query(q().min_length(3).max_length(5)),
            handlers::new_items,
        )?
        .route(
            RouteSpec::get("/query-required/").query(QueryParam::str("q").min_length(3)),
            handlers::required_query,
        )?
        .build())
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router around a route table.
///
/// The whole table is mounted as the fallback so that route precedence is
/// decided by the table, not by axum's own matcher.
pub fn create_router(api: Api, config: &GatewayConfig) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(api)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Resolve, bind, and run the handler for one request.
///
/// # Errors
/// Returns [`GatewayError::NotFound`], [`GatewayError::MethodNotAllowed`],
/// or [`GatewayError::Validation`] before any handler runs, and
/// [`GatewayError::Core`] if the handler disagrees with its declaration.
pub async fn dispatch(
    State(api): State<Api>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let path = uri.path();
    let (route, captures) = match api.dispatch(&method, path) {
        RouteMatch::Matched { route, captures } => (route, captures),
        RouteMatch::NotFound => {
            debug!(%method, path, "no route");
            return Err(GatewayError::NotFound);
        }
        RouteMatch::MethodNotAllowed { allowed } => {
            debug!(%method, path, ?allowed, "method not allowed");
            return Err(GatewayError::MethodNotAllowed { allowed });
        }
    };

    debug!(%method, path, route = %route.pattern(), "matched route");
    let bound = route.bind(captures, uri.query(), &body).map_err(|errors| {
        debug!(route = %route.pattern(), invalid = errors.len(), "request rejected");
        GatewayError::Validation(errors)
    })?;

    let payload = (route.handler())(&bound)?;
    Ok(Json(payload).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_router() -> Router {
        let table = match api_table() {
            Ok(t) => t,
            Err(e) => panic!("route table must build: {e}"),
        };
        create_router(Arc::new(table), &GatewayConfig::default())
    }

    async fn send(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = match test_router().oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        let status = resp.status();
        let bytes = match axum::body::to_bytes(resp.into_body(), 64 * 1024).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        let body = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => panic!("invalid JSON: {e}"),
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        match Request::builder().uri(uri).body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        }
    }

    #[test]
    fn api_table_registers_every_route() {
        let table = match api_table() {
            Ok(t) => t,
            Err(e) => panic!("route table must build: {e}"),
        };
        assert_eq!(table.len(), 14);
    }

    #[test]
    fn bound_requests_never_fail_in_handlers() {
        let table = match api_table() {
            Ok(t) => t,
            Err(e) => panic!("route table must build: {e}"),
        };
        for uri in [
            "/",
            "/user/me",
            "/user/-9",
            "/models/resnet",
            "/files/",
            "/items/?skip=-1",
            "/query/a?q=",
            "/query2/a?short=off",
            "/users/1/items/a?q=x&short=1",
            "/query-items/a?needy=",
            "/new-items/",
            "/new-items/?q=abcde",
            "/query-required/?q=abc",
        ] {
            let (path, query) = match uri.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (uri, None),
            };
            let RouteMatch::Matched { route, captures } = table.dispatch(&Method::GET, path) else {
                panic!("{uri} must match a route");
            };
            let bound = match route.bind(captures, query, b"") {
                Ok(b) => b,
                Err(e) => panic!("{uri} must bind: {e:?}"),
            };
            if let Err(e) = (route.handler())(&bound) {
                panic!("handler for {uri} failed: {e}");
            }
        }
    }

    #[tokio::test]
    async fn root_returns_greeting() {
        let (status, body) = send(get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello World");
    }

    #[tokio::test]
    async fn query_verbose_adds_description_unless_short() {
        let (_, long) = send(get("/query2/foo?q=bar")).await;
        assert_eq!(long["item_id"], "foo");
        assert_eq!(long["q"], "bar");
        assert_eq!(long["description"], handlers::LONG_DESCRIPTION);

        let (_, short) = send(get("/query2/foo?short=true")).await;
        assert!(short.get("description").is_none());
        assert!(short.get("q").is_none());
    }

    #[tokio::test]
    async fn user_item_reports_owner_as_number() {
        let (status, body) = send(get("/users/3/items/pen?short=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner_id"], 3);
        assert_eq!(body["item_id"], "pen");
        assert!(body.get("description").is_none());
    }

    #[tokio::test]
    async fn validation_errors_use_detail_list() {
        let (status, body) = send(get("/users/x/items/pen?short=perhaps")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = body["detail"].as_array().cloned().unwrap_or_default();
        assert_eq!(detail.len(), 2, "both failures must be reported: {body}");
        assert_eq!(detail[0]["loc"], serde_json::json!(["path", "user_id"]));
        assert_eq!(detail[1]["type"], "bool_parsing");
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_allow_header() {
        let req = match Request::builder()
            .method(Method::DELETE)
            .uri("/items/")
            .body(Body::empty())
        {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match test_router().oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = resp.headers().get(header::ALLOW).and_then(|v| v.to_str().ok());
        assert_eq!(allow, Some("GET, HEAD, POST"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let table = match api_table() {
            Ok(t) => t,
            Err(e) => panic!("route table must build: {e}"),
        };
        let config = match GatewayConfig::from_lookup(|name| {
            (name == crate::config::MAX_BODY_BYTES_VAR).then(|| "16".to_owned())
        }) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        let app = create_router(Arc::new(table), &config);
        let req = match Request::builder()
            .method(Method::POST)
            .uri("/items/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"a long enough name","price":1}"#))
        {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
