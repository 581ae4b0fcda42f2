use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::dispatcher::{Command, Dispatcher};
use crate::errors::ApiError;
use crate::metrics::encode_metrics;
use crate::openapi::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

async fn metrics() -> impl IntoResponse {
    encode_metrics()
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Dispatch and answer with the envelope's own status.
async fn reply(state: &AppState, command: Command, data: Value) -> Result<Response, ApiError> {
    let envelope = state.dispatcher.dispatch(command.as_str(), data).await?;
    let status = envelope
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::OK);
    Ok((status, Json(envelope)).into_response())
}

#[utoipa::path(
    get, path = "/emoji/database", tag = "emoji",
    responses(
        (status = 200, description = "Database name and type", body = crate::openapi::DatabaseInfoEnvelopeDoc),
        (status = 404, description = "Not Found")
    )
)]
pub async fn database_name(State(state): State<AppState>) -> Result<Response, ApiError> {
    reply(&state, Command::DatabaseName, Value::Null).await
}

#[utoipa::path(
    get, path = "/emoji", tag = "emoji",
    responses(
        (status = 200, description = "All icons", body = crate::openapi::IconListEnvelopeDoc),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_all(State(state): State<AppState>) -> Result<Response, ApiError> {
    reply(&state, Command::GetAll, Value::Null).await
}

#[utoipa::path(
    get, path = "/emoji/{id}", tag = "emoji",
    params(("id" = i64, Path, description = "Icon id")),
    responses(
        (status = 200, description = "One icon", body = crate::openapi::IconEnvelopeDoc),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_one(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    reply(&state, Command::GetOne, serde_json::json!({ "id": id })).await
}

#[utoipa::path(
    post, path = "/emoji", tag = "emoji",
    request_body = crate::openapi::CreateEmojiDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::MessageEnvelopeDoc),
        (status = 400, description = "Duplicate name, invalid payload or malformed JSON"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_new_emoji(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    reply(&state, Command::CreateNewEmoji, body).await
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::PATCH, Method::DELETE, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, HeaderName::from_static("application-type")])
        .max_age(Duration::from_secs(24 * 60 * 60))
}

/// Build the HTTP gateway router over a shared dispatcher.
pub fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
    let state = AppState { dispatcher };

    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    let emoji = Router::new()
        .route("/emoji", get(get_all).post(create_new_emoji))
        .route("/emoji/database", get(database_name))
        .route("/emoji/:id", get(get_one))
        .with_state(state);

    public
        .merge(emoji)
        .layer(build_cors())
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时记录状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use service::emoji::repository::{mock::MockIconRepository, IconRepository};
    use service::emoji::EmojiService;
    use tower::ServiceExt;

    fn app() -> Router {
        let repo: Arc<dyn IconRepository> = Arc::new(MockIconRepository::default());
        build_router(Arc::new(Dispatcher::new(Arc::new(EmojiService::new(repo, None)))))
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_emoji(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/emoji")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_ok() {
        let resp = app().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn create_maps_envelope_status() {
        let app = app();
        let grin = serde_json::json!({
            "data": {"htmlCode": "1F600", "name": "grin"},
            "applicant": "dashboard_queue-1",
            "recipient": "core_queue-2"
        });
        let resp = app.clone().oneshot(post_emoji(grin.clone())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app.clone().oneshot(post_emoji(grin)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Ooops something went wrong, emoji already exists");

        let resp = app.oneshot(Request::get("/emoji/1").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"]["name"], "grin");
    }

    #[tokio::test]
    async fn unauthorized_create_is_401() {
        let body = serde_json::json!({
            "data": {"htmlCode": "1F600", "name": "grin"},
            "applicant": "someone",
            "recipient": "core_queue"
        });
        let resp = app().oneshot(post_emoji(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let v = body_json(resp).await;
        assert_eq!(v["statusCode"], 401);
        assert_eq!(v["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn invalid_payload_is_400() {
        let body = serde_json::json!({"data": {"htmlCode": "", "name": ""}, "applicant": "a", "recipient": "b"});
        let resp = app().oneshot(post_emoji(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["statusCode"], 400);
    }

    #[tokio::test]
    async fn missing_icon_and_database_info_are_404() {
        let resp = app().oneshot(Request::get("/emoji/42").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, serde_json::json!({"message": "NOT FOUND", "status": 404}));

        // no database info configured
        let resp = app().oneshot(Request::get("/emoji/database").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn out_of_range_path_id_is_not_found() {
        let resp = app().oneshot(Request::get("/emoji/3000000000").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, serde_json::json!({"message": "NOT FOUND", "status": 404}));
    }

    #[tokio::test]
    async fn non_numeric_path_id_gets_json_error_body() {
        let resp = app().oneshot(Request::get("/emoji/grin").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["statusCode"], 400);
        assert_eq!(v["error"], "Bad Request");
    }

    #[tokio::test]
    async fn malformed_json_body_gets_json_error_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/emoji")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"data": {"htmlCode": "1F600""#))
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["statusCode"], 400);
        assert_eq!(v["error"], "Bad Request");
        assert!(v["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn empty_list_is_ok() {
        let resp = app().oneshot(Request::get("/emoji").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/emoji")
            .header("origin", "http://dashboard.local")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "application-type")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        let methods = resp.headers()["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("PATCH"));
    }

    #[tokio::test]
    async fn openapi_and_metrics_are_served() {
        let resp = app().oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_json(resp).await["paths"].get("/emoji/{id}").is_some());

        let resp = app().oneshot(Request::get("/metrics").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
