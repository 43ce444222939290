//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::rest::todos;
use super::websocket::{handler::ws_handler, state::AppState};

/// Path of the push channel
pub const HUB_PATH: &str = "/todohub";

/// Build the CORS layer for the given origin (`*` allows any)
pub fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!(origin, "invalid CORS origin, allowing any");
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        // WebSocket endpoint
        .route(HUB_PATH, get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // REST API endpoints
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/:id", put(todos::update_todo).delete(todos::delete_todo))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::{ApiError, REVISION_HEADER};
    use crate::api::websocket::hub::BroadcastHub;
    use crate::store::FileStore;
    use crate::types::{Item, Snapshot};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use tower::util::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let hub = Arc::new(BroadcastHub::new());
        let state = Arc::new(AppState::new(Arc::new(FileStore::in_memory()), hub));
        (create_router(state.clone(), cors_layer("*")), state)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_list_empty_with_revision() {
        let (app, _) = app();

        let response = app
            .oneshot(Request::builder().uri("/todos").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REVISION_HEADER], "0");
        let snapshot: Snapshot = body_json(response).await;
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_create_returns_201_with_location() {
        let (app, state) = app();

        let response = app
            .oneshot(json_request("POST", "/todos", r#"{"title":"Buy milk"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/todos/1");
        let item: Item = body_json(response).await;
        assert_eq!(item, Item::new(1, "Buy milk"));
        assert_eq!(state.hub.current_revision(), 1);
    }

    #[tokio::test]
    async fn test_create_blank_title_is_400() {
        let (app, state) = app();

        let response = app
            .oneshot(json_request("POST", "/todos", r#"{"title":"   "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "VALIDATION_FAILED");
        assert_eq!(state.hub.current_revision(), 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_status_codes() {
        let (app, state) = app();
        state.gateway.create("Buy milk").await.unwrap();

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/todos/1", r#"{"isComplete":true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/todos/999", r#"{"isComplete":true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "NOT_FOUND");

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri("/todos/1")
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // create, update, delete
        assert_eq!(state.hub.current_revision(), 3);
    }

    #[tokio::test]
    async fn test_list_matches_last_broadcast() {
        let (app, state) = app();
        state.gateway.create("a").await.unwrap();
        state.gateway.create("b").await.unwrap();
        state.gateway.update(1, true).await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/todos").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[REVISION_HEADER], "3");
        let snapshot: Snapshot = body_json(response).await;
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(1).unwrap().is_complete);
        assert!(!snapshot.get(2).unwrap().is_complete);
    }
}
