//! Todo endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::REVISION_HEADER;
use crate::api::websocket::state::AppState;
use crate::types::{CreateItem, ItemId, TodoResult, UpdateItem};

/// GET /todos - Current snapshot
pub async fn list_todos(State(state): State<Arc<AppState>>) -> TodoResult<Response> {
    let (snapshot, revision) = state.gateway.snapshot().await?;

    let mut response = Json(snapshot).into_response();
    response
        .headers_mut()
        .insert(REVISION_HEADER, HeaderValue::from(revision));
    Ok(response)
}

/// POST /todos - Create an item
pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateItem>,
) -> TodoResult<Response> {
    let item = state.gateway.create(&body.title).await?;

    let location = format!("/todos/{}", item.id);
    let mut response = (StatusCode::CREATED, Json(item)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// PUT /todos/:id - Set completion flag
pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ItemId>,
    Json(body): Json<UpdateItem>,
) -> TodoResult<StatusCode> {
    state.gateway.update(id, body.is_complete).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /todos/:id - Remove an item
pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ItemId>,
) -> TodoResult<StatusCode> {
    state.gateway.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
