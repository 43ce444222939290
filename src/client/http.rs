//! HTTP client for the REST surface

use reqwest::{Response, StatusCode};
use tracing::debug;

use super::config::ClientConfig;
use crate::api::rest::{ApiError, REVISION_HEADER};
use crate::gateway::normalize_title;
use crate::types::{CreateItem, Item, ItemId, Snapshot, TodoError, TodoResult, UpdateItem};

/// Thin typed wrapper over the `/todos` endpoints
#[derive(Clone, Debug)]
pub struct TodoClient {
    http: reqwest::Client,
    todos_url: String,
}

impl TodoClient {
    pub fn new(config: &ClientConfig) -> TodoResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TodoError::Protocol(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            todos_url: config.todos_url(),
        })
    }

    /// Pull the full list and the revision it corresponds to
    pub async fn list(&self) -> TodoResult<(Snapshot, Option<u64>)> {
        let response = self
            .http
            .get(&self.todos_url)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, None).await?;

        let revision = response
            .headers()
            .get(REVISION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let snapshot: Snapshot = response
            .json()
            .await
            .map_err(|e| TodoError::Protocol(e.to_string()))?;

        debug!(items = snapshot.len(), ?revision, "pulled snapshot");
        Ok((snapshot, revision))
    }

    /// Create an item; blank titles are rejected without a request
    pub async fn create(&self, title: &str) -> TodoResult<Item> {
        let title = normalize_title(title)?;
        let response = self
            .http
            .post(&self.todos_url)
            .json(&CreateItem {
                title: title.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, None).await?;

        response
            .json()
            .await
            .map_err(|e| TodoError::Protocol(e.to_string()))
    }

    pub async fn set_complete(&self, id: ItemId, is_complete: bool) -> TodoResult<()> {
        let response = self
            .http
            .put(format!("{}/{}", self.todos_url, id))
            .json(&UpdateItem { is_complete })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response, Some(id)).await?;
        Ok(())
    }

    pub async fn delete(&self, id: ItemId) -> TodoResult<()> {
        let response = self
            .http
            .delete(format!("{}/{}", self.todos_url, id))
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response, Some(id)).await?;
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> TodoError {
    TodoError::ConnectionLost(e.to_string())
}

/// Map error statuses back onto the shared taxonomy
async fn check_status(response: Response, id: Option<ItemId>) -> TodoResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ApiError>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };

    Err(match status {
        StatusCode::NOT_FOUND => match id {
            Some(id) => TodoError::NotFound(id),
            None => TodoError::Protocol(message),
        },
        StatusCode::BAD_REQUEST => TodoError::ValidationFailed(message),
        StatusCode::SERVICE_UNAVAILABLE => TodoError::StoreUnavailable(message),
        _ => TodoError::Protocol(format!("{}: {}", status, message)),
    })
}
