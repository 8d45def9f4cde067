use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::api::{
    CreateSync, CreatedSync, InfoResponse, LastUpdatedResponse, MAX_SYNC_SIZE, SyncRecord,
    UpdateSync, VersionResponse,
};
use crate::idgen;
use crate::model::Bookmarks;
use crate::store::{BookmarkStore, StoreError};
use crate::unpack_error;

/// Length of generated sync IDs.
pub const ID_LENGTH: usize = 32;

/// Static service descriptors reported by `GET /info`.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub status: i32,
}

pub struct AppState<S> {
    pub store: Arc<S>,
    pub service: ServiceInfo,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            store: self.store.clone(),
            service: self.service.clone(),
        }
    }
}

// Failure responses carry a bare status code with no body; clients
// infer the cause from the code and their own request.
fn bare(status: StatusCode) -> Response {
    status.into_response()
}

fn store_failure(op: &str, id: &str, e: &StoreError) -> Response {
    match e {
        StoreError::NotFound => bare(StatusCode::NOT_FOUND),
        StoreError::StaleVersion => {
            tracing::info!(id = %id, "{} rejected, stale lastUpdated token", op);
            bare(StatusCode::BAD_REQUEST)
        }
        StoreError::Backend(_) => {
            tracing::error!(id = %id, "{} failed: {}", op, unpack_error(e));
            bare(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn info<S: BookmarkStore>(State(state): State<AppState<S>>) -> Response {
    let body = InfoResponse {
        max_sync_size: MAX_SYNC_SIZE,
        message: state.service.message.clone(),
        status: state.service.status,
        version: state.service.version.clone(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn create_bookmarks<S: BookmarkStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateSync>, JsonRejection>,
) -> Response {
    let Ok(Json(p)) = payload else {
        tracing::error!("failed to decode create body");
        return bare(StatusCode::INTERNAL_SERVER_ERROR);
    };

    let id = match idgen::string(ID_LENGTH) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("failed to generate sync id: {}", unpack_error(&e));
            return bare(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let record = Bookmarks {
        id,
        bookmarks: String::new(),
        last_updated: Utc::now(),
        version: p.version,
    };

    if let Err(e) = state.store.put(record.clone()).await {
        tracing::error!(id = %record.id, "failed to persist sync: {}", unpack_error(&e));
        return bare(StatusCode::INTERNAL_SERVER_ERROR);
    }

    tracing::info!(id = %record.id, "created sync");
    let body = CreatedSync {
        id: record.id,
        last_updated: record.last_updated,
        version: record.version,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_bookmarks<S: BookmarkStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    if id.is_empty() {
        return bare(StatusCode::BAD_REQUEST);
    }

    match state.store.get(&id).await {
        Ok(b) => {
            let body = SyncRecord {
                bookmarks: b.bookmarks,
                last_updated: b.last_updated,
                version: b.version,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => store_failure("read", &id, &e),
    }
}

pub async fn update_bookmarks<S: BookmarkStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSync>, JsonRejection>,
) -> Response {
    if id.is_empty() {
        return bare(StatusCode::BAD_REQUEST);
    }

    let Ok(Json(p)) = payload else {
        return bare(StatusCode::BAD_REQUEST);
    };

    match state
        .store
        .swap_payload(&id, p.last_updated, p.bookmarks, Utc::now())
        .await
    {
        Ok(b) => {
            tracing::info!(id = %id, "updated sync");
            let body = LastUpdatedResponse {
                last_updated: b.last_updated,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => store_failure("update", &id, &e),
    }
}

pub async fn last_updated<S: BookmarkStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    if id.is_empty() {
        return bare(StatusCode::BAD_REQUEST);
    }

    match state.store.get(&id).await {
        Ok(b) => {
            let body = LastUpdatedResponse {
                last_updated: b.last_updated,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => store_failure("read", &id, &e),
    }
}

pub async fn version<S: BookmarkStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    if id.is_empty() {
        return bare(StatusCode::BAD_REQUEST);
    }

    match state.store.get(&id).await {
        Ok(b) => {
            let body = VersionResponse { version: b.version };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => store_failure("read", &id, &e),
    }
}
