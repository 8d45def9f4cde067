//! Wire payloads for the xBrowserSync-compatible REST API.
//!
//! Field names and timestamp formats are dictated by the original
//! xBrowserSync API: camelCase keys, RFC3339 timestamps with sub-second
//! precision preserved exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum sync size (in bytes) advertised by the service.
pub const MAX_SYNC_SIZE: i64 = 204800;

/// Service status codes: 1 = online, 2 = offline, 3 = not accepting
/// new syncs.
pub const STATUS_ONLINE: i32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub max_sync_size: i64,
    pub message: String,
    pub status: i32,
    pub version: String,
}

/// Body of `POST /bookmarks`. The client version tag is optional and
/// write-once; it is never changed by later updates.
#[derive(Debug, Deserialize)]
pub struct CreateSync {
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSync {
    pub id: String,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    pub bookmarks: String,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

/// Body of `PUT /bookmarks/{id}`. `last_updated` is the timestamp the
/// client believes is current, used as the compare-and-swap token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSync {
    #[serde(default)]
    pub bookmarks: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastUpdatedResponse {
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
}
