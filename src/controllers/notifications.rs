use axum::{
    extract::{Query, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::Json;
use crate::notifications::{self, Notification};

use super::AppState;

// ── Request / Response types ──

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Option<i32>,
}

/// Feed payload. Every entry counts as unread: dismissal removes it from
/// the feed entirely, so `unread_count` always equals `count`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub success: bool,
    pub count: usize,
    pub unread_count: usize,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_ids: Vec<i32>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub success: bool,
    pub message: String,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/read", post(mark_notifications_read))
}

// ── Handlers ──

/// Synthesized notification feed for a user.
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(("userId" = i32, Query, description = "User id")),
    responses(
        (status = 200, description = "Notification feed", body = FeedResponse),
        (status = 400, description = "userId missing")
    ),
    tag = "notifications"
)]
async fn get_notifications(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<axum::Json<FeedResponse>, AppError> {
    let user_id = query
        .user_id
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;

    let feed = notifications::feed_for_user(&state.db, user_id, Utc::now().naive_utc()).await?;

    Ok(axum::Json(FeedResponse {
        success: true,
        count: feed.len(),
        unread_count: feed.len(),
        notifications: feed,
    }))
}

/// Dismiss a batch of notifications of one type for a user.
#[utoipa::path(
    post,
    path = "/api/notifications/read",
    params(("userId" = i32, Query, description = "User id")),
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Notifications dismissed", body = MarkReadResponse),
        (status = 400, description = "Missing userId, ids, or type")
    ),
    tag = "notifications"
)]
async fn mark_notifications_read(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
    Json(payload): Json<MarkReadRequest>,
) -> Result<axum::Json<MarkReadResponse>, AppError> {
    let user_id = query.user_id.ok_or_else(|| {
        AppError::Validation("userId, notificationIds (array), and type are required".to_string())
    })?;
    if payload.notification_ids.is_empty() || payload.kind.trim().is_empty() {
        return Err(AppError::Validation(
            "userId, notificationIds (array), and type are required".to_string(),
        ));
    }

    notifications::dismiss_for_user(
        &state.db,
        user_id,
        &payload.notification_ids,
        &payload.kind,
        Utc::now().naive_utc(),
    )
    .await?;

    Ok(axum::Json(MarkReadResponse {
        success: true,
        message: "Notifications marked as read".to_string(),
    }))
}
