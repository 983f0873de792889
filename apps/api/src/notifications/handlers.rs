use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::notification::{Notification, NotificationView};
use crate::state::AppState;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Notification {id} not found"))
}

/// GET /api/notifications
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<NotificationView>>, AppError> {
    Ok(Json(state.repo.notifications_for(auth.id).await?))
}

/// GET /api/notifications/unread-count
pub async fn handle_unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let count = state.repo.unread_count(auth.id).await?;
    Ok(Json(json!({ "count": count })))
}

/// PUT /api/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let notification = state
        .repo
        .mark_read(id, auth.id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(notification))
}

/// PUT /api/notifications/read-all
pub async fn handle_mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let updated = state.repo.mark_all_read(auth.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// DELETE /api/notifications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.repo.delete_notification(id, auth.id).await? {
        return Err(not_found(id));
    }
    Ok(Json(json!({ "message": "Notification deleted" })))
}
