use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::notification::Notification;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct NotificationFilter {
    /// Only unread notifications
    #[schema(example = true)]
    pub unread_only: Option<bool>,
    #[schema(example = 1)]
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub data: Vec<Notification>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// for getting the caller's notifications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationFilter),
    responses(
        (status = 200, description = "Paginated notification list", body = NotificationListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn list_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<NotificationFilter>,
) -> Result<HttpResponse, ApiError> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE recipient_id = ?");
    if query.unread_only.unwrap_or(false) {
        where_sql.push_str(" AND is_read = FALSE");
    }

    let count_sql = format!("SELECT COUNT(*) FROM notifications{}", where_sql);
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(auth.user_id)
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT id, recipient_id, title, message, related_request_id, is_read, created_at \
         FROM notifications{} \
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let data = sqlx::query_as::<_, Notification>(&data_sql)
        .bind(auth.user_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(NotificationListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// for marking a notification as read endpoint
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{notification_id}/read",
    params(
        ("notification_id" = u64, Path, description = "ID of the notification to mark read")
    ),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found or not addressed to the caller")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn mark_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let notification_id = path.into_inner();

    // Scoping by recipient makes someone else's notification
    // indistinguishable from a missing one.
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM notifications WHERE id = ? AND recipient_id = ?)",
    )
    .bind(notification_id)
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !exists {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    // Idempotent: re-reading an already-read notification is fine.
    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
        .bind(notification_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Notification marked read"
    })))
}
