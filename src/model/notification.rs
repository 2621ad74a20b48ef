use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored notification, one row in `notifications`.
///
/// Delivery is the recipient polling `GET /notifications`; writes into
/// this table are fire-and-forget from the sender's point of view.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub recipient_id: u64,
    #[schema(example = "Leave request approved")]
    pub title: String,
    #[schema(example = "Your vacation request was approved by Jane Admin")]
    pub message: String,
    /// Set when the notification concerns a specific leave request.
    #[schema(example = 42)]
    pub related_request_id: Option<u64>,
    pub is_read: bool,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}
