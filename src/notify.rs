use futures::future::join_all;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::warn;
use utoipa::ToSchema;

use crate::model::leave_request::{LeaveRequest, ReviewAction};

/// A notification about to be written; `fan_out` turns a batch of these
/// into independent inserts.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub recipient_id: u64,
    pub title: String,
    pub message: String,
    pub related_request_id: Option<u64>,
}

/// One draft per reviewer-capable user, announcing a freshly admitted request.
pub fn reviewer_drafts(recipients: &[u64], request: &LeaveRequest) -> Vec<NotificationDraft> {
    let message = format!(
        "{} requested {} day(s) of {} leave, {} to {}",
        request.employee_name,
        request.duration,
        request.leave_type,
        request.start_date,
        request.end_date
    );

    recipients
        .iter()
        .map(|&recipient_id| NotificationDraft {
            recipient_id,
            title: "New leave request".to_string(),
            message: message.clone(),
            related_request_id: Some(request.id),
        })
        .collect()
}

/// The single notification sent to the requester after a review.
pub fn review_outcome_draft(
    request: &LeaveRequest,
    action: ReviewAction,
    reviewer_name: &str,
    comments: Option<&str>,
) -> NotificationDraft {
    let mut message = format!(
        "Your {} leave request, {} to {}, was {} by {}",
        request.leave_type,
        request.start_date,
        request.end_date,
        action.past_tense(),
        reviewer_name
    );

    if let Some(comments) = comments.filter(|c| !c.trim().is_empty()) {
        message.push_str(": ");
        message.push_str(comments);
    }

    NotificationDraft {
        recipient_id: request.employee_id,
        title: format!("Leave request {}", action.past_tense()),
        message,
        related_request_id: Some(request.id),
    }
}

/// Which recipients a fan-out actually reached. Individual failures never
/// abort the batch; they land in `failed` for the caller to surface.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct FanoutReport {
    #[schema(example = json!([2, 3]))]
    pub delivered: Vec<u64>,
    #[schema(example = json!([]))]
    pub failed: Vec<u64>,
}

impl FanoutReport {
    pub fn record(&mut self, recipient_id: u64, delivered: bool) {
        if delivered {
            self.delivered.push(recipient_id);
        } else {
            self.failed.push(recipient_id);
        }
    }
}

async fn insert_notification(pool: &MySqlPool, draft: &NotificationDraft) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO notifications (recipient_id, title, message, related_request_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(draft.recipient_id)
    .bind(&draft.title)
    .bind(&draft.message)
    .bind(draft.related_request_id)
    .execute(pool)
    .await
    .map(|_| ())
}

/// Write every draft concurrently. A failed insert is logged and reported,
/// never propagated; the created request and the other writes stand.
pub async fn fan_out(pool: &MySqlPool, drafts: Vec<NotificationDraft>) -> FanoutReport {
    let writes = drafts.iter().map(|draft| async move {
        let result = insert_notification(pool, draft).await;
        (draft.recipient_id, result)
    });

    let mut report = FanoutReport::default();
    for (recipient_id, result) in join_all(writes).await {
        match result {
            Ok(()) => report.record(recipient_id, true),
            Err(e) => {
                warn!(error = %e, recipient_id, "Notification write failed");
                report.record(recipient_id, false);
            }
        }
    }

    report
}

/// Best-effort single write for the review outcome notification.
pub async fn send_one(pool: &MySqlPool, draft: NotificationDraft) {
    if let Err(e) = insert_notification(pool, &draft).await {
        warn!(
            error = %e,
            recipient_id = draft.recipient_id,
            "Review outcome notification failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{LeaveStatus, LeaveType};
    use chrono::NaiveDate;

    fn request() -> LeaveRequest {
        LeaveRequest {
            id: 42,
            employee_id: 1000,
            employee_name: "John Doe".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            leave_type: LeaveType::Vacation,
            reason: "trip".to_string(),
            duration: 3,
            status: LeaveStatus::Pending,
            reviewed_by: None,
            reviewed_by_name: None,
            reviewed_at: None,
            comments: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn one_draft_per_reviewer() {
        let drafts = reviewer_drafts(&[2, 3, 7], &request());
        assert_eq!(drafts.len(), 3);
        assert!(drafts.iter().all(|d| d.related_request_id == Some(42)));
        assert_eq!(
            drafts.iter().map(|d| d.recipient_id).collect::<Vec<_>>(),
            vec![2, 3, 7]
        );
    }

    #[test]
    fn outcome_draft_addresses_the_requester() {
        let draft = review_outcome_draft(&request(), ReviewAction::Approve, "Jane Admin", None);
        assert_eq!(draft.recipient_id, 1000);
        assert_eq!(draft.related_request_id, Some(42));
        assert!(draft.message.contains("approved by Jane Admin"));
    }

    #[test]
    fn outcome_draft_appends_comments() {
        let draft = review_outcome_draft(
            &request(),
            ReviewAction::Reject,
            "Jane Admin",
            Some("team is at capacity"),
        );
        assert!(draft.title.contains("rejected"));
        assert!(draft.message.ends_with("team is at capacity"));
    }

    #[test]
    fn report_partitions_outcomes() {
        let mut report = FanoutReport::default();
        report.record(2, true);
        report.record(3, false);
        report.record(7, true);
        assert_eq!(report.delivered, vec![2, 7]);
        assert_eq!(report.failed, vec![3]);
    }
}
