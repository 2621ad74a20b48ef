use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::model::role::Role;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Vacation,
    Personal,
    Emergency,
    Other,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, sqlx::Type, ToSchema,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Approved, rejected and cancelled admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// A stored leave request, one row in `leave_requests`.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "Flu, doctor's note available")]
    pub reason: String,
    /// Whole days spanned, both endpoints inclusive. Derived, never user-supplied.
    #[schema(example = 3)]
    pub duration: u32,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
    pub reviewed_by: Option<u64>,
    pub reviewed_by_name: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of a successful admission check: the request enters the
/// store as pending with a derived duration.
#[derive(Debug, PartialEq, Eq)]
pub struct Admission {
    pub duration: u32,
    pub status: LeaveStatus,
}

/// Reviewer verdict on a pending request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn target_status(&self) -> LeaveStatus {
        match self {
            ReviewAction::Approve => LeaveStatus::Approved,
            ReviewAction::Reject => LeaveStatus::Rejected,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approved",
            ReviewAction::Reject => "rejected",
        }
    }
}

/// Whole days spanned by `[start, end]`, both endpoints inclusive.
pub fn duration_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Closed-interval overlap test: shared boundary days count as overlap.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Linear scan of the worker's conflict set (pending|approved requests).
pub fn find_conflict<'a>(
    start: NaiveDate,
    end: NaiveDate,
    existing: &'a [LeaveRequest],
) -> Option<&'a LeaveRequest> {
    existing
        .iter()
        .filter(|e| matches!(e.status, LeaveStatus::Pending | LeaveStatus::Approved))
        .find(|e| ranges_overlap(start, end, e.start_date, e.end_date))
}

/// Admission decision for a candidate date range.
///
/// `today` is the creation day at date-only precision; callers pass
/// `Utc::now().date_naive()`. `existing` is the worker's conflict set.
pub fn admit(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    existing: &[LeaveRequest],
) -> Result<Admission, ApiError> {
    if end < start {
        return Err(ApiError::Validation(
            "end_date cannot be before start_date".to_string(),
        ));
    }

    if start < today {
        return Err(ApiError::Validation(
            "start_date cannot be in the past".to_string(),
        ));
    }

    if let Some(conflict) = find_conflict(start, end, existing) {
        return Err(ApiError::Conflict(format!(
            "overlaps an existing {} request from {} to {}",
            conflict.status, conflict.start_date, conflict.end_date
        )));
    }

    Ok(Admission {
        duration: duration_days(start, end) as u32,
        status: LeaveStatus::Pending,
    })
}

/// Review transition: pending -> approved|rejected, reviewer role required.
pub fn review_transition(
    current: LeaveStatus,
    actor_role: Role,
    action: ReviewAction,
) -> Result<LeaveStatus, ApiError> {
    if !actor_role.is_reviewer() {
        return Err(ApiError::Forbidden(
            "only managers and admins may review leave requests".to_string(),
        ));
    }

    if current.is_terminal() {
        return Err(ApiError::InvalidState(format!(
            "request is already {current}, only pending requests can be reviewed"
        )));
    }

    Ok(action.target_status())
}

/// Cancellation transition: pending -> cancelled, requester only.
pub fn cancel_transition(
    current: LeaveStatus,
    requester_id: u64,
    actor_id: u64,
) -> Result<LeaveStatus, ApiError> {
    if actor_id != requester_id {
        return Err(ApiError::Forbidden(
            "only the requester may cancel a leave request".to_string(),
        ));
    }

    if current.is_terminal() {
        return Err(ApiError::InvalidState(format!(
            "request is already {current}, only pending requests can be cancelled"
        )));
    }

    Ok(LeaveStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn stored(
        id: u64,
        start: &str,
        end: &str,
        status: LeaveStatus,
    ) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: 1000,
            employee_name: "John Doe".to_string(),
            start_date: date(start),
            end_date: date(end),
            leave_type: LeaveType::Vacation,
            reason: "trip".to_string(),
            duration: duration_days(date(start), date(end)) as u32,
            status,
            reviewed_by: None,
            reviewed_by_name: None,
            reviewed_at: None,
            comments: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn duration_is_inclusive_of_both_endpoints() {
        assert_eq!(duration_days(date("2024-01-10"), date("2024-01-15")), 6);
        assert_eq!(duration_days(date("2024-01-10"), date("2024-01-10")), 1);
    }

    #[test]
    fn end_before_start_is_a_validation_error() {
        let res = admit(date("2024-01-15"), date("2024-01-10"), date("2024-01-01"), &[]);
        assert!(matches!(res, Err(ApiError::Validation(_))));
    }

    #[test]
    fn backdated_start_is_a_validation_error() {
        let res = admit(date("2024-01-05"), date("2024-01-10"), date("2024-01-06"), &[]);
        assert!(matches!(res, Err(ApiError::Validation(_))));
    }

    #[test]
    fn start_today_is_accepted() {
        let res = admit(date("2024-01-06"), date("2024-01-06"), date("2024-01-06"), &[]);
        let admission = res.unwrap();
        assert_eq!(admission.duration, 1);
        assert_eq!(admission.status, LeaveStatus::Pending);
    }

    #[test]
    fn shared_boundary_day_counts_as_overlap() {
        let existing = vec![stored(1, "2024-01-10", "2024-01-15", LeaveStatus::Pending)];
        let res = admit(
            date("2024-01-15"),
            date("2024-01-20"),
            date("2024-01-01"),
            &existing,
        );
        assert!(matches!(res, Err(ApiError::Conflict(_))));
    }

    #[test]
    fn adjacent_ranges_do_not_conflict() {
        let existing = vec![stored(1, "2024-01-10", "2024-01-12", LeaveStatus::Approved)];
        let admission = admit(
            date("2024-01-13"),
            date("2024-01-15"),
            date("2024-01-01"),
            &existing,
        )
        .unwrap();
        assert_eq!(admission.duration, 3);
    }

    #[test]
    fn terminal_requests_are_ignored_by_the_conflict_scan() {
        let existing = vec![
            stored(1, "2024-01-10", "2024-01-15", LeaveStatus::Rejected),
            stored(2, "2024-01-10", "2024-01-15", LeaveStatus::Cancelled),
        ];
        assert!(find_conflict(date("2024-01-12"), date("2024-01-14"), &existing).is_none());
    }

    #[test]
    fn manager_approves_pending_request() {
        let next = review_transition(LeaveStatus::Pending, Role::Manager, ReviewAction::Approve);
        assert_eq!(next.unwrap(), LeaveStatus::Approved);
    }

    #[test]
    fn admin_rejects_pending_request() {
        let next = review_transition(LeaveStatus::Pending, Role::Admin, ReviewAction::Reject);
        assert_eq!(next.unwrap(), LeaveStatus::Rejected);
    }

    #[test]
    fn employee_cannot_review() {
        let res = review_transition(LeaveStatus::Pending, Role::Employee, ReviewAction::Approve);
        assert!(matches!(res, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn reviewing_a_terminal_request_is_invalid() {
        for status in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            let res = review_transition(status, Role::Admin, ReviewAction::Approve);
            assert!(matches!(res, Err(ApiError::InvalidState(_))), "{status}");
        }
    }

    #[test]
    fn requester_cancels_pending_request() {
        assert_eq!(
            cancel_transition(LeaveStatus::Pending, 1000, 1000).unwrap(),
            LeaveStatus::Cancelled
        );
    }

    #[test]
    fn cancelling_an_approved_request_is_invalid() {
        let res = cancel_transition(LeaveStatus::Approved, 1000, 1000);
        assert!(matches!(res, Err(ApiError::InvalidState(_))));
    }

    #[test]
    fn only_the_requester_may_cancel() {
        let res = cancel_transition(LeaveStatus::Pending, 1000, 2000);
        assert!(matches!(res, Err(ApiError::Forbidden(_))));
    }
}
