use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::{
    self, LeaveRequest, LeaveStatus, LeaveType, ReviewAction,
};
use crate::notify::{self, FanoutReport};
use crate::utils::reviewer_cache;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "Flu, doctor's note available")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "Enjoy your trip")]
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID (reviewers only; employees always see their own)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Status(LeaveStatus),
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct CreateLeaveResponse {
    pub request: LeaveRequest,
    /// Which reviewers the new-request fan-out reached.
    pub notified: FanoutReport,
}

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, employee_name, start_date, end_date, leave_type, reason,
    duration, status, reviewed_by, reviewed_by_name, reviewed_at, comments,
    created_at, updated_at
"#;

async fn fetch_leave(pool: &MySqlPool, id: u64) -> Result<Option<LeaveRequest>, sqlx::Error> {
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");

    sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request admitted as pending", body = CreateLeaveResponse),
        (status = 400, description = "End before start, backdated start or empty reason"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Overlaps an existing pending/approved request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    if payload.reason.trim().is_empty() {
        return Err(ApiError::Validation("reason must not be empty".to_string()));
    }

    let today = Utc::now().date_naive();

    let sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests \
         WHERE employee_id = ? AND status IN ('pending', 'approved')"
    );
    let conflict_set = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await?;

    let admission = leave_request::admit(
        payload.start_date,
        payload.end_date,
        today,
        &conflict_set,
    )?;

    // Conditional write: the insert re-checks the overlap inside the store,
    // so two concurrent submissions cannot both land even though the scan
    // above ran against a snapshot.
    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, employee_name, start_date, end_date, leave_type,
             reason, duration, status)
        SELECT ?, ?, ?, ?, ?, ?, ?, ?
        FROM DUAL
        WHERE NOT EXISTS (
            SELECT 1 FROM leave_requests
            WHERE employee_id = ?
              AND status IN ('pending', 'approved')
              AND start_date <= ?
              AND end_date >= ?
        )
        "#,
    )
    .bind(auth.user_id)
    .bind(&auth.display_name)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type)
    .bind(payload.reason.trim())
    .bind(admission.duration)
    .bind(admission.status)
    .bind(auth.user_id)
    .bind(payload.end_date)
    .bind(payload.start_date)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "overlaps an existing pending or approved request".to_string(),
        ));
    }

    let request = fetch_leave(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;

    let recipients = reviewer_cache::reviewer_ids(pool.get_ref()).await?;
    let drafts = notify::reviewer_drafts(&recipients, &request);
    let notified = notify::fan_out(pool.get_ref(), drafts).await;

    tracing::info!(
        request_id = request.id,
        employee_id = request.employee_id,
        duration = request.duration,
        "Leave request created"
    );

    Ok(HttpResponse::Created().json(CreateLeaveResponse { request, notified }))
}

async fn review(
    auth: AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    action: ReviewAction,
    comments: Option<String>,
) -> Result<HttpResponse, ApiError> {
    let request = fetch_leave(pool, leave_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".to_string()))?;

    let next = leave_request::review_transition(request.status, auth.role, action)?;

    let comments = comments.filter(|c| !c.trim().is_empty());

    // `status = 'pending'` guard: a concurrent review loses here instead of
    // silently overwriting the first verdict.
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?,
            reviewed_by = ?,
            reviewed_by_name = ?,
            reviewed_at = NOW(),
            comments = ?
        WHERE id = ?
          AND status = 'pending'
        "#,
    )
    .bind(next)
    .bind(auth.user_id)
    .bind(&auth.display_name)
    .bind(&comments)
    .bind(leave_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::InvalidState(
            "request is no longer pending".to_string(),
        ));
    }

    let updated = fetch_leave(pool, leave_id)
        .await?
        .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;

    let draft = notify::review_outcome_draft(
        &updated,
        action,
        &auth.display_name,
        comments.as_deref(),
    );
    notify::send_one(pool, draft).await;

    tracing::info!(
        request_id = leave_id,
        reviewer_id = auth.user_id,
        outcome = action.past_tense(),
        "Leave request reviewed"
    );

    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Approve leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = ReviewLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a manager or admin"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> Result<HttpResponse, ApiError> {
    review(
        auth,
        pool.get_ref(),
        path.into_inner(),
        ReviewAction::Approve,
        payload.into_inner().comments,
    )
    .await
}

/* =========================
Reject leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = ReviewLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a manager or admin"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> Result<HttpResponse, ApiError> {
    review(
        auth,
        pool.get_ref(),
        path.into_inner(),
        ReviewAction::Reject,
        payload.into_inner().comments,
    )
    .await
}

/* =========================
Cancel leave (requester)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the requester"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let request = fetch_leave(pool.get_ref(), leave_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".to_string()))?;

    leave_request::cancel_transition(request.status, request.employee_id, auth.user_id)?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'cancelled'
        WHERE id = ?
          AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::InvalidState(
            "request is no longer pending".to_string(),
        ));
    }

    let updated = fetch_leave(pool.get_ref(), leave_id)
        .await?
        .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;

    tracing::info!(request_id = leave_id, "Leave request cancelled");

    Ok(HttpResponse::Ok().json(updated))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither a reviewer nor the requester"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let request = fetch_leave(pool.get_ref(), leave_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".to_string()))?;

    if !auth.is_reviewer() && request.employee_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You may only view your own leave requests".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(request))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    // Employees only ever see their own history.
    let employee_filter = if auth.is_reviewer() {
        query.employee_id
    } else {
        Some(auth.user_id)
    };

    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Status(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Status(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests{} \
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Status(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
