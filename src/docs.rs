use crate::api::leave_request::{
    CreateLeave, CreateLeaveResponse, LeaveFilter, LeaveListResponse, ReviewLeave,
};
use crate::api::notification::{NotificationFilter, NotificationListResponse};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::notification::Notification;
use crate::notify::FanoutReport;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LeaveDesk API",
        version = "1.0.0",
        description = r#"
## Leave Request Lifecycle Service

This API manages employee leave requests end to end.

### Key Features
- **Leave Requests**
  - Submit a request; dates are validated and checked for overlap against
    the worker's pending and approved requests
  - Approve or reject as a manager/admin, cancel as the requester
- **Notifications**
  - Reviewers are notified of every new request, requesters of every verdict
  - Poll and mark-read endpoints for the in-app inbox

### Security
Endpoints under `/api/v1` are protected using **JWT Bearer authentication**.
Approve and reject require the **Manager** or **Admin** role.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::notification::list_notifications,
        crate::api::notification::mark_read,
    ),
    components(
        schemas(
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveFilter,
            LeaveListResponse,
            CreateLeave,
            CreateLeaveResponse,
            ReviewLeave,
            FanoutReport,
            Notification,
            NotificationFilter,
            NotificationListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Notification", description = "Notification inbox APIs"),
    )
)]
pub struct ApiDoc;
