use crate::api::attendance::{AttendanceResponse, CheckInReq, CheckOutReq};
use crate::api::chat::{MessageResponse, SendMessage};
use crate::api::leave::{CreateLeave, LeaveAction, LeaveResponse, ProcessLeave};
use crate::api::project::{
    CreateProject, InviteMembers, ProjectListResponse, ProjectMemberResponse, ProjectResponse,
};
use crate::api::task::{CreateTask, TaskResponse, UpdateTask};
use crate::api::timelog::{CreateTimeLog, TimeLogResponse, UpdateTimeLog};
use crate::api::user::{CreateEmployee, EmployeeListResponse};
use crate::model::attendance::AttendanceEntry;
use crate::model::leave_request::{LeaveStatus, LeaveType};
use crate::model::project::{MemberStatus, ProjectStatus};
use crate::model::task::TaskStatus;
use crate::model::user::User;
use crate::models::{LoginReq, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workhub API",
        version = "1.0.0",
        description = r#"
## Workhub: HR / Workforce Management Backend

This API powers a workforce-management system covering the daily operations
of a small organization.

### Key Features
- **Accounts & Profiles**
  - Registration, JWT login with refresh rotation, self-service profile,
    admin-managed employee accounts with generated credentials
- **Attendance**
  - Multiple check-in/check-out sessions per day with location metadata
    and derived total hours
- **Leave Management**
  - Requests routed to the employee's manager for approval or rejection
- **Projects & Tasks**
  - Projects with invitations and memberships, tasks with assignees,
    per-day time logging capped at 24 hours
- **Chat & Notifications**
  - Project/task scoped messaging with notification fan-out

### Security
Most endpoints are protected using **JWT Bearer authentication**.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::user::me,
        crate::api::user::update_me,
        crate::api::user::list_employees,
        crate::api::user::create_employee,
        crate::api::user::get_employee,
        crate::api::user::update_employee,
        crate::api::user::delete_employee,
        crate::api::user::reset_password,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::status,
        crate::api::attendance::logs,

        crate::api::leave::create_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::subordinate_leaves,
        crate::api::leave::process_leave,
        crate::api::leave::whos_out,

        crate::api::project::create_project,
        crate::api::project::list_projects,
        crate::api::project::get_project,
        crate::api::project::update_project,
        crate::api::project::delete_project,
        crate::api::project::invite_members,
        crate::api::project::my_invitations,
        crate::api::project::accept_invitation,
        crate::api::project::reject_invitation,
        crate::api::project::project_tasks,
        crate::api::project::create_project_task,

        crate::api::task::list_tasks,
        crate::api::task::my_tasks,
        crate::api::task::assign_task,
        crate::api::task::get_task,
        crate::api::task::update_task,
        crate::api::task::delete_task,

        crate::api::timelog::list_timelogs,
        crate::api::timelog::create_timelog,
        crate::api::timelog::my_timelogs,
        crate::api::timelog::get_timelog,
        crate::api::timelog::update_timelog,
        crate::api::timelog::delete_timelog,

        crate::api::chat::list_messages,
        crate::api::chat::send_message,

        crate::api::notification::list_notifications,
        crate::api::notification::unread_count,
        crate::api::notification::mark_as_read,
        crate::api::notification::mark_all_as_read
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            User,
            CreateEmployee,
            EmployeeListResponse,
            AttendanceEntry,
            AttendanceResponse,
            CheckInReq,
            CheckOutReq,
            LeaveType,
            LeaveStatus,
            CreateLeave,
            LeaveAction,
            ProcessLeave,
            LeaveResponse,
            ProjectStatus,
            MemberStatus,
            CreateProject,
            InviteMembers,
            ProjectMemberResponse,
            ProjectResponse,
            ProjectListResponse,
            TaskStatus,
            CreateTask,
            UpdateTask,
            TaskResponse,
            CreateTimeLog,
            UpdateTimeLog,
            TimeLogResponse,
            SendMessage,
            MessageResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token lifecycle"),
        (name = "Users", description = "Profiles and employee directory"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Projects", description = "Project and membership APIs"),
        (name = "Tasks", description = "Task management APIs"),
        (name = "TimeLogs", description = "Per-day time logging APIs"),
        (name = "Chat", description = "Scoped messaging APIs"),
        (name = "Notifications", description = "Notification APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}
