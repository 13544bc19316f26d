use crate::{
    auth::auth::AuthUser,
    model::leave_request::{LeaveRequest, LeaveStatus, LeaveType},
    notify,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveAction {
    Approve,
    Reject,
}

#[derive(Deserialize, ToSchema)]
pub struct ProcessLeave {
    pub action: LeaveAction,
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct SubordinateQuery {
    /// Filter by leave status
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    #[schema(example = "jane@company.com")]
    pub employee_email: String,
    pub manager_id: Option<u64>,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    #[schema(example = "pending")]
    pub status: String,
    pub reason: Option<String>,
    pub processed_by: Option<u64>,
    pub processed_note: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

const LEAVE_SELECT: &str = r#"
    SELECT l.id, l.employee_id,
           CONCAT(u.first_name, ' ', u.last_name) AS employee_name,
           u.email AS employee_email,
           l.manager_id, l.start_date, l.end_date, l.leave_type, l.status,
           l.reason, l.processed_by, l.processed_note, l.created_at
    FROM leave_requests l
    JOIN users u ON u.id = l.employee_id
"#;

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/request",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "start_date cannot be after end_date"
        })));
    }

    // Route the request to the requester's manager.
    let row = sqlx::query_as::<_, (Option<u64>, String, String)>(
        "SELECT manager_id, first_name, last_name FROM users WHERE id = ?",
    )
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = auth.user_id, "Failed to resolve manager");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let (manager_id, first_name, last_name) = row;

    let done = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, manager_id, start_date, end_date, leave_type, status, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(manager_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.to_string())
    .bind(LeaveStatus::Pending.to_string())
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = auth.user_id, "Failed to create leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if let Some(manager_id) = manager_id {
        let employee_name = format!("{} {}", first_name, last_name).trim().to_string();
        notify::leave_requested(
            pool.get_ref(),
            manager_id,
            &employee_name,
            &payload.leave_type.to_string(),
            payload.start_date,
            payload.end_date,
            done.last_insert_id(),
        )
        .await;
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

/* =========================
Own history
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/my",
    responses(
        (status = 200, description = "Own leave requests", body = [LeaveResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sql = format!("{} WHERE l.employee_id = ? ORDER BY l.created_at DESC", LEAVE_SELECT);

    let leaves = sqlx::query_as::<_, LeaveResponse>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch own leave requests");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Requests routed to me (manager) / all (admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/subordinate",
    params(SubordinateQuery),
    responses(
        (status = 200, description = "Routed leave requests", body = [LeaveResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn subordinate_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SubordinateQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let mut sql = format!("{} WHERE 1=1", LEAVE_SELECT);
    if !auth.is_admin() {
        sql.push_str(" AND l.manager_id = ?");
    }
    if query.status.is_some() {
        sql.push_str(" AND l.status = ?");
    }
    sql.push_str(" ORDER BY l.created_at DESC");

    let mut q = sqlx::query_as::<_, LeaveResponse>(&sql);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }
    if let Some(status) = query.status.as_deref() {
        q = q.bind(status);
    }

    let leaves = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch subordinate leave requests");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Approve / reject (routed manager or admin)
========================= */
#[utoipa::path(
    patch,
    path = "/api/leave/{leave_id}/approve",
    request_body = ProcessLeave,
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to process")
    ),
    responses(
        (status = 200, description = "Leave processed", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the routed manager"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn process_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ProcessLeave>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, employee_id, manager_id, start_date, end_date, leave_type,
               status, reason, processed_by, processed_note, created_at
        FROM leave_requests WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Failed to fetch leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(leave) = leave else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Leave request not found"
        })));
    };

    // Only the routed manager or an admin may process.
    if !auth.is_admin() && leave.manager_id != Some(auth.user_id) {
        return Err(actix_web::error::ErrorForbidden(
            "Only the routed manager or an admin can process this request",
        ));
    }

    if leave.status != LeaveStatus::Pending.to_string() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Leave request already processed"
        })));
    }

    let (new_status, approved) = match payload.action {
        LeaveAction::Approve => (LeaveStatus::Approved, true),
        LeaveAction::Reject => (LeaveStatus::Rejected, false),
    };

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, processed_by = ?, processed_note = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(new_status.to_string())
    .bind(auth.user_id)
    .bind(&payload.note)
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Leave processing failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Leave request already processed"
        })));
    }

    notify::leave_processed(
        pool.get_ref(),
        leave.employee_id,
        &leave.leave_type,
        leave.start_date,
        approved,
        leave_id,
    )
    .await;

    let message = if approved { "Leave approved" } else { "Leave rejected" };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}

/* =========================
Who's out today
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/whos-out",
    responses(
        (status = 200, description = "Approved leaves overlapping today", body = [LeaveResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn whos_out(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let today = Utc::now().date_naive();

    let sql = format!(
        "{} WHERE l.status = 'approved' AND l.start_date <= ? AND l.end_date >= ? \
         ORDER BY l.start_date",
        LEAVE_SELECT
    );

    let leaves = sqlx::query_as::<_, LeaveResponse>(&sql)
        .bind(today)
        .bind(today)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch who's-out list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(leaves))
}
