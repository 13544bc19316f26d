use crate::{auth::auth::AuthUser, model::task::TimeLog};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

pub const DAILY_HOUR_CAP: f64 = 24.0;

#[derive(Deserialize, ToSchema)]
pub struct CreateTimeLog {
    pub task_id: u64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 2.5)]
    pub hours: f64,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTimeLog {
    pub task_id: Option<u64>,
    #[schema(example = "2026-03-02", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub description: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct MyTimeLogsQuery {
    /// Start date (YYYY-MM-DD)
    pub date_from: Option<NaiveDate>,
    /// End date (YYYY-MM-DD)
    pub date_to: Option<NaiveDate>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct TimeLogResponse {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    pub task_id: u64,
    #[schema(example = "Prepare quarterly report")]
    pub task_title: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 2.5)]
    pub hours: f64,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

const TIMELOG_SELECT: &str = r#"
    SELECT tl.id, tl.employee_id,
           CONCAT(u.first_name, ' ', u.last_name) AS employee_name,
           tl.task_id, t.title AS task_title,
           tl.date, tl.hours, tl.description, tl.created_at, tl.updated_at
    FROM time_logs tl
    JOIN users u ON u.id = tl.employee_id
    JOIN tasks t ON t.id = tl.task_id
"#;

/// true when adding `new_hours` on top of what is already logged would break
/// the 24-hour daily cap.
pub fn exceeds_daily_cap(existing_hours: f64, new_hours: f64) -> bool {
    existing_hours + new_hours > DAILY_HOUR_CAP
}

async fn logged_hours(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    exclude_id: Option<u64>,
) -> Result<f64, sqlx::Error> {
    let mut sql = String::from(
        "SELECT COALESCE(SUM(hours), 0) FROM time_logs WHERE employee_id = ? AND date = ?",
    );
    if exclude_id.is_some() {
        sql.push_str(" AND id != ?");
    }

    let mut q = sqlx::query_scalar::<_, f64>(&sql)
        .bind(employee_id)
        .bind(date);
    if let Some(id) = exclude_id {
        q = q.bind(id);
    }

    q.fetch_one(pool).await
}

fn cap_error(date: NaiveDate, existing: f64, requested: f64) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": format!(
            "Total hours for {} would be {:.2}h. Cannot exceed 24 hours per day. \
             You already have {:.2}h logged.",
            date,
            existing + requested,
            existing
        )
    }))
}

/// Time logs visible to the caller (admin: all, employee: own)
#[utoipa::path(
    get,
    path = "/api/timelogs",
    responses(
        (status = 200, description = "Time logs", body = [TimeLogResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeLogs"
)]
pub async fn list_timelogs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let mut sql = String::from(TIMELOG_SELECT);
    if !auth.is_admin() {
        sql.push_str(" WHERE tl.employee_id = ?");
    }
    sql.push_str(" ORDER BY tl.date DESC, tl.created_at DESC");

    let mut q = sqlx::query_as::<_, TimeLogResponse>(&sql);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }

    let logs = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch time logs");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(logs))
}

/// Log hours against a task (always for the caller)
#[utoipa::path(
    post,
    path = "/api/timelogs",
    request_body = CreateTimeLog,
    responses(
        (status = 201, description = "Time log created", body = TimeLogResponse),
        (status = 400, description = "Invalid hours or daily cap exceeded"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeLogs"
)]
pub async fn create_timelog(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTimeLog>,
) -> actix_web::Result<impl Responder> {
    if payload.hours <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "hours must be positive"
        })));
    }

    let task_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?)")
            .bind(payload.task_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check task");
                ErrorInternalServerError("Internal Server Error")
            })?;

    if !task_exists {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Task not found"
        })));
    }

    let existing = logged_hours(pool.get_ref(), auth.user_id, payload.date, None)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sum logged hours");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if exceeds_daily_cap(existing, payload.hours) {
        return Ok(cap_error(payload.date, existing, payload.hours));
    }

    let done = sqlx::query(
        r#"
        INSERT INTO time_logs (employee_id, task_id, date, hours, description)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.task_id)
    .bind(payload.date)
    .bind(payload.hours)
    .bind(&payload.description)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create time log");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let log = fetch_timelog(pool.get_ref(), done.last_insert_id())
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(log))
}

async fn fetch_timelog(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<TimeLogResponse>, sqlx::Error> {
    let sql = format!("{} WHERE tl.id = ?", TIMELOG_SELECT);
    sqlx::query_as::<_, TimeLogResponse>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Caller's logs with optional date range and summary stats
#[utoipa::path(
    get,
    path = "/api/timelogs/my",
    params(MyTimeLogsQuery),
    responses(
        (status = 200, description = "Own time logs with totals", body = Object, example = json!({
            "time_logs": [],
            "total_hours": 7.5,
            "count": 3
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeLogs"
)]
pub async fn my_timelogs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MyTimeLogsQuery>,
) -> actix_web::Result<impl Responder> {
    let mut sql = format!("{} WHERE tl.employee_id = ?", TIMELOG_SELECT);
    if query.date_from.is_some() {
        sql.push_str(" AND tl.date >= ?");
    }
    if query.date_to.is_some() {
        sql.push_str(" AND tl.date <= ?");
    }
    sql.push_str(" ORDER BY tl.date DESC, tl.created_at DESC");

    let mut q = sqlx::query_as::<_, TimeLogResponse>(&sql).bind(auth.user_id);
    if let Some(from) = query.date_from {
        q = q.bind(from);
    }
    if let Some(to) = query.date_to {
        q = q.bind(to);
    }

    let logs = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch own time logs");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let total_hours: f64 = logs.iter().map(|l| l.hours).sum();
    let count = logs.len();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "time_logs": logs,
        "total_hours": total_hours,
        "count": count
    })))
}

/// Time log detail
#[utoipa::path(
    get,
    path = "/api/timelogs/{id}",
    params(("id" = u64, Path, description = "Time log ID")),
    responses(
        (status = 200, description = "Time log", body = TimeLogResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Time log not found")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeLogs"
)]
pub async fn get_timelog(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let log = fetch_timelog(pool.get_ref(), path.into_inner())
        .await
        .map_err(ErrorInternalServerError)?;

    match log {
        Some(log) if auth.is_admin() || log.employee_id == auth.user_id => {
            Ok(HttpResponse::Ok().json(log))
        }
        _ => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Time log not found"
        }))),
    }
}

/// Update a time log (cap re-checked, row being updated excluded)
#[utoipa::path(
    put,
    path = "/api/timelogs/{id}",
    request_body = UpdateTimeLog,
    params(("id" = u64, Path, description = "Time log ID")),
    responses(
        (status = 200, description = "Time log updated", body = TimeLogResponse),
        (status = 400, description = "Invalid hours or daily cap exceeded"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Time log not found")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeLogs"
)]
pub async fn update_timelog(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTimeLog>,
) -> actix_web::Result<impl Responder> {
    let log_id = path.into_inner();

    let log = sqlx::query_as::<_, TimeLog>(
        "SELECT id, employee_id, task_id, date, hours, description, created_at, updated_at \
         FROM time_logs WHERE id = ?",
    )
    .bind(log_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    let Some(log) = log else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Time log not found"
        })));
    };

    if !auth.is_admin() && log.employee_id != auth.user_id {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Time log not found"
        })));
    }

    let task_id = payload.task_id.unwrap_or(log.task_id);
    let date = payload.date.unwrap_or(log.date);
    let hours = payload.hours.unwrap_or(log.hours);

    if hours <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "hours must be positive"
        })));
    }

    let existing = logged_hours(pool.get_ref(), log.employee_id, date, Some(log_id))
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sum logged hours");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if exceeds_daily_cap(existing, hours) {
        return Ok(cap_error(date, existing, hours));
    }

    sqlx::query(
        r#"
        UPDATE time_logs SET task_id = ?, date = ?, hours = ?, description = ?
        WHERE id = ?
        "#,
    )
    .bind(task_id)
    .bind(date)
    .bind(hours)
    .bind(payload.description.as_deref().or(log.description.as_deref()))
    .bind(log_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, log_id, "Failed to update time log");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let log = fetch_timelog(pool.get_ref(), log_id)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(log))
}

/// Delete a time log
#[utoipa::path(
    delete,
    path = "/api/timelogs/{id}",
    params(("id" = u64, Path, description = "Time log ID")),
    responses(
        (status = 200, description = "Time log deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Time log not found")
    ),
    security(("bearer_auth" = [])),
    tag = "TimeLogs"
)]
pub async fn delete_timelog(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let log_id = path.into_inner();

    let mut sql = String::from("DELETE FROM time_logs WHERE id = ?");
    if !auth.is_admin() {
        sql.push_str(" AND employee_id = ?");
    }

    let mut q = sqlx::query(&sql).bind(log_id);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }

    let result = q.execute(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, log_id, "Failed to delete time log");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Time log not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Time log deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_allows_exactly_24_hours() {
        assert!(!exceeds_daily_cap(16.0, 8.0));
        assert!(!exceeds_daily_cap(0.0, 24.0));
    }

    #[test]
    fn cap_rejects_past_24_hours() {
        assert!(exceeds_daily_cap(22.0, 2.5));
        assert!(exceeds_daily_cap(24.0, 0.1));
    }
}
