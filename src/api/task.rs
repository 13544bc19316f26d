use crate::{auth::auth::AuthUser, model::task::{Task, TaskStatus}, notify};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateTask {
    #[schema(example = "Prepare quarterly report")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub project_id: Option<u64>,
    /// Accepts "YYYY-MM-DD", "YYYY-MM-DDTHH:MM[:SS]" or RFC 3339.
    #[schema(example = "2026-03-15")]
    pub deadline: String,
    #[schema(example = "pending")]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assigned_members: Vec<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    /// Full replacement of the assignee set when present.
    pub assigned_members: Option<Vec<u64>>,
}

#[derive(Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub project_id: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub deadline: DateTime<Utc>,
    #[schema(example = "in_progress")]
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    pub assigned_members: Vec<u64>,
    pub assigned_member_names: Vec<String>,
}

const TASK_COLUMNS: &str = "id, title, description, project_id, deadline, status, created_at";

/// Lenient deadline parsing: the clients send date-only strings as often as
/// full timestamps.
pub fn parse_deadline(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Resolve assignees for a batch of tasks in one query.
pub async fn attach_assignees(
    pool: &MySqlPool,
    tasks: Vec<Task>,
) -> Result<Vec<TaskResponse>, sqlx::Error> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; tasks.len()].join(", ");
    let sql = format!(
        r#"
        SELECT ta.task_id, ta.user_id, CONCAT(u.first_name, ' ', u.last_name) AS name
        FROM task_assignees ta
        JOIN users u ON u.id = ta.user_id
        WHERE ta.task_id IN ({})
        "#,
        placeholders
    );

    let mut q = sqlx::query_as::<_, (u64, u64, String)>(&sql);
    for task in &tasks {
        q = q.bind(task.id);
    }

    let mut by_task: HashMap<u64, (Vec<u64>, Vec<String>)> = HashMap::new();
    for (task_id, user_id, name) in q.fetch_all(pool).await? {
        let entry = by_task.entry(task_id).or_default();
        entry.0.push(user_id);
        entry.1.push(name.trim().to_string());
    }

    Ok(tasks
        .into_iter()
        .map(|t| {
            let (assigned_members, assigned_member_names) =
                by_task.remove(&t.id).unwrap_or_default();
            TaskResponse {
                id: t.id,
                title: t.title,
                description: t.description,
                project_id: t.project_id,
                deadline: t.deadline,
                status: t.status,
                created_at: t.created_at,
                assigned_members,
                assigned_member_names,
            }
        })
        .collect())
}

pub async fn fetch_task(pool: &MySqlPool, id: u64) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Shared create path for /tasks/assign and /projects/{id}/tasks.
pub async fn insert_task(
    pool: &MySqlPool,
    payload: &CreateTask,
    project_id: Option<u64>,
) -> actix_web::Result<TaskResponse> {
    if payload.title.trim().is_empty() {
        return Err(actix_web::error::ErrorBadRequest("title is required"));
    }

    let Some(deadline) = parse_deadline(&payload.deadline) else {
        return Err(actix_web::error::ErrorBadRequest("Invalid deadline"));
    };

    let status = payload.status.unwrap_or(TaskStatus::Pending);

    let done = sqlx::query(
        r#"
        INSERT INTO tasks (title, description, project_id, deadline, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(project_id)
    .bind(deadline)
    .bind(status.to_string())
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create task");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let task_id = done.last_insert_id();

    set_assignees(pool, task_id, &payload.assigned_members)
        .await
        .map_err(|e| {
            error!(error = %e, task_id, "Failed to assign members");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if !payload.assigned_members.is_empty() {
        notify::task_assigned(pool, &payload.assigned_members, payload.title.trim(), task_id)
            .await;
    }

    let task = fetch_task(pool, task_id)
        .await
        .map_err(ErrorInternalServerError)?
        .ok_or_else(|| ErrorInternalServerError("Internal Server Error"))?;

    let mut responses = attach_assignees(pool, vec![task])
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(responses.remove(0))
}

/// Replace the assignee set; returns the newly added user ids.
async fn set_assignees(
    pool: &MySqlPool,
    task_id: u64,
    user_ids: &[u64],
) -> Result<Vec<u64>, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, u64>(
        "SELECT user_id FROM task_assignees WHERE task_id = ?",
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    sqlx::query("DELETE FROM task_assignees WHERE task_id = ?")
        .bind(task_id)
        .execute(pool)
        .await?;

    for user_id in user_ids {
        sqlx::query("INSERT IGNORE INTO task_assignees (task_id, user_id) VALUES (?, ?)")
            .bind(task_id)
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    Ok(user_ids
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect())
}

/// All tasks, most urgent deadline last (admin dashboard)
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "All tasks", body = [TaskResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn list_tasks(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks ORDER BY deadline DESC",
        TASK_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch tasks");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data = attach_assignees(pool.get_ref(), tasks)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(data))
}

/// Tasks assigned to the current user
#[utoipa::path(
    get,
    path = "/api/tasks/my",
    responses(
        (status = 200, description = "Assigned tasks", body = [TaskResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn my_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {} FROM tasks
        WHERE id IN (SELECT task_id FROM task_assignees WHERE user_id = ?)
        ORDER BY deadline DESC
        "#,
        TASK_COLUMNS
    ))
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch own tasks");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data = attach_assignees(pool.get_ref(), tasks)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(data))
}

/// Create and assign a task
#[utoipa::path(
    post,
    path = "/api/tasks/assign",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn assign_task(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTask>,
) -> actix_web::Result<impl Responder> {
    let task = insert_task(pool.get_ref(), &payload, payload.project_id).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Task detail
#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}",
    params(("task_id" = u64, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = TaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn get_task(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let task = fetch_task(pool.get_ref(), path.into_inner())
        .await
        .map_err(ErrorInternalServerError)?;

    let Some(task) = task else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Task not found"
        })));
    };

    let mut data = attach_assignees(pool.get_ref(), vec![task])
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(data.remove(0)))
}

/// Update a task; newly added assignees are notified
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    request_body = UpdateTask,
    params(("task_id" = u64, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn update_task(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTask>,
) -> actix_web::Result<impl Responder> {
    let task_id = path.into_inner();

    let task = fetch_task(pool.get_ref(), task_id)
        .await
        .map_err(ErrorInternalServerError)?;

    let Some(task) = task else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Task not found"
        })));
    };

    let deadline = match payload.deadline.as_deref() {
        Some(raw) => match parse_deadline(raw) {
            Some(dt) => dt,
            None => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Invalid deadline"
                })));
            }
        },
        None => task.deadline,
    };

    let status = match payload.status.as_deref() {
        Some(raw) => match TaskStatus::from_str(raw) {
            Ok(s) => s.to_string(),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Invalid status. Allowed: pending, in_progress, completed"
                })));
            }
        },
        None => task.status.clone(),
    };

    sqlx::query(
        r#"
        UPDATE tasks SET title = ?, description = ?, deadline = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.title.as_deref().unwrap_or(&task.title))
    .bind(payload.description.as_deref().unwrap_or(&task.description))
    .bind(deadline)
    .bind(&status)
    .bind(task_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, task_id, "Failed to update task");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if let Some(user_ids) = &payload.assigned_members {
        let added = set_assignees(pool.get_ref(), task_id, user_ids)
            .await
            .map_err(|e| {
                error!(error = %e, task_id, "Failed to update assignees");
                ErrorInternalServerError("Internal Server Error")
            })?;

        if !added.is_empty() {
            let title = payload.title.as_deref().unwrap_or(&task.title);
            notify::task_assigned(pool.get_ref(), &added, title, task_id).await;
        }
    }

    let task = fetch_task(pool.get_ref(), task_id)
        .await
        .map_err(ErrorInternalServerError)?
        .ok_or_else(|| ErrorInternalServerError("Internal Server Error"))?;

    let mut data = attach_assignees(pool.get_ref(), vec![task])
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(data.remove(0)))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    params(("task_id" = u64, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn delete_task(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let task_id = path.into_inner();

    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, task_id, "Failed to delete task");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Task not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Task deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn deadline_accepts_date_only() {
        let dt = parse_deadline("2026-03-15").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.date_naive().to_string(), "2026-03-15");
    }

    #[test]
    fn deadline_accepts_minute_precision() {
        let dt = parse_deadline("2026-03-15T14:30").unwrap();
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn deadline_accepts_rfc3339() {
        let dt = parse_deadline("2026-03-15T14:30:00Z").unwrap();
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn garbage_deadline_is_rejected() {
        assert!(parse_deadline("next tuesday").is_none());
        assert!(parse_deadline("").is_none());
    }
}
