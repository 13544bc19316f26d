use crate::{auth::auth::AuthUser, model::message::Message, notify};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SendMessage {
    #[schema(example = "Standup moved to 10:30")]
    pub content: String,
    pub project_id: Option<u64>,
    pub task_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct MessageQuery {
    /// Task ID for task chat
    pub task: Option<u64>,
    /// Project ID for group chat
    pub project: Option<u64>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct MessageResponse {
    pub id: u64,
    pub sender_id: u64,
    #[schema(example = "jane@company.com")]
    pub sender_email: String,
    #[schema(example = "Jane Doe")]
    pub sender_name: String,
    pub content: String,
    pub project_id: Option<u64>,
    pub task_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<DateTime<Utc>>,
}

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.sender_id, u.email AS sender_email,
           CONCAT(u.first_name, ' ', u.last_name) AS sender_name,
           m.content, m.project_id, m.task_id, m.timestamp
    FROM messages m
    JOIN users u ON u.id = m.sender_id
"#;

#[derive(sqlx::FromRow)]
struct TaskScopeRow {
    project_id: Option<u64>,
    project_creator: Option<u64>,
    title: String,
}

async fn task_scope(pool: &MySqlPool, task_id: u64) -> Result<Option<TaskScopeRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskScopeRow>(
        r#"
        SELECT t.project_id, p.created_by AS project_creator, t.title
        FROM tasks t
        LEFT JOIN projects p ON p.id = t.project_id
        WHERE t.id = ?
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await
}

/// Task chat: assignees, admins, and the owning project's creator.
async fn can_access_task_chat(
    pool: &MySqlPool,
    auth: &AuthUser,
    task_id: u64,
    scope: &TaskScopeRow,
) -> Result<bool, sqlx::Error> {
    if auth.is_admin() || scope.project_creator == Some(auth.user_id) {
        return Ok(true);
    }

    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM task_assignees WHERE task_id = ? AND user_id = ?)",
    )
    .bind(task_id)
    .bind(auth.user_id)
    .fetch_one(pool)
    .await
}

/// Group chat: accepted members, admins, and the creator.
async fn can_access_project_chat(
    pool: &MySqlPool,
    auth: &AuthUser,
    project_id: u64,
) -> Result<bool, sqlx::Error> {
    if auth.is_admin() {
        return Ok(true);
    }

    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM projects p
            WHERE p.id = ?
              AND (p.created_by = ?
                   OR EXISTS(SELECT 1 FROM project_members m
                             WHERE m.project_id = p.id
                               AND m.user_id = ?
                               AND m.status = 'accepted'))
        )
        "#,
    )
    .bind(project_id)
    .bind(auth.user_id)
    .bind(auth.user_id)
    .fetch_one(pool)
    .await
}

/// Messages in a task chat, a project group chat, or the caller's direct
/// history. Unauthorized scopes yield an empty list rather than an error.
#[utoipa::path(
    get,
    path = "/api/chat/messages",
    params(MessageQuery),
    responses(
        (status = 200, description = "Messages, oldest first", body = [MessageResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn list_messages(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MessageQuery>,
) -> actix_web::Result<impl Responder> {
    let empty: Vec<MessageResponse> = Vec::new();

    if let Some(task_id) = query.task {
        let Some(scope) = task_scope(pool.get_ref(), task_id)
            .await
            .map_err(ErrorInternalServerError)?
        else {
            return Ok(HttpResponse::Ok().json(empty));
        };

        if !can_access_task_chat(pool.get_ref(), &auth, task_id, &scope)
            .await
            .map_err(ErrorInternalServerError)?
        {
            return Ok(HttpResponse::Ok().json(empty));
        }

        let sql = format!("{} WHERE m.task_id = ? ORDER BY m.timestamp", MESSAGE_SELECT);
        let messages = sqlx::query_as::<_, MessageResponse>(&sql)
            .bind(task_id)
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, task_id, "Failed to fetch task messages");
                ErrorInternalServerError("Internal Server Error")
            })?;

        return Ok(HttpResponse::Ok().json(messages));
    }

    if let Some(project_id) = query.project {
        if !can_access_project_chat(pool.get_ref(), &auth, project_id)
            .await
            .map_err(ErrorInternalServerError)?
        {
            return Ok(HttpResponse::Ok().json(empty));
        }

        // group chat excludes task-scoped messages
        let sql = format!(
            "{} WHERE m.project_id = ? AND m.task_id IS NULL ORDER BY m.timestamp",
            MESSAGE_SELECT
        );
        let messages = sqlx::query_as::<_, MessageResponse>(&sql)
            .bind(project_id)
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, project_id, "Failed to fetch project messages");
                ErrorInternalServerError("Internal Server Error")
            })?;

        return Ok(HttpResponse::Ok().json(messages));
    }

    let sql = format!("{} WHERE m.sender_id = ? ORDER BY m.timestamp", MESSAGE_SELECT);
    let messages = sqlx::query_as::<_, MessageResponse>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch own messages");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(messages))
}

/// Send a message; participants of the scope are notified
#[utoipa::path(
    post,
    path = "/api/chat/messages",
    request_body = SendMessage,
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a participant of the scope"),
        (status = 404, description = "Task or project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn send_message(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SendMessage>,
) -> actix_web::Result<impl Responder> {
    if payload.content.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "content must not be empty"
        })));
    }

    let mut project_id = payload.project_id;
    let mut task_title = None;
    let mut project_name = None;

    if let Some(task_id) = payload.task_id {
        let Some(scope) = task_scope(pool.get_ref(), task_id)
            .await
            .map_err(ErrorInternalServerError)?
        else {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": "Task not found"
            })));
        };

        if !can_access_task_chat(pool.get_ref(), &auth, task_id, &scope)
            .await
            .map_err(ErrorInternalServerError)?
        {
            return Err(actix_web::error::ErrorForbidden(
                "You are not authorized to chat in this task.",
            ));
        }

        // A task message inherits the task's project.
        if project_id.is_none() {
            project_id = scope.project_id;
        }
        task_title = Some(scope.title);
    } else if let Some(project_id) = project_id {
        if !can_access_project_chat(pool.get_ref(), &auth, project_id)
            .await
            .map_err(ErrorInternalServerError)?
        {
            return Err(actix_web::error::ErrorForbidden(
                "You are not authorized to chat in this project.",
            ));
        }

        project_name = sqlx::query_scalar::<_, String>("SELECT name FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(ErrorInternalServerError)?;
    }

    let done = sqlx::query(
        r#"
        INSERT INTO messages (sender_id, content, project_id, task_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.content.trim())
    .bind(project_id)
    .bind(payload.task_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to store message");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let message_id = done.last_insert_id();

    let sender_name = crate::api::user::fetch_user(pool.get_ref(), auth.user_id)
        .await
        .map_err(ErrorInternalServerError)?
        .map(|u| u.full_name())
        .unwrap_or_default();

    // Fan-out to the other participants of the scope.
    if let Some(task_id) = payload.task_id {
        let recipients = sqlx::query_scalar::<_, u64>(
            "SELECT user_id FROM task_assignees WHERE task_id = ? AND user_id != ?",
        )
        .bind(task_id)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

        let context = format!(
            "in task: {}",
            task_title.as_deref().unwrap_or_default()
        );
        notify::chat_message(
            pool.get_ref(),
            &recipients,
            sender_name.trim(),
            &context,
            Some(format!("/tasks/{}", task_id)),
        )
        .await;
    } else if let Some(project_id) = project_id {
        let recipients = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT user_id FROM project_members
            WHERE project_id = ? AND status = 'accepted' AND user_id != ?
            "#,
        )
        .bind(project_id)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

        let context = format!(
            "in project: {}",
            project_name.as_deref().unwrap_or_default()
        );
        notify::chat_message(
            pool.get_ref(),
            &recipients,
            sender_name.trim(),
            &context,
            Some(format!("/projects/{}", project_id)),
        )
        .await;
    }

    let message = sqlx::query_as::<_, Message>(
        "SELECT id, sender_id, content, project_id, task_id, timestamp \
         FROM messages WHERE id = ?",
    )
    .bind(message_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(MessageResponse {
        id: message.id,
        sender_id: message.sender_id,
        sender_email: auth.email.clone(),
        sender_name,
        content: message.content,
        project_id: message.project_id,
        task_id: message.task_id,
        timestamp: message.timestamp,
    }))
}
