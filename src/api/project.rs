use crate::{
    api::task::{self, CreateTask},
    auth::auth::AuthUser,
    model::project::{MemberStatus, Project, ProjectMember, ProjectStatus},
    notify,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

/// Columns the creator (or an admin) may change on a project.
const PROJECT_COLUMNS: &[&str] = &["name", "company_name", "description", "status"];

#[derive(Deserialize, ToSchema)]
pub struct CreateProject {
    #[schema(example = "Website relaunch")]
    pub name: String,
    #[schema(example = "Acme Ltd")]
    pub company_name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct InviteMembers {
    /// Users to invite.
    #[serde(default)]
    pub user_ids: Vec<u64>,
    /// Single-user form kept for older clients.
    pub user_id: Option<u64>,
    #[schema(example = "member")]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProjectQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectMemberResponse {
    pub id: u64,
    pub project_id: u64,
    pub user_id: u64,
    #[schema(example = "Jane Doe")]
    pub user_name: String,
    #[schema(example = "jane@company.com")]
    pub user_email: String,
    #[schema(example = "accepted")]
    pub status: String,
    #[schema(example = "member")]
    pub role: String,
    pub invited_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: u64,
    pub name: String,
    pub company_name: String,
    pub description: Option<String>,
    #[schema(example = "ongoing")]
    pub status: String,
    pub created_by: u64,
    #[schema(example = "Jane Doe")]
    pub created_by_name: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
    pub members: Vec<ProjectMemberResponse>,
    /// Completed tasks / total tasks, as a percentage.
    #[schema(example = 40.0)]
    pub progress: f64,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<ProjectResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: u64,
    project_id: u64,
    user_id: u64,
    user_name: String,
    user_email: String,
    status: String,
    role: String,
    invited_by: Option<u64>,
    joined_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct ProjectRowWithCreator {
    id: u64,
    name: String,
    company_name: String,
    description: Option<String>,
    status: String,
    created_by: u64,
    created_by_name: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

pub fn progress_percent(completed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((completed as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
}

const PROJECT_SELECT: &str = r#"
    SELECT p.id, p.name, p.company_name, p.description, p.status, p.created_by,
           CONCAT(u.first_name, ' ', u.last_name) AS created_by_name,
           p.created_at, p.updated_at
    FROM projects p
    JOIN users u ON u.id = p.created_by
"#;

/// Visibility scoping shared by detail/update/delete/invite/tasks:
/// admins see everything, everyone else only projects they created or
/// hold a membership row for (any status).
async fn can_view(pool: &MySqlPool, auth: &AuthUser, project_id: u64) -> Result<bool, sqlx::Error> {
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
                             WHERE m.project_id = p.id AND m.user_id = ?))
        )
        "#,
    )
    .bind(project_id)
    .bind(auth.user_id)
    .bind(auth.user_id)
    .fetch_one(pool)
    .await
}

async fn fetch_project_row(
    pool: &MySqlPool,
    project_id: u64,
) -> Result<Option<ProjectRowWithCreator>, sqlx::Error> {
    let sql = format!("{} WHERE p.id = ?", PROJECT_SELECT);
    sqlx::query_as::<_, ProjectRowWithCreator>(&sql)
        .bind(project_id)
        .fetch_optional(pool)
        .await
}

/// Assemble full responses (members + progress) for a page of projects.
async fn build_responses(
    pool: &MySqlPool,
    rows: Vec<ProjectRowWithCreator>,
) -> Result<Vec<ProjectResponse>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; rows.len()].join(", ");

    let member_sql = format!(
        r#"
        SELECT m.id, m.project_id, m.user_id,
               CONCAT(u.first_name, ' ', u.last_name) AS user_name,
               u.email AS user_email,
               m.status, m.role, m.invited_by, m.joined_at
        FROM project_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.project_id IN ({})
        ORDER BY m.joined_at
        "#,
        placeholders
    );

    let mut member_q = sqlx::query_as::<_, MemberRow>(&member_sql);
    for row in &rows {
        member_q = member_q.bind(row.id);
    }

    let mut members_by_project: HashMap<u64, Vec<ProjectMemberResponse>> = HashMap::new();
    for m in member_q.fetch_all(pool).await? {
        members_by_project
            .entry(m.project_id)
            .or_default()
            .push(ProjectMemberResponse {
                id: m.id,
                project_id: m.project_id,
                user_id: m.user_id,
                user_name: m.user_name.trim().to_string(),
                user_email: m.user_email,
                status: m.status,
                role: m.role,
                invited_by: m.invited_by,
                joined_at: m.joined_at,
            });
    }

    let task_sql = format!(
        r#"
        SELECT project_id,
               COUNT(*) AS total,
               CAST(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS SIGNED) AS completed
        FROM tasks
        WHERE project_id IN ({})
        GROUP BY project_id
        "#,
        placeholders
    );

    let mut task_q = sqlx::query_as::<_, (u64, i64, i64)>(&task_sql);
    for row in &rows {
        task_q = task_q.bind(row.id);
    }

    let mut progress_by_project: HashMap<u64, f64> = HashMap::new();
    for (project_id, total, completed) in task_q.fetch_all(pool).await? {
        progress_by_project.insert(project_id, progress_percent(completed, total));
    }

    Ok(rows
        .into_iter()
        .map(|p| ProjectResponse {
            members: members_by_project.remove(&p.id).unwrap_or_default(),
            progress: progress_by_project.get(&p.id).copied().unwrap_or(0.0),
            id: p.id,
            name: p.name,
            company_name: p.company_name,
            description: p.description,
            status: p.status,
            created_by: p.created_by,
            created_by_name: p.created_by_name.trim().to_string(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect())
}

/// Create a project; the creator is auto-enrolled as accepted owner
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProject,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Missing name"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn create_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateProject>,
) -> actix_web::Result<impl Responder> {
    if payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "name is required"
        })));
    }

    let done = sqlx::query(
        r#"
        INSERT INTO projects (name, company_name, description, status, created_by)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.company_name.trim())
    .bind(&payload.description)
    .bind(ProjectStatus::Ongoing.to_string())
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create project");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let project_id = done.last_insert_id();

    sqlx::query(
        r#"
        INSERT INTO project_members (project_id, user_id, status, role)
        VALUES (?, ?, 'accepted', 'owner')
        "#,
    )
    .bind(project_id)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, project_id, "Failed to enroll project creator");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let row = fetch_project_row(pool.get_ref(), project_id)
        .await
        .map_err(ErrorInternalServerError)?
        .ok_or_else(|| ErrorInternalServerError("Internal Server Error"))?;

    let mut data = build_responses(pool.get_ref(), vec![row])
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(data.remove(0)))
}

/// Projects visible to the caller
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectQuery),
    responses(
        (status = 200, description = "Paginated project list", body = ProjectListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn list_projects(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ProjectQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let scope = if auth.is_admin() {
        ""
    } else {
        " AND (p.created_by = ? OR EXISTS(SELECT 1 FROM project_members m \
         WHERE m.project_id = p.id AND m.user_id = ?))"
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM projects p WHERE 1=1{}",
        scope
    );
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if !auth.is_admin() {
        count_q = count_q.bind(auth.user_id).bind(auth.user_id);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count projects");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "{} WHERE 1=1{} ORDER BY p.created_at DESC LIMIT ? OFFSET ?",
        PROJECT_SELECT, scope
    );

    let mut data_q = sqlx::query_as::<_, ProjectRowWithCreator>(&data_sql);
    if !auth.is_admin() {
        data_q = data_q.bind(auth.user_id).bind(auth.user_id);
    }

    let rows = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch projects");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let data = build_responses(pool.get_ref(), rows)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(ProjectListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Project detail
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}",
    params(("project_id" = u64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn get_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    if !can_view(pool.get_ref(), &auth, project_id)
        .await
        .map_err(ErrorInternalServerError)?
    {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Project not found"
        })));
    }

    let Some(row) = fetch_project_row(pool.get_ref(), project_id)
        .await
        .map_err(ErrorInternalServerError)?
    else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Project not found"
        })));
    };

    let mut data = build_responses(pool.get_ref(), vec![row])
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(data.remove(0)))
}

/// Update a project (creator or admin)
#[utoipa::path(
    put,
    path = "/api/projects/{project_id}",
    request_body = Object,
    params(("project_id" = u64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Invalid status or no updatable fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn update_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    let Some(project) = sqlx::query_as::<_, Project>(
        "SELECT id, name, company_name, description, status, created_by, created_at, updated_at \
         FROM projects WHERE id = ?",
    )
    .bind(project_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ErrorInternalServerError)?
    else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Project not found"
        })));
    };

    if project.created_by != auth.user_id && !auth.is_admin() {
        return Err(actix_web::error::ErrorForbidden(
            "You do not have permission to edit this project",
        ));
    }

    if let Some(status) = body.get("status").and_then(|v| v.as_str()) {
        if ProjectStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid status. Allowed: ongoing, completed"
            })));
        }
    }

    let update = build_update_sql("projects", &body, PROJECT_COLUMNS, "id", project_id)?;
    execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let row = fetch_project_row(pool.get_ref(), project_id)
        .await
        .map_err(ErrorInternalServerError)?
        .ok_or_else(|| ErrorInternalServerError("Internal Server Error"))?;

    let mut data = build_responses(pool.get_ref(), vec![row])
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(data.remove(0)))
}

/// Delete a project (creator or admin)
#[utoipa::path(
    delete,
    path = "/api/projects/{project_id}",
    params(("project_id" = u64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn delete_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    let created_by =
        sqlx::query_scalar::<_, u64>("SELECT created_by FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(ErrorInternalServerError)?;

    let Some(created_by) = created_by else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Project not found"
        })));
    };

    if created_by != auth.user_id && !auth.is_admin() {
        return Err(actix_web::error::ErrorForbidden(
            "You do not have permission to delete this project",
        ));
    }

    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(project_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, project_id, "Failed to delete project");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Project deleted"
    })))
}

/// Invite users to a project; existing (project, user) pairs are skipped
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/invite",
    request_body = InviteMembers,
    responses(
        (status = 201, description = "Invitations sent"),
        (status = 200, description = "Nothing new to send"),
        (status = 400, description = "No user ids supplied"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn invite_members(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<InviteMembers>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    if !can_view(pool.get_ref(), &auth, project_id)
        .await
        .map_err(ErrorInternalServerError)?
    {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Project not found"
        })));
    }

    let mut user_ids = payload.user_ids.clone();
    if user_ids.is_empty() {
        if let Some(single) = payload.user_id {
            user_ids.push(single);
        }
    }

    if user_ids.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "user_ids or user_id is required"
        })));
    }

    let role = payload.role.as_deref().unwrap_or("member");

    let project = fetch_project_row(pool.get_ref(), project_id)
        .await
        .map_err(ErrorInternalServerError)?
        .ok_or_else(|| ErrorInternalServerError("Internal Server Error"))?;

    let inviter_name = crate::api::user::fetch_user(pool.get_ref(), auth.user_id)
        .await
        .map_err(ErrorInternalServerError)?
        .map(|u| u.full_name())
        .unwrap_or_default();

    let mut sent: Vec<u64> = Vec::new();
    let mut skipped: Vec<u64> = Vec::new();
    let mut errors: Vec<serde_json::Value> = Vec::new();

    for user_id in user_ids {
        let result = sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, status, role, invited_by)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(MemberStatus::Pending.to_string())
        .bind(role)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await;

        match result {
            Ok(_) => {
                notify::project_invited(
                    pool.get_ref(),
                    user_id,
                    &project.name,
                    inviter_name.trim(),
                    project_id,
                )
                .await;
                sent.push(user_id);
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("23000")
                    && db_err.message().contains("uq_project_members") =>
            {
                // (project, user) already exists
                skipped.push(user_id);
            }
            Err(e) => {
                error!(error = %e, user_id, project_id, "Invite failed");
                errors.push(serde_json::json!({
                    "id": user_id,
                    "error": "Invite failed"
                }));
            }
        }
    }

    let status_code = if sent.is_empty() {
        HttpResponse::Ok()
    } else {
        HttpResponse::Created()
    };

    let mut response = status_code;
    Ok(response.json(serde_json::json!({
        "message": format!(
            "Invitations processed. Sent: {}, Skipped: {}",
            sent.len(),
            skipped.len()
        ),
        "results": {
            "sent": sent,
            "skipped": skipped,
            "errors": errors
        }
    })))
}

/// Caller's pending invitations
#[utoipa::path(
    get,
    path = "/api/projects/invitations",
    responses(
        (status = 200, description = "Pending invitations"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn my_invitations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    #[derive(Serialize, sqlx::FromRow)]
    struct InvitationRow {
        id: u64,
        project_id: u64,
        project_name: String,
        company_name: String,
        status: String,
        role: String,
        invited_by: Option<u64>,
        invited_by_name: Option<String>,
        joined_at: Option<DateTime<Utc>>,
    }

    let invites = sqlx::query_as::<_, InvitationRow>(
        r#"
        SELECT m.id, m.project_id, p.name AS project_name, p.company_name,
               m.status, m.role, m.invited_by,
               CONCAT(i.first_name, ' ', i.last_name) AS invited_by_name,
               m.joined_at
        FROM project_members m
        JOIN projects p ON p.id = m.project_id
        LEFT JOIN users i ON i.id = m.invited_by
        WHERE m.user_id = ? AND m.status = 'pending'
        ORDER BY m.joined_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch invitations");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(invites))
}

async fn respond_to_invitation(
    auth: AuthUser,
    pool: &MySqlPool,
    member_id: u64,
    status: MemberStatus,
) -> actix_web::Result<HttpResponse> {
    let member = sqlx::query_as::<_, ProjectMember>(
        "SELECT id, project_id, user_id, status, role, invited_by, joined_at \
         FROM project_members WHERE id = ?",
    )
    .bind(member_id)
    .fetch_optional(pool)
    .await
    .map_err(ErrorInternalServerError)?;

    let Some(member) = member else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Invitation not found"
        })));
    };

    if member.user_id != auth.user_id {
        return Err(actix_web::error::ErrorForbidden("Not your invitation"));
    }

    sqlx::query("UPDATE project_members SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(member_id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, member_id, "Failed to update invitation");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let message = match status {
        MemberStatus::Accepted => "Invitation accepted",
        MemberStatus::Rejected => "Invitation rejected",
        MemberStatus::Pending => "Invitation pending",
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}

/// Accept an invitation (invited user only)
#[utoipa::path(
    post,
    path = "/api/members/{member_id}/accept",
    params(("member_id" = u64, Path, description = "Membership ID")),
    responses(
        (status = 200, description = "Invitation accepted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your invitation"),
        (status = 404, description = "Invitation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn accept_invitation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    respond_to_invitation(auth, pool.get_ref(), path.into_inner(), MemberStatus::Accepted).await
}

/// Reject an invitation (invited user only)
#[utoipa::path(
    post,
    path = "/api/members/{member_id}/reject",
    params(("member_id" = u64, Path, description = "Membership ID")),
    responses(
        (status = 200, description = "Invitation rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your invitation"),
        (status = 404, description = "Invitation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn reject_invitation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    respond_to_invitation(auth, pool.get_ref(), path.into_inner(), MemberStatus::Rejected).await
}

/// Tasks of a project
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/tasks",
    params(("project_id" = u64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project tasks"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn project_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    if !can_view(pool.get_ref(), &auth, project_id)
        .await
        .map_err(ErrorInternalServerError)?
    {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Project not found"
        })));
    }

    let tasks = sqlx::query_as::<_, crate::model::task::Task>(
        "SELECT id, title, description, project_id, deadline, status, created_at \
         FROM tasks WHERE project_id = ? ORDER BY deadline DESC",
    )
    .bind(project_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, project_id, "Failed to fetch project tasks");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data = task::attach_assignees(pool.get_ref(), tasks)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(data))
}

/// Create a task bound to a project
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Projects"
)]
pub async fn create_project_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateTask>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    if !can_view(pool.get_ref(), &auth, project_id)
        .await
        .map_err(ErrorInternalServerError)?
    {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Project not found"
        })));
    }

    let created = task::insert_task(pool.get_ref(), &payload, Some(project_id)).await?;

    Ok(HttpResponse::Created().json(created))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_zero_without_tasks() {
        assert_eq!(progress_percent(0, 0), 0.0);
    }

    #[test]
    fn progress_is_a_rounded_percentage() {
        assert_eq!(progress_percent(2, 5), 40.0);
        assert_eq!(progress_percent(1, 3), 33.33);
        assert_eq!(progress_percent(3, 3), 100.0);
    }
}
