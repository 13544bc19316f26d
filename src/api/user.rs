use crate::{
    auth::{auth::AuthUser, password::{generate_password, hash_password}},
    model::{role::Role, user::User},
    utils::{
        db_utils::{build_update_sql, execute_update},
        email_cache, email_filter,
    },
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

/// Columns a user may change on their own profile.
const PROFILE_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "phone",
    "department",
    "designation",
    "date_of_joining",
];

/// Columns an admin may change on any account.
const ADMIN_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "phone",
    "department",
    "designation",
    "date_of_joining",
    "role_id",
    "manager_id",
    "employee_code",
    "is_active",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "john@company.com", format = "email")]
    pub email: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    /// Defaults to employee.
    pub role_id: Option<u8>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub date_of_joining: Option<NaiveDate>,
    pub manager_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
    /// Filter by role id
    pub role_id: Option<u8>,
    /// Filter by department
    pub department: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, role_id, employee_code, \
     phone, department, designation, date_of_joining, manager_id, is_active, \
     last_login_at, created_at";

pub async fn fetch_user(pool: &MySqlPool, id: u64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user profile", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let user = fetch_user(pool.get_ref(), auth.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to fetch profile");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "error": "User not found"
        }))),
    }
}

/// Update the current user's profile (whitelisted fields; password handled
/// separately so it is never written unhashed).
#[utoipa::path(
    put,
    path = "/api/me",
    request_body = Object,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "No updatable fields provided"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_me(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let mut payload = body.into_inner();

    // Pull the password out before the generic update so it gets hashed.
    let new_password = payload
        .as_object_mut()
        .and_then(|obj| obj.remove("password"))
        .and_then(|v| v.as_str().map(str::to_owned));

    let has_profile_fields = payload
        .as_object()
        .map(|o| o.keys().any(|k| PROFILE_COLUMNS.contains(&k.as_str())))
        .unwrap_or(false);

    if has_profile_fields {
        let update = build_update_sql("users", &payload, PROFILE_COLUMNS, "id", auth.user_id)?;
        execute_update(pool.get_ref(), update)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = auth.user_id, "Profile update failed");
                ErrorInternalServerError("Internal Server Error")
            })?;
    } else if new_password.is_none() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "No updatable fields provided"
        })));
    }

    if let Some(password) = new_password {
        if password.is_empty() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Password must not be empty"
            })));
        }
        let hashed = hash_password(&password);
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(hashed)
            .bind(auth.user_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, user_id = auth.user_id, "Password update failed");
                ErrorInternalServerError("Internal Server Error")
            })?;
    }

    let user = fetch_user(pool.get_ref(), auth.user_id)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(user))
}

/// Employee directory (used for pickers and admin screens)
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_employees(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let like;
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(role_id) = query.role_id {
        where_sql.push_str(" AND role_id = ?");
        args.push(FilterValue::U64(role_id as u64));
    }

    if let Some(department) = query.department.as_deref() {
        where_sql.push_str(" AND department = ?");
        args.push(FilterValue::Str(department));
    }

    if let Some(search) = query.search.as_deref() {
        where_sql.push_str(" AND (first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        like = format!("%{}%", search);
        args.push(FilterValue::Str(&like));
        args.push(FilterValue::Str(&like));
        args.push(FilterValue::Str(&like));
    }

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM users{}", where_sql);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {} FROM users{} ORDER BY id DESC LIMIT ? OFFSET ?",
        USER_COLUMNS, where_sql
    );

    let mut data_q = sqlx::query_as::<_, User>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(*s),
        };
    }

    let employees = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch employees");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Create an employee account with generated credentials (Admin)
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created; generated credentials returned"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Email is required"
        })));
    }

    let role_id = payload.role_id.unwrap_or(Role::Employee.id());
    if Role::from_id(role_id).is_none() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Invalid role"
        })));
    }

    // EMP-YYYY-XXXX
    let employee_code = format!(
        "EMP-{}-{:04}",
        Utc::now().year(),
        rand::thread_rng().gen_range(0..10_000)
    );
    let generated_password = generate_password(10);
    let hashed = hash_password(&generated_password);

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (email, password, first_name, last_name, role_id, employee_code,
             phone, department, designation, date_of_joining, manager_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&email)
    .bind(hashed)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(role_id)
    .bind(&employee_code)
    .bind(&payload.phone)
    .bind(&payload.department)
    .bind(&payload.designation)
    .bind(payload.date_of_joining)
    .bind(payload.manager_id)
    .execute(pool.get_ref())
    .await;

    let user_id = match result {
        Ok(done) => done.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "error": "Email already registered"
                    })));
                }
            }
            error!(error = %e, "Failed to create employee");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to create employee"
            })));
        }
    };

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    let user = fetch_user(pool.get_ref(), user_id)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "user": user,
        "generated_id": employee_code,
        "generated_password": generated_password
    })))
}

/// Get an account by ID (Admin)
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user = fetch_user(pool.get_ref(), path.into_inner())
        .await
        .map_err(ErrorInternalServerError)?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "error": "User not found"
        }))),
    }
}

/// Update an account (Admin)
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    request_body = Object,
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "No updatable fields provided"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    if let Some(role_id) = body.get("role_id").and_then(|v| v.as_u64()) {
        if Role::from_id(role_id as u8).is_none() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Invalid role"
            })));
        }
    }

    let update = build_update_sql("users", &body, ADMIN_COLUMNS, "id", user_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "User not found"
        })));
    }

    let user = fetch_user(pool.get_ref(), user_id)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(user))
}

/// Delete an account (Admin)
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    // grab the email first so the availability fast path can be unwound
    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to fetch user for delete");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(email) = email else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "User not found"
        })));
    };

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to delete user");
            ErrorInternalServerError("Internal Server Error")
        })?;

    email_filter::remove(&email);
    email_cache::mark_available(&email).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Reset an account password and return the generated one (Admin)
#[utoipa::path(
    post,
    path = "/api/employees/{id}/reset-password",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "New password generated"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn reset_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let user = fetch_user(pool.get_ref(), user_id)
        .await
        .map_err(ErrorInternalServerError)?;

    let Some(user) = user else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "User not found"
        })));
    };

    let new_password = generate_password(10);
    let hashed = hash_password(&new_password);

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed)
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Password reset failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Password reset successfully for {}", user.email),
        "new_password": new_password
    })))
}
