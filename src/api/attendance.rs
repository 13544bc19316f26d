use crate::{
    auth::auth::AuthUser,
    model::attendance::{Attendance, AttendanceEntry},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, types::Json};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    #[schema(example = "Head office")]
    pub location_in: Option<String>,
    pub check_in_note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckOutReq {
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,
    pub location_out: Option<String>,
    pub check_out_note: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct LogsQuery {
    /// Date to list records for, YYYY-MM-DD; defaults to today
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub id: u64,
    pub employee_id: u64,
    pub employee_email: String,
    pub employee_name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
    #[schema(example = 7.5)]
    pub total_hours: f64,
    #[schema(example = "7h 30m")]
    pub total_duration_display: String,
}

#[derive(sqlx::FromRow)]
struct AttendanceLogRow {
    id: u64,
    employee_id: u64,
    email: String,
    first_name: String,
    last_name: String,
    date: NaiveDate,
    entries: Json<Vec<AttendanceEntry>>,
    total_hours: f64,
}

impl From<AttendanceLogRow> for AttendanceResponse {
    fn from(row: AttendanceLogRow) -> Self {
        let att = Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            entries: row.entries,
            total_hours: row.total_hours,
        };
        let display = att.total_duration_display();
        AttendanceResponse {
            id: att.id,
            employee_id: att.employee_id,
            employee_email: row.email,
            employee_name: format!("{} {}", row.first_name, row.last_name)
                .trim()
                .to_string(),
            date: att.date,
            entries: att.entries.0,
            total_hours: att.total_hours,
            total_duration_display: display,
        }
    }
}

async fn fetch_for_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, entries, total_hours
        FROM attendance
        WHERE employee_id = ? AND date = ?
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

async fn store_entries(pool: &MySqlPool, att: &Attendance) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE attendance SET entries = ?, total_hours = ? WHERE id = ?")
        .bind(Json(&att.entries.0))
        .bind(att.total_hours)
        .bind(att.id)
        .execute(pool)
        .await
        .map(|_| ())
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInReq,
    responses(
        (status = 201, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in", body = Object, example = json!({
            "error": "Already checked in. Please check out first."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CheckInReq>,
) -> actix_web::Result<impl Responder> {
    let now = Utc::now();
    let today = now.date_naive();

    let mut attendance = match fetch_for_day(pool.get_ref(), auth.user_id, today)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = auth.user_id, "Check-in lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })? {
        Some(att) => att,
        None => {
            // First action of the day: create the daily record.
            let insert = sqlx::query(
                r#"
                INSERT INTO attendance (employee_id, date, entries, total_hours)
                VALUES (?, ?, ?, 0)
                "#,
            )
            .bind(auth.user_id)
            .bind(today)
            .bind(Json(Vec::<AttendanceEntry>::new()))
            .execute(pool.get_ref())
            .await;

            match insert {
                Ok(_) => {}
                // Duplicate means a parallel request created it; refetch below.
                Err(sqlx::Error::Database(db_err))
                    if db_err.code().as_deref() == Some("23000") => {}
                Err(e) => {
                    error!(error = %e, employee_id = auth.user_id, "Check-in create failed");
                    return Err(ErrorInternalServerError("Internal Server Error"));
                }
            }

            fetch_for_day(pool.get_ref(), auth.user_id, today)
                .await
                .map_err(ErrorInternalServerError)?
                .ok_or_else(|| ErrorInternalServerError("Internal Server Error"))?
        }
    };

    // Single active session per day
    if attendance.has_open_entry() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Already checked in. Please check out first."
        })));
    }

    attendance.entries.0.push(AttendanceEntry {
        check_in: now,
        check_out: None,
        lat_in: body.check_in_lat.unwrap_or(0.0),
        lng_in: body.check_in_lng.unwrap_or(0.0),
        lat_out: 0.0,
        lng_out: 0.0,
        location_in: body.location_in.clone().unwrap_or_default(),
        location_out: String::new(),
        note_in: body.check_in_note.clone().unwrap_or_default(),
        note_out: String::new(),
    });

    store_entries(pool.get_ref(), &attendance)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = auth.user_id, "Check-in failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Checked in successfully"
    })))
}

/// Check-out endpoint
#[utoipa::path(
    patch,
    path = "/api/attendance/check-out",
    request_body = CheckOutReq,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "total_hours": 7.5
        })),
        (status = 400, description = "No active check-in found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CheckOutReq>,
) -> actix_web::Result<impl Responder> {
    let now = Utc::now();
    let today = now.date_naive();

    let attendance = fetch_for_day(pool.get_ref(), auth.user_id, today)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = auth.user_id, "Check-out lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(mut attendance) = attendance else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "No attendance record found for today."
        })));
    };

    let Some(entry) = attendance.open_entry_mut() else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "No active check-in found."
        })));
    };

    entry.check_out = Some(now);
    entry.lat_out = body.check_out_lat.unwrap_or(0.0);
    entry.lng_out = body.check_out_lng.unwrap_or(0.0);
    entry.location_out = body.location_out.clone().unwrap_or_default();
    entry.note_out = body.check_out_note.clone().unwrap_or_default();

    attendance.calculate_total_hours();

    store_entries(pool.get_ref(), &attendance)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = auth.user_id, "Check-out failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "total_hours": attendance.total_hours
    })))
}

/// Today's check-in state for the current user
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, description = "Check-in state", body = Object, example = json!({
            "is_checked_in": true,
            "attendance": null
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let today = Utc::now().date_naive();

    let attendance = fetch_for_day(pool.get_ref(), auth.user_id, today)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id = auth.user_id, "Status lookup failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let is_checked_in = attendance
        .as_ref()
        .map(Attendance::has_open_entry)
        .unwrap_or(false);

    let attendance = attendance.map(|att| {
        serde_json::json!({
            "id": att.id,
            "employee_id": att.employee_id,
            "date": att.date,
            "entries": att.entries.0,
            "total_hours": att.total_hours,
            "total_duration_display": att.total_duration_display(),
        })
    });

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "is_checked_in": is_checked_in,
        "attendance": attendance
    })))
}

/// Attendance records for a date; employees see only their own
#[utoipa::path(
    get,
    path = "/api/attendance/logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Attendance records", body = [AttendanceResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LogsQuery>,
) -> actix_web::Result<impl Responder> {
    // Bad date strings fall back to today
    let date = query
        .date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut sql = String::from(
        r#"
        SELECT a.id, a.employee_id, u.email, u.first_name, u.last_name,
               a.date, a.entries, a.total_hours
        FROM attendance a
        JOIN users u ON u.id = a.employee_id
        WHERE a.date = ?
        "#,
    );

    if auth.is_employee() {
        sql.push_str(" AND a.employee_id = ?");
    }
    sql.push_str(" ORDER BY a.date DESC");

    let mut q = sqlx::query_as::<_, AttendanceLogRow>(&sql).bind(date);
    if auth.is_employee() {
        q = q.bind(auth.user_id);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch attendance logs");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data: Vec<AttendanceResponse> = rows.into_iter().map(AttendanceResponse::from).collect();

    Ok(HttpResponse::Ok().json(data))
}
