//! Notification fan-out. Handlers call these after the triggering write;
//! a failed insert is logged and never fails the original request.

use sqlx::MySqlPool;
use tracing::warn;

pub const TYPE_LEAVE_REQUEST: &str = "leave_request";
pub const TYPE_LEAVE_APPROVED: &str = "leave_approved";
pub const TYPE_LEAVE_REJECTED: &str = "leave_rejected";
pub const TYPE_PROJECT_INVITE: &str = "project_invite";
pub const TYPE_TASK_ASSIGNED: &str = "task_assigned";
pub const TYPE_CHAT_MESSAGE: &str = "chat_message";

async fn create(
    pool: &MySqlPool,
    recipient_id: u64,
    title: &str,
    message: &str,
    notification_type: &str,
    link: Option<String>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (recipient_id, title, message, notification_type, link)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(recipient_id)
    .bind(title)
    .bind(message)
    .bind(notification_type)
    .bind(link)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(error = %e, recipient_id, notification_type, "Notification insert failed");
    }
}

pub async fn leave_requested(
    pool: &MySqlPool,
    manager_id: u64,
    employee_name: &str,
    leave_type: &str,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
    leave_id: u64,
) {
    create(
        pool,
        manager_id,
        "New Leave Request",
        &format!(
            "{} has requested {} leave from {} to {}.",
            employee_name, leave_type, start_date, end_date
        ),
        TYPE_LEAVE_REQUEST,
        Some(format!("/leaves/{}", leave_id)),
    )
    .await;
}

pub async fn leave_processed(
    pool: &MySqlPool,
    employee_id: u64,
    leave_type: &str,
    start_date: chrono::NaiveDate,
    approved: bool,
    leave_id: u64,
) {
    let (title, notification_type, verb) = if approved {
        ("Leave Approved", TYPE_LEAVE_APPROVED, "approved")
    } else {
        ("Leave Rejected", TYPE_LEAVE_REJECTED, "rejected")
    };

    create(
        pool,
        employee_id,
        title,
        &format!(
            "Your {} leave request for {} has been {}.",
            leave_type, start_date, verb
        ),
        notification_type,
        Some(format!("/leaves/{}", leave_id)),
    )
    .await;
}

pub async fn project_invited(
    pool: &MySqlPool,
    user_id: u64,
    project_name: &str,
    inviter_name: &str,
    project_id: u64,
) {
    create(
        pool,
        user_id,
        "New Project Invitation",
        &format!(
            "You have been invited to join the project \"{}\" by {}.",
            project_name, inviter_name
        ),
        TYPE_PROJECT_INVITE,
        Some(format!("/projects/{}", project_id)),
    )
    .await;
}

pub async fn task_assigned(pool: &MySqlPool, user_ids: &[u64], task_title: &str, task_id: u64) {
    for &user_id in user_ids {
        create(
            pool,
            user_id,
            "New Task Assigned",
            &format!("You have been assigned to the task: {}.", task_title),
            TYPE_TASK_ASSIGNED,
            Some(format!("/tasks/{}", task_id)),
        )
        .await;
    }
}

/// `recipients` must already exclude the sender.
pub async fn chat_message(
    pool: &MySqlPool,
    recipients: &[u64],
    sender_name: &str,
    context: &str,
    link: Option<String>,
) {
    for &recipient_id in recipients {
        create(
            pool,
            recipient_id,
            "New Message",
            &format!("{} sent a message {}.", sender_name, context),
            TYPE_CHAT_MESSAGE,
            link.clone(),
        )
        .await;
    }
}
