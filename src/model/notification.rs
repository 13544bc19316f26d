use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fan-out record created after a triggering write. Immutable apart from
/// the is_read flag.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: u64,
    pub recipient_id: u64,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    pub link: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
