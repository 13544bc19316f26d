use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat message scoped to a project (group chat), a task (task chat),
/// or neither (direct).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: u64,
    pub sender_id: u64,
    pub content: String,
    pub project_id: Option<u64>,
    pub task_id: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}
