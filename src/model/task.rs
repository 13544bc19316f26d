use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub project_id: Option<u64>,
    pub deadline: DateTime<Utc>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-day hour entry for an employee against a task. Summed hours per
/// (employee, date) must never exceed 24.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeLog {
    pub id: u64,
    pub employee_id: u64,
    pub task_id: u64,
    pub date: NaiveDate,
    pub hours: f64,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn task_status_uses_snake_case() {
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            TaskStatus::from_str("in_progress").unwrap(),
            TaskStatus::InProgress
        );
        assert!(TaskStatus::from_str("done").is_err());
    }
}
