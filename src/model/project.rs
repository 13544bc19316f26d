use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectStatus {
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub company_name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Invitation/acceptance record linking a user to a project.
/// (project_id, user_id) pairs are unique.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: u64,
    pub project_id: u64,
    pub user_id: u64,
    pub status: String,
    pub role: String,
    pub invited_by: Option<u64>,
    pub joined_at: Option<DateTime<Utc>>,
}
