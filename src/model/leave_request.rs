use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    /// Manager the request was routed to at creation time.
    pub manager_id: Option<u64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub status: String,
    pub reason: Option<String>,
    pub processed_by: Option<u64>,
    pub processed_note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn leave_enums_round_trip_as_lowercase() {
        assert_eq!(LeaveType::Sick.to_string(), "sick");
        assert_eq!(LeaveType::from_str("annual").unwrap(), LeaveType::Annual);
        assert_eq!(LeaveStatus::Pending.to_string(), "pending");
        assert_eq!(
            LeaveStatus::from_str("rejected").unwrap(),
            LeaveStatus::Rejected
        );
        assert!(LeaveStatus::from_str("cancelled").is_err());
    }
}
