use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "email": "jane@company.com",
        "first_name": "Jane",
        "last_name": "Doe",
        "role_id": 4,
        "employee_code": "EMP-2026-1042",
        "phone": "+9771712345678",
        "department": "Engineering",
        "designation": "Backend Developer",
        "date_of_joining": "2024-01-01",
        "manager_id": 7,
        "is_active": true
    })
)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: u8,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub manager_id: Option<u64>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_handles_missing_parts() {
        let mut user = User {
            id: 1,
            email: "jane@company.com".into(),
            password: String::new(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            role_id: 4,
            employee_code: None,
            phone: None,
            department: None,
            designation: None,
            date_of_joining: None,
            manager_id: None,
            is_active: true,
            last_login_at: None,
            created_at: None,
        };
        assert_eq!(user.full_name(), "Jane Doe");

        user.last_name.clear();
        assert_eq!(user.full_name(), "Jane");
    }
}
