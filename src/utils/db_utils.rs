use actix_web::error::ErrorBadRequest;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// SQL bindable value enum
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// SQL update container
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Build a dynamic UPDATE statement from a JSON payload.
///
/// Only keys present in `allowed` are used; anything else in the payload is
/// ignored so callers can pass request bodies straight through without
/// exposing privileged columns.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    let fields: Vec<(&String, &Value)> = obj
        .iter()
        .filter(|(k, _)| allowed.contains(&k.as_str()))
        .collect();

    if fields.is_empty() {
        return Err(ErrorBadRequest("No updatable fields provided"));
    }

    let set_clause = fields
        .iter()
        .map(|(k, _)| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(fields.len() + 1);

    // Convert JSON values -> SqlValue
    for (_, value) in &fields {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }

    // WHERE id = ?
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

/// Execute the update
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_update_from_allowed_fields_only() {
        let payload = json!({
            "first_name": "Jane",
            "role_id": 1,
            "phone": "+9771234567"
        });

        let update = build_update_sql(
            "users",
            &payload,
            &["first_name", "phone"],
            "id",
            42,
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE users SET "));
        assert!(update.sql.contains("first_name = ?"));
        assert!(update.sql.contains("phone = ?"));
        assert!(!update.sql.contains("role_id"));
        assert!(update.sql.ends_with("WHERE id = ?"));
        // two fields + the id
        assert_eq!(update.values.len(), 3);
    }

    #[test]
    fn date_strings_are_sniffed() {
        let payload = json!({ "date_of_joining": "2026-02-01" });

        let update = build_update_sql("users", &payload, &["date_of_joining"], "id", 1).unwrap();

        assert!(matches!(update.values[0], SqlValue::Date(_)));
    }

    #[test]
    fn rejects_payload_without_updatable_fields() {
        let payload = json!({ "role_id": 1 });

        let err = build_update_sql("users", &payload, &["first_name"], "id", 1);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_non_object_payload() {
        let payload = json!([1, 2, 3]);

        assert!(build_update_sql("users", &payload, &["first_name"], "id", 1).is_err());
    }
}
