use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// The (unit, date, time) tuple uniquely naming one scheduled class
/// occurrence. Date and time are opaque strings; the unit code is stored
/// lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub unit_code: String,
    pub scheduled_date: String,
    pub scheduled_time: String,
}

impl SessionIdentity {
    /// Builds an identity with the unit code normalized to lowercase.
    pub fn new(unit_code: &str, scheduled_date: &str, scheduled_time: &str) -> Self {
        Self {
            unit_code: unit_code.trim().to_lowercase(),
            scheduled_date: scheduled_date.trim().to_string(),
            scheduled_time: scheduled_time.trim().to_string(),
        }
    }
}

/// Represents one scheduled class session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSession {
    /// The unique identifier for the session.
    pub id: Uuid,
    /// The course the session belongs to.
    pub course_code: String,
    /// The unit the session belongs to.
    pub unit_code: String,
    /// The scheduled date, as supplied by the scheduler.
    pub scheduled_date: String,
    /// The scheduled time, as supplied by the scheduler.
    pub scheduled_time: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
}

impl From<&Row> for ClassSession {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            course_code: row.get("course_code"),
            unit_code: row.get("unit_code"),
            scheduled_date: row.get("scheduled_date"),
            scheduled_time: row.get("scheduled_time"),
            created_at: row.get("created_at"),
        }
    }
}
