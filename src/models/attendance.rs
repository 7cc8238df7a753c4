use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// One redemption on a session's ledger: which student, with which token.
/// The ledger is append-only; rows are never rewritten or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    /// The unique identifier for the entry.
    pub id: Uuid,
    /// The session this entry belongs to.
    pub session_id: Uuid,
    /// The student marked present. At most one entry per student per
    /// session, compared case-insensitively.
    pub student_id: String,
    /// The raw token string that was redeemed.
    pub token_raw: String,
    /// The timestamp when attendance was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl From<&Row> for AttendanceEntry {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            session_id: row.get("session_id"),
            student_id: row.get("student_id"),
            token_raw: row.get("token_raw"),
            recorded_at: row.get("recorded_at"),
        }
    }
}
