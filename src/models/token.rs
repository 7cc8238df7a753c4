use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::models::session::SessionIdentity;

/// The registry record for the single live token of a unit.
#[derive(Debug, Clone)]
pub struct AttendanceToken {
    /// The unit this token belongs to (at most one live token per unit).
    pub unit_code: String,
    /// The course the unit belongs to.
    pub course_code: String,
    /// The lecturer who issued the token.
    pub lecturer: String,
    /// The opaque sealed token string handed to clients. Globally unique
    /// across all tokens ever issued.
    pub raw: String,
    /// The bound session date.
    pub scheduled_date: String,
    /// The bound session time.
    pub scheduled_time: String,
    /// The timestamp when the token was issued.
    pub issued_at: DateTime<Utc>,
}

impl From<&Row> for AttendanceToken {
    fn from(row: &Row) -> Self {
        Self {
            unit_code: row.get("unit_code"),
            course_code: row.get("course_code"),
            lecturer: row.get("lecturer"),
            raw: row.get("raw"),
            scheduled_date: row.get("scheduled_date"),
            scheduled_time: row.get("scheduled_time"),
            issued_at: row.get("issued_at"),
        }
    }
}

/// The structured payload sealed inside a token string.
///
/// `token_id` is generated server-side per issuance, so no two tokens can
/// ever share a raw string, even across rotation and revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub course_code: String,
    pub unit_code: String,
    pub lecturer: String,
    pub date: String,
    pub time: String,
    pub token_id: Uuid,
}

impl TokenClaims {
    /// The session identity tuple this token is bound to.
    pub fn session_identity(&self) -> SessionIdentity {
        SessionIdentity::new(&self.unit_code, &self.date, &self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_serialize_with_camel_case_fields() {
        let claims = TokenClaims {
            course_code: "bsc-cs".to_string(),
            unit_code: "cs101".to_string(),
            lecturer: "lec001".to_string(),
            date: "2024-05-01".to_string(),
            time: "09:00".to_string(),
            token_id: Uuid::new_v4(),
        };

        let json = sonic_rs::to_string(&claims).unwrap();
        assert!(json.contains("\"courseCode\""));
        assert!(json.contains("\"unitCode\""));
        assert!(json.contains("\"tokenId\""));

        let back: TokenClaims = sonic_rs::from_str(&json).unwrap();
        assert_eq!(back.token_id, claims.token_id);
        assert_eq!(back.session_identity().unit_code, "cs101");
    }

    #[test]
    fn session_identity_normalizes_unit_case() {
        let claims = TokenClaims {
            course_code: "bsc-cs".to_string(),
            unit_code: "CS101".to_string(),
            lecturer: "lec001".to_string(),
            date: "2024-05-01".to_string(),
            time: "09:00".to_string(),
            token_id: Uuid::new_v4(),
        };

        assert_eq!(claims.session_identity().unit_code, "cs101");
    }
}
