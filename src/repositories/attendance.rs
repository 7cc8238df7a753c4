use tokio_postgres::Transaction;
use uuid::Uuid;
use crate::{
    error::{is_unique_violation, AppError, Result},
    models::attendance::AttendanceEntry,
};

/// Appends one entry to a session's ledger as a single constrained INSERT.
///
/// The unique index on `(session_id, lower(student_id))` is the idempotency
/// guard: two concurrent redemptions by the same student commit exactly one
/// row, the other surfaces as `AlreadyMarked`. Distinct students never
/// contend.
pub async fn append(
    tx: &Transaction<'_>,
    session_id: Uuid,
    student_id: &str,
    token_raw: &str,
) -> Result<AttendanceEntry> {
    let id = Uuid::new_v4();
    let inserted = tx
        .query_one(
            r#"
            INSERT INTO attendance_entries (id, session_id, student_id, token_raw)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
            &[&id, &session_id, &student_id, &token_raw],
        )
        .await;

    match inserted {
        Ok(row) => Ok(AttendanceEntry::from(&row)),
        Err(e) if is_unique_violation(&e) => Err(AppError::AlreadyMarked),
        Err(e) => Err(e.into()),
    }
}

/// Lists a session's ledger in append order.
pub async fn list_for_session(
    tx: &Transaction<'_>,
    session_id: Uuid,
) -> Result<Vec<AttendanceEntry>> {
    let rows = tx
        .query(
            r#"
            SELECT *
            FROM attendance_entries
            WHERE session_id = $1
            ORDER BY recorded_at ASC
            "#,
            &[&session_id],
        )
        .await?;
    Ok(rows.iter().map(AttendanceEntry::from).collect())
}
