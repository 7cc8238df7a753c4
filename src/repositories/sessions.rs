use tokio_postgres::Transaction;
use uuid::Uuid;
use crate::{
    error::Result,
    models::session::{ClassSession, SessionIdentity},
};

/// Creates a new scheduled session. The unique constraint on the identity
/// tuple rejects a second session for the same (unit, date, time).
pub async fn create(
    tx: &Transaction<'_>,
    id: Uuid,
    course_code: &str,
    identity: &SessionIdentity,
) -> Result<ClassSession> {
    let row = tx
        .query_one(
            r#"
            INSERT INTO class_sessions (id, course_code, unit_code, scheduled_date, scheduled_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
            &[
                &id,
                &course_code,
                &identity.unit_code,
                &identity.scheduled_date,
                &identity.scheduled_time,
            ],
        )
        .await?;
    Ok(ClassSession::from(&row))
}

/// Finds a session by its identity tuple.
pub async fn find(
    tx: &Transaction<'_>,
    identity: &SessionIdentity,
) -> Result<Option<ClassSession>> {
    let row = tx
        .query_opt(
            r#"
            SELECT *
            FROM class_sessions
            WHERE unit_code = $1 AND scheduled_date = $2 AND scheduled_time = $3
            "#,
            &[
                &identity.unit_code,
                &identity.scheduled_date,
                &identity.scheduled_time,
            ],
        )
        .await?;
    Ok(row.as_ref().map(ClassSession::from))
}

/// Lists all sessions scheduled for a course.
pub async fn list_by_course(
    tx: &Transaction<'_>,
    course_code: &str,
) -> Result<Vec<ClassSession>> {
    let rows = tx
        .query(
            r#"
            SELECT *
            FROM class_sessions
            WHERE course_code = $1
            ORDER BY scheduled_date ASC, scheduled_time ASC
            "#,
            &[&course_code],
        )
        .await?;
    Ok(rows.iter().map(ClassSession::from).collect())
}

/// Deletes a session by identity. Ledger entries go with it via the
/// foreign-key cascade. Returns the deleted row, if there was one.
pub async fn delete(
    tx: &Transaction<'_>,
    identity: &SessionIdentity,
) -> Result<Option<ClassSession>> {
    let row = tx
        .query_opt(
            r#"
            DELETE FROM class_sessions
            WHERE unit_code = $1 AND scheduled_date = $2 AND scheduled_time = $3
            RETURNING *
            "#,
            &[
                &identity.unit_code,
                &identity.scheduled_date,
                &identity.scheduled_time,
            ],
        )
        .await?;
    Ok(row.as_ref().map(ClassSession::from))
}
