use tokio_postgres::Transaction;
use crate::{
    error::Result,
    models::session::SessionIdentity,
    models::token::AttendanceToken,
};

/// Installs a new token for a unit, superseding any existing one in the
/// same statement. The upsert keyed by `unit_code` leaves no window in
/// which the unit has zero or two live tokens; a superseded raw string
/// simply stops resolving.
pub async fn replace(
    tx: &Transaction<'_>,
    course_code: &str,
    lecturer: &str,
    raw: &str,
    identity: &SessionIdentity,
) -> Result<AttendanceToken> {
    let row = tx
        .query_one(
            r#"
            INSERT INTO attendance_tokens
                (unit_code, course_code, lecturer, raw, scheduled_date, scheduled_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (unit_code) DO UPDATE SET
                course_code = EXCLUDED.course_code,
                lecturer = EXCLUDED.lecturer,
                raw = EXCLUDED.raw,
                scheduled_date = EXCLUDED.scheduled_date,
                scheduled_time = EXCLUDED.scheduled_time,
                issued_at = NOW()
            RETURNING *
            "#,
            &[
                &identity.unit_code,
                &course_code,
                &lecturer,
                &raw,
                &identity.scheduled_date,
                &identity.scheduled_time,
            ],
        )
        .await?;
    Ok(AttendanceToken::from(&row))
}

/// Resolves a presented token. Exact match required on the raw string, the
/// unit, the issuing lecturer, and the full session identity tuple; a token
/// issued for one (date, time) never matches another.
pub async fn lookup(
    tx: &Transaction<'_>,
    raw: &str,
    lecturer: &str,
    identity: &SessionIdentity,
) -> Result<Option<AttendanceToken>> {
    let row = tx
        .query_opt(
            r#"
            SELECT *
            FROM attendance_tokens
            WHERE raw = $1
              AND unit_code = $2
              AND lecturer = $3
              AND scheduled_date = $4
              AND scheduled_time = $5
            "#,
            &[
                &raw,
                &identity.unit_code,
                &lecturer,
                &identity.scheduled_date,
                &identity.scheduled_time,
            ],
        )
        .await?;
    Ok(row.as_ref().map(AttendanceToken::from))
}

/// Deletes any token bound to a session being deleted. Redemption also
/// re-checks the session store, so a dangling token is rejected even if
/// this path is skipped.
pub async fn revoke_for_session(
    tx: &Transaction<'_>,
    identity: &SessionIdentity,
) -> Result<u64> {
    let revoked = tx
        .execute(
            r#"
            DELETE FROM attendance_tokens
            WHERE unit_code = $1 AND scheduled_date = $2 AND scheduled_time = $3
            "#,
            &[
                &identity.unit_code,
                &identity.scheduled_date,
                &identity.scheduled_time,
            ],
        )
        .await?;
    Ok(revoked)
}
