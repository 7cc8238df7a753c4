use uuid::Uuid;
use crate::{
    error::{is_unique_violation, AppError, Result},
    models::attendance::AttendanceEntry,
    models::session::{ClassSession, SessionIdentity},
    repositories::attendance as attendance_repo,
    repositories::sessions as session_repo,
    repositories::tokens as token_repo,
    state::AppState,
};

/// Creates a scheduled session. At most one session may exist per
/// (unit, date, time) identity tuple; the store constraint enforces it.
pub async fn create_schedule(
    state: &AppState,
    course_code: String,
    unit_code: String,
    scheduled_date: String,
    scheduled_time: String,
) -> Result<ClassSession> {
    let identity = SessionIdentity::new(&unit_code, &scheduled_date, &scheduled_time);
    let course_code = course_code.trim().to_lowercase();

    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    let created = session_repo::create(&tx, Uuid::new_v4(), &course_code, &identity).await;
    let session = match created {
        Ok(session) => session,
        Err(AppError::Database(e)) if is_unique_violation(&e) => {
            return Err(AppError::Validation(
                "Schedule already found for this unit at exact date and time. \
                 Remove current schedule to add a new one."
                    .to_string(),
            ));
        }
        Err(e) => return Err(e),
    };

    tx.commit().await?;

    tracing::info!(
        "✅ Schedule added: unit {} ({} {})",
        session.unit_code,
        session.scheduled_date,
        session.scheduled_time
    );

    Ok(session)
}

/// Lists a course's sessions, each with its attendance ledger.
pub async fn list_schedules(
    state: &AppState,
    course_code: &str,
) -> Result<Vec<(ClassSession, Vec<AttendanceEntry>)>> {
    let course_code = course_code.trim().to_lowercase();

    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    let sessions = session_repo::list_by_course(&tx, &course_code).await?;

    let mut schedules = Vec::with_capacity(sessions.len());
    for session in sessions {
        let entries = attendance_repo::list_for_session(&tx, session.id).await?;
        schedules.push((session, entries));
    }

    tx.commit().await?;

    Ok(schedules)
}

/// Deletes a session by identity and revokes any token bound to it, in one
/// transaction. Ledger entries cascade with the session row. Any token for
/// the unit still in a client's hands becomes permanently unresolvable.
pub async fn delete_schedule(state: &AppState, identity: &SessionIdentity) -> Result<()> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    session_repo::delete(&tx, identity)
        .await?
        .ok_or(AppError::NotFound)?;

    let revoked = token_repo::revoke_for_session(&tx, identity).await?;

    tx.commit().await?;

    tracing::info!(
        "✅ Schedule removed: unit {} ({} {}), {} token(s) revoked",
        identity.unit_code,
        identity.scheduled_date,
        identity.scheduled_time,
        revoked
    );

    Ok(())
}
