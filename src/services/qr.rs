use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::session::SessionIdentity,
    models::token::TokenClaims,
    repositories::attendance as attendance_repo,
    repositories::sessions as session_repo,
    repositories::tokens as token_repo,
    state::AppState,
};

/// Issues a fresh token for a unit and installs it as the unit's only live
/// token, superseding any prior one.
///
/// The raw token string is the sealed claims envelope; a server-generated
/// `tokenId` inside the claims makes it unique across all tokens ever
/// issued. Issuance never requires the session to exist yet - redemption
/// validates against the session store.
///
/// # Returns
///
/// A `Result` containing the sealed token string for transport.
pub async fn issue_token(
    state: &AppState,
    course_code: String,
    unit_code: String,
    lecturer: String,
    date: String,
    time: String,
) -> Result<String> {
    let identity = SessionIdentity::new(&unit_code, &date, &time);

    let claims = TokenClaims {
        course_code: course_code.trim().to_lowercase(),
        unit_code: identity.unit_code.clone(),
        lecturer: lecturer.trim().to_string(),
        date: identity.scheduled_date.clone(),
        time: identity.scheduled_time.clone(),
        token_id: Uuid::new_v4(),
    };

    let raw = state.envelope.seal(&claims)?;

    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;
    let token =
        token_repo::replace(&tx, &claims.course_code, &claims.lecturer, &raw, &identity).await?;
    tx.commit().await?;

    tracing::info!(
        "✅ Token issued for unit {} in {} ({} {})",
        token.unit_code,
        token.course_code,
        token.scheduled_date,
        token.scheduled_time
    );

    Ok(token.raw)
}

/// Redeems a scanned token for a student, appending to the session ledger.
///
/// The validation pipeline runs in order inside one transaction, each step
/// a hard gate:
///
/// 1. open the embedded token string (the outer transport envelope was
///    already opened by the handler) - malformed input is `Decryption`;
/// 2. registry lookup on (raw, unit, lecturer, session identity) - a miss
///    is `TokenInvalid`, covering wrong unit, wrong session, superseded or
///    forged tokens;
/// 3. session find - a miss is `SessionInvalid`, rejecting dangling
///    tokens whose session was deleted after issuance;
/// 4. ledger append - a duplicate student is `AlreadyMarked`.
///
/// Any failure rolls the transaction back whole.
pub async fn redeem_token(
    state: &AppState,
    raw_sealed_token: &str,
    student_id: &str,
) -> Result<()> {
    let raw = raw_sealed_token.trim();
    let claims: TokenClaims = state.envelope.open(raw)?;
    let identity = claims.session_identity();

    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    let token = token_repo::lookup(&tx, raw, &claims.lecturer, &identity)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    tracing::debug!(
        "🔎 Live token for unit {} (issued by {} at {}) matches",
        token.unit_code,
        token.lecturer,
        token.issued_at
    );

    let session = session_repo::find(&tx, &identity)
        .await?
        .ok_or(AppError::SessionInvalid)?;

    attendance_repo::append(&tx, session.id, student_id, raw).await?;

    tx.commit().await?;

    tracing::info!(
        "✅ Attendance recorded for student {} in unit {} ({} {})",
        student_id,
        identity.unit_code,
        identity.scheduled_date,
        identity.scheduled_time
    );

    Ok(())
}
