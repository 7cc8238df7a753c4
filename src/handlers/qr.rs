use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde::Deserialize;

use crate::{
    crypto::envelope::SealedRequest,
    error::Result,
    handlers::respond,
    services::qr as qr_service,
    state::AppState,
    validation::fields,
};

/// The decrypted payload for token issuance.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenPayload {
    pub course_code: Option<String>,
    pub unit_code: Option<String>,
    pub lecturer: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// The decrypted payload for token redemption. `rawSealedToken` is itself
/// a sealed string: outer transport envelope, inner token envelope.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RedeemTokenPayload {
    pub raw_sealed_token: Option<String>,
    pub student_id: Option<String>,
}

/// Issues a rotating QR token for a scheduled session.
#[axum::debug_handler]
pub async fn issue(
    State(state): State<AppState>,
    Json(req): Json<SealedRequest>,
) -> Result<Response> {
    match issue_inner(&state, req).await {
        Ok(raw) => Ok(respond::sealed(
            &state.envelope,
            StatusCode::CREATED,
            &sonic_rs::json!({
                "success": true,
                "token": raw,
                "message": "QR issued"
            }),
        )),
        Err(e) => Ok(respond::sealed_error(&state.envelope, e)),
    }
}

async fn issue_inner(state: &AppState, req: SealedRequest) -> Result<String> {
    let payload: IssueTokenPayload = state.envelope.open(&req.body)?;

    let course_code = fields::require_str("courseCode", payload.course_code)?;
    let unit_code = fields::require_str("unitCode", payload.unit_code)?;
    let lecturer = fields::require_str("lecturer", payload.lecturer)?;
    let date = fields::require_str("date", payload.date)?;
    let time = fields::require_str("time", payload.time)?;

    tracing::debug!("📝 Issue request for unit {} by {}", unit_code, lecturer);

    qr_service::issue_token(state, course_code, unit_code, lecturer, date, time).await
}

/// Redeems a scanned token, marking the student present.
#[axum::debug_handler]
pub async fn redeem(
    State(state): State<AppState>,
    Json(req): Json<SealedRequest>,
) -> Result<Response> {
    match redeem_inner(&state, req).await {
        Ok(()) => Ok(respond::sealed(
            &state.envelope,
            StatusCode::OK,
            &sonic_rs::json!({
                "success": true,
                "message": "Attendance Confirmed"
            }),
        )),
        Err(e) => Ok(respond::sealed_error(&state.envelope, e)),
    }
}

async fn redeem_inner(state: &AppState, req: SealedRequest) -> Result<()> {
    let payload: RedeemTokenPayload = state.envelope.open(&req.body)?;

    let raw_sealed_token = fields::require_str("rawSealedToken", payload.raw_sealed_token)?;
    let student_id = fields::require_str("studentId", payload.student_id)?;

    tracing::debug!("📝 Redemption attempt by student {}", student_id);

    qr_service::redeem_token(state, &raw_sealed_token, &student_id).await
}
