use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde::Deserialize;

use crate::{
    crypto::envelope::SealedRequest,
    error::{AppError, Result},
    models::session::SessionIdentity,
    handlers::respond,
    services::schedules as schedule_service,
    state::AppState,
    validation::fields,
};

/// The decrypted payload for creating a schedule.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchedulePayload {
    pub course_code: Option<String>,
    pub unit_code: Option<String>,
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
}

/// The decrypted payload for listing a course's schedules.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListSchedulesPayload {
    pub course_code: Option<String>,
}

/// The decrypted payload for deleting a schedule by full identity.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSchedulePayload {
    pub unit_code: Option<String>,
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
}

/// Creates a scheduled session.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<SealedRequest>,
) -> Result<Response> {
    match create_inner(&state, req).await {
        Ok(()) => Ok(respond::sealed(
            &state.envelope,
            StatusCode::CREATED,
            &sonic_rs::json!({
                "success": true,
                "message": "Schedule added successfully"
            }),
        )),
        Err(e) => Ok(respond::sealed_error(&state.envelope, e)),
    }
}

async fn create_inner(state: &AppState, req: SealedRequest) -> Result<()> {
    let payload: CreateSchedulePayload = state.envelope.open(&req.body)?;

    let course_code = fields::require_str("courseCode", payload.course_code)?;
    let unit_code = fields::require_str("unitCode", payload.unit_code)?;
    let scheduled_date = fields::require_str("scheduledDate", payload.scheduled_date)?;
    let scheduled_time = fields::require_str("scheduledTime", payload.scheduled_time)?;

    schedule_service::create_schedule(state, course_code, unit_code, scheduled_date, scheduled_time)
        .await?;
    Ok(())
}

/// Lists a course's sessions with their attendance ledgers.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Json(req): Json<SealedRequest>,
) -> Result<Response> {
    match list_inner(&state, req).await {
        Ok(schedules) if schedules.is_empty() => Ok(respond::sealed(
            &state.envelope,
            StatusCode::NOT_FOUND,
            &sonic_rs::json!({
                "success": false,
                "message": "Schedules not found"
            }),
        )),
        Ok(schedules) => Ok(respond::sealed(
            &state.envelope,
            StatusCode::OK,
            &sonic_rs::json!({
                "success": true,
                "schedules": schedules
            }),
        )),
        Err(e) => Ok(respond::sealed_error(&state.envelope, e)),
    }
}

async fn list_inner(state: &AppState, req: SealedRequest) -> Result<Vec<sonic_rs::Value>> {
    let payload: ListSchedulesPayload = state.envelope.open(&req.body)?;
    let course_code = fields::require_str("courseCode", payload.course_code)?;

    let schedules = schedule_service::list_schedules(state, &course_code).await?;

    Ok(schedules
        .into_iter()
        .map(|(session, entries)| {
            let attendance: Vec<_> = entries
                .into_iter()
                .map(|entry| {
                    sonic_rs::json!({
                        "student": entry.student_id,
                        "tokenRaw": entry.token_raw,
                        "recordedAt": entry.recorded_at.to_rfc3339()
                    })
                })
                .collect();

            sonic_rs::json!({
                "courseCode": session.course_code,
                "unitCode": session.unit_code,
                "scheduledDate": session.scheduled_date,
                "scheduledTime": session.scheduled_time,
                "attendance": attendance
            })
        })
        .collect())
}

/// Deletes a session and revokes its token.
#[axum::debug_handler]
pub async fn remove(
    State(state): State<AppState>,
    Json(req): Json<SealedRequest>,
) -> Result<Response> {
    match remove_inner(&state, req).await {
        Ok(()) => Ok(respond::sealed(
            &state.envelope,
            StatusCode::OK,
            &sonic_rs::json!({
                "success": true,
                "message": "Schedule removed successfully"
            }),
        )),
        Err(AppError::NotFound) => Ok(respond::sealed(
            &state.envelope,
            StatusCode::NOT_FOUND,
            &sonic_rs::json!({
                "success": false,
                "message": "Schedule not found"
            }),
        )),
        Err(e) => Ok(respond::sealed_error(&state.envelope, e)),
    }
}

async fn remove_inner(state: &AppState, req: SealedRequest) -> Result<()> {
    let payload: DeleteSchedulePayload = state.envelope.open(&req.body)?;

    let unit_code = fields::require_str("unitCode", payload.unit_code)?;
    let scheduled_date = fields::require_str("scheduledDate", payload.scheduled_date)?;
    let scheduled_time = fields::require_str("scheduledTime", payload.scheduled_time)?;

    let identity = SessionIdentity::new(&unit_code, &scheduled_date, &scheduled_time);
    schedule_service::delete_schedule(state, &identity).await
}
