use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::crypto::envelope::{Envelope, SealedResponse};
use crate::error::AppError;

/// Seals a payload into the single-field response shape the protocol uses
/// for every operation.
pub fn sealed<T: Serialize>(envelope: &Envelope, status: StatusCode, value: &T) -> Response {
    match envelope.seal(value) {
        Ok(body) => (status, Json(SealedResponse { body })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Translates an error into the sealed error shape. Only the summary
/// message crosses the boundary; the detail was already logged when the
/// status was derived.
pub fn sealed_error(envelope: &Envelope, err: AppError) -> Response {
    let (status, message) = err.status_and_message();
    sealed(
        envelope,
        status,
        &sonic_rs::json!({
            "success": false,
            "message": message
        }),
    )
}

/// Liveness probe.
pub async fn root() -> &'static str {
    "API is running..."
}

/// Fallback for unmatched routes.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        r#"{"message":"Request not supported."}"#,
    )
        .into_response()
}
