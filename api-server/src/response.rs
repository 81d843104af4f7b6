use actix_web::{http::StatusCode, HttpResponse};
use ghost_replay_core::error::VerifyError;

pub(crate) fn json_error_with_code(
    status: StatusCode,
    message: impl Into<String>,
    error_code: Option<&str>,
) -> HttpResponse {
    let mut body = serde_json::json!({
        "success": false,
        "error": message.into(),
    });
    if let Some(code) = error_code {
        body["error_code"] = serde_json::Value::String(code.to_string());
    }
    HttpResponse::build(status).json(body)
}

/// Tampering (bad checksum, undecodable payload) maps to 400; runs that
/// decode but do not reproduce map to 422.
pub(crate) fn verify_error_status(err: &VerifyError) -> StatusCode {
    match err.category() {
        ghost_replay_core::ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
        ghost_replay_core::ErrorCategory::Implausible => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub(crate) fn json_verify_error(err: &VerifyError) -> HttpResponse {
    HttpResponse::build(verify_error_status(err)).json(serde_json::json!({
        "success": false,
        "error": err.to_string(),
        "error_code": err.error_code(),
        "category": err.category().as_str(),
    }))
}
