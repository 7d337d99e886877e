use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_core::{Error, Kind};

/// Maps a service error onto the HTTP surface. The error's outermost
/// explicit kind picks the status; the full operation chain goes out as the
/// message.
pub fn error_to_response(err: &Error) -> axum::response::Response {
    let kind = err.kind();
    let status = match kind {
        Kind::InvalidArgument => StatusCode::BAD_REQUEST,
        Kind::NotFound => StatusCode::NOT_FOUND,
        Kind::Internal | Kind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, kind.as_str(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": {
                "code": code,
                "message": message.into(),
            }
        })),
    )
        .into_response()
}
