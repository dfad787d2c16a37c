use crate::error::ApiError;
use crate::http::types::ApiResponse;
use serde_json::json;

pub fn error_response(err: &ApiError) -> ApiResponse {
    ApiResponse::new(
        err.status(),
        json!({
            "error": {
                "code": err.code(),
                "message": err.to_string(),
            }
        }),
    )
}

pub fn not_found_route() -> ApiResponse {
    ApiResponse::new(
        404,
        json!({
            "error": {
                "code": "not_found",
                "message": "no such route",
            }
        }),
    )
}

pub fn bad_json(message: impl Into<String>) -> ApiResponse {
    ApiResponse::new(
        400,
        json!({
            "error": {
                "code": "bad_json",
                "message": message.into(),
            }
        }),
    )
}
