use super::error::{error_response, not_found_route};
use super::handlers;
use super::types::{ApiRequest, ApiResponse};
use crate::auth;
use crate::error::ApiError;
use rusqlite::Connection;

/// Authenticate, then walk the handler families until one claims the route.
/// Every route requires a caller; role checks live in the handlers so the
/// transport stays a pure dispatcher.
pub fn dispatch(conn: &Connection, req: &ApiRequest) -> ApiResponse {
    let caller = match req.bearer.as_deref() {
        Some(token) => match auth::resolve_token(conn, token) {
            Ok(caller) => caller,
            Err(e) => return error_response(&e),
        },
        None => {
            return error_response(&ApiError::Unauthenticated(
                "missing bearer token".to_string(),
            ))
        }
    };

    if let Some(resp) = handlers::attendance::try_handle(conn, &caller, req) {
        return finish(resp);
    }
    if let Some(resp) = handlers::reports::try_handle(conn, &caller, req) {
        return finish(resp);
    }
    if let Some(resp) = handlers::directory::try_handle(conn, &caller, req) {
        return finish(resp);
    }

    not_found_route()
}

fn finish(result: Result<ApiResponse, ApiError>) -> ApiResponse {
    match result {
        Ok(resp) => resp,
        Err(e) => error_response(&e),
    }
}
