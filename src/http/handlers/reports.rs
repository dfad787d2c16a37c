use crate::auth::Caller;
use crate::error::ApiResult;
use crate::http::types::{ApiRequest, ApiResponse, Method};
use crate::reports;
use rusqlite::Connection;
use serde_json::json;

use super::{optional_date_param, required_query_param};

pub fn try_handle(
    conn: &Connection,
    caller: &Caller,
    req: &ApiRequest,
) -> Option<ApiResult<ApiResponse>> {
    let segs: Vec<&str> = req.path.iter().map(String::as_str).collect();
    match (req.method, segs.as_slice()) {
        (Method::Get, ["reports", "student", student_id]) => {
            Some(student_report(conn, student_id, req))
        }
        (Method::Get, ["reports", "class"]) => Some(class_report(conn, req)),
        (Method::Get, ["admin", "stats"]) => Some(admin_stats(conn, caller)),
        _ => None,
    }
}

fn student_report(conn: &Connection, student_id: &str, req: &ApiRequest) -> ApiResult<ApiResponse> {
    let start = optional_date_param(req, "start_date")?;
    let end = optional_date_param(req, "end_date")?;
    let report = reports::student_report(conn, student_id, start, end)?;
    Ok(ApiResponse::new(200, json!(report)))
}

fn class_report(conn: &Connection, req: &ApiRequest) -> ApiResult<ApiResponse> {
    let class_id = required_query_param(req, "school_class_id")?;
    let month = required_query_param(req, "month")?;
    let report = reports::class_month_report(conn, class_id, month)?;
    Ok(ApiResponse::new(200, json!(report)))
}

fn admin_stats(conn: &Connection, caller: &Caller) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    let today = chrono::Local::now().date_naive();
    let stats = reports::admin_stats(conn, today)?;
    Ok(ApiResponse::new(200, json!(stats)))
}
