use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::http::types::{ApiRequest, ApiResponse, Method};
use crate::recorder::{self, Mark, Status};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use super::{optional_date_param, parse_date};

#[derive(Debug, Deserialize)]
struct SubmitBody {
    attendances: Vec<SubmitEntry>,
    /// Omitted on the normal path; the mark applies to today.
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitEntry {
    student_id: String,
    status: String,
}

pub fn try_handle(
    conn: &Connection,
    caller: &Caller,
    req: &ApiRequest,
) -> Option<ApiResult<ApiResponse>> {
    let segs: Vec<&str> = req.path.iter().map(String::as_str).collect();
    match (req.method, segs.as_slice()) {
        (Method::Post, ["attendance"]) => Some(submit(conn, caller, req)),
        (Method::Get, ["attendance", "class", class_id]) => {
            Some(class_roster(conn, class_id, req))
        }
        _ => None,
    }
}

fn submit(conn: &Connection, caller: &Caller, req: &ApiRequest) -> ApiResult<ApiResponse> {
    if !caller.can_record_attendance() {
        return Err(ApiError::Forbidden(
            "caller may not record attendance".to_string(),
        ));
    }

    let body: SubmitBody = serde_json::from_value(req.body.clone())
        .map_err(|e| ApiError::validation(format!("malformed attendance body: {}", e)))?;
    let date = match body.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };

    let mut marks = Vec::with_capacity(body.attendances.len());
    for entry in &body.attendances {
        marks.push(Mark {
            student_id: entry.student_id.clone(),
            status: Status::parse(&entry.status)?,
        });
    }

    let written = recorder::submit(conn, caller, date, &marks)?;
    tracing::info!(
        teacher = %caller.user_id,
        %date,
        rows = written,
        "attendance batch recorded"
    );
    Ok(ApiResponse::new(
        201,
        json!({ "message": "Attendance submitted successfully" }),
    ))
}

fn class_roster(conn: &Connection, class_id: &str, req: &ApiRequest) -> ApiResult<ApiResponse> {
    let date = optional_date_param(req, "date")?.unwrap_or_else(|| chrono::Local::now().date_naive());
    let roster = recorder::class_roster(conn, class_id, date)?;
    Ok(ApiResponse::new(200, json!(roster)))
}
