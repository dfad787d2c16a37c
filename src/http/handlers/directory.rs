use crate::auth::Caller;
use crate::directory;
use crate::error::{ApiError, ApiResult};
use crate::http::types::{ApiRequest, ApiResponse, Method};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct TeacherBody {
    name: String,
    email: String,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StudentBody {
    name: String,
    school_class_id: String,
}

pub fn try_handle(
    conn: &Connection,
    caller: &Caller,
    req: &ApiRequest,
) -> Option<ApiResult<ApiResponse>> {
    let segs: Vec<&str> = req.path.iter().map(String::as_str).collect();
    match (req.method, segs.as_slice()) {
        (Method::Get, ["classes"]) => Some(list_classes(conn)),
        (Method::Post, ["admin", "register-teacher"]) => Some(register_teacher(conn, caller, req)),
        (Method::Post, ["admin", "register-student"]) => Some(register_student(conn, caller, req)),
        (Method::Get, ["admin", "teachers"]) => Some(list_teachers(conn, caller)),
        (Method::Get, ["admin", "students"]) => Some(list_students(conn, caller)),
        (Method::Put, ["admin", "teachers", id]) => Some(update_teacher(conn, caller, id, req)),
        (Method::Put, ["admin", "students", id]) => Some(update_student(conn, caller, id, req)),
        (Method::Delete, ["admin", "teachers", id]) => Some(delete_teacher(conn, caller, id)),
        (Method::Delete, ["admin", "students", id]) => Some(delete_student(conn, caller, id)),
        _ => None,
    }
}

fn list_classes(conn: &Connection) -> ApiResult<ApiResponse> {
    let classes = directory::list_classes(conn)?;
    Ok(ApiResponse::new(200, json!(classes)))
}

fn register_teacher(conn: &Connection, caller: &Caller, req: &ApiRequest) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    let body: TeacherBody = parse_body(req)?;
    let password = body
        .password
        .as_deref()
        .ok_or_else(|| ApiError::validation("missing password"))?;
    directory::register_teacher(conn, &body.name, &body.email, password)?;
    Ok(ApiResponse::new(
        201,
        json!({ "message": "Teacher registered successfully." }),
    ))
}

fn register_student(conn: &Connection, caller: &Caller, req: &ApiRequest) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    let body: StudentBody = parse_body(req)?;
    directory::register_student(conn, &body.name, &body.school_class_id)?;
    Ok(ApiResponse::new(
        201,
        json!({ "message": "Student registered successfully." }),
    ))
}

fn list_teachers(conn: &Connection, caller: &Caller) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    let teachers = directory::list_teachers(conn)?;
    Ok(ApiResponse::new(200, json!(teachers)))
}

fn list_students(conn: &Connection, caller: &Caller) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    let students = directory::list_students(conn)?;
    Ok(ApiResponse::new(200, json!(students)))
}

fn update_teacher(
    conn: &Connection,
    caller: &Caller,
    teacher_id: &str,
    req: &ApiRequest,
) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    let body: TeacherBody = parse_body(req)?;
    let updated = directory::update_teacher(conn, teacher_id, &body.name, &body.email)?;
    Ok(ApiResponse::new(200, json!(updated)))
}

fn update_student(
    conn: &Connection,
    caller: &Caller,
    student_id: &str,
    req: &ApiRequest,
) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    let body: StudentBody = parse_body(req)?;
    let updated = directory::update_student(conn, student_id, &body.name, &body.school_class_id)?;
    Ok(ApiResponse::new(200, json!(updated)))
}

fn delete_teacher(conn: &Connection, caller: &Caller, teacher_id: &str) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    directory::delete_teacher(conn, teacher_id)?;
    Ok(ApiResponse::new(
        200,
        json!({ "message": "Teacher deleted." }),
    ))
}

fn delete_student(conn: &Connection, caller: &Caller, student_id: &str) -> ApiResult<ApiResponse> {
    caller.require_admin()?;
    directory::delete_student(conn, student_id)?;
    Ok(ApiResponse::new(
        200,
        json!({ "message": "Student deleted." }),
    ))
}

fn parse_body<T: serde::de::DeserializeOwned>(req: &ApiRequest) -> ApiResult<T> {
    serde_json::from_value(req.body.clone())
        .map_err(|e| ApiError::validation(format!("malformed body: {}", e)))
}
