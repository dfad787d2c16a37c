//! Registration and roster maintenance for the directory store: classes,
//! students, and teacher accounts. Plain create/update/delete with uniqueness
//! and reference checks; the attendance ledger itself is only touched here
//! when a student is removed.

use crate::auth::{hash_password, Role};
use crate::error::{ApiError, ApiResult};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ClassRow {
    pub id: String,
    pub name: String,
    pub student_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub school_class_id: String,
    pub class_name: String,
}

pub fn create_class(conn: &Connection, name: &str) -> ApiResult<ClassRow> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("class name must not be empty"));
    }
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO school_classes(id, name) VALUES(?, ?)",
        (&id, name),
    )?;
    Ok(ClassRow {
        id,
        name: name.to_string(),
        student_count: 0,
    })
}

pub fn list_classes(conn: &Connection) -> ApiResult<Vec<ClassRow>> {
    // Correlated subquery rather than a join, to keep the count immune to
    // future one-to-many additions.
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name,
                (SELECT COUNT(*) FROM students s WHERE s.school_class_id = c.id)
         FROM school_classes c
         ORDER BY c.name, c.id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(ClassRow {
                id: r.get(0)?,
                name: r.get(1)?,
                student_count: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn register_teacher(
    conn: &Connection,
    name: &str,
    email: &str,
    password: &str,
) -> ApiResult<TeacherRow> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let email = normalize_email(email)?;
    if password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }
    if email_taken(conn, &email, None)? {
        return Err(ApiError::validation("email already registered"));
    }

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users(id, name, email, password_hash, role) VALUES(?, ?, ?, ?, ?)",
        (
            &id,
            name,
            &email,
            hash_password(password),
            Role::Teacher.as_str(),
        ),
    )?;
    Ok(TeacherRow {
        id,
        name: name.to_string(),
        email,
        role: Role::Teacher.as_str().to_string(),
    })
}

pub fn list_teachers(conn: &Connection) -> ApiResult<Vec<TeacherRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, role FROM users WHERE role = 'teacher' ORDER BY name, id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(TeacherRow {
                id: r.get(0)?,
                name: r.get(1)?,
                email: r.get(2)?,
                role: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_teacher(
    conn: &Connection,
    teacher_id: &str,
    name: &str,
    email: &str,
) -> ApiResult<TeacherRow> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let email = normalize_email(email)?;
    if !teacher_exists(conn, teacher_id)? {
        return Err(ApiError::not_found("teacher not found"));
    }
    if email_taken(conn, &email, Some(teacher_id))? {
        return Err(ApiError::validation("email already registered"));
    }
    conn.execute(
        "UPDATE users SET name = ?, email = ? WHERE id = ?",
        (name, &email, teacher_id),
    )?;
    Ok(TeacherRow {
        id: teacher_id.to_string(),
        name: name.to_string(),
        email,
        role: Role::Teacher.as_str().to_string(),
    })
}

/// Remove a teacher account and its sessions. Ledger rows the teacher
/// recorded are left untouched; attribution outlives the account.
pub fn delete_teacher(conn: &Connection, teacher_id: &str) -> ApiResult<()> {
    if !teacher_exists(conn, teacher_id)? {
        return Err(ApiError::not_found("teacher not found"));
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM sessions WHERE user_id = ?", [teacher_id])?;
    tx.execute(
        "DELETE FROM users WHERE id = ? AND role = 'teacher'",
        [teacher_id],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn register_student(
    conn: &Connection,
    name: &str,
    school_class_id: &str,
) -> ApiResult<StudentRow> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let class_name = class_name(conn, school_class_id)?
        .ok_or_else(|| ApiError::validation("unknown school_class_id"))?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(id, name, school_class_id) VALUES(?, ?, ?)",
        (&id, name, school_class_id),
    )?;
    Ok(StudentRow {
        id,
        name: name.to_string(),
        school_class_id: school_class_id.to_string(),
        class_name,
    })
}

pub fn list_students(conn: &Connection) -> ApiResult<Vec<StudentRow>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.school_class_id, c.name
         FROM students s
         JOIN school_classes c ON c.id = s.school_class_id
         ORDER BY s.name, s.id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(StudentRow {
                id: r.get(0)?,
                name: r.get(1)?,
                school_class_id: r.get(2)?,
                class_name: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Rename a student and/or move them to another class.
pub fn update_student(
    conn: &Connection,
    student_id: &str,
    name: &str,
    school_class_id: &str,
) -> ApiResult<StudentRow> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    if !student_exists(conn, student_id)? {
        return Err(ApiError::not_found("student not found"));
    }
    let class_name = class_name(conn, school_class_id)?
        .ok_or_else(|| ApiError::validation("unknown school_class_id"))?;
    conn.execute(
        "UPDATE students SET name = ?, school_class_id = ? WHERE id = ?",
        (name, school_class_id, student_id),
    )?;
    Ok(StudentRow {
        id: student_id.to_string(),
        name: name.to_string(),
        school_class_id: school_class_id.to_string(),
        class_name,
    })
}

/// Remove a student and the ledger rows it owns, in one transaction.
pub fn delete_student(conn: &Connection, student_id: &str) -> ApiResult<()> {
    if !student_exists(conn, student_id)? {
        return Err(ApiError::not_found("student not found"));
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendances WHERE student_id = ?", [student_id])?;
    tx.execute("DELETE FROM students WHERE id = ?", [student_id])?;
    tx.commit()?;
    Ok(())
}

fn normalize_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_ascii_lowercase();
    let plausible = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !plausible {
        return Err(ApiError::validation("email is not valid"));
    }
    Ok(email)
}

fn email_taken(conn: &Connection, email: &str, exclude_id: Option<&str>) -> ApiResult<bool> {
    let taken = conn
        .query_row(
            "SELECT 1 FROM users WHERE email = ?1 AND (?2 IS NULL OR id != ?2)",
            (email, exclude_id),
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    Ok(taken)
}

fn teacher_exists(conn: &Connection, id: &str) -> ApiResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM users WHERE id = ? AND role = 'teacher'",
            [id],
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    Ok(found)
}

fn student_exists(conn: &Connection, id: &str) -> ApiResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| {
            r.get::<_, i64>(0)
        })
        .optional()?
        .is_some();
    Ok(found)
}

fn class_name(conn: &Connection, id: &str) -> ApiResult<Option<String>> {
    let name = conn
        .query_row("SELECT name FROM school_classes WHERE id = ?", [id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(name)
}
