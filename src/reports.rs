use crate::error::{ApiError, ApiResult};
use crate::recorder::Status;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct StudentInfo {
    pub id: String,
    pub name: String,
    pub school_class_id: String,
    pub class_name: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Summary {
    pub total_days: i64,
    pub present_days: i64,
    pub absent_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerRecord {
    pub id: String,
    pub student_id: String,
    pub teacher_id: String,
    pub attendance_date: String,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub student: StudentInfo,
    pub summary: Summary,
    pub records: Vec<LedgerRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassMonthRow {
    pub student_id: String,
    pub student_name: String,
    pub present_days: i64,
    pub absent_days: i64,
    pub total_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassMonthReport {
    pub class_name: String,
    pub report: Vec<ClassMonthRow>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminStats {
    pub total_students: i64,
    pub total_teachers: i64,
    pub attendance_rate_today: i64,
}

/// Records and day counts for one student over an inclusive date range.
/// Omitted bounds mean "everything"; a range that matches nothing is a valid
/// all-zero report, not an error. Records come back most-recent-first.
pub fn student_report(
    conn: &Connection,
    student_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ApiResult<StudentReport> {
    let student = conn
        .query_row(
            "SELECT s.id, s.name, s.school_class_id, c.name
             FROM students s
             JOIN school_classes c ON c.id = s.school_class_id
             WHERE s.id = ?",
            [student_id],
            |r| {
                Ok(StudentInfo {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    school_class_id: r.get(2)?,
                    class_name: r.get(3)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| ApiError::not_found("student not found"))?;

    let start_str = start.map(|d| d.format("%Y-%m-%d").to_string());
    let end_str = end.map(|d| d.format("%Y-%m-%d").to_string());

    // ISO dates compare correctly as text, so the bounds work as plain
    // string comparisons.
    let mut stmt = conn.prepare(
        "SELECT id, student_id, teacher_id, attendance_date, status
         FROM attendances
         WHERE student_id = ?1
           AND (?2 IS NULL OR attendance_date >= ?2)
           AND (?3 IS NULL OR attendance_date <= ?3)
         ORDER BY attendance_date DESC",
    )?;
    let raw = stmt
        .query_map((student_id, &start_str, &end_str), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(raw.len());
    for (id, student_id, teacher_id, attendance_date, status) in raw {
        records.push(LedgerRecord {
            id,
            student_id,
            teacher_id,
            attendance_date,
            status: Status::parse(&status)?,
        });
    }

    let total_days = records.len() as i64;
    let present_days = records
        .iter()
        .filter(|r| r.status == Status::Present)
        .count() as i64;
    let summary = Summary {
        total_days,
        present_days,
        absent_days: total_days - present_days,
    };

    Ok(StudentReport {
        student,
        summary,
        records,
    })
}

/// Per-student day counts for one calendar month, covering every current
/// member of the class. Students without records that month get an all-zero
/// row; a class without students yields an empty report. Rows come back in a
/// stable order (name, then id).
pub fn class_month_report(
    conn: &Connection,
    class_id: &str,
    month: &str,
) -> ApiResult<ClassMonthReport> {
    let (first_day, last_day) = month_bounds(month)?;

    let class_name: String = conn
        .query_row(
            "SELECT name FROM school_classes WHERE id = ?",
            [class_id],
            |r| r.get(0),
        )
        .optional()?
        .ok_or_else(|| ApiError::validation("class not found"))?;

    let mut stmt = conn.prepare(
        "SELECT id, name FROM students WHERE school_class_id = ? ORDER BY name, id",
    )?;
    let students = stmt
        .query_map([class_id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT a.student_id,
                COUNT(*),
                SUM(CASE WHEN a.status = 'Present' THEN 1 ELSE 0 END)
         FROM attendances a
         JOIN students s ON s.id = a.student_id
         WHERE s.school_class_id = ?1
           AND a.attendance_date BETWEEN ?2 AND ?3
         GROUP BY a.student_id",
    )?;
    let counted = stmt
        .query_map((class_id, &first_day, &last_day), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_student: HashMap<String, (i64, i64)> = HashMap::new();
    for (student_id, total, present) in counted {
        by_student.insert(student_id, (total, present));
    }

    let report = students
        .into_iter()
        .map(|(student_id, student_name)| {
            let (total_days, present_days) =
                by_student.get(&student_id).copied().unwrap_or((0, 0));
            ClassMonthRow {
                student_id,
                student_name,
                present_days,
                absent_days: total_days - present_days,
                total_days,
            }
        })
        .collect();

    Ok(ClassMonthReport { class_name, report })
}

/// Headline numbers for the admin dashboard, computed fresh on every call.
pub fn admin_stats(conn: &Connection, today: NaiveDate) -> ApiResult<AdminStats> {
    let total_students: i64 =
        conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
    let total_teachers: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'teacher'",
        [],
        |r| r.get(0),
    )?;

    let today_str = today.format("%Y-%m-%d").to_string();
    let (total_today, present_today): (i64, i64) = conn.query_row(
        "SELECT COUNT(*),
                SUM(CASE WHEN status = 'Present' THEN 1 ELSE 0 END)
         FROM attendances
         WHERE attendance_date = ?",
        [&today_str],
        |r| Ok((r.get(0)?, r.get::<_, Option<i64>>(1)?.unwrap_or(0))),
    )?;

    let attendance_rate_today = if total_today > 0 {
        ((present_today as f64 / total_today as f64) * 100.0).round() as i64
    } else {
        0
    };

    Ok(AdminStats {
        total_students,
        total_teachers,
        attendance_rate_today,
    })
}

/// Strict `YYYY-MM` → inclusive (first day, last day) as ISO date strings.
fn month_bounds(month: &str) -> ApiResult<(String, String)> {
    let malformed = || ApiError::validation("month must be YYYY-MM");
    let (y, m) = month.split_once('-').ok_or_else(malformed)?;
    if y.len() != 4 || m.len() != 2 {
        return Err(malformed());
    }
    let year: i32 = y.parse().map_err(|_| malformed())?;
    let month_num: u32 = m.parse().map_err(|_| malformed())?;
    let first = NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(malformed)?;
    let next_month = if month_num == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_num + 1, 1)
    }
    .ok_or_else(malformed)?;
    let last = next_month.pred_opt().ok_or_else(malformed)?;
    Ok((
        first.format("%Y-%m-%d").to_string(),
        last.format("%Y-%m-%d").to_string(),
    ))
}
