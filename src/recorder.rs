use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Attendance status as transmitted on the wire ("Present" / "Absent").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }

    pub fn parse(s: &str) -> ApiResult<Status> {
        match s {
            "Present" => Ok(Status::Present),
            "Absent" => Ok(Status::Absent),
            other => Err(ApiError::validation(format!(
                "status must be Present or Absent, got {:?}",
                other
            ))),
        }
    }
}

/// One validated entry of a submission batch.
#[derive(Debug, Clone)]
pub struct Mark {
    pub student_id: String,
    pub status: Status,
}

/// A student row annotated with the status recorded for one date, if any.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub status: Option<Status>,
}

/// Apply a batch of marks for one calendar date as a single unit.
///
/// The whole batch commits or none of it does: an unknown student id anywhere
/// in the list aborts the transaction with the ledger unchanged. Each mark is
/// an upsert keyed on (student_id, attendance_date); resubmitting the same
/// batch produces the same ledger state, and a later submission for the same
/// date overwrites both the status and the recording teacher.
///
/// Duplicate student ids within one batch are rejected outright rather than
/// resolved by list order.
pub fn submit(
    conn: &Connection,
    caller: &Caller,
    date: NaiveDate,
    marks: &[Mark],
) -> ApiResult<usize> {
    if marks.is_empty() {
        return Err(ApiError::validation("attendances must not be empty"));
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for mark in marks {
        if !seen.insert(mark.student_id.as_str()) {
            return Err(ApiError::validation(format!(
                "duplicate student id in batch: {}",
                mark.student_id
            )));
        }
    }

    let date_str = date.format("%Y-%m-%d").to_string();
    let tx = conn.unchecked_transaction()?;
    for mark in marks {
        let exists = tx
            .query_row(
                "SELECT 1 FROM students WHERE id = ?",
                [&mark.student_id],
                |r| r.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !exists {
            // tx dropped without commit; nothing written survives.
            return Err(ApiError::validation(format!(
                "unknown student id: {}",
                mark.student_id
            )));
        }

        tx.execute(
            "INSERT INTO attendances(id, student_id, teacher_id, attendance_date, status)
             VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(student_id, attendance_date) DO UPDATE SET
               status = excluded.status,
               teacher_id = excluded.teacher_id",
            (
                Uuid::new_v4().to_string(),
                &mark.student_id,
                &caller.user_id,
                &date_str,
                mark.status.as_str(),
            ),
        )?;
    }
    tx.commit()?;
    Ok(marks.len())
}

/// Students of a class, ordered by name, each annotated with the status
/// recorded for `date` (None when the student is unmarked that day).
pub fn class_roster(
    conn: &Connection,
    class_id: &str,
    date: NaiveDate,
) -> ApiResult<Vec<RosterEntry>> {
    let class_exists = conn
        .query_row(
            "SELECT 1 FROM school_classes WHERE id = ?",
            [class_id],
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if !class_exists {
        return Err(ApiError::not_found("class not found"));
    }

    let date_str = date.format("%Y-%m-%d").to_string();
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, a.status
         FROM students s
         LEFT JOIN attendances a
           ON a.student_id = s.id AND a.attendance_date = ?1
         WHERE s.school_class_id = ?2
         ORDER BY s.name, s.id",
    )?;
    let entries = stmt
        .query_map((&date_str, class_id), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut roster = Vec::with_capacity(entries.len());
    for (id, name, status) in entries {
        let status = match status {
            Some(s) => Some(Status::parse(&s)?),
            None => None,
        };
        roster.push(RosterEntry { id, name, status });
    }
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn teacher_caller() -> Caller {
        Caller {
            user_id: "t-1".to_string(),
            name: "Ms. Frizzle".to_string(),
            role: Role::Teacher,
        }
    }

    #[test]
    fn status_parses_exact_literals_only() {
        assert_eq!(Status::parse("Present").unwrap(), Status::Present);
        assert_eq!(Status::parse("Absent").unwrap(), Status::Absent);
        assert!(Status::parse("present").is_err());
        assert!(Status::parse("Late").is_err());
    }

    #[test]
    fn empty_batch_is_rejected_before_touching_the_db() {
        let conn = crate::db::open_in_memory().expect("schema");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err = submit(&conn, &teacher_caller(), date, &[]).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn duplicate_student_in_batch_is_rejected() {
        let conn = crate::db::open_in_memory().expect("schema");
        conn.execute(
            "INSERT INTO school_classes(id, name) VALUES('c1', 'Grade 1 - A')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO students(id, name, school_class_id) VALUES('s1', 'Alice', 'c1')",
            [],
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let marks = vec![
            Mark {
                student_id: "s1".to_string(),
                status: Status::Present,
            },
            Mark {
                student_id: "s1".to_string(),
                status: Status::Absent,
            },
        ];
        let err = submit(&conn, &teacher_caller(), date, &marks).unwrap_err();
        assert_eq!(err.code(), "validation");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM attendances", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
