use attendanced::auth::hash_password;
use attendanced::db;
use serde_json::json;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};

struct Daemon {
    child: Child,
    base_url: String,
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn seed_workspace(db_path: &Path) {
    let conn = db::open_db(db_path).expect("open workspace");
    conn.execute(
        "INSERT INTO users(id, name, email, password_hash, role) VALUES
         ('admin1', 'Head Admin', 'admin@school.example', ?1, 'admin'),
         ('t1', 'Ms. Honey', 'honey@school.example', ?1, 'teacher')",
        [hash_password("password123")],
    )
    .expect("seed users");
    conn.execute(
        "INSERT INTO sessions(token, user_id) VALUES
         ('tok-admin', 'admin1'),
         ('tok-teacher', 't1')",
        [],
    )
    .expect("seed sessions");
    conn.execute(
        "INSERT INTO school_classes(id, name) VALUES('c1', 'Grade 1 - A')",
        [],
    )
    .expect("seed class");
    conn.execute(
        "INSERT INTO students(id, name, school_class_id) VALUES
         ('s1', 'Alice', 'c1'),
         ('s2', 'Bob', 'c1')",
        [],
    )
    .expect("seed students");
}

fn spawn_daemon(db_path: &Path) -> Daemon {
    let exe = env!("CARGO_BIN_EXE_attendanced");
    let mut child = Command::new(exe)
        .arg("--addr")
        .arg("127.0.0.1:0")
        .arg("--db")
        .arg(db_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendanced");

    let stdout = child.stdout.take().expect("child stdout");
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();
    reader.read_line(&mut line).expect("read listen line");
    let base_url = line
        .trim()
        .rsplit_once(' ')
        .map(|(_, url)| url.to_string())
        .expect("listen line carries the url");
    assert!(base_url.starts_with("http://"), "got: {}", line);

    Daemon { child, base_url }
}

#[test]
fn end_to_end_attendance_flow_over_http() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let db_path = workspace.path().join("attendance.sqlite3");
    seed_workspace(&db_path);
    let daemon = spawn_daemon(&db_path);
    let base = &daemon.base_url;
    let client = reqwest::blocking::Client::new();

    // No token -> 401 everywhere.
    let resp = client
        .get(format!("{}/classes", base))
        .send()
        .expect("request");
    assert_eq!(resp.status().as_u16(), 401);

    // Teacher submits a batch for an explicit date, twice (idempotent).
    let batch = json!({
        "date": "2024-03-01",
        "attendances": [
            { "student_id": "s1", "status": "Present" },
            { "student_id": "s2", "status": "Absent" },
        ]
    });
    for _ in 0..2 {
        let resp = client
            .post(format!("{}/attendance", base))
            .header("Authorization", "Bearer tok-teacher")
            .json(&batch)
            .send()
            .expect("submit");
        assert_eq!(resp.status().as_u16(), 201);
        let body: serde_json::Value = resp.json().expect("json");
        assert_eq!(
            body["message"].as_str(),
            Some("Attendance submitted successfully")
        );
    }

    // Roster for that date shows the recorded statuses.
    let resp = client
        .get(format!("{}/attendance/class/c1?date=2024-03-01", base))
        .header("Authorization", "Bearer tok-teacher")
        .send()
        .expect("roster");
    assert_eq!(resp.status().as_u16(), 200);
    let roster: serde_json::Value = resp.json().expect("json");
    let entries = roster.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"].as_str(), Some("Alice"));
    assert_eq!(entries[0]["status"].as_str(), Some("Present"));
    assert_eq!(entries[1]["status"].as_str(), Some("Absent"));

    // Student report.
    let resp = client
        .get(format!("{}/reports/student/s1", base))
        .header("Authorization", "Bearer tok-teacher")
        .send()
        .expect("student report");
    assert_eq!(resp.status().as_u16(), 200);
    let report: serde_json::Value = resp.json().expect("json");
    assert_eq!(report["student"]["class_name"].as_str(), Some("Grade 1 - A"));
    assert_eq!(report["summary"]["total_days"].as_i64(), Some(1));
    assert_eq!(report["summary"]["present_days"].as_i64(), Some(1));
    assert_eq!(report["summary"]["absent_days"].as_i64(), Some(0));
    assert_eq!(report["records"].as_array().map(|a| a.len()), Some(1));

    // Class-month report covers both students exactly once.
    let resp = client
        .get(format!(
            "{}/reports/class?school_class_id=c1&month=2024-03",
            base
        ))
        .header("Authorization", "Bearer tok-teacher")
        .send()
        .expect("class report");
    assert_eq!(resp.status().as_u16(), 200);
    let report: serde_json::Value = resp.json().expect("json");
    assert_eq!(report["class_name"].as_str(), Some("Grade 1 - A"));
    let rows = report["report"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["student_id"].as_str(), Some("s1"));
    assert_eq!(rows[0]["present_days"].as_i64(), Some(1));
    assert_eq!(rows[1]["student_id"].as_str(), Some("s2"));
    assert_eq!(rows[1]["absent_days"].as_i64(), Some(1));

    // Admin stats: admin only.
    let resp = client
        .get(format!("{}/admin/stats", base))
        .header("Authorization", "Bearer tok-teacher")
        .send()
        .expect("stats as teacher");
    assert_eq!(resp.status().as_u16(), 403);

    let resp = client
        .get(format!("{}/admin/stats", base))
        .header("Authorization", "Bearer tok-admin")
        .send()
        .expect("stats as admin");
    assert_eq!(resp.status().as_u16(), 200);
    let stats: serde_json::Value = resp.json().expect("json");
    assert_eq!(stats["total_students"].as_i64(), Some(2));
    assert_eq!(stats["total_teachers"].as_i64(), Some(1));
    // The seeded marks are for 2024-03-01, not today.
    assert_eq!(stats["attendance_rate_today"].as_i64(), Some(0));

    // Admin registers a teacher; the teacher role may not.
    let new_teacher = json!({
        "name": "Mr. Wickens",
        "email": "wickens@school.example",
        "password": "password123"
    });
    let resp = client
        .post(format!("{}/admin/register-teacher", base))
        .header("Authorization", "Bearer tok-teacher")
        .json(&new_teacher)
        .send()
        .expect("register as teacher");
    assert_eq!(resp.status().as_u16(), 403);

    let resp = client
        .post(format!("{}/admin/register-teacher", base))
        .header("Authorization", "Bearer tok-admin")
        .json(&new_teacher)
        .send()
        .expect("register as admin");
    assert_eq!(resp.status().as_u16(), 201);

    // Validation failures surface as 422 with the taxonomy code.
    let resp = client
        .post(format!("{}/attendance", base))
        .header("Authorization", "Bearer tok-teacher")
        .json(&json!({ "date": "2024-03-02", "attendances": [] }))
        .send()
        .expect("empty batch");
    assert_eq!(resp.status().as_u16(), 422);
    let body: serde_json::Value = resp.json().expect("json");
    assert_eq!(body["error"]["code"].as_str(), Some("validation"));

    // Unknown routes are 404.
    let resp = client
        .get(format!("{}/no/such/route", base))
        .header("Authorization", "Bearer tok-teacher")
        .send()
        .expect("unknown route");
    assert_eq!(resp.status().as_u16(), 404);
}
