use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;

use crate::enroll;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_bool, get_required_i64, get_required_str, require_admin, require_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::session::Identity;
use crate::store::StoreError;

const ADMIN_DISPLAY_NAME: &str = "University Administrator";

fn login(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let username = get_required_str(params, "username")?;
    let password = get_required_str(params, "password")?;
    if !state.config.admin.matches(&username, &password) {
        return Err(HandlerErr::new("invalid_credentials", "invalid credentials"));
    }
    let session = state.sessions.issue(Identity::Admin {
        display_name: ADMIN_DISPLAY_NAME.to_string(),
    });
    tracing::info!("admin logged in");
    Ok(json!({
        "session": session,
        "adminName": ADMIN_DISPLAY_NAME,
        "role": "super_admin"
    }))
}

fn dashboard(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let count = |table: &str| -> Result<i64, HandlerErr> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .map_err(StoreError::from)
            .map_err(HandlerErr::from)
    };
    Ok(json!({
        "totalStudents": count("students")?,
        "totalCourses": count("courses")?,
        "totalAnnouncements": count("announcements")?,
        "totalRegistrations": count("registrations")?,
    }))
}

fn students_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    // Correlated subquery instead of a join to avoid double-counting.
    let mut stmt = conn
        .prepare(
            "SELECT s.id, s.student_no, s.first_name, s.last_name, s.email,
                    s.major, s.enrollment_year, s.created_at,
                    (SELECT COUNT(*) FROM registrations r WHERE r.student_id = s.id)
             FROM students s
             ORDER BY s.created_at DESC, s.id DESC",
        )
        .map_err(StoreError::from)?;
    let students = stmt
        .query_map([], |r| {
            Ok(json!({
                "studentId": r.get::<_, i64>(0)?,
                "studentNo": r.get::<_, String>(1)?,
                "firstName": r.get::<_, String>(2)?,
                "lastName": r.get::<_, String>(3)?,
                "email": r.get::<_, String>(4)?,
                "major": r.get::<_, String>(5)?,
                "enrollmentYear": r.get::<_, i64>(6)?,
                "createdAt": r.get::<_, String>(7)?,
                "registeredCourses": r.get::<_, i64>(8)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;
    Ok(json!({ "students": students }))
}

/// Deletes a student; registrations and grades go with it via the cascade.
/// Enrollment counters on the courses the student held are recomputed in the
/// same transaction so they keep tracking live rows.
fn students_delete(conn: &Connection, student_id: i64) -> Result<serde_json::Value, HandlerErr> {
    let tx = conn.unchecked_transaction().map_err(StoreError::from)?;

    let mut stmt = tx
        .prepare("SELECT DISTINCT course_id FROM registrations WHERE student_id = ?")
        .map_err(StoreError::from)?;
    let course_ids = stmt
        .query_map([student_id], |r| r.get::<_, i64>(0))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;
    drop(stmt);

    let removed = tx
        .execute("DELETE FROM students WHERE id = ?", [student_id])
        .map_err(StoreError::from)?;
    if removed == 0 {
        return Err(HandlerErr::not_found("student not found"));
    }
    for course_id in course_ids {
        enroll::refresh_enrollment(&tx, course_id)?;
    }

    tx.commit().map_err(StoreError::from)?;
    Ok(json!({ "ok": true }))
}

fn courses_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT id, course_code, course_name, instructor, schedule_days,
                    schedule_time, credits, max_capacity, current_enrollment, program
             FROM courses
             ORDER BY course_code",
        )
        .map_err(StoreError::from)?;
    let courses = stmt
        .query_map([], |r| {
            Ok(json!({
                "courseId": r.get::<_, i64>(0)?,
                "courseCode": r.get::<_, String>(1)?,
                "courseName": r.get::<_, String>(2)?,
                "instructor": r.get::<_, String>(3)?,
                "scheduleDays": r.get::<_, String>(4)?,
                "scheduleTime": r.get::<_, String>(5)?,
                "credits": r.get::<_, i64>(6)?,
                "maxCapacity": r.get::<_, i64>(7)?,
                "currentEnrollment": r.get::<_, i64>(8)?,
                "program": r.get::<_, Option<String>>(9)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;
    Ok(json!({ "courses": courses }))
}

fn courses_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let course_code = get_required_str(params, "courseCode")?
        .trim()
        .to_uppercase();
    let course_name = get_required_str(params, "courseName")?.trim().to_string();
    let instructor = get_required_str(params, "instructor")?.trim().to_string();
    let schedule_days = get_required_str(params, "scheduleDays")?;
    let schedule_time = get_required_str(params, "scheduleTime")?;
    let credits = get_required_i64(params, "credits")?;
    let max_capacity = get_required_i64(params, "maxCapacity")?;
    let program = params
        .get("program")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if course_code.is_empty() || course_name.is_empty() {
        return Err(HandlerErr::bad_params(
            "courseCode and courseName must not be empty",
        ));
    }
    if credits <= 0 || max_capacity <= 0 {
        return Err(HandlerErr::bad_params(
            "credits and maxCapacity must be positive",
        ));
    }

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO courses(
            course_code, course_name, instructor, schedule_days, schedule_time,
            credits, max_capacity, current_enrollment, program, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        (
            &course_code,
            &course_name,
            &instructor,
            &schedule_days,
            &schedule_time,
            credits,
            max_capacity,
            &program,
            &now,
        ),
    )
    .map_err(StoreError::from)?;
    Ok(json!({ "courseId": conn.last_insert_rowid(), "courseCode": course_code }))
}

fn courses_delete(conn: &Connection, course_id: i64) -> Result<serde_json::Value, HandlerErr> {
    let removed = conn
        .execute("DELETE FROM courses WHERE id = ?", [course_id])
        .map_err(StoreError::from)?;
    if removed == 0 {
        return Err(HandlerErr::not_found("course not found"));
    }
    Ok(json!({ "ok": true }))
}

fn announcements_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let title = get_required_str(params, "title")?.trim().to_string();
    let content = get_required_str(params, "content")?.trim().to_string();
    let author = get_required_str(params, "author")?.trim().to_string();
    let is_important = get_bool(params, "isImportant");
    if title.is_empty() || content.is_empty() || author.is_empty() {
        return Err(HandlerErr::bad_params(
            "title, content and author must not be empty",
        ));
    }

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO announcements(title, content, author, is_important, created_at)
         VALUES(?, ?, ?, ?, ?)",
        (&title, &content, &author, is_important as i64, &now),
    )
    .map_err(StoreError::from)?;
    Ok(json!({ "announcementId": conn.last_insert_rowid() }))
}

fn announcements_delete(
    conn: &Connection,
    announcement_id: i64,
) -> Result<serde_json::Value, HandlerErr> {
    let removed = conn
        .execute("DELETE FROM announcements WHERE id = ?", [announcement_id])
        .map_err(StoreError::from)?;
    if removed == 0 {
        return Err(HandlerErr::not_found("announcement not found"));
    }
    Ok(json!({ "ok": true }))
}

fn grades_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT g.id, s.student_no, s.first_name, s.last_name,
                    c.course_code, c.course_name,
                    g.grade, g.semester, g.academic_year, g.assigned_at
             FROM grades g
             JOIN students s ON g.student_id = s.id
             JOIN courses c ON g.course_id = c.id
             ORDER BY g.academic_year DESC, g.semester DESC, g.id DESC",
        )
        .map_err(StoreError::from)?;
    let grades = stmt
        .query_map([], |r| {
            Ok(json!({
                "gradeId": r.get::<_, i64>(0)?,
                "studentNo": r.get::<_, String>(1)?,
                "firstName": r.get::<_, String>(2)?,
                "lastName": r.get::<_, String>(3)?,
                "courseCode": r.get::<_, String>(4)?,
                "courseName": r.get::<_, String>(5)?,
                "grade": r.get::<_, String>(6)?,
                "semester": r.get::<_, String>(7)?,
                "academicYear": r.get::<_, String>(8)?,
                "assignedAt": r.get::<_, String>(9)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;
    Ok(json!({ "grades": grades }))
}

/// Upsert on the (student, course, semester, year) key: assigning twice for
/// the same period overwrites the letter instead of stacking rows.
fn grades_assign(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_i64(params, "studentId")?;
    let course_id = get_required_i64(params, "courseId")?;
    let grade = get_required_str(params, "grade")?.trim().to_uppercase();
    let semester = get_required_str(params, "semester")?;
    let academic_year = get_required_str(params, "academicYear")?;
    if grade.is_empty() {
        return Err(HandlerErr::bad_params("grade must not be empty"));
    }

    let student_exists: Option<i64> = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(StoreError::from)?;
    if student_exists.is_none() {
        return Err(HandlerErr::not_found("student not found"));
    }
    let course_exists: Option<i64> = conn
        .query_row("SELECT 1 FROM courses WHERE id = ?", [course_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(StoreError::from)?;
    if course_exists.is_none() {
        return Err(HandlerErr::not_found("course not found"));
    }

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO grades(student_id, course_id, grade, semester, academic_year, assigned_at)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(student_id, course_id, semester, academic_year) DO UPDATE SET
           grade = excluded.grade,
           assigned_at = excluded.assigned_at",
        (student_id, course_id, &grade, &semester, &academic_year, &now),
    )
    .map_err(StoreError::from)?;
    Ok(json!({ "ok": true }))
}

fn grades_delete(conn: &Connection, grade_id: i64) -> Result<serde_json::Value, HandlerErr> {
    let removed = conn
        .execute("DELETE FROM grades WHERE id = ?", [grade_id])
        .map_err(StoreError::from)?;
    if removed == 0 {
        return Err(HandlerErr::not_found("grade not found"));
    }
    Ok(json!({ "ok": true }))
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    match login(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let token = match get_required_str(&req.params, "session") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let revoked = state.sessions.revoke(&token);
    ok(&req.id, json!({ "ok": revoked }))
}

/// Gate + connection boilerplate shared by every admin query method.
fn with_admin_conn(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    if let Err(e) = require_admin(state, &req.params) {
        return e.response(&req.id);
    }
    let conn = match require_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admin.login" => Some(handle_login(state, req)),
        "admin.logout" => Some(handle_logout(state, req)),
        "admin.dashboard" => Some(with_admin_conn(state, req, |conn, _| dashboard(conn))),
        "admin.students.list" => Some(with_admin_conn(state, req, |conn, _| students_list(conn))),
        "admin.students.delete" => Some(with_admin_conn(state, req, |conn, params| {
            students_delete(conn, get_required_i64(params, "studentId")?)
        })),
        "admin.courses.list" => Some(with_admin_conn(state, req, |conn, _| courses_list(conn))),
        "admin.courses.create" => Some(with_admin_conn(state, req, courses_create)),
        "admin.courses.delete" => Some(with_admin_conn(state, req, |conn, params| {
            courses_delete(conn, get_required_i64(params, "courseId")?)
        })),
        "admin.announcements.create" => Some(with_admin_conn(state, req, announcements_create)),
        "admin.announcements.delete" => Some(with_admin_conn(state, req, |conn, params| {
            announcements_delete(conn, get_required_i64(params, "announcementId")?)
        })),
        "admin.grades.list" => Some(with_admin_conn(state, req, |conn, _| grades_list(conn))),
        "admin.grades.assign" => Some(with_admin_conn(state, req, grades_assign)),
        "admin.grades.delete" => Some(with_admin_conn(state, req, |conn, params| {
            grades_delete(conn, get_required_i64(params, "gradeId")?)
        })),
        _ => None,
    }
}
