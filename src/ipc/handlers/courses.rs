use rusqlite::Connection;
use serde_json::json;

use crate::enroll;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_required_i64, require_conn, require_student, HandlerErr, StudentSession,
};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreError;

fn course_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<serde_json::Value> {
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
}

const COURSE_COLUMNS: &str = "c.id, c.course_code, c.course_name, c.instructor,
    c.schedule_days, c.schedule_time, c.credits, c.max_capacity,
    c.current_enrollment, c.program";

fn list(conn: &Connection, who: &StudentSession) -> Result<serde_json::Value, HandlerErr> {
    let mut all_stmt = conn
        .prepare(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses c ORDER BY c.course_code"
        ))
        .map_err(StoreError::from)?;
    let all_courses = all_stmt
        .query_map([], course_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;

    let mut mine_stmt = conn
        .prepare(&format!(
            "SELECT {COURSE_COLUMNS}
             FROM courses c
             JOIN registrations r ON c.id = r.course_id
             WHERE r.student_id = ?
             ORDER BY c.course_code"
        ))
        .map_err(StoreError::from)?;
    let my_courses = mine_stmt
        .query_map([who.student_id], course_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;

    Ok(json!({ "allCourses": all_courses, "myCourses": my_courses }))
}

fn timetable(conn: &Connection, who: &StudentSession) -> Result<serde_json::Value, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT c.course_code, c.course_name, c.instructor,
                    c.schedule_days, c.schedule_time, c.credits, r.semester
             FROM courses c
             JOIN registrations r ON c.id = r.course_id
             WHERE r.student_id = ?
             ORDER BY c.schedule_days, c.schedule_time",
        )
        .map_err(StoreError::from)?;
    let entries = stmt
        .query_map([who.student_id], |r| {
            Ok(json!({
                "courseCode": r.get::<_, String>(0)?,
                "courseName": r.get::<_, String>(1)?,
                "instructor": r.get::<_, String>(2)?,
                "scheduleDays": r.get::<_, String>(3)?,
                "scheduleTime": r.get::<_, String>(4)?,
                "credits": r.get::<_, i64>(5)?,
                "semester": r.get::<_, String>(6)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;
    Ok(json!({ "entries": entries }))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let who = match require_student(state, &req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let conn = match require_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match list(conn, &who) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let who = match require_student(state, &req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let course_id = match get_required_i64(&req.params, "courseId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let semester = state.config.current_semester.clone();
    let conn = match require_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match enroll::register_for_course(conn, who.student_id, course_id, &semester) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(error) => HandlerErr::from(error).response(&req.id),
    }
}

fn handle_drop(state: &mut AppState, req: &Request) -> serde_json::Value {
    let who = match require_student(state, &req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let course_id = match get_required_i64(&req.params, "courseId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let conn = match require_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match enroll::drop_course(conn, who.student_id, course_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(error) => HandlerErr::from(error).response(&req.id),
    }
}

fn handle_timetable(state: &mut AppState, req: &Request) -> serde_json::Value {
    let who = match require_student(state, &req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let conn = match require_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match timetable(conn, &who) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_list(state, req)),
        "courses.register" => Some(handle_register(state, req)),
        "courses.drop" => Some(handle_drop(state, req)),
        "courses.timetable" => Some(handle_timetable(state, req)),
        _ => None,
    }
}
