use rusqlite::Connection;
use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::{require_conn, require_student, HandlerErr, StudentSession};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreError;

fn list(conn: &Connection, who: &StudentSession) -> Result<serde_json::Value, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT c.course_code, c.course_name, c.credits,
                    g.grade, g.semester, g.academic_year
             FROM grades g
             JOIN courses c ON g.course_id = c.id
             WHERE g.student_id = ?
             ORDER BY g.academic_year DESC, g.semester DESC",
        )
        .map_err(StoreError::from)?;
    let grades = stmt
        .query_map([who.student_id], |r| {
            Ok(json!({
                "courseCode": r.get::<_, String>(0)?,
                "courseName": r.get::<_, String>(1)?,
                "credits": r.get::<_, i64>(2)?,
                "grade": r.get::<_, String>(3)?,
                "semester": r.get::<_, String>(4)?,
                "academicYear": r.get::<_, String>(5)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)?;
    Ok(json!({ "grades": grades }))
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

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(handle_list(state, req)),
        _ => None,
    }
}
