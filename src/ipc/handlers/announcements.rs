use rusqlite::Connection;
use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::{
    require_conn, require_identity, require_student, HandlerErr, StudentSession,
};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreError;

/// How many announcements the dashboard shows.
const DASHBOARD_ANNOUNCEMENTS: i64 = 3;

fn announcement_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<serde_json::Value> {
    Ok(json!({
        "announcementId": r.get::<_, i64>(0)?,
        "title": r.get::<_, String>(1)?,
        "content": r.get::<_, String>(2)?,
        "author": r.get::<_, String>(3)?,
        "isImportant": r.get::<_, i64>(4)? != 0,
        "createdAt": r.get::<_, String>(5)?,
    }))
}

fn recent_announcements(
    conn: &Connection,
    limit: Option<i64>,
) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT id, title, content, author, is_important, created_at
             FROM announcements
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .map_err(StoreError::from)?;
    stmt.query_map([limit.unwrap_or(-1)], announcement_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(StoreError::from)
        .map_err(HandlerErr::from)
}

fn dashboard(conn: &Connection, who: &StudentSession) -> Result<serde_json::Value, HandlerErr> {
    let announcements = recent_announcements(conn, Some(DASHBOARD_ANNOUNCEMENTS))?;
    let registered_courses: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM registrations WHERE student_id = ?",
            [who.student_id],
            |r| r.get(0),
        )
        .map_err(StoreError::from)?;
    Ok(json!({
        "studentName": who.display_name,
        "studentNo": who.student_no,
        "registeredCourses": registered_courses,
        "announcements": announcements
    }))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = require_identity(state, &req.params) {
        return e.response(&req.id);
    }
    let limit = req.params.get("limit").and_then(|v| v.as_i64());
    let conn = match require_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match recent_announcements(conn, limit) {
        Ok(announcements) => ok(&req.id, json!({ "announcements": announcements })),
        Err(error) => error.response(&req.id),
    }
}

fn handle_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let who = match require_student(state, &req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let conn = match require_conn(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    match dashboard(conn, &who) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "announcements.list" => Some(handle_list(state, req)),
        "portal.dashboard" => Some(handle_dashboard(state, req)),
        _ => None,
    }
}
