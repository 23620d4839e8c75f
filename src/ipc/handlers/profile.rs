use rusqlite::OptionalExtension;
use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_opt_str, get_required_str, require_conn, require_student, HandlerErr, StudentSession,
};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreError;

fn profile_get(
    state: &AppState,
    who: &StudentSession,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_conn(state)?;
    let row = conn
        .query_row(
            "SELECT student_no, faculty_code, session_type, first_name, last_name,
                    email, phone, major, enrollment_year, created_at
             FROM students
             WHERE id = ?",
            [who.student_id],
            |r| {
                Ok(json!({
                    "studentNo": r.get::<_, String>(0)?,
                    "facultyCode": r.get::<_, String>(1)?,
                    "sessionType": r.get::<_, String>(2)?,
                    "firstName": r.get::<_, String>(3)?,
                    "lastName": r.get::<_, String>(4)?,
                    "email": r.get::<_, String>(5)?,
                    "phone": r.get::<_, Option<String>>(6)?,
                    "major": r.get::<_, String>(7)?,
                    "enrollmentYear": r.get::<_, i64>(8)?,
                    "createdAt": r.get::<_, String>(9)?,
                }))
            },
        )
        .optional()
        .map_err(StoreError::from)?;
    row.ok_or_else(|| HandlerErr::not_found("student not found"))
}

struct ProfileUpdate {
    first_name: String,
    last_name: String,
    major: String,
    phone: Option<String>,
}

fn parse_update(params: &serde_json::Value) -> Result<ProfileUpdate, HandlerErr> {
    let first_name = get_required_str(params, "firstName")?.trim().to_string();
    let last_name = get_required_str(params, "lastName")?.trim().to_string();
    let major = get_required_str(params, "major")?.trim().to_string();
    if first_name.is_empty() || last_name.is_empty() || major.is_empty() {
        return Err(HandlerErr::bad_params(
            "firstName, lastName and major must not be empty",
        ));
    }
    Ok(ProfileUpdate {
        first_name,
        last_name,
        major,
        phone: get_opt_str(params, "phone"),
    })
}

fn handle_profile_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let who = match require_student(state, &req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match profile_get(state, &who) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_profile_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let who = match require_student(state, &req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let update = match parse_update(&req.params) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let result = {
        let conn = match require_conn(state) {
            Ok(c) => c,
            Err(e) => return e.response(&req.id),
        };
        conn.execute(
            "UPDATE students SET first_name = ?, last_name = ?, major = ?, phone = ? WHERE id = ?",
            (
                &update.first_name,
                &update.last_name,
                &update.major,
                &update.phone,
                who.student_id,
            ),
        )
        .map_err(StoreError::from)
    };
    if let Err(e) = result {
        return HandlerErr::from(e).response(&req.id);
    }

    let display_name = format!("{} {}", update.first_name, update.last_name);
    state.sessions.rename_student(who.student_id, &display_name);
    ok(&req.id, json!({ "ok": true, "studentName": display_name }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.get" => Some(handle_profile_get(state, req)),
        "profile.update" => Some(handle_profile_update(state, req)),
        _ => None,
    }
}
