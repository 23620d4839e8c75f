use rusqlite::OptionalExtension;
use serde_json::json;

use crate::auth;
use crate::enroll::{self, NewStudentForm};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, get_required_str, require_conn, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::session::Identity;
use crate::store::StoreError;

fn parse_form(params: &serde_json::Value) -> Result<NewStudentForm, HandlerErr> {
    // enrollmentYear is accepted as a number or a numeric string, matching
    // what form-encoded clients send.
    let enrollment_year = match params.get("enrollmentYear") {
        Some(v) if v.is_i64() => v.as_i64().unwrap_or(0),
        Some(v) => v
            .as_str()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(0),
        None => 0,
    };

    Ok(NewStudentForm {
        faculty_code: get_required_str(params, "facultyCode")?,
        session_type: get_required_str(params, "sessionType")?,
        student_no: get_opt_str(params, "studentNo"),
        first_name: get_required_str(params, "firstName")?,
        last_name: get_required_str(params, "lastName")?,
        email: get_required_str(params, "email")?,
        password: get_required_str(params, "password")?,
        confirm_password: get_required_str(params, "confirmPassword")?,
        phone: get_opt_str(params, "phone"),
        major: get_required_str(params, "major")?,
        enrollment_year,
    })
}

fn register(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_conn(state)?;
    let form = parse_form(params)?;
    let registered = enroll::register_student(
        conn,
        &mut rand::thread_rng(),
        &state.config.current_semester,
        &form,
    )?;
    Ok(json!({
        "studentId": registered.student_id,
        "studentNo": registered.student_no
    }))
}

struct LoginRow {
    student_id: i64,
    student_no: String,
    display_name: String,
    password_hash: String,
}

fn login(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_no = get_required_str(params, "studentNo")?
        .trim()
        .to_uppercase();
    let password = get_required_str(params, "password")?;

    let row = {
        let conn = require_conn(state)?;
        conn.query_row(
            "SELECT id, student_no, first_name || ' ' || last_name, password_hash
             FROM students
             WHERE student_no = ?",
            [&student_no],
            |r| {
                Ok(LoginRow {
                    student_id: r.get(0)?,
                    student_no: r.get(1)?,
                    display_name: r.get(2)?,
                    password_hash: r.get(3)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)?
    };

    // One rejection message for both unknown id and wrong password.
    let Some(row) = row else {
        return Err(HandlerErr::new(
            "invalid_credentials",
            "invalid student id or password",
        ));
    };
    if !auth::verify_password(&password, &row.password_hash) {
        return Err(HandlerErr::new(
            "invalid_credentials",
            "invalid student id or password",
        ));
    }

    let session = state.sessions.issue(Identity::Student {
        student_id: row.student_id,
        student_no: row.student_no.clone(),
        display_name: row.display_name.clone(),
    });
    tracing::info!(student_no = %row.student_no, "student logged in");
    Ok(json!({
        "session": session,
        "studentNo": row.student_no,
        "studentName": row.display_name
    }))
}

fn logout(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let token = get_required_str(params, "session")?;
    let revoked = state.sessions.revoke(&token);
    Ok(json!({ "ok": revoked }))
}

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    match register(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    match login(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    match logout(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.register" => Some(handle_register(state, req)),
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        _ => None,
    }
}
