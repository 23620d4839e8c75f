use rusqlite::Connection;
use serde_json::json;

use crate::enroll::{EnrollError, RegisterError};
use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::session::Identity;
use crate::store::StoreError;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { field } => HandlerErr {
                code: "duplicate",
                message: format!("a record with this {field} already exists"),
                details: Some(json!({ "field": field })),
            },
            StoreError::Db(inner) => {
                tracing::error!(error = %inner, "database query failed");
                HandlerErr::new("db_query_failed", "operation failed")
            }
        }
    }
}

impl From<RegisterError> for HandlerErr {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::EmailTaken => HandlerErr {
                code: "duplicate",
                message: e.to_string(),
                details: Some(json!({ "field": "email" })),
            },
            RegisterError::StudentNoTaken => HandlerErr {
                code: "duplicate",
                message: e.to_string(),
                details: Some(json!({ "field": "student_no" })),
            },
            RegisterError::Store(inner) => HandlerErr::from(inner),
            other => HandlerErr::new("validation_failed", other.to_string()),
        }
    }
}

impl From<EnrollError> for HandlerErr {
    fn from(e: EnrollError) -> Self {
        match e {
            EnrollError::AlreadyRegistered => {
                HandlerErr::new("duplicate_registration", e.to_string())
            }
            EnrollError::CourseFull => HandlerErr::new("course_full", e.to_string()),
            EnrollError::CourseNotFound => HandlerErr::not_found(e.to_string()),
            EnrollError::NotRegistered => HandlerErr::not_found(e.to_string()),
            EnrollError::Store(inner) => HandlerErr::from(inner),
        }
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_opt_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}

pub fn get_required_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_bool(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub fn require_conn(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

/// The student identity a handler operates on behalf of, resolved from the
/// `session` param. No ambient logged-in state exists anywhere else.
#[derive(Debug, Clone)]
pub struct StudentSession {
    pub student_id: i64,
    pub student_no: String,
    pub display_name: String,
}

pub fn require_student(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<StudentSession, HandlerErr> {
    let token = params
        .get("session")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing session"))?;
    match state.sessions.get(token) {
        Some(Identity::Student {
            student_id,
            student_no,
            display_name,
        }) => Ok(StudentSession {
            student_id: *student_id,
            student_no: student_no.clone(),
            display_name: display_name.clone(),
        }),
        _ => Err(HandlerErr::new("unauthorized", "student login required")),
    }
}

/// Any authenticated principal, student or admin.
pub fn require_identity<'a>(
    state: &'a AppState,
    params: &serde_json::Value,
) -> Result<&'a Identity, HandlerErr> {
    let token = params
        .get("session")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing session"))?;
    state
        .sessions
        .get(token)
        .ok_or_else(|| HandlerErr::new("unauthorized", "login required"))
}

pub fn require_admin(state: &AppState, params: &serde_json::Value) -> Result<String, HandlerErr> {
    let token = params
        .get("session")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing session"))?;
    match state.sessions.get(token) {
        Some(Identity::Admin { display_name }) => Ok(display_name.clone()),
        _ => Err(HandlerErr::new("unauthorized", "admin login required")),
    }
}
