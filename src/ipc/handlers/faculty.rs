use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

/// Faculty code -> offered majors. Backs the faculty-lookup endpoint the
/// registration form queries before a session exists, so it is not gated.
const FACULTIES: &[(&str, &[&str])] = &[
    (
        "FCIT",
        &[
            "Computer Science",
            "Software Engineering",
            "Information Technology",
        ],
    ),
    (
        "FBA",
        &["Business Administration", "Accounting", "Marketing"],
    ),
    (
        "FOE",
        &[
            "Electrical Engineering",
            "Mechanical Engineering",
            "Civil Engineering",
        ],
    ),
];

pub fn majors_for(faculty_code: &str) -> &'static [&'static str] {
    let code = faculty_code.trim().to_uppercase();
    FACULTIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, majors)| *majors)
        .unwrap_or(&[])
}

fn handle_majors(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(code) = req.params.get("facultyCode").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing facultyCode", None);
    };
    // Result is the plain array of major names.
    ok(&req.id, json!(majors_for(code)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "faculty.majors" => Some(handle_majors(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_total() {
        assert_eq!(majors_for("fcit"), majors_for("FCIT"));
        assert!(majors_for("FCIT").contains(&"Computer Science"));
        assert!(majors_for("NOPE").is_empty());
    }
}
