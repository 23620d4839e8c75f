#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde_json::{json, Value};

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_portald"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("PORTAL_DATA_DIR")
        .env_remove("PORTAL_ADMIN_USER")
        .env_remove("PORTAL_ADMIN_PASSWORD")
        .env_remove("PORTAL_CURRENT_SEMESTER")
        .spawn()
        .expect("spawn portald");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> Value {
    let line = serde_json::to_string(&json!({
        "id": id,
        "method": method,
        "params": params
    }))
    .expect("encode request");
    writeln!(stdin, "{}", line).expect("write request");
    let mut resp = String::new();
    reader.read_line(&mut resp).expect("read response");
    serde_json::from_str(&resp).expect("parse response")
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> Value {
    let resp = request(stdin, reader, id, method, params);
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected ok response: {resp}"
    );
    resp.get("result").cloned().unwrap_or(Value::Null)
}

pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> Value {
    let resp = request(stdin, reader, id, method, params);
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "expected error response: {resp}"
    );
    resp.get("error").cloned().unwrap_or(Value::Null)
}

pub fn select_workspace(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) {
    let _ = request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
}

/// Registers a student with sane defaults and returns the allocated
/// identifier (e.g. `FCIT/M/001`).
pub fn register_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    email: &str,
    major: &str,
) -> String {
    let result = request_ok(
        stdin,
        reader,
        "reg",
        "auth.register",
        json!({
            "facultyCode": "FCIT",
            "sessionType": "M",
            "firstName": "Test",
            "lastName": "Student",
            "email": email,
            "password": "secret123",
            "confirmPassword": "secret123",
            "major": major,
            "enrollmentYear": 2024
        }),
    );
    result
        .get("studentNo")
        .and_then(|v| v.as_str())
        .expect("studentNo in register result")
        .to_string()
}

/// Registers and logs a student in; returns (session token, student no).
pub fn login_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    email: &str,
    major: &str,
) -> (String, String) {
    let student_no = register_student(stdin, reader, email, major);
    let result = request_ok(
        stdin,
        reader,
        "login",
        "auth.login",
        json!({ "studentNo": student_no, "password": "secret123" }),
    );
    let session = result
        .get("session")
        .and_then(|v| v.as_str())
        .expect("session token")
        .to_string();
    (session, student_no)
}

pub fn login_admin(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) -> String {
    let result = request_ok(
        stdin,
        reader,
        "admin-login",
        "admin.login",
        json!({ "username": "admin", "password": "admin123" }),
    );
    result
        .get("session")
        .and_then(|v| v.as_str())
        .expect("admin session token")
        .to_string()
}
