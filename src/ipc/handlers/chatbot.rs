use serde_json::json;

use crate::chatbot;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, require_student};
use crate::ipc::types::{AppState, Request};

fn handle_ask(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = require_student(state, &req.params) {
        return e.response(&req.id);
    }
    let message = match get_required_str(&req.params, "message") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    ok(&req.id, json!({ "response": chatbot::reply(&message) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "chatbot.ask" => Some(handle_ask(state, req)),
        _ => None,
    }
}
