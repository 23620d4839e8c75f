mod auth;
mod chatbot;
mod config;
mod db;
mod enroll;
mod ipc;
mod sampler;
mod session;
mod store;

use std::io::{self, BufRead, Write};

use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();
    // Logs go to stderr; stdout carries only protocol responses.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portald=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cfg = config::Config::from_env();
    let mut state = ipc::AppState::new(cfg);

    if let Some(dir) = state.config.data_dir.clone() {
        match db::open_db(&dir) {
            Ok(conn) => {
                tracing::info!(path = %dir.display(), "opened portal database");
                state.workspace = Some(dir);
                state.db = Some(conn);
            }
            Err(e) => {
                tracing::error!(error = %e, path = %dir.display(), "failed to open portal database");
            }
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; emit a bare error line instead.
                tracing::warn!(error = %e, "dropped malformed request line");
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
