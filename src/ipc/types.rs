use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::Config;
use crate::session::SessionStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            workspace: None,
            db: None,
            sessions: SessionStore::default(),
            config,
        }
    }
}
