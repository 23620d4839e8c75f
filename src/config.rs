use std::env;
use std::path::PathBuf;

/// Back-office credential pair. Defaults match the legacy deployment; override
/// via `PORTAL_ADMIN_USER` / `PORTAL_ADMIN_PASSWORD` in real installs.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// When set, the database is opened at startup instead of waiting for a
    /// `workspace.select` request.
    pub data_dir: Option<PathBuf>,
    /// Period tag stamped onto new registrations.
    pub current_semester: String,
    pub admin: AdminCredentials,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            data_dir: env::var_os("PORTAL_DATA_DIR").map(PathBuf::from),
            current_semester: env::var("PORTAL_CURRENT_SEMESTER")
                .unwrap_or_else(|_| "Fall 2024".to_string()),
            admin: AdminCredentials {
                username: env::var("PORTAL_ADMIN_USER").unwrap_or_else(|_| "admin".to_string()),
                password: env::var("PORTAL_ADMIN_PASSWORD")
                    .unwrap_or_else(|_| "admin123".to_string()),
            },
        }
    }
}
