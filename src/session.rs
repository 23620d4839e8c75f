use std::collections::HashMap;

use uuid::Uuid;

/// Authenticated principal attached to a session token. Handlers receive the
/// resolved value explicitly; there is no ambient logged-in flag.
#[derive(Debug, Clone)]
pub enum Identity {
    Student {
        student_id: i64,
        student_no: String,
        display_name: String,
    },
    Admin {
        display_name: String,
    },
}

/// In-memory token -> identity map. Tokens are opaque v4 UUIDs and live for
/// the daemon's lifetime unless revoked by logout.
#[derive(Default)]
pub struct SessionStore {
    tokens: HashMap<String, Identity>,
}

impl SessionStore {
    pub fn issue(&mut self, identity: Identity) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), identity);
        token
    }

    pub fn get(&self, token: &str) -> Option<&Identity> {
        self.tokens.get(token)
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }

    /// Profile updates change the display name; keep any live sessions for
    /// that student in step.
    pub fn rename_student(&mut self, student_id: i64, display_name: &str) {
        for identity in self.tokens.values_mut() {
            if let Identity::Student {
                student_id: sid,
                display_name: name,
                ..
            } = identity
            {
                if *sid == student_id {
                    *name = display_name.to_string();
                }
            }
        }
    }
}
