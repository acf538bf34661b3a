use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One logged interaction: when it happened, what the user asked, and which
/// function was matched.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub timestamp: String,
    pub prompt: String,
    pub function: String,
}

/// In-memory interaction log keyed by session id. Unbounded and never
/// persisted; records live for the lifetime of the process.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Vec<SessionRecord>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one user interaction for context
    pub async fn append(&self, session_id: &str, prompt: &str, function: &str) {
        let record = SessionRecord {
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            prompt: prompt.to_string(),
            function: function.to_string(),
        };
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(record);
    }

    /// Full conversation history; empty for unknown session ids
    pub async fn history(&self, session_id: &str) -> Vec<SessionRecord> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned().unwrap_or_default()
    }
}
