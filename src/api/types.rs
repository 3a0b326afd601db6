//! Shared state for the API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;

use crate::agent::CapabilityRouter;
use crate::session::SessionState;

/// Header carrying the caller's session id. Absent means the shared
/// "default" session, which matches single-user browser use.
pub const SESSION_HEADER: &str = "x-session-id";

const DEFAULT_SESSION: &str = "default";

/// Shared context for all API routes: one conversation state per session
/// plus the capability router answering utterances.
#[derive(Clone)]
pub struct ApiContext {
    pub sessions: Arc<Mutex<HashMap<String, SessionState>>>,
    pub agent: Arc<CapabilityRouter>,
}

impl ApiContext {
    pub fn new(agent: Arc<CapabilityRouter>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            agent,
        }
    }
}

/// Session id from the request headers, defaulting when absent or unreadable.
pub fn session_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_SESSION.to_string())
}
