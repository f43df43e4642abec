//! Shared state for the kiosk HTTP layer.

use std::sync::{Arc, Mutex};

use crate::agent::Agent;
use crate::session::SessionClaims;

// ═══════════════════════════════════════════════════════════
// App state — shared context for the kiosk router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes. Cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub sessions: Arc<Mutex<SessionClaims>>,
    pub assets_base_url: String,
}

impl AppState {
    pub fn new(agent: Agent, assets_base_url: &str) -> Self {
        Self {
            agent: Arc::new(agent),
            sessions: Arc::new(Mutex::new(SessionClaims::new())),
            assets_base_url: assets_base_url.to_string(),
        }
    }

    /// Claims a stream session id. True means the id was already claimed,
    /// so the request replays a stream that has run or is running.
    pub fn claim_session(&self, session_id: &str) -> bool {
        match self.sessions.lock() {
            Ok(mut claims) => claims.claim(session_id),
            Err(poisoned) => poisoned.into_inner().claim(session_id),
        }
    }

    /// Marks a stream session finished, extending its duplicate window.
    pub fn release_session(&self, session_id: &str) {
        match self.sessions.lock() {
            Ok(mut claims) => claims.release(session_id),
            Err(poisoned) => poisoned.into_inner().release(session_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::gemini::MockGenerateClient;
    use crate::agent::toolbox::MockToolSource;

    fn state() -> AppState {
        let agent = Agent::new(
            Arc::new(MockGenerateClient::with_text("{}")),
            Arc::new(MockToolSource::with_result(serde_json::json!("[]"))),
        );
        AppState::new(agent, "https://assets.example.com")
    }

    #[test]
    fn first_claim_is_fresh_second_is_duplicate() {
        let state = state();
        assert!(!state.claim_session("session-1"));
        assert!(state.claim_session("session-1"));
    }

    #[test]
    fn release_keeps_session_claimed() {
        let state = state();
        assert!(!state.claim_session("session-1"));
        state.release_session("session-1");
        assert!(state.claim_session("session-1"));
    }

    #[test]
    fn clones_share_the_claim_store() {
        let state = state();
        let other = state.clone();
        assert!(!state.claim_session("session-1"));
        assert!(other.claim_session("session-1"));
    }
}
