//! SSE endpoint that runs the agent pipeline for one question.
//!
//! Each request drives one full run. Rendered section fragments stream out
//! as named events (`presidents`, `leaders`, `scriptures`, `summary`),
//! failures surface as `server-error` notices, and a final `done` event
//! with payload `complete` tells the page to close its `EventSource`.
//!
//! Key properties:
//! - A session id streams at most once per claim window; replays get an
//!   immediate `done` instead of a second run.
//! - The claim is released however the stream ends, including a client
//!   disconnect that drops it mid-run.
//! - Questions are re-classified here even though `/ask` already filters,
//!   since the stream URL is callable directly.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_stream::stream;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use serde::Deserialize;

use crate::agent::{classify_content, redirect_response, ContentClassification};
use crate::render;
use crate::session::SessionClaims;
use crate::stream::SectionTracker;

use super::types::AppState;

/// Query parameters for `GET /api/stream`.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub session: String,
}

/// Releases a session claim when dropped, so the duplicate window extends
/// whether the stream completes or the client disconnects mid-run.
struct SessionGuard {
    sessions: Arc<Mutex<SessionClaims>>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        match self.sessions.lock() {
            Ok(mut claims) => claims.release(&self.session_id),
            Err(poisoned) => poisoned.into_inner().release(&self.session_id),
        }
    }
}

/// GET /api/stream?q=...&session=...: stream one answer as SSE.
pub async fn stream_answer(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = stream! {
        let question = params.q.trim().to_string();
        let session_id = params.session;

        if question.is_empty() {
            yield Ok(error_event("missing question"));
            return;
        }

        if state.claim_session(&session_id) {
            tracing::info!(session = %session_id, "duplicate stream request, closing");
            yield Ok(done_event());
            return;
        }
        let _guard = SessionGuard {
            sessions: Arc::clone(&state.sessions),
            session_id: session_id.clone(),
        };
        tracing::info!(session = %session_id, question = %question, "stream open");

        // /ask already classified, but the stream URL is reachable directly.
        let classification = classify_content(&question);
        if classification != ContentClassification::Safe {
            let redirect = redirect_response(classification);
            yield Ok(Event::default().event("server-error").data(
                render::redirect_notice(&redirect.message, &redirect.suggested_questions),
            ));
            yield Ok(done_event());
            return;
        }

        let mut results = state.agent.run(&question);
        let mut tracker = SectionTracker::new(&state.assets_base_url);
        while let Some(result) = results.recv().await {
            for section in tracker.absorb(&result) {
                yield Ok(Event::default().event(section.name).data(section.html));
            }
        }

        tracing::info!(session = %session_id, "stream complete");
        yield Ok(done_event());
    };

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keepalive"),
    )
}

fn error_event(message: &str) -> Event {
    Event::default()
        .event("server-error")
        .data(render::error_notice(message))
}

fn done_event() -> Event {
    Event::default().event("done").data("complete")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::agent::gemini::{GenerateResponse, MockGenerateClient};
    use crate::agent::prompts::{
        ORCHESTRATOR_LEADERS_PROMPT, ORCHESTRATOR_PRESIDENTS_PROMPT,
        ORCHESTRATOR_SCRIPTURES_PROMPT, SUMMARY_PROMPT,
    };
    use crate::agent::toolbox::MockToolSource;
    use crate::agent::Agent;
    use crate::api::router::kiosk_router;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const QUOTES_JSON: &str = r#"{"quotes":[{"speaker":"President Russell M. Nelson","title":"Think Celestial!","conference":"October 2023","quote":"As you think celestial, you will find yourself avoiding anything that robs you of your agency."}]}"#;
    const SCRIPTURES_JSON: &str = r#"{"scriptures":[{"volume":"Book of Mormon","reference":"Alma 32:21","text":"Faith is not to have a perfect knowledge of things."}]}"#;
    const SUMMARY_JSON: &str =
        r#"{"summary":["Faith grows through small, steady choices to follow the Savior."]}"#;

    /// Routes each generation request to a canned answer by system prompt.
    fn scripted_client() -> MockGenerateClient {
        MockGenerateClient::new(|request| {
            let system = request
                .system_instruction
                .as_ref()
                .and_then(|c| c.parts.first())
                .map(|p| p.text.clone())
                .unwrap_or_default();
            let text = if system == ORCHESTRATOR_PRESIDENTS_PROMPT {
                r#"{"safe":true,"reason":"","keywords":{"presidents_oaks":"faith","presidents_general":"faith"}}"#
            } else if system == ORCHESTRATOR_LEADERS_PROMPT {
                r#"{"keywords":{"leaders_first_presidency":"a","leaders_q12":"b","leaders_other":"c"}}"#
            } else if system == ORCHESTRATOR_SCRIPTURES_PROMPT {
                r#"{"keywords":{"scriptures_bible":"a","scriptures_bom":"b","scriptures_other":"c"}}"#
            } else if system == SUMMARY_PROMPT {
                SUMMARY_JSON
            } else if system.contains("scripture selector") {
                SCRIPTURES_JSON
            } else {
                QUOTES_JSON
            };
            Ok(GenerateResponse::with_text(text, "STOP"))
        })
    }

    fn scripted_state() -> AppState {
        let agent = Agent::new(
            Arc::new(scripted_client()),
            Arc::new(MockToolSource::with_result(serde_json::json!("[]"))),
        );
        AppState::new(agent, "https://assets.example.com")
    }

    async fn stream_body(state: AppState, uri: &str) -> String {
        let app = kiosk_router(state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_question_sends_error_without_done() {
        let body = stream_body(scripted_state(), "/api/stream?session=s-1").await;
        assert!(body.contains("event: server-error"));
        assert!(body.contains("Error: missing question"));
        assert!(!body.contains("event: done"));
    }

    #[tokio::test]
    async fn duplicate_session_closes_immediately() {
        let state = scripted_state();
        assert!(!state.claim_session("s-dup"));

        let body = stream_body(state, "/api/stream?q=What+is+faith%3F&session=s-dup").await;
        assert!(body.contains("event: done"));
        assert!(body.contains("data: complete"));
        assert!(!body.contains("event: presidents"));
    }

    #[tokio::test]
    async fn redirected_question_gets_notice_then_done() {
        let body = stream_body(
            scripted_state(),
            "/api/stream?q=Why+did+the+church+practice+polygamy%3F&session=s-2",
        )
        .await;
        assert!(body.contains("event: server-error"));
        assert!(body.contains("Here are some questions I can help with:"));
        assert!(body.contains("event: done"));
        assert!(!body.contains("event: presidents"));
    }

    #[tokio::test]
    async fn full_stream_carries_every_section_and_ends_done() {
        let body = stream_body(
            scripted_state(),
            "/api/stream?q=How+can+I+strengthen+my+faith%3F&session=s-3",
        )
        .await;

        assert!(body.contains("event: presidents"));
        assert!(body.contains("event: leaders"));
        assert!(body.contains("event: scriptures"));
        assert!(body.contains("event: summary"));
        assert!(body.contains("Think Celestial!"));
        assert!(body.contains("Alma 32:21"));

        // The closing done event is last.
        let done_at = body.rfind("event: done").unwrap();
        assert!(done_at > body.rfind("event: summary").unwrap());
        assert!(body[done_at..].contains("data: complete"));
    }

    #[tokio::test]
    async fn finished_stream_extends_the_claim_window() {
        let state = scripted_state();
        let _ = stream_body(
            state.clone(),
            "/api/stream?q=How+can+I+find+peace%3F&session=s-4",
        )
        .await;
        // The run claimed and released the id; a replay is still a duplicate.
        assert!(state.claim_session("s-4"));
    }

    #[tokio::test]
    async fn agent_failures_surface_as_server_error_events() {
        let client = MockGenerateClient::new(|request| {
            let system = request
                .system_instruction
                .as_ref()
                .and_then(|c| c.parts.first())
                .map(|p| p.text.clone())
                .unwrap_or_default();
            if system == ORCHESTRATOR_PRESIDENTS_PROMPT {
                Ok(GenerateResponse::with_text(
                    r#"{"safe":true,"reason":"","keywords":{"presidents_oaks":"faith","presidents_general":"faith"}}"#,
                    "STOP",
                ))
            } else {
                Err(crate::agent::AgentError::GeminiApi {
                    status: 500,
                    body: "backend down".into(),
                })
            }
        });
        let agent = Agent::new(
            Arc::new(client),
            Arc::new(MockToolSource::with_result(serde_json::json!("[]"))),
        );
        let state = AppState::new(agent, "https://assets.example.com");

        let body = stream_body(state, "/api/stream?q=What+is+hope%3F&session=s-5").await;
        assert!(body.contains("event: server-error"));
        assert!(body.contains("failed:"));
        assert!(body.contains("event: done"));
    }
}
