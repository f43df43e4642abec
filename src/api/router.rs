//! Kiosk HTTP router.
//!
//! Three routes: the landing page, the question intake that swaps in a
//! stream container, and the SSE stream itself. The intake classifies
//! questions before any session exists, so redirected visitors never
//! open a stream.

use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::agent::{classify_content, redirect_response, ContentClassification};
use crate::render;

use super::error::ApiError;
use super::sse;
use super::types::AppState;

/// Build the kiosk router.
pub fn kiosk_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/ask", post(ask))
        .route("/api/stream", get(sse::stream_answer))
        .with_state(state)
}

/// GET /: the kiosk landing page.
async fn home() -> Html<String> {
    Html(render::home_page())
}

/// Request body for `POST /ask`. The kiosk form posts urlencoded; JSON is
/// accepted for direct API callers.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    question: String,
}

/// Extracts a body as form or JSON by content type.
struct JsonOrForm<T>(T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Self(body));
        }
        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Self(body));
        }
        Err(ApiError::UnsupportedMediaType)
    }
}

/// POST /ask: validate and classify a question, then hand back either a
/// redirect notice or the container that opens the SSE stream.
async fn ask(JsonOrForm(request): JsonOrForm<AskRequest>) -> Result<Html<String>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::MissingQuestion);
    }

    let classification = classify_content(question);
    if classification != ContentClassification::Safe {
        tracing::info!(?classification, "question redirected at intake");
        let redirect = redirect_response(classification);
        return Ok(Html(render::redirect_notice(
            &redirect.message,
            &redirect.suggested_questions,
        )));
    }

    let session_id = format!("session-{}", Uuid::new_v4());
    tracing::info!(session = %session_id, "question accepted");
    Ok(Html(render::stream_container(&session_id, question)))
}
