//! Chat endpoints.
//!
//! - `GET /api/chat/messages` — current conversation for the session
//! - `POST /api/chat/send` — answer one utterance
//! - `GET /api/chat/conversations` — saved conversations, newest-first
//! - `POST /api/chat/conversations/new` — archive and start fresh
//! - `POST /api/chat/conversations/:id/load` — switch to a saved one
//! - `DELETE /api/chat/conversations` — clear the archive

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{session_id_from_headers, ApiContext};
use crate::models::Message;
use crate::session::{SessionEvent, SessionState};

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Serialize)]
pub struct ConversationView {
    pub conversation_id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

impl ConversationView {
    fn of(state: &SessionState) -> Self {
        Self {
            conversation_id: state.current.id.clone(),
            title: state.current.title.clone(),
            messages: state.current.messages.clone(),
        }
    }
}

/// Run `f` against the session's state, creating the session on first use.
fn with_session<T>(
    ctx: &ApiContext,
    session_id: &str,
    f: impl FnOnce(&mut SessionState) -> T,
) -> Result<T, ApiError> {
    let mut sessions = ctx
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock poisoned".into()))?;
    let state = sessions
        .entry(session_id.to_string())
        .or_insert_with(|| SessionState::new(session_id.to_string()));
    Ok(f(state))
}

/// `GET /api/chat/messages`
pub async fn messages(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<ConversationView>, ApiError> {
    let session_id = session_id_from_headers(&headers);
    let view = with_session(&ctx, &session_id, |state| ConversationView::of(state))?;
    Ok(Json(view))
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub conversation_id: String,
    pub reply: String,
}

/// `POST /api/chat/send`
///
/// Collaborator failure is not an HTTP failure: the exchange completes
/// with an apology carrying the error text, exactly as a normal turn.
pub async fn send(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(
            "Message too long (max 2000 chars)".into(),
        ));
    }

    let session_id = session_id_from_headers(&headers);

    // The LLM and graph clients block, so the turn runs off the async runtime.
    let agent = ctx.agent.clone();
    let agent_session = session_id.clone();
    let utterance = message.clone();
    let outcome = tokio::task::spawn_blocking(move || agent.respond(&agent_session, &utterance))
        .await
        .map_err(|e| ApiError::Internal(format!("agent task failed: {e}")))?;

    let reply = match outcome {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(session_id, error = %e, "capability failed; replying with apology");
            format!("I'm sorry, I wasn't able to answer that: {e}")
        }
    };

    let conversation_id = with_session(&ctx, &session_id, |state| {
        state.apply(SessionEvent::SubmitMessage {
            user: message,
            assistant: reply.clone(),
        });
        state.current.id.clone()
    })?;

    Ok(Json(SendResponse {
        conversation_id,
        reply,
    }))
}

#[derive(Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
}

#[derive(Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
}

/// `GET /api/chat/conversations`
pub async fn conversations(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<ConversationsResponse>, ApiError> {
    let session_id = session_id_from_headers(&headers);
    let conversations = with_session(&ctx, &session_id, |state| {
        state
            .registry
            .list()
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                message_count: c.messages.len(),
            })
            .collect()
    })?;
    Ok(Json(ConversationsResponse { conversations }))
}

/// `POST /api/chat/conversations/new`
pub async fn new_conversation(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<ConversationView>, ApiError> {
    let session_id = session_id_from_headers(&headers);
    let view = with_session(&ctx, &session_id, |state| {
        state.apply(SessionEvent::NewConversation);
        ConversationView::of(state)
    })?;
    Ok(Json(view))
}

/// `POST /api/chat/conversations/:id/load`
///
/// An unknown id is logged and leaves the current conversation in place;
/// the response always carries the (possibly unchanged) current state.
pub async fn load_conversation(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    let session_id = session_id_from_headers(&headers);
    let view = with_session(&ctx, &session_id, |state| {
        state.apply(SessionEvent::LoadConversation { id });
        ConversationView::of(state)
    })?;
    Ok(Json(view))
}

/// `DELETE /api/chat/conversations`
pub async fn clear_conversations(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<ConversationView>, ApiError> {
    let session_id = session_id_from_headers(&headers);
    let view = with_session(&ctx, &session_id, |state| {
        state.apply(SessionEvent::ClearHistory);
        ConversationView::of(state)
    })?;
    Ok(Json(view))
}
