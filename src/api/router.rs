//! HTTP router.
//!
//! Returns a composable `Router` mounted under `/api/`. Session identity
//! comes from the `x-session-id` header; everything else is stateless
//! JSON over the shared `ApiContext`.

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the chat API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/chat/messages", get(endpoints::chat::messages))
        .route("/chat/send", post(endpoints::chat::send))
        .route(
            "/chat/conversations",
            get(endpoints::chat::conversations)
                .delete(endpoints::chat::clear_conversations),
        )
        .route(
            "/chat/conversations/new",
            post(endpoints::chat::new_conversation),
        )
        .route(
            "/chat/conversations/:id/load",
            post(endpoints::chat::load_conversation),
        )
        .with_state(ctx);

    Router::new().nest("/api", routes)
}
