pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        // Interview prep
        .route(
            "/api/v1/sessions/:id/questions",
            post(handlers::handle_generate_questions),
        )
        .route(
            "/api/v1/sessions/:id/answers",
            put(handlers::handle_put_answers),
        )
        .route(
            "/api/v1/sessions/:id/answers/:index",
            put(handlers::handle_put_answer),
        )
        .route(
            "/api/v1/sessions/:id/evaluation",
            post(handlers::handle_evaluate),
        )
        // Résumé context
        .route(
            "/api/v1/sessions/:id/resume",
            post(handlers::handle_upload_resume),
        )
        // Chat
        .route(
            "/api/v1/sessions/:id/chat",
            get(handlers::handle_get_transcript).post(handlers::handle_chat),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
