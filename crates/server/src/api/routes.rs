use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audit, chat, handlers, middleware as mw, sessions};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Chat
        .route("/chat", post(chat::chat))
        .route("/sessions", get(sessions::list_sessions))
        .route("/history/{session_id}", get(sessions::get_history))
        // Audit
        .route("/audit", get(audit::query_audit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw::auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .route("/", get(handlers::root))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(mw::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
