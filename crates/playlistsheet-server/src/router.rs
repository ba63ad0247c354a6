use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Router, middleware};
use playlistsheet_protocol::{CREATE_SHEET_PATH, FETCH_PLAYLIST_PATH, MAX_BODY_SIZE};
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};
use crate::rate_limit::rate_limit_middleware;

/// Builds the application router.
///
/// The rate limiter wraps only the API routes; `/health` is never limited.
pub fn build_router(state: AppState) -> Router {
    let api = Router::<AppState>::new()
        .route(FETCH_PLAYLIST_PATH, post(handler::fetch_playlist))
        .route(CREATE_SHEET_PATH, post(handler::create_sheet))
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    Router::<AppState>::new()
        .route("/health", get(handler::health))
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
}
