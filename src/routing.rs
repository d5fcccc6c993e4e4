//! Application router configuration.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    api::{cancel, decide, get_balance, get_report, receive_text, select_action},
    endpoints,
    logging::logging_middleware,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ACTION, post(select_action))
        .route(endpoints::TEXT, post(receive_text))
        .route(endpoints::DECISION, post(decide))
        .route(endpoints::CANCEL, post(cancel))
        .route(endpoints::REPORT, get(get_report))
        .route(endpoints::BALANCE, get(get_balance))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Wrap `router` in a span per request.
pub fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted to responses.
        .on_failure(());

    router.layer(tracing_layer)
}
