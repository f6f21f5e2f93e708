use crate::handlers;
use crate::session;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    let sessions = session::layer(&state.config);
    Router::new()
        .route("/", get(handlers::home))
        .route("/landing", get(handlers::landing))
        .route("/scriptures", get(handlers::scriptures))
        .route("/today", get(handlers::today))
        .route("/post/:date", get(handlers::post))
        .route("/subscribe", get(handlers::subscribe_page).post(handlers::subscribe))
        .route("/payment", get(handlers::payment_page).post(handlers::pay))
        .route("/api/location", get(handlers::location))
        .route("/healthz", get(handlers::healthz))
        .layer(sessions)
        .with_state(state)
}
