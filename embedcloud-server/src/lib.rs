// Declare modules to be part of the library crate

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod platform;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Builds the API router over a fully prepared application state.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/chart", get(handlers::get_chart))
        .route("/chart/click", post(handlers::chart_click))
        .layer(TraceLayer::new_for_http()) // Log requests/responses
        .layer(CorsLayer::permissive()) // Allow all origins (adjust for production)
        .with_state(state)
}
