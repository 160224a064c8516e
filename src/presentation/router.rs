// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_focus, close_stream, create_widget, export_csv, export_json, health_check,
    ingest_samples, remove_widget, render_frame, reset_samples, set_focus, stream_frames,
};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Export and frame bodies are compressed by their own response builders,
    // so there is no CompressionLayer here.
    Router::new()
        .route("/healthz", get(health_check))
        .route("/samples", post(ingest_samples).delete(reset_samples))
        .route("/close", post(close_stream))
        .route("/traffic.json", get(export_json))
        .route("/traffic.csv", get(export_csv))
        .route("/widgets", post(create_widget))
        .route("/widgets/:id", delete(remove_widget))
        .route("/widgets/:id/frame", get(render_frame))
        .route("/widgets/:id/frames", get(stream_frames))
        .route(
            "/widgets/:id/focus/:window",
            post(set_focus).delete(clear_focus),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
