// HTTP request handlers
use crate::application::widget_service::{now_ms, WidgetError, WidgetId};
use crate::domain::window::WindowId;
use crate::infrastructure::chunked_frames::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, encoded_response};
use crate::infrastructure::sample_codec::parse_samples;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CloseRequest {
    pub code: u16,
}

#[derive(Deserialize)]
pub struct FocusRequest {
    pub pixel_x: i64,
}

#[derive(Serialize)]
pub struct FocusResponse {
    pub window: WindowId,
    pub focus_ms: Option<i64>,
}

impl IntoResponse for WidgetError {
    fn into_response(self) -> Response {
        let status = match &self {
            WidgetError::NotFound(_) => StatusCode::NOT_FOUND,
            WidgetError::DrillDown(_) => StatusCode::BAD_REQUEST,
            WidgetError::Settings(_) | WidgetError::Repository(_) => {
                tracing::error!("Widget request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn internal_error(context: &str, e: anyhow::Error) -> Response {
    tracing::error!("{}: {:#}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Accept one `[timestamp_ms, up, down]` tuple or a list of them
pub async fn ingest_samples(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let samples = match parse_samples(&body, state.timestamp_resolution_ms) {
        Ok(samples) => samples,
        Err(e) => {
            tracing::warn!("Rejected sample delivery: {}", e);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    let accepted = samples.len();
    match state.ingest_service.record(samples, now_ms()).await {
        Ok(held) => Json(json!({ "accepted": accepted, "held": held })).into_response(),
        Err(e) => internal_error("Error recording samples", e),
    }
}

/// Record the upstream stream's termination
pub async fn close_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CloseRequest>,
) -> StatusCode {
    state.ingest_service.close(request.code);
    StatusCode::NO_CONTENT
}

pub async fn reset_samples(State(state): State<Arc<AppState>>) -> Response {
    match state.ingest_service.reset().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error("Error clearing samples", e),
    }
}

pub async fn export_json(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.ingest_service.export_json().await {
        Ok(json) => respond_encoded(json.into_bytes(), "application/json", &headers).await,
        Err(e) => internal_error("Error exporting samples", e),
    }
}

pub async fn export_csv(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.ingest_service.export_csv().await {
        Ok(csv) => respond_encoded(csv.into_bytes(), "text/csv", &headers).await,
        Err(e) => internal_error("Error exporting samples", e),
    }
}

async fn respond_encoded(body: Vec<u8>, content_type: &'static str, headers: &HeaderMap) -> Response {
    match encoded_response(body, content_type, accepts_brotli(headers)).await {
        Ok(response) => response.into_response(),
        Err(status) => status.into_response(),
    }
}

pub async fn create_widget(State(state): State<Arc<AppState>>) -> Response {
    match state.widget_service.create_widget().await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn remove_widget(
    Path(id): Path<WidgetId>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.widget_service.remove_widget(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Single redraw, for clients that poll instead of streaming
pub async fn render_frame(
    Path(id): Path<WidgetId>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.widget_service.render_frame(id, now_ms()).await {
        Ok(frame) => Json(frame).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Stream frames for a widget at the redraw interval
pub async fn stream_frames(
    Path(id): Path<WidgetId>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    match state.widget_service.stream_frames(id).await {
        Ok(rx) => stream_from_receiver(rx, compress).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Drill down: pin the clicked window's child to the instant under `pixel_x`
pub async fn set_focus(
    Path((id, window)): Path<(WidgetId, WindowId)>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<FocusRequest>,
) -> Response {
    match state
        .widget_service
        .set_focus(id, window, request.pixel_x, now_ms())
        .await
    {
        Ok(focus_ms) => Json(FocusResponse { window, focus_ms }).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn clear_focus(
    Path((id, window)): Path<(WidgetId, WindowId)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.widget_service.clear_focus(id, window).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
