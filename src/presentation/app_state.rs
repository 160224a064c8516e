// Application state for HTTP handlers
use crate::application::ingest_service::IngestService;
use crate::application::widget_service::WidgetService;

#[derive(Clone)]
pub struct AppState {
    pub ingest_service: IngestService,
    pub widget_service: WidgetService,
    pub timestamp_resolution_ms: i64,
}
