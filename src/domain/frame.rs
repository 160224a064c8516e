// Render frame domain model - everything a renderer needs for one redraw
use super::series::{Series, SeriesStats};
use super::window::WindowId;
use serde::Serialize;

/// Whether the upstream sample stream is still delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StreamStatus {
    Open,
    Closed { code: u16 },
}

impl StreamStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, StreamStatus::Closed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesFrame {
    pub buckets: Vec<u64>,
    #[serde(flatten)]
    pub stats: SeriesStats,
}

impl From<Series> for SeriesFrame {
    fn from(series: Series) -> Self {
        let stats = series.stats();
        Self {
            buckets: series.buckets,
            stats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowFrame {
    pub window: WindowId,
    pub label: String,
    pub end_ms: i64,
    pub span_ms: i64,
    pub bucket_width_ms: i64,
    pub focus_ms: Option<i64>,
    pub up: SeriesFrame,
    pub down: SeriesFrame,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub now_ms: i64,
    pub status: StreamStatus,
    pub windows: Vec<WindowFrame>,
}

impl RenderFrame {
    pub fn window(&self, id: WindowId) -> Option<&WindowFrame> {
        self.windows.iter().find(|w| w.window == id)
    }
}
