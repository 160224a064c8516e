// Time windows and the day -> hour -> minute drill-down chain
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowId {
    Day,
    Hour,
    Minute,
}

impl WindowId {
    /// Coarsest first, matching the order windows are stored in the chain.
    pub const ALL: [WindowId; 3] = [WindowId::Day, WindowId::Hour, WindowId::Minute];

    fn index(self) -> usize {
        match self {
            WindowId::Day => 0,
            WindowId::Hour => 1,
            WindowId::Minute => 2,
        }
    }

    pub fn child(self) -> Option<WindowId> {
        match self {
            WindowId::Day => Some(WindowId::Hour),
            WindowId::Hour => Some(WindowId::Minute),
            WindowId::Minute => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WindowId::Day => "1 day ago",
            WindowId::Hour => "1 hour ago",
            WindowId::Minute => "1 minute ago",
        }
    }
}

/// Spans of the three windows, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpans {
    pub day_ms: i64,
    pub hour_ms: i64,
    pub minute_ms: i64,
}

impl Default for WindowSpans {
    fn default() -> Self {
        Self {
            day_ms: 86_400_000,
            hour_ms: 3_600_000,
            minute_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub id: WindowId,
    pub span_ms: i64,
    pub bucket_count: usize,
    pub bucket_width_ms: i64,
    /// Instant picked by drill-down on this window's bar. It becomes the end
    /// of the child window; the minute window never carries one.
    pub focus_ms: Option<i64>,
    parent: Option<usize>,
}

impl TimeWindow {
    fn new(id: WindowId, span_ms: i64, bucket_count: usize, parent: Option<usize>) -> Self {
        Self {
            id,
            span_ms,
            bucket_count,
            bucket_width_ms: span_ms / bucket_count as i64,
            focus_ms: None,
            parent,
        }
    }

    pub fn label(&self) -> &'static str {
        self.id.label()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("bucket count must be positive")]
    ZeroBuckets,
    #[error("{window:?} span of {span_ms}ms is shorter than {bucket_count} buckets")]
    SpanTooShort {
        window: WindowId,
        span_ms: i64,
        bucket_count: usize,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrillDownError {
    #[error("the {0:?} window has no finer window to drill into")]
    NoFinerWindow(WindowId),
}

/// Depth of the day -> hour -> minute chain; bounds end-time resolution.
const MAX_CHAIN_DEPTH: usize = 3;

/// The three windows of one widget, stored coarsest first with parent indices.
#[derive(Debug, Clone)]
pub struct WindowChain {
    windows: [TimeWindow; 3],
}

impl WindowChain {
    pub fn new(bucket_count: usize, spans: WindowSpans) -> Result<Self, ChainError> {
        if bucket_count == 0 {
            return Err(ChainError::ZeroBuckets);
        }
        for (window, span_ms) in [
            (WindowId::Day, spans.day_ms),
            (WindowId::Hour, spans.hour_ms),
            (WindowId::Minute, spans.minute_ms),
        ] {
            if span_ms < bucket_count as i64 {
                return Err(ChainError::SpanTooShort {
                    window,
                    span_ms,
                    bucket_count,
                });
            }
        }

        Ok(Self {
            windows: [
                TimeWindow::new(WindowId::Day, spans.day_ms, bucket_count, None),
                TimeWindow::new(WindowId::Hour, spans.hour_ms, bucket_count, Some(0)),
                TimeWindow::new(WindowId::Minute, spans.minute_ms, bucket_count, Some(1)),
            ],
        })
    }

    pub fn window(&self, id: WindowId) -> &TimeWindow {
        &self.windows[id.index()]
    }

    pub fn windows(&self) -> impl Iterator<Item = &TimeWindow> {
        self.windows.iter()
    }

    pub fn effective_end(&self, id: WindowId, now_ms: i64) -> i64 {
        self.resolve_end(id, now_ms).0
    }

    /// Walks from the parent towards the root until a window with a usable
    /// focus is found. Returns the end instant and the number of windows visited.
    fn resolve_end(&self, id: WindowId, now_ms: i64) -> (i64, usize) {
        let mut current = self.windows[id.index()].parent;
        let mut steps = 0;

        while let Some(index) = current {
            if steps == MAX_CHAIN_DEPTH {
                break;
            }
            steps += 1;

            let window = &self.windows[index];
            if let Some(focus) = window.focus_ms {
                if focus < now_ms {
                    return (focus, steps);
                }
            }
            current = window.parent;
        }

        (now_ms, steps)
    }

    /// Converts a click at `pixel_x` on `clicked`'s bar into the end instant of
    /// its child window and stores it on `clicked`. Returns the stored focus,
    /// `None` if it was clamped away for not being in the past.
    pub fn set_focus(
        &mut self,
        clicked: WindowId,
        pixel_x: i64,
        now_ms: i64,
    ) -> Result<Option<i64>, DrillDownError> {
        let child = clicked.child().ok_or(DrillDownError::NoFinerWindow(clicked))?;

        let parent = self.window(clicked);
        let bucket_count = parent.bucket_count as i64;
        let x = pixel_x.clamp(0, bucket_count);
        let parent_end = self.effective_end(clicked, now_ms);
        let clicked_at = parent_end - (bucket_count - x) * parent.bucket_width_ms;
        let focus = clicked_at + self.window(child).span_ms / 2;

        let focus = (focus < now_ms).then_some(focus);
        self.windows[clicked.index()].focus_ms = focus;
        tracing::debug!(
            "Drill-down on {:?} at x={} focuses {:?} at {:?}",
            clicked,
            x,
            child,
            focus
        );
        Ok(focus)
    }

    /// Releases the drill-down on `clicked`; its child follows its own parent again.
    pub fn clear_focus(&mut self, clicked: WindowId) -> Result<(), DrillDownError> {
        if clicked.child().is_none() {
            return Err(DrillDownError::NoFinerWindow(clicked));
        }
        self.windows[clicked.index()].focus_ms = None;
        Ok(())
    }
}
