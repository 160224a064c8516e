use crate::domain::sample::RetentionPolicy;
use crate::domain::window::WindowSpans;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MonitorConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub widget: WidgetSettings,
    #[serde(default)]
    pub ingest: IngestSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetSettings {
    #[serde(default = "default_bucket_count")]
    pub bucket_count: usize,
    #[serde(default = "default_minute_span_ms")]
    pub minute_span_ms: i64,
    #[serde(default = "default_hour_span_ms")]
    pub hour_span_ms: i64,
    #[serde(default = "default_day_span_ms")]
    pub day_span_ms: i64,
    #[serde(default = "default_redraw_interval_ms")]
    pub redraw_interval_ms: u64,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            bucket_count: default_bucket_count(),
            minute_span_ms: default_minute_span_ms(),
            hour_span_ms: default_hour_span_ms(),
            day_span_ms: default_day_span_ms(),
            redraw_interval_ms: default_redraw_interval_ms(),
        }
    }
}

impl WidgetSettings {
    pub fn spans(&self) -> WindowSpans {
        WindowSpans {
            day_ms: self.day_span_ms,
            hour_ms: self.hour_span_ms,
            minute_ms: self.minute_span_ms,
        }
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestSettings {
    /// Timestamps are rounded down to this many milliseconds; 0 keeps them exact.
    #[serde(default = "default_timestamp_resolution_ms")]
    pub timestamp_resolution_ms: i64,
    /// Maximum sample age; defaults to the day window's span.
    #[serde(default)]
    pub retention_ms: Option<i64>,
    #[serde(default)]
    pub keep_all_samples: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            timestamp_resolution_ms: default_timestamp_resolution_ms(),
            retention_ms: None,
            keep_all_samples: false,
        }
    }
}

impl IngestSettings {
    pub fn retention_policy(&self, widget: &WidgetSettings) -> RetentionPolicy {
        if self.keep_all_samples {
            return RetentionPolicy::KeepAll;
        }
        RetentionPolicy::MaxAge {
            max_age_ms: self.retention_ms.unwrap_or(widget.day_span_ms),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_bucket_count() -> usize {
    600
}

fn default_minute_span_ms() -> i64 {
    60_000
}

fn default_hour_span_ms() -> i64 {
    3_600_000
}

fn default_day_span_ms() -> i64 {
    86_400_000
}

fn default_redraw_interval_ms() -> u64 {
    100
}

fn default_timestamp_resolution_ms() -> i64 {
    100
}

/// Loads `config/monitor.{toml,yaml,json}` if present, overridden by
/// `MONITOR__SECTION__KEY` environment variables.
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(
            config::Environment::with_prefix("MONITOR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
