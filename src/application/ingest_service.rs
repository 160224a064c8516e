// Ingest service - Use cases for recording samples, closing the stream and exporting the log
use crate::application::traffic_repository::TrafficRepository;
use crate::domain::frame::StreamStatus;
use crate::domain::sample::Sample;
use crate::infrastructure::sample_codec::{render_csv, render_json};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct IngestService {
    repository: Arc<dyn TrafficRepository>,
    status: Arc<watch::Sender<StreamStatus>>,
}

impl IngestService {
    pub fn new(
        repository: Arc<dyn TrafficRepository>,
        status: Arc<watch::Sender<StreamStatus>>,
    ) -> Self {
        Self { repository, status }
    }

    pub async fn record(&self, samples: Vec<Sample>, now_ms: i64) -> anyhow::Result<usize> {
        if self.status().is_closed() {
            tracing::warn!("Recording {} samples after the stream was closed", samples.len());
        }
        let count = samples.len();
        let held = self.repository.append(samples, now_ms).await?;
        tracing::debug!("Recorded {} samples, {} held", count, held);
        Ok(held)
    }

    /// Marks the upstream stream as closed; redraw loops emit one final frame and stop.
    pub fn close(&self, code: u16) {
        tracing::info!("Sample stream closed with code {}", code);
        self.status.send_replace(StreamStatus::Closed { code });
    }

    pub fn status(&self) -> StreamStatus {
        *self.status.borrow()
    }

    /// Drops every held sample and reopens the stream.
    pub async fn reset(&self) -> anyhow::Result<()> {
        self.repository.clear().await?;
        self.status.send_replace(StreamStatus::Open);
        tracing::info!("Sample log cleared");
        Ok(())
    }

    pub async fn export_json(&self) -> anyhow::Result<String> {
        let samples = self.repository.snapshot().await?;
        Ok(render_json(&samples)?)
    }

    pub async fn export_csv(&self) -> anyhow::Result<String> {
        let samples = self.repository.snapshot().await?;
        Ok(render_csv(&samples))
    }
}
