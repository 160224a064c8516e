// In-memory repository implementation
use crate::application::traffic_repository::TrafficRepository;
use crate::domain::sample::{RetentionPolicy, Sample, SampleBuffer};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Sample log shared by ingestion and every redraw loop. Appends take the
/// write lock briefly; redraws copy a snapshot under the read lock and bin
/// outside of it.
#[derive(Debug)]
pub struct InMemoryTrafficLog {
    buffer: RwLock<SampleBuffer>,
}

impl InMemoryTrafficLog {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            buffer: RwLock::new(SampleBuffer::new(retention)),
        }
    }
}

#[async_trait]
impl TrafficRepository for InMemoryTrafficLog {
    async fn append(&self, samples: Vec<Sample>, now_ms: i64) -> Result<usize> {
        let mut buffer = self.buffer.write().await;
        for sample in samples {
            buffer.append(sample);
        }
        buffer.expire(now_ms);
        Ok(buffer.len())
    }

    async fn snapshot(&self) -> Result<Vec<Sample>> {
        let buffer = self.buffer.read().await;
        Ok(buffer.samples().to_vec())
    }

    async fn clear(&self) -> Result<()> {
        self.buffer.write().await.clear();
        Ok(())
    }
}
