// Repository trait for the traffic sample log
use crate::domain::sample::Sample;
use async_trait::async_trait;

#[async_trait]
pub trait TrafficRepository: Send + Sync {
    /// Append samples in arrival order and expire old ones against `now_ms`,
    /// returning the number of samples held afterwards
    async fn append(&self, samples: Vec<Sample>, now_ms: i64) -> anyhow::Result<usize>;

    /// Consistent copy of every held sample, for one redraw or export
    async fn snapshot(&self) -> anyhow::Result<Vec<Sample>>;

    /// Drop every held sample
    async fn clear(&self) -> anyhow::Result<()>;
}
