// Widget service - Window chains per widget, drill-down and the periodic redraw loop
use crate::application::binner::build_frame;
use crate::application::traffic_repository::TrafficRepository;
use crate::domain::frame::{RenderFrame, StreamStatus};
use crate::domain::window::{ChainError, DrillDownError, WindowChain, WindowId};
use crate::infrastructure::config::WidgetSettings;
use futures::{pin_mut, Stream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::MissedTickBehavior;

pub type WidgetId = u64;

const FRAME_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("widget {0} not found")]
    NotFound(WidgetId),
    #[error(transparent)]
    DrillDown(#[from] DrillDownError),
    #[error("invalid widget settings: {0}")]
    Settings(#[from] ChainError),
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

type WidgetMap = HashMap<WidgetId, Arc<RwLock<WindowChain>>>;

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct WidgetService {
    repository: Arc<dyn TrafficRepository>,
    settings: WidgetSettings,
    widgets: Arc<RwLock<WidgetMap>>,
    next_id: Arc<AtomicU64>,
    status: watch::Receiver<StreamStatus>,
}

impl WidgetService {
    pub fn new(
        repository: Arc<dyn TrafficRepository>,
        settings: WidgetSettings,
        status: watch::Receiver<StreamStatus>,
    ) -> Self {
        Self {
            repository,
            settings,
            widgets: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            status,
        }
    }

    pub async fn create_widget(&self) -> Result<WidgetId, WidgetError> {
        let chain = WindowChain::new(self.settings.bucket_count, self.settings.spans())?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.widgets
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(chain)));
        tracing::info!("Created widget {}", id);
        Ok(id)
    }

    pub async fn remove_widget(&self, id: WidgetId) -> Result<(), WidgetError> {
        self.widgets
            .write()
            .await
            .remove(&id)
            .ok_or(WidgetError::NotFound(id))?;
        tracing::info!("Removed widget {}", id);
        Ok(())
    }

    async fn chain(&self, id: WidgetId) -> Result<Arc<RwLock<WindowChain>>, WidgetError> {
        self.widgets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(WidgetError::NotFound(id))
    }

    pub async fn set_focus(
        &self,
        id: WidgetId,
        clicked: WindowId,
        pixel_x: i64,
        now_ms: i64,
    ) -> Result<Option<i64>, WidgetError> {
        let chain = self.chain(id).await?;
        let focus = chain.write().await.set_focus(clicked, pixel_x, now_ms)?;
        Ok(focus)
    }

    pub async fn clear_focus(&self, id: WidgetId, clicked: WindowId) -> Result<(), WidgetError> {
        let chain = self.chain(id).await?;
        chain.write().await.clear_focus(clicked)?;
        Ok(())
    }

    pub async fn render_frame(&self, id: WidgetId, now_ms: i64) -> Result<RenderFrame, WidgetError> {
        let chain = self.chain(id).await?;
        let status = *self.status.borrow();
        render(&*self.repository, &chain, status, now_ms).await
    }

    /// Starts the redraw loop for a widget. Frames arrive every redraw interval
    /// until the stream closes (one final frame carries the closed status), the
    /// widget is removed, or the receiver is dropped.
    pub async fn stream_frames(
        &self,
        id: WidgetId,
    ) -> Result<mpsc::Receiver<RenderFrame>, WidgetError> {
        // Fail fast on unknown widgets instead of returning an empty stream.
        self.chain(id).await?;

        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let service = self.clone();

        tokio::spawn(async move {
            let frames = Self::redraw_frames(service, id);
            pin_mut!(frames);

            while let Some(frame) = frames.next().await {
                if tx.send(frame).await.is_err() {
                    tracing::debug!("Frame receiver for widget {} dropped", id);
                    break;
                }
            }
            tracing::debug!("Redraw loop for widget {} finished", id);
        });

        Ok(rx)
    }

    fn redraw_frames(service: WidgetService, id: WidgetId) -> impl Stream<Item = RenderFrame> + Send {
        let period = service.settings.redraw_interval();

        async_stream::stream! {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let chain = match service.chain(id).await {
                    Ok(chain) => chain,
                    Err(_) => break,
                };
                let status = *service.status.borrow();

                match render(&*service.repository, &chain, status, now_ms()).await {
                    Ok(frame) => yield frame,
                    Err(e) => tracing::error!("Redraw of widget {} failed: {}", id, e),
                }

                if status.is_closed() {
                    break;
                }
            }
        }
    }
}

async fn render(
    repository: &dyn TrafficRepository,
    chain: &RwLock<WindowChain>,
    status: StreamStatus,
    now_ms: i64,
) -> Result<RenderFrame, WidgetError> {
    let samples = repository.snapshot().await?;
    let chain = chain.read().await;
    Ok(build_frame(&chain, &samples, now_ms, status))
}
