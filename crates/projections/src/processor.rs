//! Projection processor: keeps views in step with the order store.

use std::sync::Arc;
use std::time::Duration;

use order_store::OrderStore;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::Result;
use crate::projection::Projection;

const DEFAULT_RESYNC: Duration = Duration::from_secs(30);

/// Re-projects every registered view from the active order set.
///
/// The processor supports:
/// - Refresh: fetches `list_active` once and hands it to each projection
/// - Rebuild: resets all projections, then refreshes
/// - Run: refreshes on change notifications, on a lagged or closed channel,
///   and on a periodic resync tick, so a missed notification only leaves
///   a view stale until the next tick
pub struct ProjectionProcessor<S: OrderStore + ?Sized> {
    store: Arc<S>,
    projections: Vec<Box<dyn Projection>>,
    resync_interval: Duration,
}

impl<S: OrderStore + ?Sized + 'static> ProjectionProcessor<S> {
    /// Creates a processor over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            projections: Vec::new(),
            resync_interval: DEFAULT_RESYNC,
        }
    }

    /// Sets the safety-net resync interval.
    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Fetches the active orders once and refreshes every projection.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_all(&self) -> Result<()> {
        let active = self.store.list_active().await?;

        for projection in &self.projections {
            projection.refresh(&active).await?;
        }

        metrics::counter!("projection_refreshes_total").increment(1);
        tracing::debug!(active = active.len(), "projections refreshed");
        Ok(())
    }

    /// Resets all projections and refreshes them from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.refresh_all().await
    }

    /// Runs until the store's notification channel closes.
    ///
    /// Takes an `Arc` so request handlers can keep calling
    /// [`refresh_all`](Self::refresh_all) while the loop runs.
    pub async fn run(self: Arc<Self>) {
        let mut changes = self.store.notifier().subscribe();
        let mut resync = tokio::time::interval(self.resync_interval);
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            projections = self.projections.len(),
            resync_secs = self.resync_interval.as_secs(),
            "projection processor started"
        );

        loop {
            let closed = tokio::select! {
                received = changes.recv() => match received {
                    Ok(change) => {
                        tracing::trace!(order_id = %change.order_id, kind = ?change.kind, "order changed");
                        // One refresh covers everything already queued.
                        loop {
                            match changes.try_recv() {
                                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        false
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "change notifications lagged, refreshing");
                        false
                    }
                    Err(RecvError::Closed) => true,
                },
                _ = resync.tick() => false,
            };

            if let Err(e) = self.refresh_all().await {
                tracing::warn!(error = %e, "projection refresh failed; view stays stale until next change");
            }

            if closed {
                tracing::info!("change channel closed, projection processor stopping");
                break;
            }
        }
    }

    /// Spawns [`run`](Self::run) on the runtime.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use chrono::Utc;
    use common::OrderId;
    use domain::{Money, Order, OrderCode, OrderItem, PlaceOrder, ServiceType};
    use order_store::InMemoryOrderStore;
    use tokio::sync::RwLock;

    /// Records how many orders each refresh saw.
    struct CountingProjection {
        seen: Arc<RwLock<Vec<usize>>>,
        position: Arc<RwLock<ProjectionPosition>>,
    }

    impl CountingProjection {
        fn new() -> Self {
            Self {
                seen: Arc::new(RwLock::new(Vec::new())),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
            }
        }
    }

    #[async_trait]
    impl Projection for CountingProjection {
        fn name(&self) -> &'static str {
            "CountingProjection"
        }

        async fn refresh(&self, active: &[Order]) -> Result<()> {
            self.seen.write().await.push(active.len());
            let mut pos = self.position.write().await;
            *pos = pos.advance(Utc::now());
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            self.seen.write().await.clear();
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn placed(number: u16) -> Order {
        let cmd = PlaceOrder::new(
            ServiceType::Balcao,
            vec![OrderItem::new("Coxinha", 2, Money::from_cents(700))],
        );
        Order::place(cmd, OrderId::new(), OrderCode::new('A', number), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_all_feeds_every_projection() {
        let store = Arc::new(InMemoryOrderStore::new());
        store.create(&placed(101)).await.unwrap();
        store.create(&placed(102)).await.unwrap();

        let first = CountingProjection::new();
        let second = CountingProjection::new();
        let seen1 = Arc::clone(&first.seen);
        let seen2 = Arc::clone(&second.seen);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(first));
        processor.register(Box::new(second));
        assert_eq!(processor.projection_count(), 2);

        processor.refresh_all().await.unwrap();

        assert_eq!(*seen1.read().await, vec![2]);
        assert_eq!(*seen2.read().await, vec![2]);
    }

    #[tokio::test]
    async fn test_empty_store_refresh() {
        let store = Arc::new(InMemoryOrderStore::new());
        let projection = CountingProjection::new();
        let seen = Arc::clone(&projection.seen);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));
        processor.refresh_all().await.unwrap();

        assert_eq!(*seen.read().await, vec![0]);
    }

    #[tokio::test]
    async fn test_rebuild_resets_then_refreshes() {
        let store = Arc::new(InMemoryOrderStore::new());
        store.create(&placed(103)).await.unwrap();

        let projection = CountingProjection::new();
        let seen = Arc::clone(&projection.seen);
        let pos = Arc::clone(&projection.position);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        processor.refresh_all().await.unwrap();
        processor.refresh_all().await.unwrap();
        assert_eq!(pos.read().await.refreshes, 2);

        processor.rebuild_all().await.unwrap();
        assert_eq!(*seen.read().await, vec![1]);
        assert_eq!(pos.read().await.refreshes, 1);
    }

    #[tokio::test]
    async fn test_run_refreshes_on_change() {
        let store = Arc::new(InMemoryOrderStore::new());
        let projection = CountingProjection::new();
        let seen = Arc::clone(&projection.seen);

        let mut processor = ProjectionProcessor::new(Arc::clone(&store))
            .with_resync_interval(Duration::from_secs(3600));
        processor.register(Box::new(projection));
        let handle = Arc::new(processor).spawn();

        // Wait for the initial resync tick, then publish a change.
        wait_until(|| async { !seen.read().await.is_empty() }).await;
        store.create(&placed(104)).await.unwrap();
        wait_until(|| async { seen.read().await.last() == Some(&1) }).await;

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_tick_heals_missed_changes() {
        let store = Arc::new(InMemoryOrderStore::new());
        let projection = CountingProjection::new();
        let pos = Arc::clone(&projection.position);

        let mut processor = ProjectionProcessor::new(Arc::clone(&store))
            .with_resync_interval(Duration::from_secs(30));
        processor.register(Box::new(projection));
        let handle = Arc::new(processor).spawn();

        tokio::time::sleep(Duration::from_secs(95)).await;
        // Initial tick plus three resyncs.
        assert!(pos.read().await.refreshes >= 4);

        handle.abort();
    }

    async fn wait_until<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }
}
