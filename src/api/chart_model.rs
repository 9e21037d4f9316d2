use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::api::store::SampleStore;
use crate::core::{ChartScope, ChartState, Sample, chart_state};
use crate::error::ChartResult;

/// Wiring for an [`ObservationChartModel`].
#[derive(Debug, Clone)]
pub struct ObservationChartConfig {
    pub filter_key: String,
    pub scope: ChartScope,
    pub debounce: Duration,
}

impl ObservationChartConfig {
    #[must_use]
    pub fn new(filter_key: impl Into<String>) -> Self {
        Self {
            filter_key: filter_key.into(),
            scope: ChartScope::Day,
            debounce: Duration::from_millis(100),
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: ChartScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Injected time source; defaults to [`Utc::now`].
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Reactive binding between a [`SampleStore`] and a rendering surface.
///
/// The model owns a single-writer state cell: every recomputation rebuilds
/// the whole [`ChartState`] and publishes it atomically through a watch
/// channel, so a subscriber never observes a partially updated bucket
/// sequence. Recomputations carry a monotonic sequence number and a late
/// result that lost the race to a newer one is discarded (last-write-wins).
///
/// [`Self::notify_changed`] spawns onto the ambient tokio runtime and must be
/// called from within one.
pub struct ObservationChartModel {
    inner: Arc<ModelInner>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

struct ModelInner {
    store: Arc<dyn SampleStore>,
    filter_key: String,
    debounce: Duration,
    clock: Clock,
    scope: Mutex<ChartScope>,
    samples: Mutex<Vec<Sample>>,
    next_seq: AtomicU64,
    published_seq: Mutex<u64>,
    state_tx: watch::Sender<ChartState>,
}

impl ObservationChartModel {
    #[must_use]
    pub fn new(store: Arc<dyn SampleStore>, config: ObservationChartConfig) -> Self {
        Self::with_clock(store, config, Arc::new(Utc::now))
    }

    /// Same as [`Self::new`] with an injected clock, so tests can pin `now`.
    #[must_use]
    pub fn with_clock(
        store: Arc<dyn SampleStore>,
        config: ObservationChartConfig,
        clock: Clock,
    ) -> Self {
        let (state_tx, _) = watch::channel(ChartState::empty(config.scope));
        Self {
            inner: Arc::new(ModelInner {
                store,
                filter_key: config.filter_key,
                debounce: config.debounce,
                clock,
                scope: Mutex::new(config.scope),
                samples: Mutex::new(Vec::new()),
                next_seq: AtomicU64::new(0),
                published_seq: Mutex::new(0),
                state_tx,
            }),
            pending: Mutex::new(None),
        }
    }

    /// Subscribes to published chart states.
    ///
    /// The cell starts out as [`ChartState::empty`] until the first
    /// [`Self::refresh`] or change notification lands.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChartState> {
        self.inner.state_tx.subscribe()
    }

    /// Fetches immediately and publishes the resulting state (initial load).
    pub async fn refresh(&self) -> ChartResult<()> {
        let ticket = self.inner.take_ticket();
        self.inner.fetch_and_publish(ticket).await
    }

    /// Signals that the external store contents may have changed.
    ///
    /// The refetch waits out the debounce window first, so a burst of
    /// notifications collapses into a single fetch: each call aborts the
    /// still-pending task of the previous one. A fetch failure is logged and
    /// the previously published state stays in place.
    pub fn notify_changed(&self) {
        let inner = Arc::clone(&self.inner);
        let ticket = inner.take_ticket();
        let task = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            if let Err(err) = inner.fetch_and_publish(ticket).await {
                tracing::warn!(error = %err, "sample refetch failed; keeping previous chart state");
            }
        });
        if let Some(previous) = lock(&self.pending).replace(task) {
            previous.abort();
        }
    }

    /// Changes the bucketing scope and recomputes from the cached samples.
    ///
    /// No refetch happens: scope only affects bucketing, not the data.
    pub fn set_scope(&self, scope: ChartScope) {
        *lock(&self.inner.scope) = scope;
        let ticket = self.inner.take_ticket();
        self.inner.publish_cached(ticket);
    }

    /// Current scope selection.
    #[must_use]
    pub fn scope(&self) -> ChartScope {
        *lock(&self.inner.scope)
    }

    /// Drives the model from a change-notification stream until the sender
    /// side closes.
    pub async fn run(&self, mut changes: mpsc::Receiver<()>) {
        while changes.recv().await.is_some() {
            self.notify_changed();
        }
    }
}

impl ModelInner {
    fn take_ticket(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn recompute(&self, samples: &[Sample]) -> ChartState {
        chart_state(samples, *lock(&self.scope), (self.clock)())
    }

    async fn fetch_and_publish(&self, ticket: u64) -> ChartResult<()> {
        let samples: Vec<Sample> = self
            .store
            .fetch_samples(&self.filter_key)
            .await?
            .into_iter()
            .filter(|sample| sample.value.is_finite())
            .collect();

        let state = self.recompute(&samples);
        let mut published = lock(&self.published_seq);
        if ticket < *published {
            tracing::debug!(ticket, latest = *published, "discarding stale recomputation");
            return Ok(());
        }
        *published = ticket;
        *lock(&self.samples) = samples;
        self.state_tx.send_replace(state);
        Ok(())
    }

    fn publish_cached(&self, ticket: u64) {
        let samples = lock(&self.samples).clone();
        let state = self.recompute(&samples);
        let mut published = lock(&self.published_seq);
        if ticket < *published {
            return;
        }
        *published = ticket;
        self.state_tx.send_replace(state);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
