use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use observation_charts::api::Clock;
use observation_charts::core::{ChartScope, Sample};
use observation_charts::error::{ChartError, ChartResult};
use observation_charts::{ObservationChartConfig, ObservationChartModel, SampleStore};
use tokio::sync::{Mutex, mpsc};

const STEP_COUNT_CODE: &str = "55423-8";

struct FakeStore {
    samples: Mutex<Vec<Sample>>,
    fetch_calls: AtomicU64,
    fail: AtomicBool,
    last_filter_key: Mutex<Option<String>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
            fail: AtomicBool::new(false),
            last_filter_key: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SampleStore for FakeStore {
    async fn fetch_samples(&self, filter_key: &str) -> ChartResult<Vec<Sample>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        *self.last_filter_key.lock().await = Some(filter_key.to_owned());
        if self.fail.load(Ordering::Relaxed) {
            return Err(ChartError::StoreFetch("store offline".to_owned()));
        }
        Ok(self.samples.lock().await.clone())
    }
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap()
}

fn fixed_clock() -> Clock {
    Arc::new(|| fixed_now())
}

fn sample(h: u32, mi: u32, value: f64) -> Sample {
    Sample::new(Utc.with_ymd_and_hms(2024, 1, 2, h, mi, 0).unwrap(), value)
        .expect("finite sample")
}

fn model_with(store: Arc<FakeStore>) -> ObservationChartModel {
    ObservationChartModel::with_clock(
        store,
        ObservationChartConfig::new(STEP_COUNT_CODE),
        fixed_clock(),
    )
}

#[tokio::test]
async fn refresh_publishes_initial_state() {
    let store = Arc::new(FakeStore::default());
    *store.samples.lock().await = vec![sample(2, 30, 5.0), sample(1, 15, 3.0)];

    let model = model_with(Arc::clone(&store));
    let rx = model.subscribe();
    model.refresh().await.expect("initial fetch");

    let state = rx.borrow().clone();
    assert_eq!(state.scope, ChartScope::Day);
    assert_eq!(state.buckets.len(), 4);
    assert_eq!(state.max_value, 5.0);
    assert_eq!(store.fetch_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn subscriber_starts_with_empty_state() {
    let model = model_with(Arc::new(FakeStore::default()));
    let rx = model.subscribe();

    let state = rx.borrow().clone();
    assert!(state.buckets.is_empty());
    assert_eq!(state.max_value, 0.0);
}

#[tokio::test(start_paused = true)]
async fn notification_burst_coalesces_into_one_fetch() {
    let store = Arc::new(FakeStore::default());
    *store.samples.lock().await = vec![sample(2, 30, 5.0)];

    let model = model_with(Arc::clone(&store));
    let mut rx = model.subscribe();

    for _ in 0..5 {
        model.notify_changed();
    }

    rx.changed().await.expect("published state");
    assert_eq!(store.fetch_calls.load(Ordering::Relaxed), 1);
    assert_eq!(rx.borrow().max_value, 5.0);
}

#[tokio::test]
async fn set_scope_rebuckets_without_refetch() {
    let store = Arc::new(FakeStore::default());
    *store.samples.lock().await = vec![sample(2, 30, 5.0)];

    let model = model_with(Arc::clone(&store));
    let rx = model.subscribe();
    model.refresh().await.expect("initial fetch");

    model.set_scope(ChartScope::Week);

    assert_eq!(store.fetch_calls.load(Ordering::Relaxed), 1);
    assert_eq!(model.scope(), ChartScope::Week);

    let state = rx.borrow().clone();
    assert_eq!(state.scope, ChartScope::Week);
    assert_eq!(state.buckets.len(), 7);
    assert_eq!(state.max_value, 5.0);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_keeps_previous_state() {
    let store = Arc::new(FakeStore::default());
    *store.samples.lock().await = vec![sample(2, 30, 5.0)];

    let model = model_with(Arc::clone(&store));
    let rx = model.subscribe();
    model.refresh().await.expect("initial fetch");
    let before = rx.borrow().clone();

    store.fail.store(true, Ordering::Relaxed);
    model.notify_changed();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(store.fetch_calls.load(Ordering::Relaxed), 2);
    assert_eq!(*rx.borrow(), before);
}

#[tokio::test(start_paused = true)]
async fn stale_recomputation_never_overwrites_newer_state() {
    let store = Arc::new(FakeStore::default());
    *store.samples.lock().await = vec![sample(2, 30, 5.0)];

    let model = model_with(Arc::clone(&store));
    let rx = model.subscribe();
    model.refresh().await.expect("initial fetch");

    // The debounced refetch below will see the new store contents but loses
    // the sequence race to the scope change published while it slept.
    *store.samples.lock().await = vec![sample(2, 30, 11.0)];
    model.notify_changed();
    model.set_scope(ChartScope::Week);

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(store.fetch_calls.load(Ordering::Relaxed), 2);
    let state = rx.borrow().clone();
    assert_eq!(state.scope, ChartScope::Week);
    assert_eq!(state.max_value, 5.0);
}

#[tokio::test(start_paused = true)]
async fn run_drives_a_change_notification_stream() {
    let store = Arc::new(FakeStore::default());
    *store.samples.lock().await = vec![sample(2, 30, 5.0)];

    let model = Arc::new(model_with(Arc::clone(&store)));
    let mut rx = model.subscribe();

    let (tx, changes) = mpsc::channel(8);
    let driver = {
        let model = Arc::clone(&model);
        tokio::spawn(async move { model.run(changes).await })
    };

    for _ in 0..3 {
        tx.send(()).await.expect("queued notification");
    }
    drop(tx);
    driver.await.expect("driver finished");

    rx.changed().await.expect("published state");
    assert_eq!(store.fetch_calls.load(Ordering::Relaxed), 1);
    assert_eq!(rx.borrow().max_value, 5.0);
}

#[tokio::test]
async fn filter_key_reaches_the_store() {
    let store = Arc::new(FakeStore::default());
    let model = model_with(Arc::clone(&store));
    model.refresh().await.expect("initial fetch");

    assert_eq!(
        store.last_filter_key.lock().await.as_deref(),
        Some(STEP_COUNT_CODE)
    );
}

#[tokio::test]
async fn non_finite_fetched_values_are_dropped_at_ingestion() {
    let store = Arc::new(FakeStore::default());
    *store.samples.lock().await = vec![
        Sample {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 2, 30, 0).unwrap(),
            value: f64::NAN,
        },
        sample(2, 20, 5.0),
    ];

    let model = model_with(Arc::clone(&store));
    let rx = model.subscribe();
    model.refresh().await.expect("initial fetch");

    assert_eq!(rx.borrow().max_value, 5.0);
}
