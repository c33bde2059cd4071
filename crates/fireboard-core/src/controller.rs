// ── Feed controller ──
//
// Owns the one ExchangeClient, the current FeedSnapshot, and the live-update
// subscription. Refreshes may overlap; whichever completes last publishes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use fireboard_api::{ChangeTick, DataInput, DataRef, EventStreamHandle, ExchangeClient, StreamStatus};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::error::CoreError;
use crate::notice::Notice;
use crate::snapshot::FeedSnapshot;

const NOTICE_CHANNEL_SIZE: usize = 64;

// ── FeedState ───────────────────────────────────────────────────────

/// Load state of the feed.
///
/// `Idle` until the first successful refresh, `Loading` while any refresh
/// is in flight, `Ready` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Idle,
    Loading,
    Ready,
}

// ── FeedController ──────────────────────────────────────────────────

/// Entry point for consumers. Cheaply cloneable via `Arc<FeedInner>`.
#[derive(Clone)]
pub struct FeedController {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    config: BoardConfig,
    client: ExchangeClient,
    snapshot: watch::Sender<Arc<FeedSnapshot>>,
    state: watch::Sender<FeedState>,
    notice_tx: broadcast::Sender<Notice>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    stream_status: watch::Sender<StreamStatus>,
    /// Refreshes currently running. Only touched under the `state` lock.
    in_flight: AtomicUsize,
    published: AtomicBool,
    started: AtomicBool,
    cancel: CancellationToken,
    stream: Mutex<Option<EventStreamHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for FeedInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl FeedController {
    /// Build the controller and its HTTP client. Does not touch the network;
    /// call [`start()`](Self::start) for the initial load and live updates.
    pub fn new(config: BoardConfig) -> Result<Self, CoreError> {
        let client = ExchangeClient::new(&config.node_url, config.namespace.clone(), &config.transport())?;
        Ok(Self::with_client(config, client))
    }

    /// Use an already-built client.
    pub fn with_client(config: BoardConfig, client: ExchangeClient) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(FeedSnapshot::default()));
        let (state, _) = watch::channel(FeedState::Idle);
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let (last_refresh, _) = watch::channel(None);
        let (stream_status, _) = watch::channel(StreamStatus::Stopped);

        Self {
            inner: Arc::new(FeedInner {
                config,
                client,
                snapshot,
                state,
                notice_tx,
                last_refresh,
                stream_status,
                in_flight: AtomicUsize::new(0),
                published: AtomicBool::new(false),
                started: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                stream: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ExchangeClient {
        &self.inner.client
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// One-time initialization: open the live-update stream (when enabled)
    /// and perform the initial refresh.
    ///
    /// Later calls are no-ops. A failed initial refresh is reported as a
    /// notice, not an error; only an unusable event-stream URL fails here.
    pub async fn start(&self) -> Result<(), CoreError> {
        let subscription = if self.inner.config.live_updates {
            Some(self.inner.config.subscription_url()?)
        } else {
            None
        };

        if self.inner.started.swap(true, Ordering::AcqRel) {
            debug!("feed already started");
            return Ok(());
        }

        if let Some(url) = subscription {
            self.spawn_live_updates(url).await;
        }

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial refresh failed");
        }
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    async fn spawn_live_updates(&self, url: url::Url) {
        info!(%url, "opening live-update stream");
        let stream_cancel = self.inner.cancel.child_token();
        let handle = EventStreamHandle::connect(url, self.inner.config.reconnect(), stream_cancel.clone());

        let ticks = handle.subscribe();
        let status = handle.status();
        let weak = Arc::downgrade(&self.inner);

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(live_update_task(weak.clone(), ticks, stream_cancel.clone())));
        handles.push(tokio::spawn(stream_status_task(weak, status, stream_cancel)));
        drop(handles);

        *self.inner.stream.lock().await = Some(handle);
    }

    /// Stop the live-update stream and join background tasks.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.stream.lock().await.take() {
            handle.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        self.inner.stream_status.send_replace(StreamStatus::Stopped);
    }

    /// Build a controller without live updates, run `f`, shut down.
    pub async fn oneshot<F, Fut, T>(config: BoardConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(FeedController) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.live_updates = false;

        let controller = FeedController::new(cfg)?;
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Re-pull the message list and its data, then publish a fresh snapshot.
    ///
    /// On failure the previous snapshot stays in place and an error notice
    /// is raised.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let _guard = InFlight::enter(&self.inner);

        match self.pull().await {
            Ok(snapshot) => {
                self.publish(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "refresh failed, keeping previous snapshot");
                self.notify(Notice::error(format!("Could not refresh messages: {e}")));
                Err(e)
            }
        }
    }

    async fn pull(&self) -> Result<FeedSnapshot, CoreError> {
        let messages = self.inner.client.list_messages().await?;
        let refs: Vec<DataRef> = messages.iter().flat_map(|m| m.data.iter().cloned()).collect();
        let data = self.inner.client.fetch_data(&refs).await?;
        debug!(messages = messages.len(), data = data.len(), "pulled feed");
        Ok(FeedSnapshot::new(messages, data))
    }

    fn publish(&self, snapshot: FeedSnapshot) {
        // Value-equal snapshots keep the current Arc so watchers are not woken.
        self.inner.snapshot.send_if_modified(|current| {
            if **current == snapshot {
                false
            } else {
                *current = Arc::new(snapshot);
                true
            }
        });
        self.inner.published.store(true, Ordering::Release);
        self.inner.last_refresh.send_replace(Some(Utc::now()));
    }

    /// Broadcast `text` as a single string value.
    ///
    /// Returns the accepted message id when the node echoed one. The feed is
    /// not touched here: the new message appears via the next refresh.
    pub async fn submit(&self, text: &str) -> Result<Option<String>, CoreError> {
        match self.inner.client.send_broadcast(&[DataInput::text(text)]).await {
            Ok(accepted) => {
                let id = accepted.map(|m| m.header.id);
                info!(id = id.as_deref().unwrap_or("-"), "broadcast accepted");
                Ok(id)
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(error = %err, "broadcast failed");
                self.notify(Notice::error(format!("Could not send message: {err}")));
                Err(err)
            }
        }
    }

    /// Raise a notice for every current subscriber.
    pub fn notify(&self, notice: Notice) {
        let _ = self.inner.notice_tx.send(notice);
    }

    fn spawn_refresh(&self) {
        let ctrl = self.clone();
        tokio::spawn(async move {
            if let Err(e) = ctrl.refresh().await {
                debug!(error = %e, "tick-triggered refresh failed");
            }
        });
    }

    // ── Observation ─────────────────────────────────────────────────

    /// The snapshot currently published.
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        Arc::clone(&self.inner.snapshot.borrow())
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.inner.snapshot.subscribe()
    }

    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> FeedState {
        *self.inner.state.borrow()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notice_tx.subscribe()
    }

    /// Live-update connection state. `Stopped` until started.
    pub fn stream_status(&self) -> watch::Receiver<StreamStatus> {
        self.inner.stream_status.subscribe()
    }

    /// When the last successful refresh completed.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_refresh.borrow()
    }

    pub fn subscribe_last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.inner.last_refresh.subscribe()
    }
}

// ── In-flight accounting ────────────────────────────────────────────

struct InFlight<'a> {
    inner: &'a FeedInner,
}

impl<'a> InFlight<'a> {
    fn enter(inner: &'a FeedInner) -> Self {
        inner.state.send_modify(|state| {
            inner.in_flight.fetch_add(1, Ordering::Relaxed);
            *state = FeedState::Loading;
        });
        Self { inner }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let inner = self.inner;
        inner.state.send_if_modified(|state| {
            if inner.in_flight.fetch_sub(1, Ordering::Relaxed) > 1 {
                return false;
            }
            *state = if inner.published.load(Ordering::Acquire) {
                FeedState::Ready
            } else {
                FeedState::Idle
            };
            true
        });
    }
}

// ── Background tasks ────────────────────────────────────────────────

/// Every tick schedules one refresh. A lagged receiver counts as one tick.
async fn live_update_task(
    inner: Weak<FeedInner>,
    mut ticks: broadcast::Receiver<ChangeTick>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = ticks.recv() => {
                match result {
                    Ok(tick) => debug!(at = %tick.received_at, "change tick"),
                    Err(RecvError::Lagged(n)) => debug!(skipped = n, "ticks lagged, refreshing once"),
                    Err(RecvError::Closed) => break,
                }
                let Some(inner) = inner.upgrade() else { break };
                FeedController { inner }.spawn_refresh();
            }
        }
    }
}

async fn stream_status_task(
    inner: Weak<FeedInner>,
    mut status: watch::Receiver<StreamStatus>,
    cancel: CancellationToken,
) {
    loop {
        let current = *status.borrow_and_update();
        {
            let Some(strong) = inner.upgrade() else { break };
            strong.stream_status.send_replace(current);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
