//! # Async Load Controller
//!
//! [`AsyncLoader`] wraps one zero-argument async read and publishes its
//! lifecycle as a [`LoadState`]. Two loading flags are tracked:
//!
//! - `in_flight` mirrors the real lifetime of the call.
//! - `loading_visible` only turns on once the call has outlived the reveal
//!   delay (300 ms by default), so fast responses never flash a spinner.
//!
//! Load failures are terminal at this boundary: they are stored, optionally
//! notified, handed to the error callback, and `fetch` resolves to `None`.
//!
//! Overlapping calls (a manual refetch while the auto-fetch driver is
//! reading) are counted: `in_flight` stays true until the last one resolves,
//! and `loading_visible` until the last revealed one does.
//!
//! ## Known races
//!
//! - [`reset`](AsyncLoader::reset) does not cancel a call in flight. If that
//!   call resolves afterwards it overwrites the reset state.
//! - Overlapping calls store their results in completion order, so an older,
//!   slower read can overwrite the result of a newer one.

use crate::error::SyncError;
use crate::notify::{Notification, NotificationSink, DEFAULT_NOTIFICATION_DURATION};
use crate::settings::SyncSettings;
use crate::{BoxFuture, Callback};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type FetchFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, SyncError>> + Send + Sync>;

/// Configuration for an [`AsyncLoader`].
pub struct LoaderOptions<T> {
    pub initial_data: Option<T>,
    pub on_success: Option<Callback<T>>,
    pub on_error: Option<Callback<SyncError>>,
    /// Emit an error notification when the read fails.
    pub notify_errors: bool,
    /// Overrides the underlying error's message in the notification.
    pub error_message: Option<String>,
    pub reveal_delay: Duration,
    pub auto_fetch: bool,
    pub notification_duration: Duration,
}

impl<T> Default for LoaderOptions<T> {
    fn default() -> Self {
        Self {
            initial_data: None,
            on_success: None,
            on_error: None,
            notify_errors: true,
            error_message: None,
            reveal_delay: Duration::from_millis(300),
            auto_fetch: true,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }
}

impl<T> LoaderOptions<T> {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            notify_errors: settings.notify_load_errors,
            reveal_delay: settings.reveal_delay(),
            notification_duration: settings.notification_duration(),
            ..Self::default()
        }
    }

    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&SyncError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn notify_errors(mut self, enabled: bool) -> Self {
        self.notify_errors = enabled;
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }

    pub fn auto_fetch(mut self, enabled: bool) -> Self {
        self.auto_fetch = enabled;
        self
    }
}

/// Snapshot of a loader's lifecycle.
#[derive(Debug, Clone)]
pub struct LoadState<T> {
    pub data: Option<T>,
    pub in_flight: bool,
    pub loading_visible: bool,
    pub error: Option<SyncError>,
    pending: usize,
    revealed: usize,
    // Bumped by `reset`; calls started before it no longer touch the counters.
    epoch: u64,
}

impl<T> LoadState<T> {
    fn settle(&mut self, epoch: u64, revealed: bool) {
        if self.epoch == epoch {
            self.pending = self.pending.saturating_sub(1);
            if revealed {
                self.revealed = self.revealed.saturating_sub(1);
            }
        }
        self.in_flight = self.pending > 0;
        self.loading_visible = self.revealed > 0;
    }

    /// The flicker-free loading flag a view should render.
    pub fn is_loading(&self) -> bool {
        self.in_flight && self.loading_visible
    }

    /// True for the whole lifetime of a call, regardless of the reveal delay.
    pub fn is_loading_any(&self) -> bool {
        self.in_flight
    }
}

/// Releases a call's counters if its `fetch` future is dropped before it
/// resolves.
struct InFlight<'a, T> {
    state: &'a watch::Sender<LoadState<T>>,
    epoch: u64,
    revealed: bool,
    settled: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            let (epoch, revealed) = (self.epoch, self.revealed);
            self.state.send_modify(|s| s.settle(epoch, revealed));
            debug!("Fetch cancelled");
        }
    }
}

/// Controller around a single async read.
pub struct AsyncLoader<T> {
    fetch_fn: FetchFn<T>,
    sink: Arc<dyn NotificationSink>,
    options: LoaderOptions<T>,
    state: watch::Sender<LoadState<T>>,
}

impl<T> AsyncLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut, E>(fetch_fn: F, sink: Arc<dyn NotificationSink>, options: LoaderOptions<T>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let fetch_fn: FetchFn<T> = Box::new(move || {
            let request = fetch_fn();
            Box::pin(async move { request.await.map_err(SyncError::remote) })
        });
        let (state, _) = watch::channel(LoadState {
            data: options.initial_data.clone(),
            in_flight: false,
            loading_visible: false,
            error: None,
            pending: 0,
            revealed: 0,
            epoch: 0,
        });
        Self {
            fetch_fn,
            sink,
            options,
            state,
        }
    }

    /// Runs the read once and returns its result, or `None` if it failed.
    pub async fn fetch(&self) -> Option<T> {
        let mut epoch = 0;
        self.state.send_modify(|s| {
            s.error = None;
            s.pending += 1;
            s.in_flight = true;
            epoch = s.epoch;
        });
        debug!("Fetch started");
        let mut guard = InFlight {
            state: &self.state,
            epoch,
            revealed: false,
            settled: false,
        };

        // Reveal timer: armed here, disarmed on every resolution path below.
        let mut request = (self.fetch_fn)();
        let reveal = tokio::time::sleep(self.options.reveal_delay);
        tokio::pin!(reveal);
        let mut timer_fired = false;
        let outcome = loop {
            tokio::select! {
                biased;
                outcome = &mut request => break outcome,
                _ = &mut reveal, if !timer_fired => {
                    timer_fired = true;
                    self.state.send_modify(|s| {
                        if s.epoch == epoch {
                            s.revealed += 1;
                            s.loading_visible = true;
                            guard.revealed = true;
                        }
                    });
                    debug!(revealed = guard.revealed, "Reveal delay elapsed");
                }
            }
        };

        let revealed = guard.revealed;
        guard.settled = true;
        match outcome {
            Ok(data) => {
                self.state.send_modify(|s| {
                    s.data = Some(data.clone());
                    s.settle(epoch, revealed);
                });
                info!(revealed, "Fetch ok");
                if let Some(callback) = &self.options.on_success {
                    callback(&data);
                }
                Some(data)
            }
            Err(error) => {
                self.state.send_modify(|s| {
                    s.error = Some(error.clone());
                    s.settle(epoch, revealed);
                });
                warn!(error = %error, revealed, "Fetch failed");
                if self.options.notify_errors {
                    let message = self
                        .options
                        .error_message
                        .clone()
                        .unwrap_or_else(|| error.to_string());
                    self.sink.emit(
                        Notification::error(message).with_duration(self.options.notification_duration),
                    );
                }
                if let Some(callback) = &self.options.on_error {
                    callback(&error);
                }
                None
            }
        }
    }

    /// Manual re-invocation, e.g. from a retry button.
    pub async fn refetch(&self) -> Option<T> {
        self.fetch().await
    }

    /// Restores the initial data and clears the error and both loading flags.
    pub fn reset(&self) {
        let initial = self.options.initial_data.clone();
        self.state.send_modify(|s| {
            s.data = initial;
            s.error = None;
            s.pending = 0;
            s.revealed = 0;
            s.epoch += 1;
            s.in_flight = false;
            s.loading_visible = false;
        });
        debug!("Reset");
    }

    /// Overwrites the current data without a read.
    pub fn set_data(&self, data: Option<T>) {
        self.state.send_modify(|s| s.data = data);
    }

    /// Drives auto-fetch: one fetch now, then one per change of `deps`.
    ///
    /// Several dependencies are combined into one value (a query struct or a
    /// tuple). A send that leaves the value equal to the last fetched-for one is
    /// ignored. The driver stops once the dependency sender is dropped. Returns
    /// `None` when auto-fetch is disabled.
    pub fn auto_fetch<D>(self: &Arc<Self>, mut deps: watch::Receiver<D>) -> Option<JoinHandle<()>>
    where
        D: PartialEq + Clone + Send + Sync + 'static,
    {
        if !self.options.auto_fetch {
            return None;
        }
        let loader = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut last = deps.borrow_and_update().clone();
            loader.fetch().await;
            while deps.changed().await.is_ok() {
                let current = deps.borrow_and_update().clone();
                if current == last {
                    continue;
                }
                last = current;
                debug!("Dependencies changed");
                loader.fetch().await;
            }
            debug!("Dependencies closed, auto-fetch stopped");
        }))
    }

    /// Auto-fetch with no dependencies: a single fetch on start.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let (_never_changes, deps) = watch::channel(());
        self.auto_fetch(deps)
    }

    pub fn state(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn error(&self) -> Option<SyncError> {
        self.state.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn is_loading_any(&self) -> bool {
        self.state.borrow().is_loading_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockError, MockRemote, RecordingSink};
    use crate::notify::NotificationKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn slow_read(
        latency: Duration,
        value: u32,
    ) -> impl Fn() -> BoxFuture<'static, Result<u32, MockError>> + Send + Sync + 'static {
        move || {
            Box::pin(async move {
                tokio::time::sleep(latency).await;
                Ok(value)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_read_never_reveals_loading() {
        let sink = Arc::new(RecordingSink::new());
        let loader = Arc::new(AsyncLoader::new(
            slow_read(Duration::from_millis(100), 42),
            sink,
            LoaderOptions::default(),
        ));

        let task = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.fetch().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(loader.is_loading_any());
        assert!(!loader.is_loading());

        assert_eq!(task.await.unwrap(), Some(42));
        assert!(!loader.is_loading_any());
        assert!(!loader.state().loading_visible);

        // The disarmed timer must not fire later either.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!loader.state().loading_visible);
        assert_eq!(loader.data(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_read_reveals_loading_after_delay() {
        let sink = Arc::new(RecordingSink::new());
        let loader = Arc::new(AsyncLoader::new(
            slow_read(Duration::from_millis(1000), 7),
            sink,
            LoaderOptions::default(),
        ));

        let task = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.fetch().await }
        });

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!loader.is_loading());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(loader.is_loading());

        assert_eq!(task.await.unwrap(), Some(7));
        assert!(!loader.is_loading());
        assert!(!loader.is_loading_any());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_fetches_keep_flags_until_the_last_resolves() {
        let sink = Arc::new(RecordingSink::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = Arc::new(AsyncLoader::new(
            {
                let calls = Arc::clone(&calls);
                move || {
                    // First read is slow, the second one fast.
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    let latency = if n == 0 { 1000 } else { 400 };
                    async move {
                        tokio::time::sleep(Duration::from_millis(latency)).await;
                        Ok::<_, MockError>(n as u32)
                    }
                }
            },
            sink,
            LoaderOptions::default(),
        ));

        let slow = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.fetch().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fast = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.refetch().await }
        });

        assert_eq!(fast.await.unwrap(), Some(1));
        let state = loader.state();
        assert!(state.in_flight);
        assert!(state.loading_visible);
        assert!(loader.is_loading());

        assert_eq!(slow.await.unwrap(), Some(0));
        let state = loader.state();
        assert!(!state.in_flight);
        assert!(!state.loading_visible);
        // Results land in completion order.
        assert_eq!(state.data, Some(0));
    }

    #[tokio::test]
    async fn late_read_after_reset_overwrites_reset_state() {
        let sink = Arc::new(RecordingSink::new());
        let remote = MockRemote::<(), u32>::new();
        let responder = remote.expect_call().deferred();
        remote.expect_call().return_ok(8);
        let loader = Arc::new(AsyncLoader::new(
            remote.fetcher(),
            sink,
            LoaderOptions::default().initial_data(0),
        ));

        let pending = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.fetch().await }
        });
        loader.subscribe().wait_for(|s| s.in_flight).await.unwrap();

        loader.reset();
        let state = loader.state();
        assert_eq!(state.data, Some(0));
        assert!(!state.in_flight);

        responder.resolve(5);
        assert_eq!(pending.await.unwrap(), Some(5));
        assert_eq!(loader.data(), Some(5));
        assert!(!loader.is_loading_any());

        // Counters are still balanced for the next call.
        assert_eq!(loader.fetch().await, Some(8));
        assert!(!loader.is_loading_any());
        remote.verify();
    }

    #[tokio::test]
    async fn dropped_fetch_releases_in_flight() {
        let sink = Arc::new(RecordingSink::new());
        let remote = MockRemote::<(), u32>::new();
        let _responder = remote.expect_call().deferred();
        let loader = Arc::new(AsyncLoader::new(remote.fetcher(), sink, LoaderOptions::default()));

        let task = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.fetch().await }
        });
        loader.subscribe().wait_for(|s| s.in_flight).await.unwrap();

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!loader.is_loading_any());
    }

    #[tokio::test]
    async fn failure_is_stored_notified_and_not_raised() {
        let sink = Arc::new(RecordingSink::new());
        let remote = MockRemote::<(), u32>::new();
        remote.expect_call().return_err("backend down");
        let seen = Arc::new(AtomicUsize::new(0));

        let loader = AsyncLoader::new(
            remote.fetcher(),
            sink.clone(),
            LoaderOptions::default().initial_data(1).on_error({
                let seen = Arc::clone(&seen);
                move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );

        assert_eq!(loader.fetch().await, None);
        assert_eq!(loader.data(), Some(1));
        assert_eq!(loader.error().unwrap().to_string(), "backend down");
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::Error);
        assert_eq!(events[0].message, "backend down");
        remote.verify();
    }

    #[tokio::test]
    async fn configured_message_overrides_and_notifications_can_be_suppressed() {
        let sink = Arc::new(RecordingSink::new());
        let remote = MockRemote::<(), u32>::new();
        remote.expect_call().return_err("timeout");
        remote.expect_call().return_err("timeout");

        let loud = AsyncLoader::new(
            remote.fetcher(),
            sink.clone(),
            LoaderOptions::default().error_message("Failed to fetch data"),
        );
        loud.fetch().await;
        assert_eq!(sink.events()[0].message, "Failed to fetch data");

        let quiet = AsyncLoader::new(
            remote.fetcher(),
            sink.clone(),
            LoaderOptions::default().notify_errors(false),
        );
        quiet.fetch().await;
        assert_eq!(sink.len(), 1);
        assert!(quiet.error().is_some());
    }

    #[tokio::test]
    async fn success_clears_previous_error_and_reset_restores_initial() {
        let sink = Arc::new(RecordingSink::new());
        let remote = MockRemote::<(), u32>::new();
        remote.expect_call().return_err("flaky");
        remote.expect_call().return_ok(10);

        let loader = AsyncLoader::new(remote.fetcher(), sink, LoaderOptions::default().initial_data(0));
        assert_eq!(loader.fetch().await, None);
        assert!(loader.error().is_some());

        assert_eq!(loader.refetch().await, Some(10));
        assert!(loader.error().is_none());
        assert_eq!(loader.data(), Some(10));

        loader.reset();
        let state = loader.state();
        assert_eq!(state.data, Some(0));
        assert!(state.error.is_none());
        assert!(!state.in_flight);
    }

    #[tokio::test]
    async fn auto_fetch_follows_dependency_changes() {
        let sink = Arc::new(RecordingSink::new());
        let (page_tx, page_rx) = watch::channel(1u32);
        let reads = Arc::new(AtomicUsize::new(0));

        let loader = Arc::new(AsyncLoader::new(
            {
                let reads = Arc::clone(&reads);
                let page_rx = page_rx.clone();
                move || {
                    reads.fetch_add(1, Ordering::SeqCst);
                    let page = *page_rx.borrow();
                    async move { Ok::<_, MockError>(page * 10) }
                }
            },
            sink,
            LoaderOptions::default(),
        ));
        let mut state = loader.subscribe();
        let driver = loader.auto_fetch(page_rx).expect("auto-fetch enabled");

        state.wait_for(|s| s.data == Some(10)).await.unwrap();

        page_tx.send(2).unwrap();
        state.wait_for(|s| s.data == Some(20)).await.unwrap();

        // Same value again: no extra read.
        page_tx.send(2).unwrap();
        drop(page_tx);
        driver.await.unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_auto_fetch_is_manual_only() {
        let sink = Arc::new(RecordingSink::new());
        let remote = MockRemote::<(), u32>::new();
        let loader = Arc::new(AsyncLoader::new(
            remote.fetcher(),
            sink,
            LoaderOptions::default().auto_fetch(false),
        ));
        assert!(loader.start().is_none());
        assert_eq!(remote.call_count(), 0);
    }
}
