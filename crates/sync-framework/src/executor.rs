//! # Single-Entity Optimistic Executor
//!
//! [`OptimisticExecutor`] runs one remote write against one logical entity. The
//! caller may pass a speculative effect that is applied synchronously before the
//! write is issued. The executor does not know how to undo that effect: on
//! failure the error callback receives the pre-call snapshot and the caller
//! reverses its own change. For automatic rollback over a keyed set of records
//! use [`OptimisticCollection`](crate::OptimisticCollection).
//!
//! Every call produces at most one notification. Failures are re-raised.

use crate::error::SyncError;
use crate::notify::{Notification, NotificationSink, DEFAULT_NOTIFICATION_DURATION};
use crate::{BoxFuture, Callback};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

type WriteFn<T, R> = Box<dyn Fn(T) -> BoxFuture<'static, Result<R, SyncError>> + Send + Sync>;

/// Receives the error and the pre-call snapshot.
pub type ErrorCallback<T> = Arc<dyn Fn(&SyncError, &T) + Send + Sync>;

pub struct ExecutorOptions<T> {
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub on_success: Option<Callback<T>>,
    pub on_error: Option<ErrorCallback<T>>,
    pub notification_duration: Duration,
}

impl<T> Default for ExecutorOptions<T> {
    fn default() -> Self {
        Self {
            success_message: None,
            error_message: None,
            on_success: None,
            on_error: None,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }
}

impl<T> ExecutorOptions<T> {
    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&SyncError, &T) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutorState {
    /// Calls currently between snapshot capture and their last callback.
    pub in_flight: usize,
    /// Error of the most recent failed call; cleared when a new call starts.
    pub error: Option<SyncError>,
}

pub struct OptimisticExecutor<T, R> {
    write_fn: WriteFn<T, R>,
    sink: Arc<dyn NotificationSink>,
    options: ExecutorOptions<T>,
    state: watch::Sender<ExecutorState>,
}

impl<T, R> OptimisticExecutor<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    pub fn new<F, Fut, E>(write_fn: F, sink: Arc<dyn NotificationSink>, options: ExecutorOptions<T>) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let write_fn: WriteFn<T, R> = Box::new(move |data| {
            let request = write_fn(data);
            Box::pin(async move { request.await.map_err(SyncError::remote) })
        });
        let (state, _) = watch::channel(ExecutorState::default());
        Self {
            write_fn,
            sink,
            options,
            state,
        }
    }

    /// Issues the write with no local speculative effect.
    pub async fn execute(&self, data: T) -> Result<R, SyncError> {
        self.run(data, None::<fn(&T)>).await
    }

    /// Applies `apply` to `data` synchronously, then issues the write.
    pub async fn execute_with<A>(&self, data: T, apply: A) -> Result<R, SyncError>
    where
        A: FnOnce(&T),
    {
        self.run(data, Some(apply)).await
    }

    async fn run<A>(&self, data: T, apply: Option<A>) -> Result<R, SyncError>
    where
        A: FnOnce(&T),
    {
        self.state.send_modify(|s| {
            s.in_flight += 1;
            s.error = None;
        });

        let snapshot = data.clone();
        if let Some(apply) = apply {
            apply(&data);
            debug!("Speculative effect applied");
        }

        let outcome = (self.write_fn)(data).await;
        let result = match outcome {
            Ok(result) => {
                info!("Write committed");
                if let Some(message) = &self.options.success_message {
                    self.sink.emit(
                        Notification::success(message.clone())
                            .with_duration(self.options.notification_duration),
                    );
                }
                if let Some(callback) = &self.options.on_success {
                    callback(&snapshot);
                }
                Ok(result)
            }
            Err(error) => {
                warn!(error = %error, "Write failed");
                self.state.send_modify(|s| s.error = Some(error.clone()));
                let message = self
                    .options
                    .error_message
                    .clone()
                    .unwrap_or_else(|| error.to_string());
                self.sink
                    .emit(Notification::error(message).with_duration(self.options.notification_duration));
                if let Some(callback) = &self.options.on_error {
                    callback(&error, &snapshot);
                }
                Err(error)
            }
        };

        self.state.send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
        result
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().in_flight > 0
    }

    pub fn error(&self) -> Option<SyncError> {
        self.state.borrow().error.clone()
    }

    pub fn state(&self) -> ExecutorState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExecutorState> {
        self.state.subscribe()
    }
}
