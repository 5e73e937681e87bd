//! # Mock Remotes & Recording Sink
//!
//! Test doubles for the two seams of this crate: the remote operation passed to
//! a loader, executor or collection, and the [`NotificationSink`].
//!
//! ## MockRemote
//!
//! [`MockRemote<I, O>`] stands in for any `Fn(I) -> Future<Output = Result<O, _>>`.
//! Expectations are queued with [`MockRemote::expect_call`] and consumed in
//! order, one per call. A call with no expectation left panics.
//!
//! ```rust
//! use sync_framework::mock::{MockRemote, RecordingSink};
//! use sync_framework::{CollectionOptions, Entity, MutationMessages, OptimisticCollection};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Tag { id: u32, label: String }
//! impl Entity for Tag {
//!     type Id = u32;
//!     fn id(&self) -> &u32 { &self.id }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let list = MockRemote::<(), Vec<Tag>>::new();
//!     list.expect_call().return_ok(vec![Tag { id: 1, label: "rust".into() }]);
//!
//!     let sink = Arc::new(RecordingSink::new());
//!     let tags = OptimisticCollection::new(list.fetcher(), sink.clone(), CollectionOptions::default());
//!     tags.load_items().await;
//!
//!     let update = MockRemote::<Tag, Tag>::new();
//!     update.expect_call().return_err("read-only");
//!     let result = tags
//!         .update_item(Tag { id: 1, label: "go".into() }, update.handler(), MutationMessages::new())
//!         .await;
//!
//!     assert!(result.is_err());
//!     assert_eq!(tags.get(&1).unwrap().label, "rust");
//!     assert_eq!(sink.errors(), vec!["Error updating item: read-only".to_string()]);
//!     list.verify();
//!     update.verify();
//! }
//! ```
//!
//! ## Holding a call open
//!
//! [`CallExpectationBuilder::deferred`] returns a [`Responder`]; the call stays
//! pending until the test resolves or rejects it. Use it to observe the
//! speculative state while the remote is "in flight".

use crate::notify::{Notification, NotificationKind, NotificationSink};
use crate::BoxFuture;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Error produced by mock remotes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MockError(pub String);

impl MockError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

enum Expectation<O> {
    Ready(Result<O, MockError>),
    Deferred(oneshot::Receiver<Result<O, MockError>>),
}

struct MockInner<I, O> {
    expectations: VecDeque<Expectation<O>>,
    calls: Vec<I>,
}

/// Scripted stand-in for a remote operation.
pub struct MockRemote<I, O> {
    inner: Arc<Mutex<MockInner<I, O>>>,
}

impl<I, O> Clone for MockRemote<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, O> Default for MockRemote<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> MockRemote<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                expectations: VecDeque::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Queues the response for the next unanswered call.
    pub fn expect_call(&self) -> CallExpectationBuilder<I, O> {
        CallExpectationBuilder {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Records `input` and answers with the next queued expectation.
    ///
    /// # Panics
    ///
    /// If no expectation is left.
    pub fn call(&self, input: I) -> BoxFuture<'static, Result<O, MockError>> {
        let expectation = {
            let mut inner = self.inner.lock();
            inner.calls.push(input);
            inner.expectations.pop_front()
        };
        match expectation {
            Some(Expectation::Ready(response)) => Box::pin(async move { response }),
            Some(Expectation::Deferred(receiver)) => Box::pin(async move {
                receiver
                    .await
                    .unwrap_or_else(|_| Err(MockError::new("responder dropped")))
            }),
            None => panic!("Unexpected call: no expectation left"),
        }
    }

    /// The mock as a remote operation taking one argument.
    pub fn handler(&self) -> impl Fn(I) -> BoxFuture<'static, Result<O, MockError>> + Clone + Send + Sync + 'static {
        let mock = self.clone();
        move |input| mock.call(input)
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    /// Verifies that all expectations were consumed.
    pub fn verify(&self) {
        let remaining = self.inner.lock().expectations.len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

impl<I, O> MockRemote<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Arguments of every call so far, in call order.
    pub fn calls(&self) -> Vec<I> {
        self.inner.lock().calls.clone()
    }
}

impl<O> MockRemote<(), O>
where
    O: Send + 'static,
{
    /// The mock as a zero-argument read.
    pub fn fetcher(&self) -> impl Fn() -> BoxFuture<'static, Result<O, MockError>> + Clone + Send + Sync + 'static {
        let mock = self.clone();
        move || mock.call(())
    }
}

/// Builder for one queued response.
pub struct CallExpectationBuilder<I, O> {
    inner: Arc<Mutex<MockInner<I, O>>>,
}

impl<I, O> CallExpectationBuilder<I, O> {
    pub fn return_ok(self, value: O) {
        self.push(Expectation::Ready(Ok(value)));
    }

    pub fn return_err(self, message: impl Into<String>) {
        self.push(Expectation::Ready(Err(MockError::new(message))));
    }

    /// Leaves the call pending until the returned [`Responder`] answers it.
    pub fn deferred(self) -> Responder<O> {
        let (sender, receiver) = oneshot::channel();
        self.push(Expectation::Deferred(receiver));
        Responder { sender }
    }

    fn push(self, expectation: Expectation<O>) {
        self.inner.lock().expectations.push_back(expectation);
    }
}

/// Answers a deferred call.
pub struct Responder<O> {
    sender: oneshot::Sender<Result<O, MockError>>,
}

impl<O> Responder<O> {
    pub fn resolve(self, value: O) {
        let _ = self.sender.send(Ok(value));
    }

    pub fn reject(self, message: impl Into<String>) {
        let _ = self.sender.send(Err(MockError::new(message)));
    }
}

/// A [`NotificationSink`] that keeps everything it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.messages_of(NotificationKind::Success)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages_of(NotificationKind::Error)
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn messages_of(&self, kind: NotificationKind) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, notification: Notification) {
        self.events.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expectations_are_consumed_in_order() {
        let remote = MockRemote::<u32, u32>::new();
        remote.expect_call().return_ok(1);
        remote.expect_call().return_err("second");

        assert_eq!(remote.call(10).await, Ok(1));
        assert_eq!(remote.call(20).await, Err(MockError::new("second")));
        assert_eq!(remote.calls(), vec![10, 20]);
        remote.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met. 1 remaining")]
    async fn verify_reports_leftovers() {
        let remote = MockRemote::<(), ()>::new();
        remote.expect_call().return_ok(());
        remote.verify();
    }

    #[tokio::test]
    async fn dropped_responder_fails_the_call() {
        let remote = MockRemote::<(), u8>::new();
        let responder = remote.expect_call().deferred();
        let pending = remote.call(());
        drop(responder);
        assert_eq!(pending.await, Err(MockError::new("responder dropped")));
    }
}
