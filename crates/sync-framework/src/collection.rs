//! # Collection Synchronizer
//!
//! [`OptimisticCollection`] keeps an ordered, identity-keyed list of entities in
//! step with a remote store. Loads are full refreshes. Add, update and delete
//! follow the same per-call state machine:
//!
//! ```text
//! idle -> speculatively-applied -> awaiting-remote -> { committed | rolled-back }
//! ```
//!
//! Rollback restores a snapshot taken at speculative-apply time; callers never
//! supply an inverse operation. Every local transition is a single synchronous
//! `send_modify` on the published state, so subscribers see each step and no
//! other task can observe a half-applied one.
//!
//! ## Same-key calls
//!
//! With `serialize_per_key` on (the default) a mutation waits for the previous
//! mutation on the same key to reconcile before it captures its snapshot. With
//! it off, overlapping calls on one key race and the last remote response wins.
//!
//! ## Delete rollback position
//!
//! A rolled-back delete re-inserts the entity at the index it was removed from,
//! clamped to the current length.

use crate::entity::{entity_type, Entity};
use crate::error::SyncError;
use crate::keyed::{KeySlot, KeyedQueue};
use crate::notify::{Notification, NotificationSink, DEFAULT_NOTIFICATION_DURATION};
use crate::settings::SyncSettings;
use crate::{BoxFuture, Callback};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

type FetchAllFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, SyncError>> + Send + Sync>;

pub struct CollectionOptions<T> {
    pub on_success: Option<Callback<Vec<T>>>,
    pub on_error: Option<Callback<SyncError>>,
    pub serialize_per_key: bool,
    pub notification_duration: Duration,
}

impl<T> Default for CollectionOptions<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
            serialize_per_key: true,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }
}

impl<T> CollectionOptions<T> {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            serialize_per_key: settings.serialize_per_key,
            notification_duration: settings.notification_duration(),
            ..Self::default()
        }
    }

    pub fn on_success(mut self, callback: impl Fn(&Vec<T>) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&SyncError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn serialize_per_key(mut self, enabled: bool) -> Self {
        self.serialize_per_key = enabled;
        self
    }
}

/// Per-call notification texts. Unset error text falls back to
/// `"Error <verb> item: <cause>"`; unset success text emits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationMessages {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl MutationMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(mut self, message: impl Into<String>) -> Self {
        self.success = Some(message.into());
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct CollectionState<T> {
    pub items: Vec<T>,
    /// True while `load_items` is running.
    pub loading: bool,
    /// Error of the last failed load; cleared when a load starts.
    pub error: Option<SyncError>,
}

/// Client-side mirror of a remote collection with optimistic mutations.
pub struct OptimisticCollection<T: Entity> {
    fetch_all: FetchAllFn<T>,
    sink: Arc<dyn NotificationSink>,
    options: CollectionOptions<T>,
    state: watch::Sender<CollectionState<T>>,
    queue: KeyedQueue<T::Id>,
}

impl<T: Entity> OptimisticCollection<T> {
    pub fn new<F, Fut, E>(fetch_all: F, sink: Arc<dyn NotificationSink>, options: CollectionOptions<T>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        let fetch_all: FetchAllFn<T> = Box::new(move || {
            let request = fetch_all();
            Box::pin(async move { request.await.map_err(SyncError::remote) })
        });
        let (state, _) = watch::channel(CollectionState {
            items: Vec::new(),
            loading: false,
            error: None,
        });
        Self {
            fetch_all,
            sink,
            options,
            state,
            queue: KeyedQueue::new(),
        }
    }

    /// Replaces the whole collection with the remote list.
    ///
    /// On failure the current items are kept and an empty list is returned.
    pub async fn load_items(&self) -> Vec<T> {
        let entity_type = entity_type::<T>();
        debug!(entity_type, "Load");
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        match (self.fetch_all)().await {
            Ok(items) => {
                self.state.send_modify(|s| {
                    s.items = items.clone();
                    s.loading = false;
                });
                info!(entity_type, size = items.len(), "Loaded");
                if let Some(callback) = &self.options.on_success {
                    callback(&items);
                }
                items
            }
            Err(error) => {
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(error.clone());
                });
                warn!(entity_type, error = %error, "Load failed");
                self.emit(Notification::error(format!("Error loading items: {error}")));
                if let Some(callback) = &self.options.on_error {
                    callback(&error);
                }
                Vec::new()
            }
        }
    }

    /// Appends `item` immediately, then reconciles with `add_fn`'s result.
    ///
    /// On success the speculative entry is replaced by the canonical entity,
    /// which may carry a server-assigned key. On failure the entry is removed.
    pub async fn add_item<F, Fut, E>(&self, item: T, add_fn: F, messages: MutationMessages) -> Result<T, SyncError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync + 'static,
    {
        let entity_type = entity_type::<T>();
        let id = item.id().clone();
        let _slot = self.reserve(&id).await;
        debug!(entity_type, %id, "Add");

        let appended = self.state.send_if_modified(|s| {
            if s.items.iter().any(|existing| existing.id() == &id) {
                return false;
            }
            s.items.push(item.clone());
            true
        });
        if !appended {
            warn!(entity_type, %id, "Add refused, key present");
            return Err(SyncError::already_exists(&id));
        }

        match add_fn(item).await.map_err(SyncError::remote) {
            Ok(created) => {
                self.state
                    .send_modify(|s| replace_by_id(&mut s.items, &id, created.clone()));
                info!(entity_type, %id, created_id = %created.id(), size = self.len(), "Added");
                self.notify_success(&messages);
                Ok(created)
            }
            Err(error) => {
                self.state
                    .send_modify(|s| s.items.retain(|existing| existing.id() != &id));
                warn!(entity_type, %id, error = %error, "Add rolled back");
                self.notify_failure(&messages, "adding", &error);
                Err(error)
            }
        }
    }

    /// Swaps in `updated` immediately, then reconciles with `update_fn`'s result.
    ///
    /// Fails with [`SyncError::NotFound`] before any remote call if the key is
    /// absent. On failure the pre-update entity is restored.
    pub async fn update_item<F, Fut, E>(
        &self,
        updated: T,
        update_fn: F,
        messages: MutationMessages,
    ) -> Result<T, SyncError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync + 'static,
    {
        let entity_type = entity_type::<T>();
        let id = updated.id().clone();
        let _slot = self.reserve(&id).await;
        debug!(entity_type, %id, "Update");

        let mut snapshot = None;
        self.state.send_if_modified(|s| {
            match s.items.iter_mut().find(|existing| existing.id() == &id) {
                Some(current) => {
                    snapshot = Some(std::mem::replace(current, updated.clone()));
                    true
                }
                None => false,
            }
        });
        let Some(snapshot) = snapshot else {
            warn!(entity_type, %id, "Not found");
            return Err(SyncError::not_found(&id));
        };

        match update_fn(updated).await.map_err(SyncError::remote) {
            Ok(canonical) => {
                self.state
                    .send_modify(|s| replace_by_id(&mut s.items, &id, canonical.clone()));
                info!(entity_type, %id, "Updated");
                self.notify_success(&messages);
                Ok(canonical)
            }
            Err(error) => {
                self.state
                    .send_modify(|s| replace_by_id(&mut s.items, &id, snapshot));
                warn!(entity_type, %id, error = %error, "Update rolled back");
                self.notify_failure(&messages, "updating", &error);
                Err(error)
            }
        }
    }

    /// Removes the entity immediately, then confirms with `delete_fn`.
    ///
    /// Fails with [`SyncError::NotFound`] before any remote call if the key is
    /// absent. On failure the removed entity is re-inserted.
    pub async fn delete_item<F, Fut, E>(&self, id: T::Id, delete_fn: F, messages: MutationMessages) -> Result<(), SyncError>
    where
        F: FnOnce(T::Id) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Error + Send + Sync + 'static,
    {
        let entity_type = entity_type::<T>();
        let _slot = self.reserve(&id).await;
        debug!(entity_type, %id, "Delete");

        let mut removed = None;
        self.state.send_if_modified(|s| {
            match s.items.iter().position(|existing| existing.id() == &id) {
                Some(index) => {
                    removed = Some((index, s.items.remove(index)));
                    true
                }
                None => false,
            }
        });
        let Some((index, snapshot)) = removed else {
            warn!(entity_type, %id, "Not found");
            return Err(SyncError::not_found(&id));
        };

        match delete_fn(id.clone()).await.map_err(SyncError::remote) {
            Ok(()) => {
                info!(entity_type, %id, size = self.len(), "Deleted");
                self.notify_success(&messages);
                Ok(())
            }
            Err(error) => {
                self.state.send_modify(|s| {
                    let at = index.min(s.items.len());
                    s.items.insert(at, snapshot);
                });
                warn!(entity_type, %id, error = %error, "Delete rolled back");
                self.notify_failure(&messages, "deleting", &error);
                Err(error)
            }
        }
    }

    /// Replaces the local items without a remote call.
    pub fn set_items(&self, items: Vec<T>) {
        self.state.send_modify(|s| s.items = items);
    }

    /// Overwrites the entity with the same key without a remote call.
    /// Returns `false` if the key is absent.
    pub fn replace_local(&self, item: T) -> bool {
        self.state.send_if_modified(|s| {
            match s.items.iter_mut().find(|existing| existing.id() == item.id()) {
                Some(slot) => {
                    *slot = item;
                    true
                }
                None => false,
            }
        })
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<SyncError> {
        self.state.borrow().error.clone()
    }

    pub fn state(&self) -> CollectionState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionState<T>> {
        self.state.subscribe()
    }

    /// Takes the mutation slot of `id`, as add/update/delete do internally.
    ///
    /// For writes made outside those three, e.g. a separate executor that
    /// reconciles through [`replace_local`](Self::replace_local). Do not call
    /// a mutation on the same key while holding the slot: it would wait for
    /// itself. `None` when per-key serialization is off.
    pub async fn reserve(&self, id: &T::Id) -> Option<KeySlot<T::Id>> {
        if self.options.serialize_per_key {
            Some(self.queue.acquire(id).await)
        } else {
            None
        }
    }

    fn notify_success(&self, messages: &MutationMessages) {
        if let Some(message) = &messages.success {
            self.emit(Notification::success(message.clone()));
        }
    }

    fn notify_failure(&self, messages: &MutationMessages, verb: &str, error: &SyncError) {
        let message = messages
            .error
            .clone()
            .unwrap_or_else(|| format!("Error {verb} item: {error}"));
        self.emit(Notification::error(message));
    }

    fn emit(&self, notification: Notification) {
        self.sink
            .emit(notification.with_duration(self.options.notification_duration));
    }
}

fn replace_by_id<T: Entity>(items: &mut [T], id: &T::Id, value: T) {
    if let Some(slot) = items.iter_mut().find(|item| item.id() == id) {
        *slot = value;
    }
}
