//! # Sync Framework
//!
//! Client-side state synchronization against a slow or unreliable remote store.
//! The local view is updated *speculatively* before the remote confirms a write,
//! then either kept (with the canonical value the remote returned) or rolled
//! back to a snapshot taken just before the speculative change.
//!
//! ## Components
//!
//! 1. **[`AsyncLoader`]** - one remote read with a debounced loading flag. The
//!    flag only becomes visible once a request has been outstanding longer than
//!    the reveal delay (300 ms by default), so fast reads never flash a spinner.
//! 2. **[`OptimisticExecutor`]** - one remote write against one entity. It
//!    applies a caller-supplied speculative effect and hands the pre-call
//!    snapshot to the error callback. It does not roll back on its own.
//! 3. **[`OptimisticCollection`]** - an ordered, keyed list of [`Entity`] values
//!    with load/add/update/delete. Rollback is automatic and snapshot based.
//!
//! Every outcome the user should hear about goes to a [`NotificationSink`]:
//! [`NotificationCenter`] keeps an auto-dismissing list, [`TracingSink`] just logs.
//!
//! ## Example
//!
//! ```rust
//! use sync_framework::{CollectionOptions, Entity, MutationMessages, NotificationCenter, OptimisticCollection};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Note { id: u32, text: String }
//!
//! impl Entity for Note {
//!     type Id = u32;
//!     fn id(&self) -> &u32 { &self.id }
//! }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("store unavailable")]
//! struct StoreDown;
//!
//! #[tokio::main]
//! async fn main() {
//!     let center = NotificationCenter::new();
//!     let notes = OptimisticCollection::new(
//!         || async { Ok::<_, StoreDown>(vec![Note { id: 1, text: "draft".into() }]) },
//!         Arc::new(center.clone()),
//!         CollectionOptions::default(),
//!     );
//!     notes.load_items().await;
//!
//!     let result = notes
//!         .update_item(
//!             Note { id: 1, text: "final".into() },
//!             |_note| async { Err::<Note, _>(StoreDown) },
//!             MutationMessages::new().error("Could not save note"),
//!         )
//!         .await;
//!
//!     assert!(result.is_err());
//!     assert_eq!(notes.get(&1).unwrap().text, "draft");
//!     assert_eq!(center.notifications()[0].notification.message, "Could not save note");
//! }
//! ```
//!
//! ## Concurrency
//!
//! All state lives in `tokio::sync::watch` channels and every local transition
//! is one synchronous modification, so a subscriber never sees a half-applied
//! mutation. Mutations on the same key in one collection are serialized by a
//! [`KeyedQueue`] unless `serialize_per_key` is turned off.
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockRemote`](mock::MockRemote) for scripting
//! remote responses (including calls held open until the test releases them)
//! and [`RecordingSink`](mock::RecordingSink) for asserting on notifications.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod collection;
pub mod entity;
pub mod error;
pub mod executor;
pub mod keyed;
pub mod loader;
pub mod mock;
pub mod notify;
pub mod settings;
pub mod tracing;

/// Boxed, sendable future used for type-erased remote operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared callback invoked with a borrowed value.
pub type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;

// Re-export core types for convenience
pub use collection::{CollectionOptions, CollectionState, MutationMessages, OptimisticCollection};
pub use entity::Entity;
pub use error::SyncError;
pub use executor::{ExecutorOptions, ExecutorState, OptimisticExecutor};
pub use keyed::{KeySlot, KeyedQueue};
pub use loader::{AsyncLoader, LoadState, LoaderOptions};
pub use notify::{
    ActiveNotification, Notification, NotificationCenter, NotificationKind, NotificationSink, TracingSink,
    DEFAULT_NOTIFICATION_DURATION,
};
pub use settings::SyncSettings;
