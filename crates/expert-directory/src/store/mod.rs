//! # Remote Store
//!
//! An in-process stand-in for the directory's HTTP backend. Each record type
//! gets its own [`RemoteStore`] actor that owns the records in insertion order,
//! assigns ids on create and answers requests over an mpsc channel with
//! oneshot replies.
//!
//! The store is deliberately "remote-shaped": every call can be slowed down
//! with an artificial latency and the next call of a given kind can be made to
//! fail with [`StoreClient::fail_next`], so rollbacks can be exercised end to end.
//!
//! ```rust
//! use expert_directory::model::Expert;
//! use expert_directory::store::{RemoteStore, StoreOp};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (store, client) = RemoteStore::<Expert>::new(16);
//!     tokio::spawn(store.run());
//!
//!     let created = client.create(Expert::new("Dr. Amal", "UoB", "Professor")).await.unwrap();
//!     assert_eq!(created.id.0, 1);
//!
//!     client.fail_next(StoreOp::List, "network").await.unwrap();
//!     assert!(client.list().await.is_err());
//!     assert_eq!(client.list().await.unwrap().len(), 1);
//! }
//! ```

pub mod actor;
pub mod client;
pub mod error;
pub mod message;

pub use actor::RemoteStore;
pub use client::StoreClient;
pub use error::StoreError;
pub use message::{StoreOp, StoreRequest, StoreResponse};

use std::fmt::Debug;
use sync_framework::Entity;

/// A record a [`RemoteStore`] can own.
pub trait Record: Entity + Debug {
    /// Overwrites the id with the store-assigned sequence number.
    fn assign_id(&mut self, seq: u64);

    /// Server-side validation run on create and update.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
