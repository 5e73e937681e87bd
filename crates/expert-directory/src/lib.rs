//! # Expert Directory
//!
//! A sample application built on `sync-framework`: an expert directory whose
//! views update optimistically against a slow, failure-prone backend.
//!
//! - **[model]**: [`Expert`](model::Expert), [`ExpertRequest`](model::ExpertRequest)
//!   and [`DirectoryStats`](model::DirectoryStats).
//! - **[store]**: the simulated backend, one [`RemoteStore`](store::RemoteStore)
//!   actor per record type, with latency and fault injection.
//! - **[clients]**: typed wrappers over the store clients.
//! - **[lifecycle]**: [`DirectorySystem`](lifecycle::DirectorySystem), which
//!   wires stores, collections, the review executor and the stats loader.

pub mod clients;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod store;

pub use error::DirectoryError;
