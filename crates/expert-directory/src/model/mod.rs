//! Plain data structures for the expert directory.

pub mod expert;
pub mod request;
pub mod stats;

pub use expert::{Expert, ExpertId};
pub use request::{ExpertRequest, RequestId, RequestStatus, Review};
pub use stats::DirectoryStats;
