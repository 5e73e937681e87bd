//! # Entity Trait
//!
//! The `Entity` trait is the contract every record synchronized by an
//! [`OptimisticCollection`](crate::OptimisticCollection) must satisfy: it is
//! cloneable (snapshots are clones) and it exposes a stable identity key.
//!
//! Identity is the sole basis for matching a local and a remote representation
//! of the same record. No other field is assumed stable.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A record with a caller-defined identity key.
///
/// ```rust
/// use sync_framework::Entity;
///
/// #[derive(Clone, Debug)]
/// struct Expert { id: u64, name: String }
///
/// impl Entity for Expert {
///     type Id = u64;
///     fn id(&self) -> &u64 { &self.id }
/// }
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    /// The identity key (e.g. `u64`, `String`, `Uuid`).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    fn id(&self) -> &Self::Id;
}

/// Short type name for log fields ("Expert" instead of "expert_directory::model::Expert").
pub(crate) fn entity_type<T>() -> &'static str {
    std::any::type_name::<T>()
        .split("::")
        .last()
        .unwrap_or("Unknown")
}
