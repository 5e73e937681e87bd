/// Errors returned by a [`StoreClient`](super::StoreClient).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store closed")]
    StoreClosed,
    #[error("Store dropped response channel")]
    StoreDropped,
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Invalid(String),
    /// Failure injected with `fail_next`; displays as the injected message.
    #[error("{0}")]
    Injected(String),
}
