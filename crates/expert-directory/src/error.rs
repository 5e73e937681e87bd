use crate::model::{RequestId, RequestStatus};
use crate::store::StoreError;

/// Errors surfaced by the directory's domain clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Request {id} was already {status}")]
    AlreadyReviewed { id: RequestId, status: RequestStatus },
}
