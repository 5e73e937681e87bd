use super::error::StoreError;
use super::Record;
use tokio::sync::oneshot;

/// One-shot reply channel used by the store.
pub type StoreResponse<T> = oneshot::Sender<Result<T, StoreError>>;

/// The data operations a store serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
}

/// Messages a [`RemoteStore`](super::RemoteStore) understands.
///
/// `List`, `Create`, `Update` and `Delete` mirror the backend's REST surface.
/// `FailNext` is test plumbing: it arms a fault for the next request of one
/// operation kind.
#[derive(Debug)]
pub enum StoreRequest<T: Record> {
    List {
        respond_to: StoreResponse<Vec<T>>,
    },
    Create {
        record: T,
        respond_to: StoreResponse<T>,
    },
    Update {
        record: T,
        respond_to: StoreResponse<T>,
    },
    Delete {
        id: T::Id,
        respond_to: StoreResponse<()>,
    },
    FailNext {
        op: StoreOp,
        message: String,
        respond_to: StoreResponse<()>,
    },
}

impl<T: Record> StoreRequest<T> {
    /// The operation kind, or `None` for control messages.
    pub fn op(&self) -> Option<StoreOp> {
        match self {
            Self::List { .. } => Some(StoreOp::List),
            Self::Create { .. } => Some(StoreOp::Create),
            Self::Update { .. } => Some(StoreOp::Update),
            Self::Delete { .. } => Some(StoreOp::Delete),
            Self::FailNext { .. } => None,
        }
    }
}
