use super::record_client::RecordClient;
use crate::error::DirectoryError;
use crate::model::{ExpertRequest, RequestStatus, Review};
use crate::store::{StoreClient, StoreError};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Client for the expert-request store.
#[derive(Clone)]
pub struct RequestClient {
    inner: StoreClient<ExpertRequest>,
}

impl RequestClient {
    pub fn new(inner: StoreClient<ExpertRequest>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RecordClient<ExpertRequest> for RequestClient {
    type Error = DirectoryError;

    fn inner(&self) -> &StoreClient<ExpertRequest> {
        &self.inner
    }

    fn map_error(e: StoreError) -> Self::Error {
        DirectoryError::Store(e)
    }
}

impl RequestClient {
    /// Files a new request; the status is always `Pending` on submission.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn submit(&self, request: ExpertRequest) -> Result<ExpertRequest, DirectoryError> {
        debug!("Submitting");
        self.create(ExpertRequest {
            status: RequestStatus::Pending,
            ..request
        })
        .await
    }

    /// Records an approve or reject decision. Only pending requests can be
    /// reviewed.
    #[instrument(skip(self, review), fields(id = %review.request.id, decision = %review.decision))]
    pub async fn review(&self, review: Review) -> Result<ExpertRequest, DirectoryError> {
        if !review.request.is_pending() {
            warn!(status = %review.request.status, "Already reviewed");
            return Err(DirectoryError::AlreadyReviewed {
                id: review.request.id,
                status: review.request.status,
            });
        }
        debug!("Reviewing");
        self.update(review.decided()).await
    }
}
