use super::record_client::RecordClient;
use crate::error::DirectoryError;
use crate::model::Expert;
use crate::store::{StoreClient, StoreError};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the expert store.
#[derive(Clone)]
pub struct ExpertClient {
    inner: StoreClient<Expert>,
}

impl ExpertClient {
    pub fn new(inner: StoreClient<Expert>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RecordClient<Expert> for ExpertClient {
    type Error = DirectoryError;

    fn inner(&self) -> &StoreClient<Expert> {
        &self.inner
    }

    fn map_error(e: StoreError) -> Self::Error {
        DirectoryError::Store(e)
    }
}

impl ExpertClient {
    /// Makes the profile visible in the public directory.
    #[instrument(skip(self, expert), fields(id = %expert.id))]
    pub async fn publish(&self, expert: Expert) -> Result<Expert, DirectoryError> {
        debug!("Publishing");
        self.update(Expert {
            is_published: true,
            ..expert
        })
        .await
    }

    #[instrument(skip(self, expert), fields(id = %expert.id))]
    pub async fn set_availability(&self, expert: Expert, is_available: bool) -> Result<Expert, DirectoryError> {
        debug!(is_available, "Changing availability");
        self.update(Expert { is_available, ..expert }).await
    }
}
