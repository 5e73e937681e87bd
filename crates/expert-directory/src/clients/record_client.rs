use crate::store::{Record, StoreClient, StoreError};
use async_trait::async_trait;

/// Shared CRUD surface for the domain clients.
///
/// Implementors provide access to the underlying [`StoreClient`] and an error
/// mapping; `list`, `create`, `update` and `delete` come for free.
///
/// ```rust
/// use expert_directory::clients::RecordClient;
/// use expert_directory::model::Expert;
/// use expert_directory::store::{RemoteStore, StoreClient, StoreError};
///
/// struct Plain(StoreClient<Expert>);
///
/// impl RecordClient<Expert> for Plain {
///     type Error = StoreError;
///     fn inner(&self) -> &StoreClient<Expert> { &self.0 }
///     fn map_error(e: StoreError) -> StoreError { e }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (store, client) = RemoteStore::<Expert>::new(4);
///     tokio::spawn(store.run());
///     let plain = Plain(client);
///     assert!(plain.list().await.unwrap().is_empty());
/// }
/// ```
#[async_trait]
pub trait RecordClient<T: Record>: Send + Sync {
    /// The domain error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Access the inner store client.
    fn inner(&self) -> &StoreClient<T>;

    /// Map store errors to the domain error type.
    fn map_error(e: StoreError) -> Self::Error;

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list().await.map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, record: T) -> Result<T, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().create(record).await.map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, record: T) -> Result<T, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().update(record).await.map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }
}
