use super::error::StoreError;
use super::message::{StoreOp, StoreRequest};
use super::Record;
use tokio::sync::{mpsc, oneshot};

/// Typed async handle to a [`RemoteStore`](super::RemoteStore).
///
/// Holds only a sender, so clones are cheap and share one store.
pub struct StoreClient<T: Record> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: Record> Clone for StoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Record> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn list(&self) -> Result<Vec<T>, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::List { respond_to })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)?
    }

    pub async fn create(&self, record: T) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Create { record, respond_to })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)?
    }

    pub async fn update(&self, record: T) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Update { record, respond_to })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)?
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Delete { id, respond_to })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)?
    }

    /// Makes the next `op` request fail with `message`.
    pub async fn fail_next(&self, op: StoreOp, message: impl Into<String>) -> Result<(), StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::FailNext {
                op,
                message: message.into(),
                respond_to,
            })
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        response.await.map_err(|_| StoreError::StoreDropped)?
    }
}

#[cfg(test)]
mod tests {
    use super::super::RemoteStore;
    use super::*;
    use crate::model::{Expert, ExpertId};

    fn spawn_store(seed: Vec<Expert>) -> StoreClient<Expert> {
        let (store, client) = RemoteStore::new(8);
        tokio::spawn(store.seed(seed).run());
        client
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_after_seed() {
        let client = spawn_store(vec![Expert::new("A", "UoB", "Professor")]);
        let created = client.create(Expert::new("B", "UoB", "Lecturer")).await.unwrap();
        assert_eq!(created.id, ExpertId(2));
        let names: Vec<_> = client.list().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn injected_fault_hits_exactly_one_request() {
        let client = spawn_store(vec![Expert::new("A", "UoB", "Professor")]);
        client.fail_next(StoreOp::Delete, "network").await.unwrap();

        let error = client.delete(ExpertId(1)).await.unwrap_err();
        assert_eq!(error, StoreError::Injected("network".to_string()));
        assert_eq!(error.to_string(), "network");
        assert_eq!(client.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fault_only_hits_its_operation() {
        let client = spawn_store(vec![Expert::new("A", "UoB", "Professor")]);
        client.fail_next(StoreOp::Update, "conflict").await.unwrap();

        assert_eq!(client.list().await.unwrap().len(), 1);
        let current = client.list().await.unwrap().remove(0);
        assert_eq!(
            client.update(current.clone()).await,
            Err(StoreError::Injected("conflict".to_string()))
        );
        assert_eq!(client.update(current.clone()).await, Ok(current));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let client = spawn_store(Vec::new());
        let mut ghost = Expert::new("Ghost", "None", "None");
        ghost.id = ExpertId(99);
        let error = client.update(ghost).await.unwrap_err();
        assert_eq!(error, StoreError::NotFound("expert_99".to_string()));
    }

    #[tokio::test]
    async fn invalid_record_is_rejected() {
        let client = spawn_store(Vec::new());
        let error = client.create(Expert::new("", "UoB", "Professor")).await.unwrap_err();
        assert!(matches!(error, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn dropped_store_reports_closed() {
        let (store, client) = RemoteStore::<Expert>::new(1);
        drop(store);
        assert_eq!(client.list().await, Err(StoreError::StoreClosed));
    }
}
