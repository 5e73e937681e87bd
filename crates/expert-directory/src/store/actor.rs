use super::client::StoreClient;
use super::error::StoreError;
use super::message::{StoreOp, StoreRequest};
use super::Record;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The actor that owns one record type's remote state.
///
/// Requests are processed sequentially, so the `records` vector needs no lock.
/// Records keep insertion order; `List` returns them in that order.
///
/// # Operations
///
/// * **List**: clones every record.
/// * **Create**: validates, assigns the next id (ignoring the incoming one),
///   appends and returns the stored record.
/// * **Update**: validates, replaces the record with the same id and returns
///   it. Unknown ids fail with [`StoreError::NotFound`].
/// * **Delete**: removes the record with the given id.
/// * **FailNext**: the next request of the given [`StoreOp`] fails with
///   [`StoreError::Injected`] and leaves the records untouched. Faults queue
///   up per operation.
pub struct RemoteStore<T: Record> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    records: Vec<T>,
    next_id: u64,
    latency: Duration,
    faults: Vec<(StoreOp, String)>,
}

impl<T: Record> RemoteStore<T> {
    /// Creates a store and its client. `buffer_size` bounds the request queue.
    pub fn new(buffer_size: usize) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let store = Self {
            receiver,
            records: Vec::new(),
            next_id: 1,
            latency: Duration::ZERO,
            faults: Vec::new(),
        };
        (store, StoreClient::new(sender))
    }

    /// Delay applied before answering each data request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Pre-populates the store, assigning ids in order.
    pub fn seed(mut self, records: impl IntoIterator<Item = T>) -> Self {
        for mut record in records {
            record.assign_id(self.next_id);
            self.next_id += 1;
            self.records.push(record);
        }
        self
    }

    /// Processes requests until every client is dropped.
    pub async fn run(mut self) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, size = self.records.len(), "Store started");

        while let Some(msg) = self.receiver.recv().await {
            let Some(op) = msg.op() else {
                if let StoreRequest::FailNext { op, message, respond_to } = msg {
                    debug!(entity_type, ?op, %message, "Fault armed");
                    self.faults.push((op, message));
                    let _ = respond_to.send(Ok(()));
                }
                continue;
            };

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let fault = self.take_fault(op);

            match msg {
                StoreRequest::List { respond_to } => {
                    debug!(entity_type, size = self.records.len(), "List");
                    let result = match fault {
                        Some(e) => Err(e),
                        None => Ok(self.records.clone()),
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Create { mut record, respond_to } => {
                    debug!(entity_type, ?record, "Create");
                    if let Some(e) = fault {
                        warn!(entity_type, error = %e, "Create failed");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    if let Err(reason) = record.validate() {
                        warn!(entity_type, %reason, "Create rejected");
                        let _ = respond_to.send(Err(StoreError::Invalid(reason)));
                        continue;
                    }
                    record.assign_id(self.next_id);
                    self.next_id += 1;
                    info!(entity_type, id = %record.id(), size = self.records.len() + 1, "Created");
                    self.records.push(record.clone());
                    let _ = respond_to.send(Ok(record));
                }
                StoreRequest::Update { record, respond_to } => {
                    let id = record.id().clone();
                    debug!(entity_type, %id, ?record, "Update");
                    if let Some(e) = fault {
                        warn!(entity_type, %id, error = %e, "Update failed");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    if let Err(reason) = record.validate() {
                        warn!(entity_type, %id, %reason, "Update rejected");
                        let _ = respond_to.send(Err(StoreError::Invalid(reason)));
                        continue;
                    }
                    match self.records.iter_mut().find(|r| r.id() == &id) {
                        Some(slot) => {
                            *slot = record.clone();
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(record));
                        }
                        None => {
                            warn!(entity_type, %id, "Not found");
                            let _ = respond_to.send(Err(StoreError::NotFound(id.to_string())));
                        }
                    }
                }
                StoreRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    if let Some(e) = fault {
                        warn!(entity_type, %id, error = %e, "Delete failed");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    match self.records.iter().position(|r| r.id() == &id) {
                        Some(index) => {
                            self.records.remove(index);
                            info!(entity_type, %id, size = self.records.len(), "Deleted");
                            let _ = respond_to.send(Ok(()));
                        }
                        None => {
                            warn!(entity_type, %id, "Not found");
                            let _ = respond_to.send(Err(StoreError::NotFound(id.to_string())));
                        }
                    }
                }
                // Handled before the latency wait.
                StoreRequest::FailNext { .. } => {}
            }
        }

        info!(entity_type, size = self.records.len(), "Shutdown");
    }

    fn take_fault(&mut self, op: StoreOp) -> Option<StoreError> {
        let index = self.faults.iter().position(|(armed, _)| *armed == op)?;
        let (_, message) = self.faults.remove(index);
        Some(StoreError::Injected(message))
    }
}
