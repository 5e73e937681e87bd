//! Domain clients wrapping the generic [`StoreClient`](crate::store::StoreClient).

pub mod expert_client;
pub mod record_client;
pub mod request_client;

pub use expert_client::ExpertClient;
pub use record_client::RecordClient;
pub use request_client::RequestClient;
