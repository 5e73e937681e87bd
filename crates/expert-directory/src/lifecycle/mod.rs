//! # System Lifecycle & Orchestration
//!
//! [`DirectorySystem`] is the conductor: it spawns one [`RemoteStore`] per
//! record type, wraps their clients in the sync-framework components and owns
//! the [`NotificationCenter`] every component reports to.
//!
//! | Component | Type | Remote |
//! |-----------|------|--------|
//! | `experts` | [`OptimisticCollection<Expert>`] | expert store |
//! | `requests` | [`OptimisticCollection<ExpertRequest>`] | request store |
//! | request review | [`OptimisticExecutor<Review, ExpertRequest>`] | request store |
//! | `stats` | [`AsyncLoader<DirectoryStats>`] | both stores |
//!
//! ## Statistics refresh
//!
//! The stats loader is auto-fetched on a revision counter. Every committed
//! mutation bumps the counter, which triggers one background re-read.
//!
//! ## Shutdown
//!
//! [`DirectorySystem::shutdown`] closes the revision channel (stopping the
//! stats driver), drops every client and then awaits the store tasks, which
//! exit once their request channels close.

pub mod config;

pub use config::SystemConfig;

use crate::clients::{ExpertClient, RecordClient, RequestClient};
use crate::error::DirectoryError;
use crate::model::{DirectoryStats, Expert, ExpertId, ExpertRequest, RequestId, RequestStatus, Review};
use crate::store::RemoteStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sync_framework::{
    AsyncLoader, CollectionOptions, ExecutorOptions, LoaderOptions, MutationMessages, NotificationCenter,
    NotificationSink, OptimisticCollection, OptimisticExecutor, SyncError,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The fully wired expert directory.
pub struct DirectorySystem {
    pub notifications: NotificationCenter,
    pub experts: Arc<OptimisticCollection<Expert>>,
    pub requests: Arc<OptimisticCollection<ExpertRequest>>,
    pub stats: Arc<AsyncLoader<DirectoryStats>>,
    review: OptimisticExecutor<Review, ExpertRequest>,
    expert_client: ExpertClient,
    request_client: RequestClient,
    revision: watch::Sender<u64>,
    provisional_ids: AtomicU64,
    stats_driver: Option<JoinHandle<()>>,
    store_handles: Vec<JoinHandle<()>>,
}

impl DirectorySystem {
    /// Starts a system with empty stores. Must be called inside a Tokio runtime.
    pub fn new(config: SystemConfig) -> Self {
        Self::with_records(config, Vec::new(), Vec::new())
    }

    /// Starts a system whose stores are pre-populated.
    pub fn with_records(config: SystemConfig, experts: Vec<Expert>, requests: Vec<ExpertRequest>) -> Self {
        // 1. Stores
        let (expert_store, expert_store_client) = RemoteStore::new(config.buffer_size);
        let (request_store, request_store_client) = RemoteStore::new(config.buffer_size);
        let store_handles = vec![
            tokio::spawn(
                expert_store
                    .with_latency(config.store_latency())
                    .seed(experts)
                    .run(),
            ),
            tokio::spawn(
                request_store
                    .with_latency(config.store_latency())
                    .seed(requests)
                    .run(),
            ),
        ];
        let expert_client = ExpertClient::new(expert_store_client);
        let request_client = RequestClient::new(request_store_client);

        // 2. Sync components, all reporting to one notification center
        let notifications = NotificationCenter::new();
        let sink: Arc<dyn NotificationSink> = Arc::new(notifications.clone());

        let experts = Arc::new(OptimisticCollection::new(
            {
                let client = expert_client.clone();
                move || {
                    let client = client.clone();
                    async move { client.list().await }
                }
            },
            Arc::clone(&sink),
            CollectionOptions::from_settings(&config.sync),
        ));

        let requests = Arc::new(OptimisticCollection::new(
            {
                let client = request_client.clone();
                move || {
                    let client = client.clone();
                    async move { client.list().await }
                }
            },
            Arc::clone(&sink),
            CollectionOptions::from_settings(&config.sync),
        ));

        let review = OptimisticExecutor::new(
            {
                let client = request_client.clone();
                move |review: Review| {
                    let client = client.clone();
                    async move { client.review(review).await }
                }
            },
            Arc::clone(&sink),
            ExecutorOptions::default()
                .success_message("Request review saved")
                .notification_duration(config.sync.notification_duration())
                .on_error({
                    let requests = Arc::clone(&requests);
                    move |_error: &SyncError, review: &Review| {
                        requests.replace_local(review.request.clone());
                    }
                }),
        );

        let stats = Arc::new(AsyncLoader::new(
            {
                let experts = expert_client.clone();
                let requests = request_client.clone();
                move || {
                    let experts = experts.clone();
                    let requests = requests.clone();
                    async move {
                        let all_experts = experts.list().await?;
                        let all_requests = requests.list().await?;
                        Ok::<_, DirectoryError>(DirectoryStats::compute(&all_experts, &all_requests))
                    }
                }
            },
            Arc::clone(&sink),
            LoaderOptions::from_settings(&config.sync)
                .initial_data(DirectoryStats::default())
                .error_message("Failed to load statistics"),
        ));

        // 3. Stats follow the revision counter
        let (revision, revision_rx) = watch::channel(0);
        let stats_driver = stats.auto_fetch(revision_rx);

        info!(
            reveal_delay_ms = config.sync.reveal_delay_ms,
            store_latency_ms = config.store_latency_ms,
            "Directory system started"
        );

        Self {
            notifications,
            experts,
            requests,
            stats,
            review,
            expert_client,
            request_client,
            revision,
            provisional_ids: AtomicU64::new(u64::MAX),
            stats_driver,
            store_handles,
        }
    }

    /// Loads both collections from their stores.
    pub async fn load(&self) {
        let (experts, requests) = tokio::join!(self.experts.load_items(), self.requests.load_items());
        info!(experts = experts.len(), requests = requests.len(), "Directory loaded");
    }

    /// Adds an expert under a provisional id; the store assigns the real one.
    pub async fn add_expert(&self, mut draft: Expert) -> Result<Expert, SyncError> {
        draft.id = ExpertId(self.next_provisional());
        let client = &self.expert_client;
        let created = self
            .experts
            .add_item(
                draft,
                |expert| async move { client.create(expert).await },
                MutationMessages::new().success("Expert created successfully"),
            )
            .await?;
        self.bump_revision();
        Ok(created)
    }

    pub async fn update_expert(&self, expert: Expert) -> Result<Expert, SyncError> {
        let client = &self.expert_client;
        let updated = self
            .experts
            .update_item(
                expert,
                |expert| async move { client.update(expert).await },
                MutationMessages::new().success("Expert updated successfully"),
            )
            .await?;
        self.bump_revision();
        Ok(updated)
    }

    pub async fn delete_expert(&self, id: ExpertId) -> Result<(), SyncError> {
        let client = &self.expert_client;
        self.experts
            .delete_item(
                id,
                |id| async move { client.delete(id).await },
                MutationMessages::new().success("Expert deleted successfully"),
            )
            .await?;
        self.bump_revision();
        Ok(())
    }

    pub async fn publish_expert(&self, id: ExpertId) -> Result<Expert, SyncError> {
        let current = self.experts.get(&id).ok_or_else(|| SyncError::not_found(id))?;
        let client = &self.expert_client;
        let published = self
            .experts
            .update_item(
                Expert {
                    is_published: true,
                    ..current
                },
                |expert| async move { client.publish(expert).await },
                MutationMessages::new()
                    .success("Expert published")
                    .error("Failed to publish expert"),
            )
            .await?;
        self.bump_revision();
        Ok(published)
    }

    pub async fn submit_request(&self, mut draft: ExpertRequest) -> Result<ExpertRequest, SyncError> {
        draft.id = RequestId(self.next_provisional());
        let client = &self.request_client;
        let submitted = self
            .requests
            .add_item(
                draft,
                |request| async move { client.submit(request).await },
                MutationMessages::new().success("Request submitted"),
            )
            .await?;
        self.bump_revision();
        Ok(submitted)
    }

    /// Approves or rejects a request through the review executor.
    ///
    /// The decided status is shown immediately; a failed review restores the
    /// request as it was. The request's key slot is held for the whole review,
    /// so other mutations on the same request queue behind it.
    pub async fn review_request(&self, id: RequestId, decision: RequestStatus) -> Result<ExpertRequest, SyncError> {
        let _slot = self.requests.reserve(&id).await;
        let current = self.requests.get(&id).ok_or_else(|| SyncError::not_found(id))?;
        debug!(%id, %decision, "Review");
        let requests = &self.requests;
        let reviewed = self
            .review
            .execute_with(Review { request: current, decision }, |review| {
                requests.replace_local(review.decided());
            })
            .await?;
        self.requests.replace_local(reviewed.clone());
        self.bump_revision();
        Ok(reviewed)
    }

    /// True while any review call is outstanding.
    pub fn is_reviewing(&self) -> bool {
        self.review.is_loading()
    }

    pub fn expert_client(&self) -> &ExpertClient {
        &self.expert_client
    }

    pub fn request_client(&self) -> &RequestClient {
        &self.request_client
    }

    /// Current value of the mutation counter the stats loader follows.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Stops the stats driver and waits for both stores to exit.
    pub async fn shutdown(self) {
        let Self {
            notifications,
            experts,
            requests,
            stats,
            review,
            expert_client,
            request_client,
            revision,
            stats_driver,
            store_handles,
            ..
        } = self;

        drop(revision);
        if let Some(driver) = stats_driver {
            let _ = driver.await;
        }

        drop((experts, requests, stats, review));
        drop((expert_client, request_client));
        for handle in store_handles {
            let _ = handle.await;
        }
        info!(pending_notifications = notifications.len(), "Directory system stopped");
    }

    fn next_provisional(&self) -> u64 {
        self.provisional_ids.fetch_sub(1, Ordering::Relaxed)
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}
