//! # Expert Directory Demo
//!
//! Walks one directory session end to end:
//!
//! 1. Start a [`DirectorySystem`] with a few seeded experts and requests.
//! 2. Load both collections and wait for the first statistics.
//! 3. Add, update and publish experts.
//! 4. Make the store reject an update and watch the rollback.
//! 5. Delete an expert and approve a pending request.
//!
//! Every notification pushed to the [`NotificationCenter`](sync_framework::NotificationCenter)
//! is logged as it appears. Tune the run with `RUST_LOG` and the
//! `EXPERT_SYNC_*` variables, e.g. `EXPERT_SYNC_STORE_LATENCY_MS=500` to see
//! the loading indicator reveal.

use expert_directory::clients::RecordClient;
use expert_directory::lifecycle::{DirectorySystem, SystemConfig};
use expert_directory::model::{Expert, ExpertRequest, RequestStatus};
use expert_directory::store::StoreOp;
use std::collections::HashSet;
use sync_framework::tracing::setup_tracing;
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = SystemConfig::from_env();
    info!(?config, "Starting expert directory");

    let system = DirectorySystem::with_records(
        config,
        vec![
            Expert::new("Dr. Amal Hassan", "University of Bahrain", "Professor").with_areas(["Energy"]),
            Expert::new("Dr. Yousif Ali", "Bahrain Polytechnic", "Lecturer").with_areas(["Water", "Energy"]),
        ],
        vec![ExpertRequest::new("Dr. Layla Nasser", "BIBF")],
    );

    // Log notifications as the center publishes them
    let mut feed = system.notifications.subscribe();
    let notification_log = tokio::spawn(async move {
        let mut seen = HashSet::new();
        while feed.changed().await.is_ok() {
            let active = feed.borrow_and_update().clone();
            for toast in active {
                if seen.insert(toast.id.clone()) {
                    info!(id = %toast.id, kind = ?toast.notification.kind, message = %toast.notification.message, "Notification");
                }
            }
        }
    });

    async {
        system.load().await;
        let mut stats = system.stats.subscribe();
        let _ = stats
            .wait_for(|s| !s.in_flight && s.data.as_ref().is_some_and(|d| d.total_experts > 0))
            .await;
    }
    .instrument(tracing::info_span!("initial_load"))
    .await;

    let added = system
        .add_expert(Expert::new("Dr. Sara Ahmed", "Arabian Gulf University", "Associate Professor").with_areas(["Health"]))
        .instrument(tracing::info_span!("add_expert"))
        .await
        .map_err(|e| e.to_string())?;
    info!(id = %added.id, "Expert added");

    let renamed = system
        .update_expert(Expert {
            designation: "Professor".to_string(),
            ..added.clone()
        })
        .instrument(tracing::info_span!("update_expert"))
        .await
        .map_err(|e| e.to_string())?;
    info!(id = %renamed.id, designation = %renamed.designation, "Expert updated");

    // Force a rollback: the store rejects the next update
    system
        .expert_client()
        .inner()
        .fail_next(StoreOp::Update, "network")
        .await
        .map_err(|e| e.to_string())?;
    let attempt = Expert {
        is_available: false,
        ..renamed.clone()
    };
    match system.update_expert(attempt).await {
        Ok(_) => warn!("Update unexpectedly succeeded"),
        Err(e) => {
            let restored = system.experts.get(&renamed.id);
            info!(error = %e, restored = ?restored.map(|x| x.is_available), "Update rolled back");
        }
    }

    system
        .publish_expert(renamed.id)
        .await
        .map_err(|e| e.to_string())?;

    if let Some(first) = system.experts.items().first() {
        system
            .delete_expert(first.id)
            .await
            .map_err(|e| e.to_string())?;
    }

    let pending = system.requests.items().into_iter().find(|r| r.is_pending());
    if let Some(request) = pending {
        match system.review_request(request.id, RequestStatus::Approved).await {
            Ok(reviewed) => info!(id = %reviewed.id, status = %reviewed.status, "Request reviewed"),
            Err(e) => error!(error = %e, "Review failed"),
        }
    }

    let mut stats = system.stats.subscribe();
    let revision = system.revision();
    let _ = stats.wait_for(|s| !s.in_flight).await;
    if let Some(stats) = system.stats.data() {
        info!(
            revision,
            total = stats.total_experts,
            published = stats.published_count,
            pending = stats.pending_requests,
            "Directory statistics"
        );
    }

    system.shutdown().await;
    let _ = notification_log.await;
    info!("Application finished");
    Ok(())
}
