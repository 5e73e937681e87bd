//! # Observability
//!
//! Every component logs through the `tracing` macros with structured fields:
//!
//! - `entity_type` - short type name of the synchronized entity (`Expert`, `ExpertRequest`)
//! - `id` - identity key of the entity a mutation targets
//! - `size` - collection length after a committed change
//! - `error` - display form of a remote failure
//!
//! Speculative steps log at `debug`, commits at `info`, rollbacks and
//! refused mutations at `warn`.
//!
//! ```text
//! INFO Loaded entity_type="Expert" size=3
//! WARN Update rolled back entity_type="Expert" id=2 error=network
//! ```
//!
//! Levels are controlled with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run -p expert-directory
//! RUST_LOG=sync_framework=debug cargo run -p expert-directory
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once at process start. A second call panics, as with any global
/// subscriber.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type carries the context instead
        .compact()
        .init();
}
