//! Snapshot writer.
//!
//! Snapshots are captured inside a world job, so the copy is consistent and
//! the tick task never waits on disk. The captured value is then written by a
//! separate task. A failed write is logged and simply retried at the next
//! interval; in-memory state is never touched.

use crate::shutdown::ShutdownState;
use crate::world::{WorldError, WorldHandle};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use territory_core::{PersistenceError, SnapshotStore, WorldSnapshot};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// What a saved snapshot contained, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub territories: usize,
    pub claims: usize,
    pub locks: usize,
}

impl SnapshotSummary {
    fn of(snapshot: &WorldSnapshot) -> Self {
        Self {
            territories: snapshot.territories.len(),
            claims: snapshot.claims.len(),
            locks: snapshot.locks.len(),
        }
    }
}

/// Captures a snapshot on the world task and writes it to `store`.
pub async fn save_snapshot(world: &WorldHandle, store: &dyn SnapshotStore) -> Result<SnapshotSummary, SaveError> {
    let snapshot = world.run(|guard| guard.service().snapshot(Utc::now())).await?;
    store.save(&snapshot).await?;
    Ok(SnapshotSummary::of(&snapshot))
}

/// Starts the periodic writer. It stops when `shutdown` is initiated; the
/// final snapshot is the caller's job.
pub fn spawn_snapshot_writer(
    world: WorldHandle,
    store: Arc<dyn SnapshotStore>,
    interval: Duration,
    shutdown: ShutdownState,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing has changed yet.
        ticker.tick().await;

        let mut failures = 0u32;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait() => break,
            }

            match save_snapshot(&world, store.as_ref()).await {
                Ok(summary) => {
                    if failures > 0 {
                        info!("✅ Snapshot writes recovered after {} failures", failures);
                        failures = 0;
                    }
                    debug!(
                        "💾 Periodic snapshot: {} territories, {} claims, {} locks",
                        summary.territories, summary.claims, summary.locks
                    );
                }
                Err(SaveError::World(WorldError::Closed)) => {
                    info!("🌍 World task is gone, snapshot writer stopping");
                    break;
                }
                Err(e) => {
                    failures += 1;
                    error!("❌ Snapshot failed (attempt {}), retrying in {:?}: {}", failures, interval, e);
                }
            }
        }
    })
}
