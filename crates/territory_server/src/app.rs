//! Main application logic and lifecycle management.
//!
//! The [`Application`] loads configuration, restores the last snapshot, starts
//! the world task and its helpers, and takes a final snapshot on shutdown.

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::host::TracingSink;
use crate::logging::display_banner;
use crate::persistence::{save_snapshot, spawn_snapshot_writer};
use crate::shutdown::ShutdownState;
use crate::signals::{wait_for_shutdown_signal, wait_for_shutdown_signal_silent};
use crate::world::{spawn_world, WorldHandle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use territory_core::{
    DecisionStats, JsonFileStore, MessageSink, PersistenceError, SnapshotStore, TerritoryService, WorldSnapshot,
};
use territory_guard::{MemberNotifier, OnlinePlayers, TerritoryGuard};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const HIGH_ACTIVITY_DECISIONS: u64 = 10_000;
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Application {
    config: AppConfig,
    store: Arc<JsonFileStore>,
    world: WorldHandle,
    world_task: JoinHandle<TerritoryGuard>,
    directory: Arc<OnlinePlayers>,
}

impl Application {
    /// Loads configuration, applies CLI overrides, restores state and starts
    /// the world task.
    ///
    /// A snapshot that exists but cannot be read aborts startup rather than
    /// starting from an empty world that would overwrite it.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        apply_overrides(&mut config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let store = Arc::new(JsonFileStore::new(config.persistence.snapshot_path()));
        let snapshot = store.load().await?;
        let directory = Arc::new(OnlinePlayers::new());
        let guard = build_guard(&config, snapshot, directory.clone())?;
        let (world, world_task) = spawn_world(guard, config.world.queue_capacity);

        Ok(Self {
            config,
            store,
            world,
            world_task,
            directory,
        })
    }

    /// Handle for scheduling work on the world task.
    pub fn world(&self) -> WorldHandle {
        self.world.clone()
    }

    /// Online player registry shared with connection handling.
    pub fn directory(&self) -> Arc<OnlinePlayers> {
        self.directory.clone()
    }

    /// Runs until a shutdown signal arrives, then stops the background tasks
    /// and writes a final snapshot.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting territory server");
        self.log_configuration_summary();

        let shutdown = ShutdownState::new();
        let writer = spawn_snapshot_writer(
            self.world.clone(),
            self.store.clone(),
            self.config.persistence.snapshot_interval(),
            shutdown.clone(),
        );
        let monitor = spawn_monitor(
            self.world.clone(),
            Duration::from_secs(self.config.monitoring.stats_interval_secs),
            self.config.notifications.denial_cooldown(),
            shutdown.clone(),
        );

        info!("✅ Territory server is now running!");
        info!("🔍 Statistics every {}s", self.config.monitoring.stats_interval_secs);
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        wait_for_shutdown_signal().await?;

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = wait_for_shutdown_signal_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }
            warn!("Shutdown signal received again, exiting without a final snapshot.");
            std::process::exit(1);
        });

        info!("📡 Phase 1: Stopping background tasks...");
        shutdown.initiate_shutdown();
        for (name, task) in [("snapshot writer", writer), ("monitor", monitor)] {
            if tokio::time::timeout(TASK_STOP_TIMEOUT, task).await.is_err() {
                warn!("⏰ {} did not stop within {:?}", name, TASK_STOP_TIMEOUT);
            }
        }

        info!("💾 Phase 2: Writing final snapshot...");
        let stats = shutdown_world(self.world, self.world_task, self.store.as_ref()).await?;
        log_final_statistics(&stats);

        info!("✅ Territory server shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  💾 Snapshot: {}", self.config.persistence.snapshot_path().display());
        info!("  ⏱️ Snapshot interval: {}s", self.config.persistence.snapshot_interval_secs);
        info!("  🗺️ Default claim limit: {}", self.config.territory.default_claim_limit);
        info!("  🔕 Denial cooldown: {}ms", self.config.notifications.denial_cooldown_ms);
        if !self.config.policy.is_empty() {
            info!("  🛡️ Zone policy overrides active");
        }
    }
}

/// Command-line values win over the file.
pub fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(data_dir) = &args.data_dir {
        config.persistence.data_dir = data_dir.to_string_lossy().to_string();
    }
    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
}

/// Builds the guard from configuration and, if present, the last snapshot.
pub fn build_guard(
    config: &AppConfig,
    snapshot: Option<WorldSnapshot>,
    directory: Arc<OnlinePlayers>,
) -> Result<TerritoryGuard, PersistenceError> {
    let policy = config.policy.apply();
    let mut service = match snapshot {
        Some(snapshot) => {
            info!(
                "📂 Restoring snapshot taken at {}: {} territories, {} claims, {} locks",
                snapshot.taken_at,
                snapshot.territories.len(),
                snapshot.claims.len(),
                snapshot.locks.len()
            );
            TerritoryService::from_snapshot(config.territory.clone(), policy, snapshot)?
        }
        None => {
            info!("🆕 No snapshot found, starting with an empty world");
            TerritoryService::new(config.territory.clone(), policy)
        }
    };

    let sink: Arc<dyn MessageSink> = Arc::new(TracingSink);
    service.set_observer(Box::new(MemberNotifier::new(directory, sink.clone())));
    Ok(TerritoryGuard::with_cooldown(service, sink, config.notifications.denial_cooldown()))
}

/// Writes the final snapshot, releases the world handle and waits for the
/// world task to drain. Returns the statistics for the whole run.
pub async fn shutdown_world(
    world: WorldHandle,
    world_task: JoinHandle<TerritoryGuard>,
    store: &dyn SnapshotStore,
) -> Result<DecisionStats, Box<dyn std::error::Error>> {
    let summary = save_snapshot(&world, store).await?;
    info!(
        "✅ Final snapshot saved: {} territories, {} claims, {} locks",
        summary.territories, summary.claims, summary.locks
    );

    let stats = world.run(|guard| guard.stats().clone()).await?;
    drop(world);

    if tokio::time::timeout(TASK_STOP_TIMEOUT, world_task).await.is_err() {
        warn!("⏰ World task still has open handles, not waiting any longer");
    }
    Ok(stats)
}

/// One statistics report.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub decisions: u64,
    pub denied: u64,
    pub operator_bypasses: u64,
    pub suppressed_messages: u64,
    pub territories: usize,
    pub claims: usize,
    pub locks: usize,
}

impl HealthReport {
    pub fn collect(guard: &TerritoryGuard, suppressed_messages: u64) -> Self {
        let stats = guard.stats();
        let service = guard.service();
        Self {
            decisions: stats.total(),
            denied: stats.denied,
            operator_bypasses: stats.operator_bypasses,
            suppressed_messages,
            territories: service.manager().len(),
            claims: service.manager().claims().len(),
            locks: service.locks().len(),
        }
    }
}

fn spawn_monitor(world: WorldHandle, interval: Duration, cooldown: Duration, shutdown: ShutdownState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        let mut last_decisions = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait() => break,
            }

            let report = world
                .run(move |guard| {
                    let notifier = guard.notifier_mut();
                    notifier.prune(Instant::now(), cooldown * 4);
                    let suppressed = notifier.suppressed();
                    HealthReport::collect(guard, suppressed)
                })
                .await;
            let Ok(report) = report else {
                break;
            };

            let decisions_this_period = report.decisions.saturating_sub(last_decisions);
            last_decisions = report.decisions;
            info!(
                "📊 Territory Health - {} decisions/period | {} denied total | {} operator bypasses | {} territories, {} claims, {} locks",
                decisions_this_period,
                report.denied,
                report.operator_bypasses,
                report.territories,
                report.claims,
                report.locks
            );
            if decisions_this_period > HIGH_ACTIVITY_DECISIONS {
                info!("🔥 High activity detected - {} decisions this period", decisions_this_period);
            }
        }
    })
}

fn log_final_statistics(stats: &DecisionStats) {
    info!("📊 Final Statistics:");
    info!("  - Decisions: {} ({} allowed, {} denied)", stats.total(), stats.allowed, stats.denied);
    info!("  - Operator bypasses: {}", stats.operator_bypasses);
    info!("  - Explosion blocks filtered: {}", stats.blast_blocks_filtered);
    let mut reasons: Vec<_> = stats.denied_by_reason.iter().collect();
    reasons.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (reason, count) in reasons {
        info!("  - {}: {}", reason, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use territory_core::{BlockPos, ChunkKey, PlayerId, Requester, Rule, WorldId, ZonePolicy};
    use territory_guard::events::{BlockPlaceEvent, EventActor};

    fn args(dir: &TempDir) -> CliArgs {
        CliArgs {
            config_path: dir.path().join("territory.toml"),
            data_dir: Some(dir.path().join("data")),
            log_level: Some("debug".to_string()),
            json_logs: false,
        }
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = AppConfig::default();
        let args = CliArgs {
            config_path: PathBuf::from("territory.toml"),
            data_dir: Some(PathBuf::from("/srv/world")),
            log_level: Some("trace".to_string()),
            json_logs: true,
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.persistence.data_dir, "/srv/world");
        assert_eq!(config.logging.level, "trace");
        assert!(config.logging.json_format);
    }

    #[tokio::test]
    async fn test_build_guard_restores_snapshot() {
        let mut service = TerritoryService::default();
        let owner = Requester::player(PlayerId::new());
        let guild = service.create(&owner, "Ravens", Utc::now()).unwrap();
        service.claim(&owner, guild, ChunkKey::new(WorldId(0), 2, 3)).unwrap();
        let snapshot = service.snapshot(Utc::now());

        let guard = build_guard(&AppConfig::default(), Some(snapshot), Arc::new(OnlinePlayers::new())).unwrap();

        assert_eq!(guard.service().manager().owner_of(&ChunkKey::new(WorldId(0), 2, 3)), Some(guild));
    }

    #[tokio::test]
    async fn test_build_guard_applies_policy_overrides() {
        let mut config = AppConfig::default();
        let mut wild = ZonePolicy::WILD;
        wild.build = Rule::Deny;
        config.policy.wild = Some(wild);

        let guard = build_guard(&config, None, Arc::new(OnlinePlayers::new())).unwrap();

        assert_eq!(guard.service().engine().policy().wild.build, Rule::Deny);
    }

    #[tokio::test]
    async fn test_application_lifecycle_persists_state() {
        let dir = TempDir::new().unwrap();
        let app = Application::new(args(&dir)).await.unwrap();
        assert!(dir.path().join("territory.toml").exists());

        let owner = PlayerId::new();
        let world = app.world();
        world
            .run(move |guard| {
                let requester = Requester::player(owner);
                let service = guard.service_mut();
                service.create(&requester, "Ravens", Utc::now()).unwrap();
                service
                    .claim_here(&requester, BlockPos::new(WorldId(0), 5, 64, 5), None)
                    .unwrap();
            })
            .await
            .unwrap();
        let decision = world
            .run(|guard| {
                let mut event = BlockPlaceEvent {
                    actor: EventActor::player(PlayerId::new()),
                    block: BlockPos::new(WorldId(0), 6, 64, 6),
                    cancelled: false,
                };
                guard.on_block_place(&mut event)
            })
            .await
            .unwrap();
        assert!(decision.is_denied());
        drop(world);

        let Application { world, world_task, store, .. } = app;
        let stats = shutdown_world(world, world_task, store.as_ref()).await.unwrap();
        assert_eq!(stats.denied, 1);

        let restarted = Application::new(args(&dir)).await.unwrap();
        let owner_of = restarted
            .world()
            .run(|guard| guard.service().manager().owner_of(&ChunkKey::new(WorldId(0), 0, 0)))
            .await
            .unwrap();
        assert!(owner_of.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_aborts_startup() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        tokio::fs::create_dir_all(&data).await.unwrap();
        tokio::fs::write(data.join("world.json"), b"{ not json").await.unwrap();

        assert!(Application::new(args(&dir)).await.is_err());
    }

    #[test]
    fn test_health_report_counts_state() {
        let mut service = TerritoryService::default();
        let owner = Requester::player(PlayerId::new());
        let guild = service.create(&owner, "Ravens", Utc::now()).unwrap();
        service.claim(&owner, guild, ChunkKey::new(WorldId(0), 0, 0)).unwrap();
        service.lock(&owner, BlockPos::new(WorldId(0), 1, 64, 1)).unwrap();
        let guard = TerritoryGuard::new(service, Arc::new(TracingSink));

        let report = HealthReport::collect(&guard, 7);

        assert_eq!(report.territories, 4);
        assert_eq!(report.claims, 1);
        assert_eq!(report.locks, 1);
        assert_eq!(report.suppressed_messages, 7);
        assert_eq!(report.decisions, 0);
    }
}
