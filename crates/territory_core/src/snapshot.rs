//! # Snapshots
//!
//! A [`WorldSnapshot`] is a consistent copy of every territory, claim, claim
//! limit and lock. It is captured synchronously on the thread that owns the
//! state and then handed to a [`SnapshotStore`] that writes it asynchronously,
//! so in-memory structures are never read while being mutated.
//!
//! Records are sorted on capture so that identical state always produces an
//! identical file.

use crate::claims::ClaimLimit;
use crate::config::TerritoryConfig;
use crate::error::PersistenceError;
use crate::locks::LockOverlay;
use crate::manager::TerritoryManager;
use crate::territory::{Role, Territory, TerritoryKind};
use crate::types::{BlockPos, ChunkKey, PlayerId, TerritoryId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current on-disk format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub player: PlayerId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryRecord {
    pub id: TerritoryId,
    pub name: String,
    pub kind: TerritoryKind,
    pub owner: Option<PlayerId>,
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub invites: Vec<PlayerId>,
    #[serde(default)]
    pub join_requests: Vec<PlayerId>,
    pub mob_spawning_allowed: bool,
    pub open_join: bool,
    #[serde(default)]
    pub description: String,
    pub creation_time: DateTime<Utc>,
}

impl TerritoryRecord {
    fn capture(territory: &Territory) -> Self {
        let mut members: Vec<MemberRecord> = territory
            .members()
            .map(|(player, role)| MemberRecord { player, role })
            .collect();
        members.sort_by_key(|m| m.player);
        let mut invites: Vec<PlayerId> = territory.invites().collect();
        invites.sort();
        let mut join_requests: Vec<PlayerId> = territory.join_requests().collect();
        join_requests.sort();

        Self {
            id: territory.id,
            name: territory.name.clone(),
            kind: territory.kind,
            owner: territory.owner(),
            members,
            invites,
            join_requests,
            mob_spawning_allowed: territory.mob_spawning_allowed,
            open_join: territory.open_join,
            description: territory.description.clone(),
            creation_time: territory.creation_time,
        }
    }

    fn into_territory(self) -> Result<Territory, PersistenceError> {
        if self.kind == TerritoryKind::MemberOwned {
            let owners = self.members.iter().filter(|m| m.role == Role::Owner).count();
            let owner_matches = self
                .owner
                .is_some_and(|owner| self.members.iter().any(|m| m.player == owner && m.role == Role::Owner));
            if owners != 1 || !owner_matches {
                return Err(PersistenceError::Corrupt(format!(
                    "territory '{}' must have exactly one owner",
                    self.name
                )));
            }
        }

        Ok(Territory::restore(
            self.id,
            self.name,
            self.kind,
            self.owner,
            self.members.into_iter().map(|m| (m.player, m.role)).collect(),
            self.invites.into_iter().collect(),
            self.join_requests.into_iter().collect(),
            (self.mob_spawning_allowed, self.open_join),
            self.description,
            self.creation_time,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub chunk: ChunkKey,
    pub territory: TerritoryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRecord {
    pub territory: TerritoryId,
    pub limit: ClaimLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub location: BlockPos,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub taken_at: DateTime<Utc>,
    pub territories: Vec<TerritoryRecord>,
    pub claims: Vec<ClaimRecord>,
    #[serde(default)]
    pub claim_limits: Vec<LimitRecord>,
    #[serde(default)]
    pub locks: Vec<LockRecord>,
}

impl WorldSnapshot {
    /// Copies the current state. Must run on the thread that owns `manager`.
    pub fn capture(manager: &TerritoryManager, locks: &LockOverlay, now: DateTime<Utc>) -> Self {
        let mut territories: Vec<TerritoryRecord> = manager.iter().map(TerritoryRecord::capture).collect();
        territories.sort_by_key(|t| t.id);

        let mut claims: Vec<ClaimRecord> = manager
            .claims()
            .iter()
            .map(|(chunk, territory)| ClaimRecord { chunk: *chunk, territory: *territory })
            .collect();
        claims.sort_by_key(|c| c.chunk);

        let mut claim_limits: Vec<LimitRecord> = manager
            .claims()
            .limit_overrides()
            .map(|(territory, limit)| LimitRecord { territory: *territory, limit: *limit })
            .collect();
        claim_limits.sort_by_key(|l| l.territory);

        let mut lock_records: Vec<LockRecord> = locks
            .iter()
            .map(|(location, owner)| LockRecord { location: *location, owner: *owner })
            .collect();
        lock_records.sort_by_key(|l| l.location);

        Self {
            version: SNAPSHOT_VERSION,
            taken_at: now,
            territories,
            claims,
            claim_limits,
            locks: lock_records,
        }
    }

    /// Rebuilds the manager and lock overlay, validating every invariant.
    ///
    /// # Errors
    ///
    /// * [`PersistenceError::UnsupportedVersion`] for snapshots from another format
    /// * [`PersistenceError::Corrupt`] for duplicate names, players in two
    ///   territories, overlapping claims, or claims by unknown territories
    pub fn restore(self, config: TerritoryConfig) -> Result<(TerritoryManager, LockOverlay), PersistenceError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut manager = TerritoryManager::new(config);
        for record in self.territories {
            let territory = record.into_territory()?;
            manager.insert_restored(territory).map_err(PersistenceError::Corrupt)?;
        }

        for record in self.claim_limits {
            if manager.territory(record.territory).is_none() {
                return Err(PersistenceError::Corrupt(format!(
                    "claim limit for unknown territory {}",
                    record.territory
                )));
            }
            manager.claims_mut().set_limit(record.territory, record.limit);
        }

        for record in self.claims {
            if manager.territory(record.territory).is_none() {
                return Err(PersistenceError::Corrupt(format!(
                    "chunk {} claimed by unknown territory {}",
                    record.chunk, record.territory
                )));
            }
            manager
                .claims_mut()
                .insert_restored(record.chunk, record.territory)
                .map_err(|owner| {
                    PersistenceError::Corrupt(format!("chunk {} claimed twice (already {owner})", record.chunk))
                })?;
        }

        let mut locks = LockOverlay::new();
        for record in self.locks {
            locks
                .lock(record.location, record.owner)
                .map_err(|_| PersistenceError::Corrupt(format!("block {} locked twice", record.location)))?;
        }

        info!(
            "📂 Restored {} territories, {} claims, {} locks",
            manager.len(),
            manager.claims().len(),
            locks.len()
        );
        Ok((manager, locks))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Durable storage for snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the latest snapshot, or `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<WorldSnapshot>, PersistenceError>;

    async fn save(&self, snapshot: &WorldSnapshot) -> Result<(), PersistenceError>;
}

/// Stores snapshots as a single pretty-printed JSON file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write never leaves a truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<Option<WorldSnapshot>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let snapshot = WorldSnapshot::from_json(&bytes)?;
        debug!("📂 Loaded snapshot from {}", self.path.display());
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &WorldSnapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = snapshot.to_json()?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!("💾 Snapshot written to {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorldId;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn chunk(x: i32, z: i32) -> ChunkKey {
        ChunkKey::new(WorldId(0), x, z)
    }

    fn populated() -> (TerritoryManager, LockOverlay) {
        let mut manager = TerritoryManager::default();
        let owner = PlayerId::new();
        let guild = manager.create("Ravens", owner, Utc::now()).unwrap();
        manager.add_member(guild, PlayerId::new(), Role::Moderator).unwrap();
        manager.add_member(guild, PlayerId::new(), Role::User).unwrap();
        manager.invite(guild, PlayerId::new()).unwrap();
        manager.set_claim_limit(guild, ClaimLimit::Bounded(40)).unwrap();
        for x in 0..20 {
            manager.claim(chunk(x, 0), guild).unwrap();
        }
        manager.claim(chunk(-5, -5), TerritoryId::SAFE_ZONE).unwrap();
        manager.describe(TerritoryId::SAFE_ZONE, "Spawn").unwrap();

        let other = manager.create("Wolves", PlayerId::new(), Utc::now()).unwrap();
        manager.claim(chunk(100, 100), other).unwrap();

        let mut locks = LockOverlay::new();
        locks.lock(BlockPos::new(WorldId(0), 3, 64, 3), owner).unwrap();
        (manager, locks)
    }

    fn ownership(manager: &TerritoryManager) -> BTreeMap<ChunkKey, TerritoryId> {
        manager.claims().iter().map(|(c, t)| (*c, *t)).collect()
    }

    fn roles(manager: &TerritoryManager) -> BTreeMap<TerritoryId, BTreeMap<PlayerId, Role>> {
        manager.iter().map(|t| (t.id, t.members().collect())).collect()
    }

    #[test]
    fn test_capture_restore_reproduces_state() {
        let (manager, locks) = populated();
        let snapshot = WorldSnapshot::capture(&manager, &locks, Utc::now());

        let (restored, restored_locks) = snapshot.clone().restore(TerritoryConfig::default()).unwrap();

        assert_eq!(ownership(&restored), ownership(&manager));
        assert_eq!(roles(&restored), roles(&manager));
        assert_eq!(restored_locks.len(), 1);
        assert_eq!(WorldSnapshot::capture(&restored, &restored_locks, snapshot.taken_at), snapshot);
    }

    #[test]
    fn test_restore_keeps_limit_overrides_above_default() {
        let (manager, locks) = populated();
        let snapshot = WorldSnapshot::capture(&manager, &locks, Utc::now());

        let (restored, _) = snapshot.restore(TerritoryConfig::default()).unwrap();
        let guild = restored.territory_by_name("Ravens").unwrap().id;

        assert_eq!(restored.claims().count_for(guild), 20);
        assert_eq!(restored.claims().limit_for(guild), ClaimLimit::Bounded(40));
        assert_eq!(restored.territory(TerritoryId::SAFE_ZONE).unwrap().description, "Spawn");
    }

    #[test]
    fn test_restore_rejects_overlapping_claims() {
        let (manager, locks) = populated();
        let mut snapshot = WorldSnapshot::capture(&manager, &locks, Utc::now());
        let first = snapshot.claims[0].clone();
        snapshot.claims.push(ClaimRecord {
            chunk: first.chunk,
            territory: TerritoryId::WAR_ZONE,
        });

        assert!(matches!(
            snapshot.restore(TerritoryConfig::default()),
            Err(PersistenceError::Corrupt(_))
        ));
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let (manager, locks) = populated();
        let mut snapshot = WorldSnapshot::capture(&manager, &locks, Utc::now());
        snapshot.version = 99;

        assert!(matches!(
            snapshot.restore(TerritoryConfig::default()),
            Err(PersistenceError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("territories.json"));
        let (manager, locks) = populated();
        let snapshot = WorldSnapshot::capture(&manager, &locks, Utc::now());

        assert!(store.load().await.unwrap().is_none());
        store.save(&snapshot).await.unwrap();
        let loaded = store.load().await.unwrap().expect("snapshot should exist");

        assert_eq!(loaded, snapshot);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_json_store_reports_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("territories.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let result = JsonFileStore::new(path).load().await;

        assert!(matches!(result, Err(PersistenceError::Serialization(_))));
    }
}
