//! Claim registry: the spatial store mapping chunks to owning territories.
//!
//! The forward map (`ChunkKey -> TerritoryId`) answers `owner_of`, the single
//! hottest lookup in the engine. The reverse index (`TerritoryId -> chunks`)
//! serves enumeration, claim counts and cascade unclaims on disband.
//!
//! Both maps are only ever mutated together, which keeps claims pairwise
//! disjoint: a chunk maps to exactly one territory or none.

use crate::error::{TerritoryError, TerritoryResult};
use crate::types::{ChunkKey, TerritoryId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default maximum number of chunks a member-owned territory may claim.
pub const DEFAULT_CLAIM_LIMIT: usize = 16;

/// Maximum number of claims a territory may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimLimit {
    Bounded(usize),
    Unbounded,
}

impl std::fmt::Display for ClaimLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounded(limit) => write!(f, "{limit}"),
            Self::Unbounded => write!(f, "unlimited"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClaimRegistry {
    owners: HashMap<ChunkKey, TerritoryId>,
    by_territory: HashMap<TerritoryId, HashSet<ChunkKey>>,
    limits: HashMap<TerritoryId, ClaimLimit>,
    default_limit: usize,
}

impl ClaimRegistry {
    pub fn new(default_limit: usize) -> Self {
        Self {
            owners: HashMap::new(),
            by_territory: HashMap::new(),
            limits: HashMap::new(),
            default_limit,
        }
    }

    /// Assigns `chunk` to `territory`.
    ///
    /// Claiming a chunk the territory already owns is a no-op.
    ///
    /// # Errors
    ///
    /// * [`TerritoryError::AlreadyClaimed`] if another territory owns the chunk
    /// * [`TerritoryError::LimitReached`] if the territory is at its claim limit
    ///
    /// The registry is left unchanged on error.
    pub fn claim(&mut self, chunk: ChunkKey, territory: TerritoryId) -> TerritoryResult<()> {
        match self.owners.get(&chunk) {
            Some(owner) if *owner == territory => return Ok(()),
            Some(owner) => return Err(TerritoryError::AlreadyClaimed { owner: *owner }),
            None => {}
        }

        if let ClaimLimit::Bounded(limit) = self.limit_for(territory) {
            if self.count_for(territory) >= limit {
                return Err(TerritoryError::LimitReached { limit });
            }
        }

        self.owners.insert(chunk, territory);
        self.by_territory.entry(territory).or_default().insert(chunk);
        Ok(())
    }

    /// Inserts a claim read back from a snapshot, skipping the limit check.
    ///
    /// Fails with the current owner if the chunk is already taken.
    pub(crate) fn insert_restored(&mut self, chunk: ChunkKey, territory: TerritoryId) -> Result<(), TerritoryId> {
        if let Some(owner) = self.owners.get(&chunk) {
            return Err(*owner);
        }
        self.owners.insert(chunk, territory);
        self.by_territory.entry(territory).or_default().insert(chunk);
        Ok(())
    }

    /// Releases `chunk` from `territory`.
    ///
    /// # Errors
    ///
    /// [`TerritoryError::NotOwner`] if the chunk is unclaimed or claimed by
    /// a different territory.
    pub fn unclaim(&mut self, chunk: ChunkKey, territory: TerritoryId) -> TerritoryResult<()> {
        if self.owners.get(&chunk) != Some(&territory) {
            return Err(TerritoryError::NotOwner);
        }
        self.owners.remove(&chunk);
        if let Some(chunks) = self.by_territory.get_mut(&territory) {
            chunks.remove(&chunk);
            if chunks.is_empty() {
                self.by_territory.remove(&territory);
            }
        }
        Ok(())
    }

    /// Releases every chunk held by `territory`, returning what was released.
    pub fn unclaim_all(&mut self, territory: TerritoryId) -> Vec<ChunkKey> {
        let released: Vec<ChunkKey> = self
            .by_territory
            .remove(&territory)
            .map(|chunks| chunks.into_iter().collect())
            .unwrap_or_default();
        for chunk in &released {
            self.owners.remove(chunk);
        }
        released
    }

    #[inline]
    pub fn owner_of(&self, chunk: &ChunkKey) -> Option<TerritoryId> {
        self.owners.get(chunk).copied()
    }

    pub fn count_for(&self, territory: TerritoryId) -> usize {
        self.by_territory.get(&territory).map_or(0, HashSet::len)
    }

    /// Iterates the chunks held by `territory` in no particular order.
    pub fn claims_of(&self, territory: TerritoryId) -> impl Iterator<Item = &ChunkKey> {
        self.by_territory.get(&territory).into_iter().flatten()
    }

    pub fn limit_for(&self, territory: TerritoryId) -> ClaimLimit {
        self.limits
            .get(&territory)
            .copied()
            .unwrap_or(ClaimLimit::Bounded(self.default_limit))
    }

    /// Overrides the claim limit for one territory.
    ///
    /// Lowering a limit below the current count does not release claims; it
    /// only prevents new ones.
    pub fn set_limit(&mut self, territory: TerritoryId, limit: ClaimLimit) {
        self.limits.insert(territory, limit);
    }

    pub fn clear_limit(&mut self, territory: TerritoryId) {
        self.limits.remove(&territory);
    }

    pub fn limit_overrides(&self) -> impl Iterator<Item = (&TerritoryId, &ClaimLimit)> {
        self.limits.iter()
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Iterates every `(chunk, owner)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&ChunkKey, &TerritoryId)> {
        self.owners.iter()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl Default for ClaimRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CLAIM_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorldId;

    fn chunk(x: i32, z: i32) -> ChunkKey {
        ChunkKey::new(WorldId(0), x, z)
    }

    #[test]
    fn test_claim_and_lookup() {
        let mut registry = ClaimRegistry::default();
        let guild = TerritoryId::new();

        registry.claim(chunk(0, 0), guild).expect("claim should succeed");

        assert_eq!(registry.owner_of(&chunk(0, 0)), Some(guild));
        assert_eq!(registry.owner_of(&chunk(0, 1)), None);
        assert_eq!(registry.count_for(guild), 1);
    }

    #[test]
    fn test_claim_owned_by_other_fails_and_leaves_registry_unchanged() {
        let mut registry = ClaimRegistry::default();
        let first = TerritoryId::new();
        let second = TerritoryId::new();
        registry.claim(chunk(3, 3), first).unwrap();

        let result = registry.claim(chunk(3, 3), second);

        assert_eq!(result, Err(TerritoryError::AlreadyClaimed { owner: first }));
        assert_eq!(registry.owner_of(&chunk(3, 3)), Some(first));
        assert_eq!(registry.count_for(first), 1);
        assert_eq!(registry.count_for(second), 0);
    }

    #[test]
    fn test_reclaiming_own_chunk_is_noop() {
        let mut registry = ClaimRegistry::new(1);
        let guild = TerritoryId::new();
        registry.claim(chunk(0, 0), guild).unwrap();

        assert!(registry.claim(chunk(0, 0), guild).is_ok());
        assert_eq!(registry.count_for(guild), 1);
    }

    #[test]
    fn test_limit_plus_one_claim_fails() {
        let mut registry = ClaimRegistry::new(3);
        let guild = TerritoryId::new();
        for x in 0..3 {
            registry.claim(chunk(x, 0), guild).unwrap();
        }

        let result = registry.claim(chunk(3, 0), guild);

        assert_eq!(result, Err(TerritoryError::LimitReached { limit: 3 }));
        assert_eq!(registry.count_for(guild), 3);
        assert_eq!(registry.owner_of(&chunk(3, 0)), None);
    }

    #[test]
    fn test_unbounded_limit_override() {
        let mut registry = ClaimRegistry::new(1);
        registry.set_limit(TerritoryId::SAFE_ZONE, ClaimLimit::Unbounded);

        for x in 0..50 {
            registry.claim(chunk(x, 0), TerritoryId::SAFE_ZONE).unwrap();
        }
        assert_eq!(registry.count_for(TerritoryId::SAFE_ZONE), 50);
    }

    #[test]
    fn test_unclaim_requires_ownership() {
        let mut registry = ClaimRegistry::default();
        let owner = TerritoryId::new();
        let other = TerritoryId::new();
        registry.claim(chunk(1, 1), owner).unwrap();

        assert_eq!(registry.unclaim(chunk(1, 1), other), Err(TerritoryError::NotOwner));
        assert_eq!(registry.unclaim(chunk(9, 9), owner), Err(TerritoryError::NotOwner));

        registry.unclaim(chunk(1, 1), owner).unwrap();
        assert_eq!(registry.owner_of(&chunk(1, 1)), None);
        assert_eq!(registry.count_for(owner), 0);
    }

    #[test]
    fn test_unclaim_all_releases_everything() {
        let mut registry = ClaimRegistry::default();
        let guild = TerritoryId::new();
        let neighbour = TerritoryId::new();
        for x in 0..4 {
            registry.claim(chunk(x, 0), guild).unwrap();
        }
        registry.claim(chunk(10, 10), neighbour).unwrap();

        let mut released = registry.unclaim_all(guild);
        released.sort();

        assert_eq!(released, (0..4).map(|x| chunk(x, 0)).collect::<Vec<_>>());
        assert_eq!(registry.count_for(guild), 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.owner_of(&chunk(10, 10)), Some(neighbour));
    }
}
