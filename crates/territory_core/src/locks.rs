//! Lock overlay: per-block ownership, independent of territories.
//!
//! A lock restricts one fixture to one player. Adapters consult it before any
//! territory rule for protected fixture classes; once a lock exists, territory
//! membership and rank no longer matter for that block.

use crate::decision::{Decision, DenyReason};
use crate::error::{TerritoryError, TerritoryResult};
use crate::types::{BlockPos, PlayerId};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct LockOverlay {
    locks: HashMap<BlockPos, PlayerId>,
}

impl LockOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// [`TerritoryError::AlreadyLocked`] if any player already holds a lock on `location`.
    pub fn lock(&mut self, location: BlockPos, owner: PlayerId) -> TerritoryResult<()> {
        if self.locks.contains_key(&location) {
            return Err(TerritoryError::AlreadyLocked);
        }
        self.locks.insert(location, owner);
        info!("🔒 {} locked by {}", location, owner);
        Ok(())
    }

    /// # Errors
    ///
    /// * [`TerritoryError::NotLocked`] if there is no lock
    /// * [`TerritoryError::NotOwner`] if `requester` is not the lock owner
    pub fn unlock(&mut self, location: BlockPos, requester: PlayerId) -> TerritoryResult<()> {
        match self.locks.get(&location) {
            None => Err(TerritoryError::NotLocked),
            Some(owner) if *owner != requester => Err(TerritoryError::NotOwner),
            Some(_) => {
                self.locks.remove(&location);
                info!("🔓 {} unlocked by {}", location, requester);
                Ok(())
            }
        }
    }

    /// Removes a lock regardless of owner. Used by operators.
    pub fn force_unlock(&mut self, location: BlockPos) -> Option<PlayerId> {
        self.locks.remove(&location)
    }

    /// Drops the lock of a block that no longer exists.
    pub fn remove_on_destroy(&mut self, location: BlockPos) -> Option<PlayerId> {
        let owner = self.locks.remove(&location);
        if let Some(owner) = owner {
            debug!("🔓 Lock at {} held by {} removed with its block", location, owner);
        }
        owner
    }

    #[inline]
    pub fn is_locked(&self, location: &BlockPos) -> bool {
        self.locks.contains_key(location)
    }

    #[inline]
    pub fn owner_of(&self, location: &BlockPos) -> Option<PlayerId> {
        self.locks.get(location).copied()
    }

    /// Verdict for `requester` touching `location`.
    ///
    /// `None` when the block is unlocked, so the caller falls through to
    /// territory policy.
    pub fn check(&self, location: &BlockPos, requester: PlayerId) -> Option<Decision> {
        self.locks.get(location).map(|owner| {
            if *owner == requester {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Locked)
            }
        })
    }

    /// Every block locked by `owner`, sorted.
    pub fn locks_of(&self, owner: PlayerId) -> Vec<BlockPos> {
        let mut blocks: Vec<BlockPos> = self
            .locks
            .iter()
            .filter(|(_, p)| **p == owner)
            .map(|(pos, _)| *pos)
            .collect();
        blocks.sort();
        blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BlockPos, &PlayerId)> {
        self.locks.iter()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorldId;

    fn door() -> BlockPos {
        BlockPos::new(WorldId(0), 10, 64, -3)
    }

    #[test]
    fn test_lock_is_exclusive() {
        let mut locks = LockOverlay::new();
        let owner = PlayerId::new();

        locks.lock(door(), owner).unwrap();

        assert_eq!(locks.lock(door(), PlayerId::new()), Err(TerritoryError::AlreadyLocked));
        assert_eq!(locks.lock(door(), owner), Err(TerritoryError::AlreadyLocked));
        assert_eq!(locks.owner_of(&door()), Some(owner));
    }

    #[test]
    fn test_only_owner_unlocks() {
        let mut locks = LockOverlay::new();
        let owner = PlayerId::new();
        locks.lock(door(), owner).unwrap();

        assert_eq!(locks.unlock(door(), PlayerId::new()), Err(TerritoryError::NotOwner));
        locks.unlock(door(), owner).unwrap();
        assert!(!locks.is_locked(&door()));
        assert_eq!(locks.unlock(door(), owner), Err(TerritoryError::NotLocked));
    }

    #[test]
    fn test_check_denies_everyone_but_owner() {
        let mut locks = LockOverlay::new();
        let owner = PlayerId::new();
        locks.lock(door(), owner).unwrap();

        assert_eq!(locks.check(&door(), owner), Some(Decision::Allow));
        assert_eq!(locks.check(&door(), PlayerId::new()), Some(Decision::Deny(DenyReason::Locked)));
        assert_eq!(locks.check(&door().offset(0, 1, 0), PlayerId::new()), None);
    }

    #[test]
    fn test_destroyed_block_drops_lock() {
        let mut locks = LockOverlay::new();
        let owner = PlayerId::new();
        locks.lock(door(), owner).unwrap();
        locks.lock(door().offset(1, 0, 0), owner).unwrap();

        assert_eq!(locks.remove_on_destroy(door()), Some(owner));
        assert_eq!(locks.locks_of(owner), vec![door().offset(1, 0, 0)]);
        assert_eq!(locks.remove_on_destroy(door()), None);
    }
}
