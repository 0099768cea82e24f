//! # Territory Service
//!
//! The command layer. Bundles the [`TerritoryManager`], the [`DecisionEngine`]
//! and the [`LockOverlay`], and exposes every management operation as a method
//! taking the [`Requester`]. Each command is authorized by the decision engine
//! before the manager is touched, so chat commands, admin tools and tests all
//! share one permission path.
//!
//! The service is owned by a single thread; nothing here locks.

use crate::claims::ClaimLimit;
use crate::config::TerritoryConfig;
use crate::decision::{Actor, Decision, DecisionEngine, DenyReason, Requester};
use crate::error::{PersistenceError, TerritoryError, TerritoryResult};
use crate::locks::LockOverlay;
use crate::manager::{JoinOutcome, LeaveOutcome, TerritoryInfo, TerritoryManager, TerritorySummary};
use crate::notify::{TerritoryFlag, TerritoryObserver};
use crate::policy::{ActionKind, Command, ZonePolicyTable};
use crate::roles::{resolve, EffectiveRole};
use crate::snapshot::WorldSnapshot;
use crate::territory::{Role, Territory};
use crate::types::{BlockPos, ChunkKey, PlayerId, TerritoryId};
use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(Debug)]
pub struct TerritoryService {
    manager: TerritoryManager,
    engine: DecisionEngine,
    locks: LockOverlay,
}

impl TerritoryService {
    pub fn new(config: TerritoryConfig, policy: ZonePolicyTable) -> Self {
        Self {
            manager: TerritoryManager::new(config),
            engine: DecisionEngine::new(policy),
            locks: LockOverlay::new(),
        }
    }

    /// Rebuilds the service from a snapshot.
    pub fn from_snapshot(
        config: TerritoryConfig,
        policy: ZonePolicyTable,
        snapshot: WorldSnapshot,
    ) -> Result<Self, PersistenceError> {
        let (manager, locks) = snapshot.restore(config)?;
        Ok(Self {
            manager,
            engine: DecisionEngine::new(policy),
            locks,
        })
    }

    pub fn set_observer(&mut self, observer: Box<dyn TerritoryObserver>) {
        self.manager.set_observer(observer);
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> WorldSnapshot {
        WorldSnapshot::capture(&self.manager, &self.locks, now)
    }

    pub fn manager(&self) -> &TerritoryManager {
        &self.manager
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn locks(&self) -> &LockOverlay {
        &self.locks
    }

    // ---- Exposed lookups ----

    #[inline]
    pub fn owner_of(&self, location: BlockPos) -> Option<TerritoryId> {
        self.manager.owner_of(&location.chunk())
    }

    pub fn territory_at(&self, location: BlockPos) -> Option<&Territory> {
        self.manager.territory_at(&location.chunk())
    }

    pub fn effective_role(&self, territory: TerritoryId, player: PlayerId, is_operator: bool) -> Option<EffectiveRole> {
        self.manager.effective_role(territory, player, is_operator)
    }

    pub fn info(&self, territory: TerritoryId) -> Option<TerritoryInfo> {
        self.manager.info(territory)
    }

    pub fn list(&self) -> Vec<TerritorySummary> {
        self.manager.list()
    }

    // ---- Decisions ----

    #[inline]
    pub fn decide(&self, actor: &Actor, location: BlockPos, action: ActionKind) -> Decision {
        self.engine.decide(&self.manager, actor, location, action)
    }

    /// Decision for using a protected fixture: the lock overlay answers first,
    /// and territory policy only applies to unlocked blocks.
    pub fn decide_fixture(&self, actor: &Actor, location: BlockPos) -> Decision {
        if let Some(player) = actor.player_id() {
            if let Some(verdict) = self.locks.check(&location, player) {
                return verdict;
            }
        } else if self.locks.is_locked(&location) {
            return Decision::Deny(DenyReason::Locked);
        }
        self.decide(actor, location, ActionKind::Interact)
    }

    /// Looks up `territory` and asks the engine whether `requester` may run `command` on it.
    fn authorized(&self, requester: &Requester, territory: TerritoryId, command: Command) -> TerritoryResult<&Territory> {
        let target = self
            .manager
            .territory(territory)
            .ok_or(TerritoryError::UnknownTerritory(territory))?;
        match self.engine.authorize(target, requester, command) {
            Decision::Allow => Ok(target),
            Decision::Deny(reason) => {
                debug!("🚫 {:?} on '{}' by {} denied: {}", command, target.name, requester.id, reason);
                Err(TerritoryError::denied(reason))
            }
        }
    }

    /// The territory the requester belongs to.
    fn own_territory(&self, requester: &Requester) -> TerritoryResult<TerritoryId> {
        self.manager
            .territory_of_player(requester.id)
            .map(|t| t.id)
            .ok_or(TerritoryError::NotMember(requester.id))
    }

    // ---- Territory lifecycle ----

    pub fn create(&mut self, requester: &Requester, name: &str, now: DateTime<Utc>) -> TerritoryResult<TerritoryId> {
        self.manager.create(name, requester.id, now)
    }

    pub fn rename(&mut self, requester: &Requester, territory: TerritoryId, name: &str) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::Rename)?;
        self.manager.rename(territory, name)
    }

    pub fn describe(&mut self, requester: &Requester, territory: TerritoryId, text: &str) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::Describe)?;
        self.manager.describe(territory, text)
    }

    pub fn toggle_flag(&mut self, requester: &Requester, territory: TerritoryId, flag: TerritoryFlag) -> TerritoryResult<bool> {
        self.authorized(requester, territory, Command::SetFlag)?;
        self.manager.toggle(territory, flag)
    }

    pub fn disband(&mut self, requester: &Requester, territory: TerritoryId) -> TerritoryResult<Vec<ChunkKey>> {
        self.authorized(requester, territory, Command::Disband)?;
        self.manager.disband(territory)
    }

    // ---- Membership ----

    pub fn invite(&mut self, requester: &Requester, territory: TerritoryId, target: PlayerId) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::Invite)?;
        self.manager.invite(territory, target)
    }

    pub fn cancel_invite(&mut self, requester: &Requester, territory: TerritoryId, target: PlayerId) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::CancelInvite)?;
        self.manager.cancel_invite(territory, target)
    }

    pub fn accept_invite(&mut self, requester: &Requester, territory: TerritoryId) -> TerritoryResult<()> {
        self.manager.accept_invite(requester.id, territory)
    }

    pub fn decline_invite(&mut self, requester: &Requester, territory: TerritoryId) -> TerritoryResult<()> {
        self.manager.decline_invite(requester.id, territory)
    }

    pub fn request_join(&mut self, requester: &Requester, territory: TerritoryId) -> TerritoryResult<JoinOutcome> {
        self.manager.request_join(requester.id, territory)
    }

    pub fn accept_request(&mut self, requester: &Requester, territory: TerritoryId, target: PlayerId) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::HandleJoinRequest)?;
        self.manager.accept_request(territory, target)
    }

    pub fn decline_request(&mut self, requester: &Requester, territory: TerritoryId, target: PlayerId) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::HandleJoinRequest)?;
        self.manager.decline_request(territory, target)
    }

    /// Removes `target`, who must rank strictly below the requester.
    pub fn kick(&mut self, requester: &Requester, territory: TerritoryId, target: PlayerId) -> TerritoryResult<Role> {
        let guild = self.authorized(requester, territory, Command::Kick)?;
        let target_role = guild.role_of(target).ok_or(TerritoryError::NotMember(target))?;
        let outranks = match resolve(guild, requester.id, requester.operator) {
            EffectiveRole::Operator => true,
            EffectiveRole::Member(role) => role > target_role,
            EffectiveRole::Outsider => false,
        };
        if !outranks {
            return Err(TerritoryError::CannotTargetRank);
        }
        self.manager.kick(territory, target)
    }

    pub fn leave(&mut self, requester: &Requester) -> TerritoryResult<LeaveOutcome> {
        self.manager.leave(requester.id)
    }

    pub fn set_role(&mut self, requester: &Requester, territory: TerritoryId, target: PlayerId, role: Role) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::SetRole)?;
        self.manager.set_role(territory, target, role)
    }

    pub fn transfer(&mut self, requester: &Requester, territory: TerritoryId, new_owner: PlayerId) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::Transfer)?;
        self.manager.transfer(territory, new_owner)
    }

    // ---- Claims ----

    pub fn claim(&mut self, requester: &Requester, territory: TerritoryId, chunk: ChunkKey) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::Claim)?;
        self.manager.claim(chunk, territory)
    }

    pub fn unclaim(&mut self, requester: &Requester, territory: TerritoryId, chunk: ChunkKey) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::Unclaim)?;
        self.manager.unclaim(chunk, territory)
    }

    /// Claims the chunk at `location` for the requester's own territory, or for
    /// `zone` when given (operators claiming for pseudo-zones or on behalf of a guild).
    pub fn claim_here(
        &mut self,
        requester: &Requester,
        location: BlockPos,
        zone: Option<TerritoryId>,
    ) -> TerritoryResult<TerritoryId> {
        let territory = match zone {
            Some(id) => id,
            None => self.own_territory(requester)?,
        };
        self.claim(requester, territory, location.chunk())?;
        Ok(territory)
    }

    /// Releases the chunk at `location` from whichever territory holds it.
    pub fn unclaim_here(&mut self, requester: &Requester, location: BlockPos) -> TerritoryResult<TerritoryId> {
        let chunk = location.chunk();
        let territory = self.manager.owner_of(&chunk).ok_or(TerritoryError::NotOwner)?;
        self.unclaim(requester, territory, chunk)?;
        Ok(territory)
    }

    pub fn set_claim_limit(&mut self, requester: &Requester, territory: TerritoryId, limit: ClaimLimit) -> TerritoryResult<()> {
        self.authorized(requester, territory, Command::SetClaimLimit)?;
        self.manager.set_claim_limit(territory, limit)
    }

    // ---- Locks ----

    /// Locks a fixture. The requester must be allowed to use it in the first place.
    ///
    /// Fixtures in chunks claimed for a server zone are public; only operators
    /// may lock them.
    pub fn lock(&mut self, requester: &Requester, location: BlockPos) -> TerritoryResult<()> {
        let in_server_zone = self
            .territory_at(location)
            .is_some_and(|territory| territory.kind.is_pseudo_zone());
        if in_server_zone && !requester.operator {
            return Err(TerritoryError::PseudoZone);
        }
        if let Decision::Deny(reason) = self.decide(&Actor::Player(*requester), location, ActionKind::Interact) {
            return Err(TerritoryError::denied(reason));
        }
        self.locks.lock(location, requester.id)
    }

    /// Releases a lock. Operators may release anyone's lock.
    pub fn unlock(&mut self, requester: &Requester, location: BlockPos) -> TerritoryResult<()> {
        if requester.operator && self.locks.is_locked(&location) {
            self.locks.force_unlock(location);
            return Ok(());
        }
        self.locks.unlock(location, requester.id)
    }

    /// Blocks locked by `player`, for a "my locks" listing.
    pub fn locks_of(&self, player: PlayerId) -> Vec<BlockPos> {
        self.locks.locks_of(player)
    }

    /// Notifies the overlay that a block is gone.
    pub fn block_destroyed(&mut self, location: BlockPos) -> Option<PlayerId> {
        self.locks.remove_on_destroy(location)
    }
}

impl Default for TerritoryService {
    fn default() -> Self {
        Self::new(TerritoryConfig::default(), ZonePolicyTable::default())
    }
}
