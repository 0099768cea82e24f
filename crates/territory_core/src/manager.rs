//! # Territory Manager
//!
//! Owns every territory, the claim registry, and the indexes that keep them
//! consistent:
//!
//! - a lowercase name index enforcing unique names,
//! - a player index enforcing at most one member-owned territory per player.
//!
//! The manager performs state transitions only. It does not authorize anything;
//! commands from players go through
//! [`TerritoryService`](crate::service::TerritoryService), which asks the
//! decision engine first. Every successful mutation is reported to the
//! configured [`TerritoryObserver`].

use crate::claims::{ClaimLimit, ClaimRegistry};
use crate::config::TerritoryConfig;
use crate::error::{TerritoryError, TerritoryResult};
use crate::notify::{NoopObserver, TerritoryEvent, TerritoryFlag, TerritoryObserver};
use crate::roles::{resolve, EffectiveRole};
use crate::territory::{validate_name, Role, Territory, TerritoryKind};
use crate::types::{ChunkKey, PlayerId, TerritoryId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player became a member straight away (open join or invited).
    Joined,
    /// A join request was recorded for moderators to handle.
    Requested,
}

/// Result of a player leaving their territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left(TerritoryId),
    /// The player was the last member; the territory was disbanded.
    Disbanded(TerritoryId),
}

/// Everything shown by the `info` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerritoryInfo {
    pub id: TerritoryId,
    pub name: String,
    pub kind: TerritoryKind,
    pub owner: Option<PlayerId>,
    /// Members grouped by role, highest role first. Empty roles are omitted.
    pub members: Vec<(Role, Vec<PlayerId>)>,
    pub claim_count: usize,
    pub claim_limit: ClaimLimit,
    pub mob_spawning_allowed: bool,
    pub open_join: bool,
    pub description: String,
    pub creation_time: DateTime<Utc>,
}

/// One line of the `list` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerritorySummary {
    pub id: TerritoryId,
    pub name: String,
    pub kind: TerritoryKind,
    pub claim_count: usize,
    pub member_count: usize,
}

pub struct TerritoryManager {
    territories: HashMap<TerritoryId, Territory>,
    names: HashMap<String, TerritoryId>,
    player_index: HashMap<PlayerId, TerritoryId>,
    claims: ClaimRegistry,
    config: TerritoryConfig,
    observer: Box<dyn TerritoryObserver>,
}

impl std::fmt::Debug for TerritoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerritoryManager")
            .field("territories", &self.territories.len())
            .field("claims", &self.claims.len())
            .field("players", &self.player_index.len())
            .finish()
    }
}

impl TerritoryManager {
    /// Creates a manager holding only the three server pseudo-zones.
    pub fn new(config: TerritoryConfig) -> Self {
        let mut manager = Self {
            territories: HashMap::new(),
            names: HashMap::new(),
            player_index: HashMap::new(),
            claims: ClaimRegistry::new(config.default_claim_limit),
            config,
            observer: Box::new(NoopObserver),
        };
        manager.provision_pseudo_zones(Utc::now());
        manager
    }

    pub fn with_observer(config: TerritoryConfig, observer: Box<dyn TerritoryObserver>) -> Self {
        let mut manager = Self::new(config);
        manager.observer = observer;
        manager
    }

    pub fn set_observer(&mut self, observer: Box<dyn TerritoryObserver>) {
        self.observer = observer;
    }

    pub fn config(&self) -> &TerritoryConfig {
        &self.config
    }

    /// Inserts any missing pseudo-zone. Existing ones are left untouched.
    pub(crate) fn provision_pseudo_zones(&mut self, now: DateTime<Utc>) {
        for kind in [TerritoryKind::Safe, TerritoryKind::War, TerritoryKind::Wild] {
            let Some(zone) = Territory::pseudo_zone(kind, now) else {
                continue;
            };
            self.claims.set_limit(zone.id, ClaimLimit::Unbounded);
            if !self.territories.contains_key(&zone.id) {
                self.names.insert(zone.name.to_lowercase(), zone.id);
                self.territories.insert(zone.id, zone);
            }
        }
    }

    /// Inserts a territory read from a snapshot, rebuilding the indexes.
    pub(crate) fn insert_restored(&mut self, territory: Territory) -> Result<(), String> {
        let key = territory.name.to_lowercase();
        if self.names.get(&key).is_some_and(|id| *id != territory.id) {
            return Err(format!("duplicate territory name '{}'", territory.name));
        }
        let member_owned = territory.kind == TerritoryKind::MemberOwned;
        if member_owned {
            for player in territory.member_ids() {
                if self.player_index.get(&player).is_some_and(|id| *id != territory.id) {
                    return Err(format!("player {player} belongs to two territories"));
                }
            }
            for player in territory.member_ids() {
                self.player_index.insert(player, territory.id);
            }
        }

        if let Some(previous) = self.territories.remove(&territory.id) {
            self.names.remove(&previous.name.to_lowercase());
        }
        self.names.insert(key, territory.id);
        self.territories.insert(territory.id, territory);
        Ok(())
    }

    pub(crate) fn claims_mut(&mut self) -> &mut ClaimRegistry {
        &mut self.claims
    }

    // ---- Queries ----

    pub fn territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(&id)
    }

    /// Case-insensitive name lookup.
    pub fn territory_by_name(&self, name: &str) -> Option<&Territory> {
        self.names
            .get(&name.to_lowercase())
            .and_then(|id| self.territories.get(id))
    }

    pub fn territory_of_player(&self, player: PlayerId) -> Option<&Territory> {
        self.player_index
            .get(&player)
            .and_then(|id| self.territories.get(id))
    }

    /// The territory owning `chunk`, if any.
    #[inline]
    pub fn territory_at(&self, chunk: &ChunkKey) -> Option<&Territory> {
        self.claims
            .owner_of(chunk)
            .and_then(|id| self.territories.get(&id))
    }

    #[inline]
    pub fn owner_of(&self, chunk: &ChunkKey) -> Option<TerritoryId> {
        self.claims.owner_of(chunk)
    }

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    pub fn effective_role(&self, territory: TerritoryId, player: PlayerId, is_operator: bool) -> Option<EffectiveRole> {
        self.territories
            .get(&territory)
            .map(|t| resolve(t, player, is_operator))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }

    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    pub fn info(&self, id: TerritoryId) -> Option<TerritoryInfo> {
        let territory = self.territories.get(&id)?;
        let members = [Role::Owner, Role::Admin, Role::Moderator, Role::User]
            .into_iter()
            .map(|role| (role, territory.members_with_role(role)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();

        Some(TerritoryInfo {
            id,
            name: territory.name.clone(),
            kind: territory.kind,
            owner: territory.owner(),
            members,
            claim_count: self.claims.count_for(id),
            claim_limit: self.claims.limit_for(id),
            mob_spawning_allowed: territory.mob_spawning_allowed,
            open_join: territory.open_join,
            description: territory.description.clone(),
            creation_time: territory.creation_time,
        })
    }

    /// Member-owned territories, most claims first, then by name.
    pub fn list(&self) -> Vec<TerritorySummary> {
        let mut summaries: Vec<TerritorySummary> = self
            .territories
            .values()
            .filter(|t| t.kind == TerritoryKind::MemberOwned)
            .map(|t| TerritorySummary {
                id: t.id,
                name: t.name.clone(),
                kind: t.kind,
                claim_count: self.claims.count_for(t.id),
                member_count: t.member_count(),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.claim_count
                .cmp(&a.claim_count)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        summaries
    }

    // ---- Territory lifecycle ----

    /// Creates a member-owned territory with `owner` as OWNER.
    ///
    /// # Errors
    ///
    /// * [`TerritoryError::InvalidName`] if the name breaks the naming rule
    /// * [`TerritoryError::AlreadyInTerritory`] if the owner already has a territory
    /// * [`TerritoryError::DuplicateName`] if the name is taken (case-insensitive)
    pub fn create(&mut self, name: &str, owner: PlayerId, now: DateTime<Utc>) -> TerritoryResult<TerritoryId> {
        self.check_name(name)?;
        if self.player_index.contains_key(&owner) {
            return Err(TerritoryError::AlreadyInTerritory(owner));
        }
        let key = name.to_lowercase();
        if self.names.contains_key(&key) {
            return Err(TerritoryError::DuplicateName(name.to_string()));
        }

        let id = TerritoryId::new();
        self.territories
            .insert(id, Territory::member_owned(id, name.to_string(), owner, now));
        self.names.insert(key, id);
        self.player_index.insert(owner, id);

        info!("🏰 Territory '{}' ({}) created by {}", name, id, owner);
        self.emit(TerritoryEvent::Created { territory: id, name: name.to_string(), owner });
        Ok(id)
    }

    pub fn rename(&mut self, id: TerritoryId, new_name: &str) -> TerritoryResult<()> {
        self.member_owned(id)?;
        self.check_name(new_name)?;
        let key = new_name.to_lowercase();
        if self.names.get(&key).is_some_and(|owner| *owner != id) {
            return Err(TerritoryError::DuplicateName(new_name.to_string()));
        }

        let territory = self.member_owned_mut(id)?;
        let old_name = std::mem::replace(&mut territory.name, new_name.to_string());
        self.names.remove(&old_name.to_lowercase());
        self.names.insert(key, id);

        info!("🏷️ Territory '{}' renamed to '{}'", old_name, new_name);
        self.emit(TerritoryEvent::Renamed {
            territory: id,
            old_name,
            new_name: new_name.to_string(),
        });
        Ok(())
    }

    /// Replaces the description, truncated to the configured maximum length.
    pub fn describe(&mut self, id: TerritoryId, text: &str) -> TerritoryResult<()> {
        let max = self.config.max_description_length;
        let territory = self.territory_mut(id)?;
        territory.description = text.trim().chars().take(max).collect();
        self.emit(TerritoryEvent::DescriptionChanged { territory: id });
        Ok(())
    }

    /// Deletes a member-owned territory, releasing every claim and membership.
    ///
    /// Returns the chunks that were released.
    pub fn disband(&mut self, id: TerritoryId) -> TerritoryResult<Vec<ChunkKey>> {
        self.member_owned(id)?;
        let Some(mut territory) = self.territories.remove(&id) else {
            return Err(TerritoryError::UnknownTerritory(id));
        };

        let released = self.claims.unclaim_all(id);
        self.claims.clear_limit(id);
        self.names.remove(&territory.name.to_lowercase());
        let former_members = territory.clear_membership();
        for player in &former_members {
            self.player_index.remove(player);
        }

        info!(
            "💥 Territory '{}' disbanded: {} claims released, {} members removed",
            territory.name,
            released.len(),
            former_members.len()
        );
        self.emit(TerritoryEvent::Disbanded {
            territory: id,
            name: territory.name,
            former_members,
        });
        Ok(released)
    }

    // ---- Membership ----

    /// Adds `player` with `role`. OWNER cannot be granted this way.
    pub fn add_member(&mut self, id: TerritoryId, player: PlayerId, role: Role) -> TerritoryResult<()> {
        if role == Role::Owner {
            return Err(TerritoryError::InvalidRoleAssignment(role));
        }
        self.member_owned(id)?;
        if self.player_index.contains_key(&player) {
            return Err(TerritoryError::AlreadyInTerritory(player));
        }

        self.member_owned_mut(id)?.insert_member(player, role);
        self.player_index.insert(player, id);
        info!("👋 Player {} joined territory {} as {}", player, id, role);
        self.emit(TerritoryEvent::MemberJoined { territory: id, player });
        Ok(())
    }

    /// Removes a non-owner member. Returns the role they held.
    pub fn remove_member(&mut self, id: TerritoryId, player: PlayerId) -> TerritoryResult<Role> {
        let role = self.detach_member(id, player)?;
        info!("🚪 Player {} left territory {}", player, id);
        self.emit(TerritoryEvent::MemberLeft { territory: id, player });
        Ok(role)
    }

    /// Like [`remove_member`](Self::remove_member), reported as a kick.
    pub fn kick(&mut self, id: TerritoryId, player: PlayerId) -> TerritoryResult<Role> {
        let role = self.detach_member(id, player).map_err(|err| match err {
            TerritoryError::OwnerMustTransfer => TerritoryError::CannotTargetRank,
            other => other,
        })?;
        info!("🥾 Player {} kicked from territory {}", player, id);
        self.emit(TerritoryEvent::MemberKicked { territory: id, player });
        Ok(role)
    }

    fn detach_member(&mut self, id: TerritoryId, player: PlayerId) -> TerritoryResult<Role> {
        let territory = self.member_owned_mut(id)?;
        match territory.role_of(player) {
            None => return Err(TerritoryError::NotMember(player)),
            Some(Role::Owner) => return Err(TerritoryError::OwnerMustTransfer),
            Some(_) => {}
        }
        let role = territory
            .remove_member(player)
            .ok_or(TerritoryError::NotMember(player))?;
        self.player_index.remove(&player);
        Ok(role)
    }

    /// A player leaves whatever territory they belong to.
    ///
    /// An owner who is the last member disbands the territory; an owner with
    /// other members must transfer ownership first.
    pub fn leave(&mut self, player: PlayerId) -> TerritoryResult<LeaveOutcome> {
        let Some(territory) = self.territory_of_player(player) else {
            return Err(TerritoryError::NotMember(player));
        };
        let id = territory.id;

        if territory.owner() == Some(player) {
            if territory.member_count() > 1 {
                return Err(TerritoryError::OwnerMustTransfer);
            }
            self.disband(id)?;
            return Ok(LeaveOutcome::Disbanded(id));
        }

        self.remove_member(id, player)?;
        Ok(LeaveOutcome::Left(id))
    }

    /// Changes a member's role. OWNER is only reachable through [`transfer`](Self::transfer),
    /// and the current owner's role cannot be changed here.
    pub fn set_role(&mut self, id: TerritoryId, player: PlayerId, role: Role) -> TerritoryResult<()> {
        if role == Role::Owner {
            return Err(TerritoryError::InvalidRoleAssignment(role));
        }
        let territory = self.member_owned_mut(id)?;
        match territory.role_of(player) {
            None => return Err(TerritoryError::NotMember(player)),
            Some(Role::Owner) => return Err(TerritoryError::OwnerMustTransfer),
            Some(_) => {}
        }
        territory.set_role(player, role);

        info!("🎖️ Player {} is now {} in territory {}", player, role, id);
        self.emit(TerritoryEvent::RoleChanged { territory: id, player, role });
        Ok(())
    }

    /// Atomically hands OWNER to `new_owner`, demoting the previous owner to ADMIN.
    pub fn transfer(&mut self, id: TerritoryId, new_owner: PlayerId) -> TerritoryResult<()> {
        let territory = self.member_owned_mut(id)?;
        if !territory.is_member(new_owner) {
            return Err(TerritoryError::NotMember(new_owner));
        }
        let previous = territory.owner();
        if previous == Some(new_owner) {
            return Ok(());
        }
        territory.swap_owner(new_owner);

        info!("👑 Territory {} ownership transferred to {}", id, new_owner);
        self.emit(TerritoryEvent::OwnershipTransferred {
            territory: id,
            previous,
            owner: new_owner,
        });
        Ok(())
    }

    // ---- Invites and join requests ----

    pub fn invite(&mut self, id: TerritoryId, player: PlayerId) -> TerritoryResult<()> {
        let territory = self.member_owned_mut(id)?;
        if territory.is_member(player) {
            return Err(TerritoryError::AlreadyInTerritory(player));
        }
        if !territory.add_invite(player) {
            return Err(TerritoryError::AlreadyInvited(player));
        }
        self.emit(TerritoryEvent::Invited { territory: id, player });
        Ok(())
    }

    pub fn cancel_invite(&mut self, id: TerritoryId, player: PlayerId) -> TerritoryResult<()> {
        if !self.member_owned_mut(id)?.remove_invite(player) {
            return Err(TerritoryError::NotInvited(player));
        }
        self.emit(TerritoryEvent::InviteCancelled { territory: id, player });
        Ok(())
    }

    pub fn accept_invite(&mut self, player: PlayerId, id: TerritoryId) -> TerritoryResult<()> {
        if !self.member_owned(id)?.is_invited(player) {
            return Err(TerritoryError::NotInvited(player));
        }
        self.add_member(id, player, Role::User)
    }

    pub fn decline_invite(&mut self, player: PlayerId, id: TerritoryId) -> TerritoryResult<()> {
        if !self.member_owned_mut(id)?.remove_invite(player) {
            return Err(TerritoryError::NotInvited(player));
        }
        self.emit(TerritoryEvent::InviteDeclined { territory: id, player });
        Ok(())
    }

    /// Joins immediately when the territory is open or the player is invited,
    /// otherwise records a join request.
    pub fn request_join(&mut self, player: PlayerId, id: TerritoryId) -> TerritoryResult<JoinOutcome> {
        if self.player_index.contains_key(&player) {
            return Err(TerritoryError::AlreadyInTerritory(player));
        }
        let territory = self.member_owned(id)?;
        if territory.open_join || territory.is_invited(player) {
            self.add_member(id, player, Role::User)?;
            return Ok(JoinOutcome::Joined);
        }
        if self.member_owned_mut(id)?.add_join_request(player) {
            self.emit(TerritoryEvent::JoinRequested { territory: id, player });
        }
        Ok(JoinOutcome::Requested)
    }

    pub fn accept_request(&mut self, id: TerritoryId, player: PlayerId) -> TerritoryResult<()> {
        if !self.member_owned(id)?.has_join_request(player) {
            return Err(TerritoryError::NoJoinRequest(player));
        }
        if self.player_index.contains_key(&player) {
            self.member_owned_mut(id)?.remove_join_request(player);
            return Err(TerritoryError::AlreadyInTerritory(player));
        }
        self.add_member(id, player, Role::User)
    }

    pub fn decline_request(&mut self, id: TerritoryId, player: PlayerId) -> TerritoryResult<()> {
        if !self.member_owned_mut(id)?.remove_join_request(player) {
            return Err(TerritoryError::NoJoinRequest(player));
        }
        self.emit(TerritoryEvent::JoinRequestDeclined { territory: id, player });
        Ok(())
    }

    // ---- Flags ----

    pub fn set_mob_spawning(&mut self, id: TerritoryId, allowed: bool) -> TerritoryResult<()> {
        self.territory_mut(id)?.mob_spawning_allowed = allowed;
        self.emit(TerritoryEvent::FlagChanged {
            territory: id,
            flag: TerritoryFlag::MobSpawning,
            value: allowed,
        });
        Ok(())
    }

    pub fn set_open_join(&mut self, id: TerritoryId, open: bool) -> TerritoryResult<()> {
        self.member_owned_mut(id)?.open_join = open;
        self.emit(TerritoryEvent::FlagChanged {
            territory: id,
            flag: TerritoryFlag::OpenJoin,
            value: open,
        });
        Ok(())
    }

    /// Flips a flag and returns its new value.
    pub fn toggle(&mut self, id: TerritoryId, flag: TerritoryFlag) -> TerritoryResult<bool> {
        let territory = self.territory(id).ok_or(TerritoryError::UnknownTerritory(id))?;
        match flag {
            TerritoryFlag::MobSpawning => {
                let value = !territory.mob_spawning_allowed;
                self.set_mob_spawning(id, value)?;
                Ok(value)
            }
            TerritoryFlag::OpenJoin => {
                let value = !territory.open_join;
                self.set_open_join(id, value)?;
                Ok(value)
            }
        }
    }

    // ---- Claims ----

    pub fn claim(&mut self, chunk: ChunkKey, id: TerritoryId) -> TerritoryResult<()> {
        if !self.territories.contains_key(&id) {
            return Err(TerritoryError::UnknownTerritory(id));
        }
        if self.claims.owner_of(&chunk) == Some(id) {
            return Ok(());
        }
        self.claims.claim(chunk, id)?;
        info!("🚩 Chunk {} claimed by territory {}", chunk, id);
        self.emit(TerritoryEvent::Claimed { territory: id, chunk });
        Ok(())
    }

    pub fn unclaim(&mut self, chunk: ChunkKey, id: TerritoryId) -> TerritoryResult<()> {
        self.claims.unclaim(chunk, id)?;
        info!("🏳️ Chunk {} released by territory {}", chunk, id);
        self.emit(TerritoryEvent::Unclaimed { territory: id, chunk });
        Ok(())
    }

    pub fn set_claim_limit(&mut self, id: TerritoryId, limit: ClaimLimit) -> TerritoryResult<()> {
        if !self.territories.contains_key(&id) {
            return Err(TerritoryError::UnknownTerritory(id));
        }
        self.claims.set_limit(id, limit);
        info!("📏 Claim limit for territory {} set to {}", id, limit);
        self.emit(TerritoryEvent::ClaimLimitChanged { territory: id, limit });
        Ok(())
    }

    // ---- Internals ----

    fn check_name(&self, name: &str) -> TerritoryResult<()> {
        validate_name(name, self.config.min_name_length, self.config.max_name_length)
            .map_err(|reason| TerritoryError::InvalidName(format!("'{name}' {reason}")))
    }

    fn territory_mut(&mut self, id: TerritoryId) -> TerritoryResult<&mut Territory> {
        self.territories
            .get_mut(&id)
            .ok_or(TerritoryError::UnknownTerritory(id))
    }

    fn member_owned(&self, id: TerritoryId) -> TerritoryResult<&Territory> {
        let territory = self
            .territories
            .get(&id)
            .ok_or(TerritoryError::UnknownTerritory(id))?;
        if territory.kind.is_pseudo_zone() {
            return Err(TerritoryError::PseudoZone);
        }
        Ok(territory)
    }

    fn member_owned_mut(&mut self, id: TerritoryId) -> TerritoryResult<&mut Territory> {
        let territory = self.territory_mut(id)?;
        if territory.kind.is_pseudo_zone() {
            return Err(TerritoryError::PseudoZone);
        }
        Ok(territory)
    }

    fn emit(&self, event: TerritoryEvent) {
        let (name, mut audience): (&str, Vec<PlayerId>) = match &event {
            TerritoryEvent::Disbanded { name, former_members, .. } => (name.as_str(), former_members.clone()),
            other => match self.territories.get(&other.territory()) {
                Some(t) => (t.name.as_str(), t.member_ids().collect()),
                None => ("", Vec::new()),
            },
        };
        if let Some(subject) = event.subject() {
            if !audience.contains(&subject) {
                audience.push(subject);
            }
        }
        self.observer.on_territory_event(&event, name, &audience);
    }
}

impl Default for TerritoryManager {
    fn default() -> Self {
        Self::new(TerritoryConfig::default())
    }
}
