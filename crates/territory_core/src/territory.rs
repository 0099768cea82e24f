//! # Territory Model
//!
//! The owning entity for a set of claimed chunks. Member-owned territories (the
//! guilds players create) and the three server pseudo-zones share this one shape
//! so every lookup on the hot path is uniform.
//!
//! Membership fields are private: they are mutated only through
//! [`TerritoryManager`](crate::manager::TerritoryManager), which also maintains
//! the player index that enforces one territory per player.

use crate::types::{PlayerId, TerritoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Zone type of a territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerritoryKind {
    /// Server zone where nothing can be built or hurt.
    Safe,
    /// Server zone open to combat but closed to terrain edits.
    War,
    /// Explicitly claimed wilderness; behaves like unclaimed land.
    Wild,
    /// A guild owned and run by players.
    MemberOwned,
}

impl TerritoryKind {
    /// Whether this is one of the three server-controlled zones.
    pub const fn is_pseudo_zone(self) -> bool {
        !matches!(self, Self::MemberOwned)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::War => "WAR",
            Self::Wild => "WILD",
            Self::MemberOwned => "GUILD",
        }
    }
}

impl std::fmt::Display for TerritoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rank of a member within a member-owned territory.
///
/// Variants are declared lowest first so the derived ordering reads naturally:
/// `Role::Owner > Role::Admin > Role::Moderator > Role::User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Moderator,
    Admin,
    Owner,
}

impl Role {
    /// Place and break blocks, use buckets and ignition tools.
    pub const fn can_build(self) -> bool {
        !matches!(self, Self::User)
    }

    /// Open protected interactables.
    pub const fn can_access(self) -> bool {
        !matches!(self, Self::User)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Moderator => "Moderator",
            Self::Admin => "Admin",
            Self::Owner => "Owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub kind: TerritoryKind,
    pub mob_spawning_allowed: bool,
    pub open_join: bool,
    pub description: String,
    pub creation_time: DateTime<Utc>,
    owner: Option<PlayerId>,
    members: HashMap<PlayerId, Role>,
    invites: HashSet<PlayerId>,
    join_requests: HashSet<PlayerId>,
}

impl Territory {
    /// Creates a member-owned territory with `owner` as its only member.
    pub fn member_owned(id: TerritoryId, name: String, owner: PlayerId, now: DateTime<Utc>) -> Self {
        let mut members = HashMap::new();
        members.insert(owner, Role::Owner);
        Self {
            id,
            name,
            kind: TerritoryKind::MemberOwned,
            mob_spawning_allowed: false,
            open_join: false,
            description: String::new(),
            creation_time: now,
            owner: Some(owner),
            members,
            invites: HashSet::new(),
            join_requests: HashSet::new(),
        }
    }

    /// Builds one of the server pseudo-zones. `MemberOwned` yields `None`.
    pub fn pseudo_zone(kind: TerritoryKind, now: DateTime<Utc>) -> Option<Self> {
        let (id, name, description) = match kind {
            TerritoryKind::Safe => (TerritoryId::SAFE_ZONE, "SafeZone", "Free from PvP and monsters"),
            TerritoryKind::War => (TerritoryId::WAR_ZONE, "WarZone", "Not the safest place to be"),
            TerritoryKind::Wild => (TerritoryId::WILDERNESS, "Wilderness", "Unclaimed land"),
            TerritoryKind::MemberOwned => return None,
        };
        Some(Self {
            id,
            name: name.to_string(),
            kind,
            mob_spawning_allowed: !matches!(kind, TerritoryKind::Safe),
            open_join: false,
            description: description.to_string(),
            creation_time: now,
            owner: None,
            members: HashMap::new(),
            invites: HashSet::new(),
            join_requests: HashSet::new(),
        })
    }

    /// Reassembles a territory from persisted parts without re-validating them.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: TerritoryId,
        name: String,
        kind: TerritoryKind,
        owner: Option<PlayerId>,
        members: HashMap<PlayerId, Role>,
        invites: HashSet<PlayerId>,
        join_requests: HashSet<PlayerId>,
        flags: (bool, bool),
        description: String,
        creation_time: DateTime<Utc>,
    ) -> Self {
        let (mob_spawning_allowed, open_join) = flags;
        Self {
            id,
            name,
            kind,
            mob_spawning_allowed,
            open_join,
            description,
            creation_time,
            owner,
            members,
            invites,
            join_requests,
        }
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn role_of(&self, player: PlayerId) -> Option<Role> {
        self.members.get(&player).copied()
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.members.contains_key(&player)
    }

    pub fn members(&self) -> impl Iterator<Item = (PlayerId, Role)> + '_ {
        self.members.iter().map(|(id, role)| (*id, *role))
    }

    pub fn member_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.keys().copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Members holding exactly `role`, sorted for stable display.
    pub fn members_with_role(&self, role: Role) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .members
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn is_invited(&self, player: PlayerId) -> bool {
        self.invites.contains(&player)
    }

    pub fn invites(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.invites.iter().copied()
    }

    pub fn has_join_request(&self, player: PlayerId) -> bool {
        self.join_requests.contains(&player)
    }

    pub fn join_requests(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.join_requests.iter().copied()
    }

    pub(crate) fn insert_member(&mut self, player: PlayerId, role: Role) {
        self.invites.remove(&player);
        self.join_requests.remove(&player);
        self.members.insert(player, role);
    }

    pub(crate) fn remove_member(&mut self, player: PlayerId) -> Option<Role> {
        self.members.remove(&player)
    }

    pub(crate) fn set_role(&mut self, player: PlayerId, role: Role) {
        if let Some(slot) = self.members.get_mut(&player) {
            *slot = role;
        }
    }

    /// Swaps OWNER: the current owner becomes ADMIN, `new_owner` becomes OWNER.
    pub(crate) fn swap_owner(&mut self, new_owner: PlayerId) {
        if let Some(previous) = self.owner {
            self.members.insert(previous, Role::Admin);
        }
        self.members.insert(new_owner, Role::Owner);
        self.owner = Some(new_owner);
    }

    pub(crate) fn add_invite(&mut self, player: PlayerId) -> bool {
        self.invites.insert(player)
    }

    pub(crate) fn remove_invite(&mut self, player: PlayerId) -> bool {
        self.invites.remove(&player)
    }

    pub(crate) fn add_join_request(&mut self, player: PlayerId) -> bool {
        self.join_requests.insert(player)
    }

    pub(crate) fn remove_join_request(&mut self, player: PlayerId) -> bool {
        self.join_requests.remove(&player)
    }

    /// Drops all membership state, returning the former members.
    pub(crate) fn clear_membership(&mut self) -> Vec<PlayerId> {
        self.owner = None;
        self.invites.clear();
        self.join_requests.clear();
        self.members.drain().map(|(id, _)| id).collect()
    }
}

/// Checks a territory name against the alphanumeric naming rule.
pub fn validate_name(name: &str, min_len: usize, max_len: usize) -> Result<(), String> {
    let len = name.chars().count();
    if len < min_len {
        return Err(format!("must be at least {min_len} characters"));
    }
    if len > max_len {
        return Err(format!("must be at most {max_len} characters"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("must contain only letters and digits".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Owner > Role::Admin);
        assert!(Role::Admin > Role::Moderator);
        assert!(Role::Moderator > Role::User);
    }

    #[test]
    fn test_role_capabilities() {
        for role in [Role::Owner, Role::Admin, Role::Moderator] {
            assert!(role.can_build(), "{role} should build");
            assert!(role.can_access(), "{role} should access");
        }
        assert!(!Role::User.can_build());
        assert!(!Role::User.can_access());
    }

    #[test]
    fn test_member_owned_starts_with_owner() {
        let owner = PlayerId::new();
        let guild = Territory::member_owned(TerritoryId::new(), "Ravens".into(), owner, Utc::now());

        assert_eq!(guild.owner(), Some(owner));
        assert_eq!(guild.role_of(owner), Some(Role::Owner));
        assert_eq!(guild.member_count(), 1);
        assert!(!guild.mob_spawning_allowed);
        assert!(!guild.open_join);
    }

    #[test]
    fn test_pseudo_zones_have_fixed_ids_and_no_members() {
        let safe = Territory::pseudo_zone(TerritoryKind::Safe, Utc::now()).unwrap();
        let war = Territory::pseudo_zone(TerritoryKind::War, Utc::now()).unwrap();

        assert_eq!(safe.id, TerritoryId::SAFE_ZONE);
        assert_eq!(war.id, TerritoryId::WAR_ZONE);
        assert_eq!(safe.owner(), None);
        assert_eq!(safe.member_count(), 0);
        assert!(Territory::pseudo_zone(TerritoryKind::MemberOwned, Utc::now()).is_none());
    }

    #[test]
    fn test_swap_owner_demotes_previous_owner() {
        let owner = PlayerId::new();
        let heir = PlayerId::new();
        let mut guild = Territory::member_owned(TerritoryId::new(), "Ravens".into(), owner, Utc::now());
        guild.insert_member(heir, Role::Moderator);

        guild.swap_owner(heir);

        assert_eq!(guild.owner(), Some(heir));
        assert_eq!(guild.role_of(heir), Some(Role::Owner));
        assert_eq!(guild.role_of(owner), Some(Role::Admin));
        assert_eq!(guild.members_with_role(Role::Owner), vec![heir]);
    }

    #[test]
    fn test_insert_member_clears_pending_invite_and_request() {
        let owner = PlayerId::new();
        let recruit = PlayerId::new();
        let mut guild = Territory::member_owned(TerritoryId::new(), "Ravens".into(), owner, Utc::now());
        guild.add_invite(recruit);
        guild.add_join_request(recruit);

        guild.insert_member(recruit, Role::User);

        assert!(!guild.is_invited(recruit));
        assert!(!guild.has_join_request(recruit));
        assert_eq!(guild.role_of(recruit), Some(Role::User));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ravens42", 3, 16).is_ok());
        assert!(validate_name("ab", 3, 16).is_err());
        assert!(validate_name("has space", 3, 16).is_err());
        assert!(validate_name("under_score", 3, 16).is_err());
        assert!(validate_name("abcdefghijklmnopq", 3, 16).is_err());
    }
}
