//! Role resolver: maps `(territory, player)` to an effective role.
//!
//! Resolution order:
//! 1. Server operators resolve to [`EffectiveRole::Operator`] regardless of
//!    membership. This bypass is absolute and applies before any other check.
//! 2. Non-members resolve to [`EffectiveRole::Outsider`] with no capabilities.
//! 3. Members resolve to their stored [`Role`].

use crate::territory::{Role, Territory};
use crate::types::PlayerId;
use serde::{Deserialize, Serialize};

/// Capability flags derived from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_build: bool,
    pub can_access: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities { can_build: false, can_access: false };
    pub const ALL: Capabilities = Capabilities { can_build: true, can_access: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveRole {
    /// Implicit role of a server operator; holds every capability.
    Operator,
    /// A member of the territory with their stored rank.
    Member(Role),
    /// Sentinel for anyone who is not a member.
    Outsider,
}

impl EffectiveRole {
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Operator => Capabilities::ALL,
            Self::Member(role) => Capabilities {
                can_build: role.can_build(),
                can_access: role.can_access(),
            },
            Self::Outsider => Capabilities::NONE,
        }
    }

    /// Whether the player actually belongs to the territory.
    ///
    /// Operators are not members; they bypass membership checks instead.
    pub const fn is_member(self) -> bool {
        matches!(self, Self::Member(_))
    }

    /// Stored rank, if the player is a member.
    pub const fn rank(self) -> Option<Role> {
        match self {
            Self::Member(role) => Some(role),
            _ => None,
        }
    }

    /// Whether this role meets `required`. Operators always do.
    pub fn at_least(self, required: Role) -> bool {
        match self {
            Self::Operator => true,
            Self::Member(role) => role >= required,
            Self::Outsider => false,
        }
    }
}

pub fn resolve(territory: &Territory, player: PlayerId, is_operator: bool) -> EffectiveRole {
    if is_operator {
        return EffectiveRole::Operator;
    }
    match territory.role_of(player) {
        Some(role) => EffectiveRole::Member(role),
        None => EffectiveRole::Outsider,
    }
}
