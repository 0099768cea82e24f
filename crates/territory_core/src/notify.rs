//! Collaborator interfaces and territory mutation events.
//!
//! The engine never talks to players directly. Identity lookups go through a
//! [`PlayerDirectory`], outgoing text through a [`MessageSink`], and every
//! successful territory mutation is reported to a [`TerritoryObserver`] along
//! with the players it concerns.

use crate::claims::ClaimLimit;
use crate::territory::Role;
use crate::types::{ChunkKey, PlayerId, TerritoryId};

/// Player identity lookup provided by the host.
pub trait PlayerDirectory: Send + Sync {
    fn is_online(&self, player: PlayerId) -> bool;
    fn display_name(&self, player: PlayerId) -> Option<String>;
}

/// Outgoing player messaging provided by the host.
pub trait MessageSink: Send + Sync {
    /// Sends a single chat line.
    fn send_message(&self, player: PlayerId, message: &str);
    /// Shows a title overlay.
    fn send_title(&self, player: PlayerId, title: &str, subtitle: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerritoryFlag {
    MobSpawning,
    OpenJoin,
}

impl TerritoryFlag {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MobSpawning => "mob spawning",
            Self::OpenJoin => "open join",
        }
    }
}

/// A successful mutation of the territory model or claim registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerritoryEvent {
    Created { territory: TerritoryId, name: String, owner: PlayerId },
    Renamed { territory: TerritoryId, old_name: String, new_name: String },
    DescriptionChanged { territory: TerritoryId },
    Disbanded { territory: TerritoryId, name: String, former_members: Vec<PlayerId> },
    MemberJoined { territory: TerritoryId, player: PlayerId },
    MemberLeft { territory: TerritoryId, player: PlayerId },
    MemberKicked { territory: TerritoryId, player: PlayerId },
    RoleChanged { territory: TerritoryId, player: PlayerId, role: Role },
    OwnershipTransferred { territory: TerritoryId, previous: Option<PlayerId>, owner: PlayerId },
    Invited { territory: TerritoryId, player: PlayerId },
    InviteCancelled { territory: TerritoryId, player: PlayerId },
    InviteDeclined { territory: TerritoryId, player: PlayerId },
    JoinRequested { territory: TerritoryId, player: PlayerId },
    JoinRequestDeclined { territory: TerritoryId, player: PlayerId },
    FlagChanged { territory: TerritoryId, flag: TerritoryFlag, value: bool },
    Claimed { territory: TerritoryId, chunk: ChunkKey },
    Unclaimed { territory: TerritoryId, chunk: ChunkKey },
    ClaimLimitChanged { territory: TerritoryId, limit: ClaimLimit },
}

impl TerritoryEvent {
    pub fn territory(&self) -> TerritoryId {
        match self {
            Self::Created { territory, .. }
            | Self::Renamed { territory, .. }
            | Self::DescriptionChanged { territory }
            | Self::Disbanded { territory, .. }
            | Self::MemberJoined { territory, .. }
            | Self::MemberLeft { territory, .. }
            | Self::MemberKicked { territory, .. }
            | Self::RoleChanged { territory, .. }
            | Self::OwnershipTransferred { territory, .. }
            | Self::Invited { territory, .. }
            | Self::InviteCancelled { territory, .. }
            | Self::InviteDeclined { territory, .. }
            | Self::JoinRequested { territory, .. }
            | Self::JoinRequestDeclined { territory, .. }
            | Self::FlagChanged { territory, .. }
            | Self::Claimed { territory, .. }
            | Self::Unclaimed { territory, .. }
            | Self::ClaimLimitChanged { territory, .. } => *territory,
        }
    }

    /// The player the event is about, when that player may not be a member.
    pub fn subject(&self) -> Option<PlayerId> {
        match self {
            Self::MemberLeft { player, .. }
            | Self::MemberKicked { player, .. }
            | Self::Invited { player, .. }
            | Self::InviteCancelled { player, .. }
            | Self::InviteDeclined { player, .. }
            | Self::JoinRequested { player, .. }
            | Self::JoinRequestDeclined { player, .. } => Some(*player),
            _ => None,
        }
    }
}

/// Receives every successful territory mutation.
///
/// `audience` holds the current members of the territory (former members for
/// a disband) plus the event's subject. Implementations must be cheap: they run
/// on the tick thread.
pub trait TerritoryObserver: Send + Sync {
    fn on_territory_event(&self, event: &TerritoryEvent, territory_name: &str, audience: &[PlayerId]);
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TerritoryObserver for NoopObserver {
    fn on_territory_event(&self, _event: &TerritoryEvent, _territory_name: &str, _audience: &[PlayerId]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let territory = TerritoryId::new();
        let player = PlayerId::new();

        let invited = TerritoryEvent::Invited { territory, player };
        assert_eq!(invited.territory(), territory);
        assert_eq!(invited.subject(), Some(player));

        let joined = TerritoryEvent::MemberJoined { territory, player };
        assert_eq!(joined.subject(), None);
    }
}
