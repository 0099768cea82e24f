//! Error types for territory, claim and lock operations.
//!
//! Every fallible operation in this crate returns one of these as an explicit
//! value. Nothing here is allowed to panic across the tick loop.

use crate::decision::DenyReason;
use crate::territory::Role;
use crate::types::{PlayerId, TerritoryId};

/// Errors returned by the claim registry, territory model, lock overlay and
/// the command layer built on top of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerritoryError {
    /// The chunk already belongs to another territory
    #[error("Chunk is already claimed by {owner}")]
    AlreadyClaimed { owner: TerritoryId },

    /// The territory holds as many claims as its limit allows
    #[error("Claim limit of {limit} reached")]
    LimitReached { limit: usize },

    /// The requester does not own the claim or lock being released
    #[error("Not the owner")]
    NotOwner,

    /// Another territory already uses this name
    #[error("Name already taken: {0}")]
    DuplicateName(String),

    /// The name is empty, too long, or not alphanumeric
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The player is not a member of the territory
    #[error("Player {0} is not a member")]
    NotMember(PlayerId),

    /// OWNER can only change hands through an ownership transfer
    #[error("Cannot assign {0:?} through a role change")]
    InvalidRoleAssignment(Role),

    /// The block already carries a lock
    #[error("Block is already locked")]
    AlreadyLocked,

    /// The block carries no lock
    #[error("Block is not locked")]
    NotLocked,

    /// The decision engine refused the action
    #[error("Denied: {reason}")]
    Denied { reason: DenyReason },

    /// No territory with this id exists
    #[error("Unknown territory: {0}")]
    UnknownTerritory(TerritoryId),

    /// The player already belongs to a member-owned territory
    #[error("Player {0} already belongs to a territory")]
    AlreadyInTerritory(PlayerId),

    /// The player has not been invited
    #[error("Player {0} has no pending invite")]
    NotInvited(PlayerId),

    /// The player already holds a pending invite
    #[error("Player {0} is already invited")]
    AlreadyInvited(PlayerId),

    /// The player has no pending join request
    #[error("Player {0} has no pending join request")]
    NoJoinRequest(PlayerId),

    /// Membership and naming operations do not apply to server pseudo-zones
    #[error("Operation not supported on server zones")]
    PseudoZone,

    /// The owner has to hand over ownership before leaving
    #[error("The owner must transfer ownership before leaving")]
    OwnerMustTransfer,

    /// The target holds a rank equal to or above the actor's
    #[error("Cannot act on a member of equal or higher rank")]
    CannotTargetRank,
}

impl TerritoryError {
    /// Shorthand for wrapping a decision-engine denial.
    pub fn denied(reason: DenyReason) -> Self {
        Self::Denied { reason }
    }
}

/// Errors raised while loading or saving snapshots.
///
/// These never cross into the tick loop as panics; the writer logs them and
/// retries on the next scheduled snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
}

pub type TerritoryResult<T> = Result<T, TerritoryError>;
