//! # Territory Core
//!
//! Spatial ownership and access control for a persistent multiplayer world.
//!
//! The world is divided into 16×16 chunk columns. Each chunk is claimed by at
//! most one territory, and every world-mutating action is reduced to an
//! `(actor, location, action)` intent that a single [`DecisionEngine`] answers
//! with [`Decision::Allow`] or [`Decision::Deny`].
//!
//! ## Components
//!
//! - **Claim Registry** ([`ClaimRegistry`]): chunk → territory, plus the reverse index
//! - **Territory Model** ([`Territory`], [`TerritoryManager`]): identity, membership, flags
//! - **Role Resolver** ([`roles::resolve`]): `(territory, player)` → effective role
//! - **Zone Policy Table** ([`ZonePolicyTable`]): per zone type rules, as data
//! - **Decision Engine** ([`DecisionEngine`]): the single source of policy truth
//! - **Lock Overlay** ([`LockOverlay`]): per-block ownership, checked before territory rules
//! - **Command layer** ([`TerritoryService`]): management commands, authorized by the engine
//! - **Snapshots** ([`WorldSnapshot`], [`SnapshotStore`]): persistence off the owning thread
//!
//! ## Quick Start
//!
//! ```rust
//! use territory_core::*;
//! use chrono::Utc;
//!
//! let mut service = TerritoryService::default();
//! let owner = Requester::player(PlayerId::new());
//! let guild = service.create(&owner, "Ravens", Utc::now())?;
//!
//! let door = BlockPos::new(WorldId(0), 4, 64, 4);
//! service.claim_here(&owner, door, None)?;
//!
//! let stranger = Actor::Player(Requester::player(PlayerId::new()));
//! let verdict = service.decide(&stranger, door, ActionKind::BlockBreak);
//! assert_eq!(verdict, Decision::Deny(DenyReason::OwnedOutsider));
//! assert_eq!(service.owner_of(door), Some(guild));
//! # Ok::<(), TerritoryError>(())
//! ```
//!
//! Everything in this crate is synchronous and lock-free: the state is owned by
//! exactly one thread, and other threads reach it by scheduling work onto that
//! thread.

pub mod claims;
pub mod config;
pub mod decision;
pub mod error;
pub mod locks;
pub mod manager;
pub mod notify;
pub mod policy;
pub mod roles;
pub mod service;
pub mod snapshot;
pub mod stats;
pub mod territory;
pub mod types;

pub use claims::{ClaimLimit, ClaimRegistry, DEFAULT_CLAIM_LIMIT};
pub use config::{PolicyOverrides, TerritoryConfig};
pub use decision::{Actor, BlastVerdict, Decision, DecisionEngine, DenyReason, Intent, Requester};
pub use error::{PersistenceError, TerritoryError, TerritoryResult};
pub use locks::LockOverlay;
pub use manager::{JoinOutcome, LeaveOutcome, TerritoryInfo, TerritoryManager, TerritorySummary};
pub use notify::{
    MessageSink, NoopObserver, PlayerDirectory, TerritoryEvent, TerritoryFlag, TerritoryObserver,
};
pub use policy::{ActionCategory, ActionKind, Command, ExplosionRule, Rule, ZonePolicy, ZonePolicyTable};
pub use roles::{Capabilities, EffectiveRole};
pub use service::TerritoryService;
pub use snapshot::{JsonFileStore, SnapshotStore, WorldSnapshot, SNAPSHOT_VERSION};
pub use stats::DecisionStats;
pub use territory::{Role, Territory, TerritoryKind};
pub use types::{BlockPos, ChunkKey, PlayerId, TerritoryId, WorldId, CHUNK_SIZE};
