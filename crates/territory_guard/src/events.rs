//! # Intercepted World Events
//!
//! One struct per mutation category the host runtime reports before applying
//! it. Every event carries a `cancelled` flag: adapters set it when the
//! decision engine denies the mutation, and the host honours it.
//!
//! ## Categories
//!
//! - **Blocks**: [`BlockBreakEvent`], [`BlockPlaceEvent`], [`BucketUseEvent`]
//! - **Fire**: [`IgniteEvent`], [`BlockBurnEvent`]
//! - **Liquids**: [`LiquidFlowEvent`]
//! - **Explosions**: [`ExplosionEvent`]
//! - **Creatures**: [`CreatureSpawnEvent`], [`CreatureTargetEvent`], [`CreatureMoveEvent`]
//! - **Damage**: [`PlayerDamageEvent`]
//! - **Fixtures**: [`InteractEvent`], [`EntityInteractEvent`]
//!
//! Events are plain serde structs so hosts that speak JSON can feed them in
//! directly.

use serde::{Deserialize, Serialize};
use territory_core::{BlockPos, PlayerId, Requester};

/// Player performing an action, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventActor {
    pub player: PlayerId,
    #[serde(default)]
    pub operator: bool,
}

impl EventActor {
    pub const fn player(player: PlayerId) -> Self {
        Self { player, operator: false }
    }

    pub const fn operator(player: PlayerId) -> Self {
        Self { player, operator: true }
    }
}

impl From<EventActor> for Requester {
    fn from(actor: EventActor) -> Self {
        Requester {
            id: actor.player,
            operator: actor.operator,
        }
    }
}

/// What kind of block an event touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockClass {
    /// Ordinary terrain and building blocks.
    Terrain,
    Door,
    /// Chests, barrels, furnaces and similar containers.
    Storage,
    /// Levers, buttons, pressure plates and other circuit parts.
    Mechanism,
}

impl BlockClass {
    /// Protected fixtures are subject to the lock overlay.
    pub const fn is_protected_fixture(self) -> bool {
        !matches!(self, Self::Terrain)
    }
}

/// Entities that behave like fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    /// Storage carts and other containers that move.
    MobileStorage,
    /// Item frames, paintings and other hanging displays.
    HangingDisplay,
    /// Armour stands and other decorative entities fixed in place.
    DecorativeFixed,
}

impl EntityClass {
    /// Whether the entity sits on a fixed block and can therefore be locked.
    pub const fn is_lockable(self) -> bool {
        !matches!(self, Self::MobileStorage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBreakEvent {
    pub actor: EventActor,
    pub block: BlockPos,
    pub class: BlockClass,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPlaceEvent {
    pub actor: EventActor,
    pub block: BlockPos,
    #[serde(default)]
    pub cancelled: bool,
}

/// Filling or emptying a bucket at `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketUseEvent {
    pub actor: EventActor,
    pub target: BlockPos,
    #[serde(default)]
    pub cancelled: bool,
}

/// Why a block caught fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IgniteCause {
    /// Flint, fire charges and other ignition tools.
    Player { actor: EventActor },
    /// Fire spreading from a burning block.
    Spread { from: BlockPos },
    /// Lava setting a neighbour alight.
    Lava { from: BlockPos },
    Lightning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgniteEvent {
    pub cause: IgniteCause,
    pub block: BlockPos,
    #[serde(default)]
    pub cancelled: bool,
}

/// A block about to be destroyed by fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBurnEvent {
    pub block: BlockPos,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidFlowEvent {
    pub from: BlockPos,
    pub to: BlockPos,
    #[serde(default)]
    pub cancelled: bool,
}

/// An explosion with the blocks it is about to destroy.
///
/// Adapters may shrink `blocks` instead of cancelling the whole event; entity
/// damage is governed by `cancelled` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionEvent {
    pub origin: BlockPos,
    pub blocks: Vec<BlockPos>,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSpawnEvent {
    pub location: BlockPos,
    pub hostile: bool,
    #[serde(default)]
    pub cancelled: bool,
}

/// A creature picking a player as its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureTargetEvent {
    pub target: PlayerId,
    pub target_location: BlockPos,
    pub hostile: bool,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureMoveEvent {
    pub from: BlockPos,
    pub to: BlockPos,
    pub hostile: bool,
    #[serde(default)]
    pub cancelled: bool,
}

/// Where incoming damage comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DamageSource {
    /// Melee or projectile damage by another player standing at `location`.
    Player { actor: EventActor, location: BlockPos },
    Creature { hostile: bool },
    /// Falling, drowning, fire and everything else without an attacker.
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDamageEvent {
    pub victim: PlayerId,
    pub victim_location: BlockPos,
    pub source: DamageSource,
    #[serde(default)]
    pub cancelled: bool,
}

/// Right-click use of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractEvent {
    pub actor: EventActor,
    pub block: BlockPos,
    pub class: BlockClass,
    #[serde(default)]
    pub cancelled: bool,
}

/// Use of, or damage to, a fixture-like entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInteractEvent {
    pub actor: EventActor,
    pub location: BlockPos,
    pub class: EntityClass,
    #[serde(default)]
    pub cancelled: bool,
}
