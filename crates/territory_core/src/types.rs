//! # Core Type Definitions
//!
//! Identifiers and spatial keys shared by every component of the territory engine.
//!
//! ## Key Types
//!
//! - [`PlayerId`] - Unique identifier for a player
//! - [`TerritoryId`] - Unique identifier for a territory (guild or pseudo-zone)
//! - [`WorldId`] - Dimension index assigned by the host runtime
//! - [`ChunkKey`] - The atomic unit of claiming
//! - [`BlockPos`] - A single block in a world, convertible to its [`ChunkKey`]
//!
//! Wrapper types keep the many ids in this crate from being confused with one
//! another, and every type here is `Copy` so the hot lookup path never allocates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width of a chunk in blocks, along both the X and Z axes.
pub const CHUNK_SIZE: i32 = 16;

const CHUNK_SHIFT: u32 = CHUNK_SIZE.trailing_zeros();

/// Unique identifier for a player.
///
/// # Examples
///
/// ```rust
/// use territory_core::PlayerId;
///
/// let player_id = PlayerId::new();
/// let parsed: PlayerId = player_id.to_string().parse()?;
/// assert_eq!(player_id, parsed);
/// # Ok::<(), uuid::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a territory.
///
/// The three server pseudo-zones use fixed, well-known ids so that claims made
/// for them survive a snapshot round-trip without any name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerritoryId(pub Uuid);

impl TerritoryId {
    /// The server-controlled safe zone.
    pub const SAFE_ZONE: TerritoryId = TerritoryId(Uuid::from_u128(1));
    /// The server-controlled war zone.
    pub const WAR_ZONE: TerritoryId = TerritoryId(Uuid::from_u128(2));
    /// Explicitly claimed wilderness.
    pub const WILDERNESS: TerritoryId = TerritoryId(Uuid::from_u128(3));

    /// Creates a new random territory ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TerritoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TerritoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dimension index assigned by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// A chunk column in a world: the atomic unit of claim.
///
/// Chunk keys are immutable values. Two keys are equal when they name the same
/// chunk column in the same world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    pub world: WorldId,
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub const fn new(world: WorldId, x: i32, z: i32) -> Self {
        Self { world, x, z }
    }
}

impl std::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}, {}]", self.world, self.x, self.z)
    }
}

/// Integer position of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub world: WorldId,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self { world, x, y, z }
    }

    /// Returns the chunk containing this block.
    ///
    /// Uses an arithmetic shift so negative coordinates floor toward negative
    /// infinity (block `-1` lives in chunk `-1`, not chunk `0`).
    pub const fn chunk(&self) -> ChunkKey {
        ChunkKey {
            world: self.world,
            x: self.x >> CHUNK_SHIFT,
            z: self.z >> CHUNK_SHIFT,
        }
    }

    /// Returns the block offset by the given deltas. Coordinates wrap at the
    /// `i32` edge instead of overflowing.
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            world: self.world,
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
            z: self.z.wrapping_add(dz),
        }
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}
