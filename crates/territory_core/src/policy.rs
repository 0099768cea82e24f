//! # Zone Policy Table
//!
//! Static rules keyed by territory type. Each row says, per action category,
//! what the default verdict is and which checks (capability, membership,
//! same-territory) decide it. Adding a zone type is a new row here, not a
//! change to the decision procedure.
//!
//! | Type         | build/bucket/ignite | burn | liquid in | mob spawn    | aggro        | player damage | interact   | explosion  |
//! |--------------|---------------------|------|-----------|--------------|--------------|---------------|------------|------------|
//! | SAFE         | deny                | deny | same terr.| deny         | deny hostile | deny          | allow      | cancel     |
//! | WAR          | deny                | deny | same terr.| allow        | allow        | allow         | allow      | no blocks  |
//! | WILD         | allow               | allow| allow     | allow        | allow        | allow         | allow      | allow      |
//! | MEMBER_OWNED | canBuild + member   | deny | same terr.| deny hostile | allow        | allow         | member     | per block  |

use crate::territory::{Role, TerritoryKind};
use crate::types::BlockPos;
use serde::{Deserialize, Serialize};

/// A single world mutation, reduced to what the policy needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    BlockBreak,
    BlockPlace,
    BucketUse,
    Ignite,
    /// A block consumed by fire.
    Burn,
    /// Fire spreading from `from` into the target block.
    FireSpread { from: BlockPos },
    /// Liquid flowing from `from` into the target block.
    LiquidFlow { from: BlockPos },
    MobSpawn { hostile: bool },
    /// A creature acquiring a player as its target.
    CreatureTarget { hostile: bool },
    /// A creature moving into the target block's chunk.
    CreatureEnter { hostile: bool },
    /// Damage dealt to a player standing at the target location.
    PlayerDamage,
    /// Doors, storage, mechanisms, mobile storage and other fixtures.
    Interact,
    /// One block in the blast list of an explosion that started at `origin`.
    ExplosionBlock { origin: BlockPos },
}

impl ActionKind {
    pub const fn category(&self) -> ActionCategory {
        match self {
            Self::BlockBreak | Self::BlockPlace => ActionCategory::Build,
            Self::BucketUse => ActionCategory::Bucket,
            Self::Ignite => ActionCategory::Ignite,
            Self::Burn | Self::FireSpread { .. } => ActionCategory::Burn,
            Self::LiquidFlow { .. } => ActionCategory::LiquidFlow,
            Self::MobSpawn { .. } => ActionCategory::MobSpawn,
            Self::CreatureTarget { .. } | Self::CreatureEnter { .. } => ActionCategory::CreatureAggro,
            Self::PlayerDamage => ActionCategory::PlayerDamage,
            Self::Interact => ActionCategory::Interact,
            Self::ExplosionBlock { .. } => ActionCategory::Explosion,
        }
    }

    /// Origin of a cross-boundary action, if any.
    pub const fn source(&self) -> Option<BlockPos> {
        match self {
            Self::FireSpread { from } | Self::LiquidFlow { from } => Some(*from),
            Self::ExplosionBlock { origin } => Some(*origin),
            _ => None,
        }
    }

    pub const fn is_hostile_creature(&self) -> bool {
        match self {
            Self::MobSpawn { hostile }
            | Self::CreatureTarget { hostile }
            | Self::CreatureEnter { hostile } => *hostile,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    Build,
    Bucket,
    Ignite,
    Burn,
    LiquidFlow,
    MobSpawn,
    CreatureAggro,
    PlayerDamage,
    Interact,
    Explosion,
}

/// How one cell of the table is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Allow,
    /// Denied for everyone except operators.
    Deny,
    /// Requires the `can_build` capability and membership of this exact territory.
    RequireBuild,
    /// Requires membership of this territory; rank does not matter.
    RequireMembership,
    /// Source and destination must belong to the same territory.
    SameTerritory,
    /// Denies hostile creatures unless the territory allows mob spawning.
    DenyHostile,
}

/// What happens to an explosion that starts inside a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplosionRule {
    /// Cancel the whole event and clear its block list.
    Cancel,
    /// Keep entity effects, clear the block list.
    SuppressBlocks,
    Allow,
    /// Filter blocks individually by the destination chunk's rules.
    PerBlock,
}

impl ExplosionRule {
    /// Whether a block in a chunk with this rule may be destroyed by a blast
    /// from `same_territory` (true) or from elsewhere (false).
    pub const fn block_may_break(self, same_territory: bool) -> bool {
        match self {
            Self::Cancel | Self::SuppressBlocks => false,
            Self::Allow => true,
            Self::PerBlock => same_territory,
        }
    }
}

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePolicy {
    pub build: Rule,
    pub bucket: Rule,
    pub ignite: Rule,
    pub burn: Rule,
    pub liquid_flow: Rule,
    pub mob_spawn: Rule,
    pub creature_aggro: Rule,
    pub player_damage: Rule,
    pub interact: Rule,
    pub explosion: ExplosionRule,
}

impl ZonePolicy {
    pub const SAFE: ZonePolicy = ZonePolicy {
        build: Rule::Deny,
        bucket: Rule::Deny,
        ignite: Rule::Deny,
        burn: Rule::Deny,
        liquid_flow: Rule::SameTerritory,
        mob_spawn: Rule::Deny,
        creature_aggro: Rule::DenyHostile,
        player_damage: Rule::Deny,
        interact: Rule::Allow,
        explosion: ExplosionRule::Cancel,
    };

    pub const WAR: ZonePolicy = ZonePolicy {
        build: Rule::Deny,
        bucket: Rule::Deny,
        ignite: Rule::Deny,
        burn: Rule::Deny,
        liquid_flow: Rule::SameTerritory,
        mob_spawn: Rule::Allow,
        creature_aggro: Rule::Allow,
        player_damage: Rule::Allow,
        interact: Rule::Allow,
        explosion: ExplosionRule::SuppressBlocks,
    };

    pub const WILD: ZonePolicy = ZonePolicy {
        build: Rule::Allow,
        bucket: Rule::Allow,
        ignite: Rule::Allow,
        burn: Rule::Allow,
        liquid_flow: Rule::Allow,
        mob_spawn: Rule::Allow,
        creature_aggro: Rule::Allow,
        player_damage: Rule::Allow,
        interact: Rule::Allow,
        explosion: ExplosionRule::Allow,
    };

    pub const MEMBER_OWNED: ZonePolicy = ZonePolicy {
        build: Rule::RequireBuild,
        bucket: Rule::RequireBuild,
        ignite: Rule::RequireBuild,
        burn: Rule::Deny,
        liquid_flow: Rule::SameTerritory,
        mob_spawn: Rule::DenyHostile,
        creature_aggro: Rule::Allow,
        player_damage: Rule::Allow,
        interact: Rule::RequireMembership,
        explosion: ExplosionRule::PerBlock,
    };

    /// Rule for a non-explosion category. Explosions map to `SameTerritory`
    /// here; use [`ZonePolicy::explosion`] for the blast-level verdict.
    pub const fn rule(&self, category: ActionCategory) -> Rule {
        match category {
            ActionCategory::Build => self.build,
            ActionCategory::Bucket => self.bucket,
            ActionCategory::Ignite => self.ignite,
            ActionCategory::Burn => self.burn,
            ActionCategory::LiquidFlow => self.liquid_flow,
            ActionCategory::MobSpawn => self.mob_spawn,
            ActionCategory::CreatureAggro => self.creature_aggro,
            ActionCategory::PlayerDamage => self.player_damage,
            ActionCategory::Interact => self.interact,
            ActionCategory::Explosion => Rule::SameTerritory,
        }
    }
}

/// The full table, one row per territory type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePolicyTable {
    pub safe: ZonePolicy,
    pub war: ZonePolicy,
    pub wild: ZonePolicy,
    pub member_owned: ZonePolicy,
}

impl ZonePolicyTable {
    #[inline]
    pub const fn row(&self, kind: TerritoryKind) -> &ZonePolicy {
        match kind {
            TerritoryKind::Safe => &self.safe,
            TerritoryKind::War => &self.war,
            TerritoryKind::Wild => &self.wild,
            TerritoryKind::MemberOwned => &self.member_owned,
        }
    }

    pub fn row_mut(&mut self, kind: TerritoryKind) -> &mut ZonePolicy {
        match kind {
            TerritoryKind::Safe => &mut self.safe,
            TerritoryKind::War => &mut self.war,
            TerritoryKind::Wild => &mut self.wild,
            TerritoryKind::MemberOwned => &mut self.member_owned,
        }
    }
}

impl Default for ZonePolicyTable {
    fn default() -> Self {
        Self {
            safe: ZonePolicy::SAFE,
            war: ZonePolicy::WAR,
            wild: ZonePolicy::WILD,
            member_owned: ZonePolicy::MEMBER_OWNED,
        }
    }
}

/// Management commands, authorized through the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Claim,
    Unclaim,
    Rename,
    Describe,
    SetFlag,
    Invite,
    CancelInvite,
    HandleJoinRequest,
    Kick,
    SetRole,
    Transfer,
    Disband,
    SetClaimLimit,
}

impl Command {
    /// Lowest rank allowed to run the command in a member-owned territory.
    /// `None` means only server operators may run it.
    pub const fn required_role(self) -> Option<Role> {
        match self {
            Self::Claim | Self::Unclaim | Self::Rename | Self::Describe | Self::SetFlag => {
                Some(Role::Admin)
            }
            Self::Invite | Self::CancelInvite | Self::HandleJoinRequest | Self::Kick => {
                Some(Role::Moderator)
            }
            Self::SetRole | Self::Transfer | Self::Disband => Some(Role::Owner),
            Self::SetClaimLimit => None,
        }
    }
}
