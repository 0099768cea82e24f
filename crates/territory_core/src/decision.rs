//! # Decision Engine
//!
//! The single source of policy truth. Every world mutation and every management
//! command is reduced to an actor, a location (or territory) and an action, and
//! answered here with a [`Decision`].
//!
//! ## Procedure
//!
//! 1. Operators are allowed immediately (absolute bypass, still logged).
//! 2. The owning territory is looked up through the claim registry; unclaimed
//!    land is allowed.
//! 3. The actor's effective role is resolved.
//! 4. The zone policy row for the territory type supplies the rule for the
//!    action's category, which is evaluated against role capabilities and
//!    same-territory checks.
//!
//! The engine is branch-only: no I/O, no allocation, no interior mutability.
//! All state it reads is passed in explicitly.

use crate::manager::TerritoryManager;
use crate::policy::{ActionCategory, ActionKind, Command, ExplosionRule, Rule, ZonePolicyTable};
use crate::roles::{resolve, EffectiveRole};
use crate::territory::{Role, Territory, TerritoryKind};
use crate::types::{BlockPos, PlayerId};
use tracing::debug;

/// A player issuing an action, with their operator status as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: PlayerId,
    pub operator: bool,
}

impl Requester {
    pub const fn player(id: PlayerId) -> Self {
        Self { id, operator: false }
    }

    pub const fn operator(id: PlayerId) -> Self {
        Self { id, operator: true }
    }
}

/// Who is behind a world mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Player(Requester),
    /// Natural processes: liquids, fire, explosions, creatures.
    Environment,
}

impl Actor {
    pub const fn player_id(&self) -> Option<PlayerId> {
        match self {
            Self::Player(requester) => Some(requester.id),
            Self::Environment => None,
        }
    }

    pub const fn is_operator(&self) -> bool {
        matches!(self, Self::Player(Requester { operator: true, .. }))
    }
}

impl From<Requester> for Actor {
    fn from(requester: Requester) -> Self {
        Self::Player(requester)
    }
}

/// The `(actor, location, action)` tuple every enforcement adapter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub actor: Actor,
    pub location: BlockPos,
    pub action: ActionKind,
}

impl Intent {
    pub const fn new(actor: Actor, location: BlockPos, action: ActionKind) -> Self {
        Self { actor, location, action }
    }
}

/// Why an action was refused. The tag selects the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    SafeZone,
    WarZone,
    Wilderness,
    /// The actor is not a member of the owning territory.
    OwnedOutsider,
    /// The actor is a member but lacks the build capability.
    OwnedNeedsModerator,
    /// Member-owned land closed to natural processes.
    Protected,
    /// Source and destination belong to different territories.
    CrossBoundary,
    /// Hostile creatures are not allowed here.
    HostileMob,
    /// A lock on this fixture belongs to another player.
    Locked,
    /// The command needs a higher rank.
    InsufficientRank { required: Role },
    /// Only server operators may do this.
    OperatorOnly,
}

impl DenyReason {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::SafeZone => "SAFE_ZONE",
            Self::WarZone => "WAR_ZONE",
            Self::Wilderness => "WILDERNESS",
            Self::OwnedOutsider => "OWNED_OUTSIDER",
            Self::OwnedNeedsModerator => "OWNED_NEEDS_MODERATOR",
            Self::Protected => "OWNED_PROTECTED",
            Self::CrossBoundary => "CROSS_BOUNDARY",
            Self::HostileMob => "HOSTILE_MOB",
            Self::Locked => "LOCKED",
            Self::InsufficientRank { .. } => "INSUFFICIENT_RANK",
            Self::OperatorOnly => "OPERATOR_ONLY",
        }
    }

    /// Reason used when a zone's rule is a flat deny.
    const fn for_zone(kind: TerritoryKind) -> Self {
        match kind {
            TerritoryKind::Safe => Self::SafeZone,
            TerritoryKind::War => Self::WarZone,
            TerritoryKind::Wild => Self::Wilderness,
            TerritoryKind::MemberOwned => Self::Protected,
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    pub const fn is_denied(self) -> bool {
        !self.is_allowed()
    }

    pub const fn reason(self) -> Option<DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }
}

/// Outcome of filtering an explosion's block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlastVerdict {
    /// The whole event must be cancelled, entity effects included.
    pub cancelled: bool,
    /// Number of blocks removed from the blast list.
    pub blocks_removed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    policy: ZonePolicyTable,
}

impl DecisionEngine {
    pub fn new(policy: ZonePolicyTable) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ZonePolicyTable {
        &self.policy
    }

    pub fn decide_intent(&self, territories: &TerritoryManager, intent: &Intent) -> Decision {
        self.decide(territories, &intent.actor, intent.location, intent.action)
    }

    pub fn decide(
        &self,
        territories: &TerritoryManager,
        actor: &Actor,
        location: BlockPos,
        action: ActionKind,
    ) -> Decision {
        if let Actor::Player(requester) = actor {
            if requester.operator {
                debug!("🛡️ Operator bypass: {} {:?} at {}", requester.id, action, location);
                return Decision::Allow;
            }
        }

        let Some(territory) = territories.territory_at(&location.chunk()) else {
            return Decision::Allow;
        };
        let row = self.policy.row(territory.kind);

        let decision = match action.category() {
            ActionCategory::Explosion => {
                let same = action
                    .source()
                    .is_some_and(|origin| territories.owner_of(&origin.chunk()) == Some(territory.id));
                if row.explosion.block_may_break(same) {
                    Decision::Allow
                } else if row.explosion == ExplosionRule::PerBlock {
                    Decision::Deny(DenyReason::CrossBoundary)
                } else {
                    Decision::Deny(DenyReason::for_zone(territory.kind))
                }
            }
            category => self.evaluate(row.rule(category), territories, territory, actor, action, location),
        };

        if let Decision::Deny(reason) = decision {
            debug!("🚫 {:?} at {} in '{}' denied: {}", action, location, territory.name, reason);
        }
        decision
    }

    fn evaluate(
        &self,
        rule: Rule,
        territories: &TerritoryManager,
        territory: &Territory,
        actor: &Actor,
        action: ActionKind,
        location: BlockPos,
    ) -> Decision {
        match rule {
            Rule::Allow => Decision::Allow,
            Rule::Deny => Decision::Deny(DenyReason::for_zone(territory.kind)),
            Rule::RequireBuild => match self.role_of(territory, actor) {
                None => Decision::Deny(DenyReason::Protected),
                Some(EffectiveRole::Outsider) => Decision::Deny(DenyReason::OwnedOutsider),
                Some(role) if role.capabilities().can_build => Decision::Allow,
                Some(_) => Decision::Deny(DenyReason::OwnedNeedsModerator),
            },
            Rule::RequireMembership => match self.role_of(territory, actor) {
                None => Decision::Deny(DenyReason::Protected),
                Some(role) if role.is_member() => Decision::Allow,
                Some(_) => Decision::Deny(DenyReason::OwnedOutsider),
            },
            Rule::SameTerritory => {
                let source = action.source().unwrap_or(location);
                if territories.owner_of(&source.chunk()) == Some(territory.id) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::CrossBoundary)
                }
            }
            Rule::DenyHostile => {
                if action.is_hostile_creature() && !territory.mob_spawning_allowed {
                    Decision::Deny(DenyReason::HostileMob)
                } else {
                    Decision::Allow
                }
            }
        }
    }

    /// Effective role of a player actor; `None` for the environment.
    fn role_of(&self, territory: &Territory, actor: &Actor) -> Option<EffectiveRole> {
        match actor {
            Actor::Player(requester) => Some(resolve(territory, requester.id, requester.operator)),
            Actor::Environment => None,
        }
    }

    /// Filters an explosion's block list in place.
    ///
    /// The zone the blast starts in decides first: SAFE-style rows cancel the
    /// whole event, WAR-style rows keep entity effects but clear every block.
    /// Otherwise each block is checked against the rules of the chunk it lies
    /// in, so a blast can never reach from one territory into another.
    pub fn filter_explosion(
        &self,
        territories: &TerritoryManager,
        origin: BlockPos,
        blocks: &mut Vec<BlockPos>,
    ) -> BlastVerdict {
        let before = blocks.len();
        let origin_rule = territories
            .territory_at(&origin.chunk())
            .map(|t| self.policy.row(t.kind).explosion);

        match origin_rule {
            Some(ExplosionRule::Cancel) => {
                blocks.clear();
                return BlastVerdict { cancelled: true, blocks_removed: before };
            }
            Some(ExplosionRule::SuppressBlocks) => {
                blocks.clear();
                return BlastVerdict { cancelled: false, blocks_removed: before };
            }
            _ => {}
        }

        let action = ActionKind::ExplosionBlock { origin };
        blocks.retain(|block| {
            self.decide(territories, &Actor::Environment, *block, action)
                .is_allowed()
        });

        BlastVerdict {
            cancelled: false,
            blocks_removed: before - blocks.len(),
        }
    }

    /// Authorizes a management command against `territory`.
    ///
    /// Uses the same role resolver and operator bypass as [`decide`](Self::decide).
    /// Commands on server pseudo-zones are reserved for operators.
    pub fn authorize(&self, territory: &Territory, requester: &Requester, command: Command) -> Decision {
        if requester.operator {
            debug!("🛡️ Operator bypass: {} runs {:?} on '{}'", requester.id, command, territory.name);
            return Decision::Allow;
        }
        let Some(required) = command.required_role() else {
            return Decision::Deny(DenyReason::OperatorOnly);
        };
        if territory.kind.is_pseudo_zone() {
            return Decision::Deny(DenyReason::OperatorOnly);
        }

        match resolve(territory, requester.id, false) {
            EffectiveRole::Outsider => Decision::Deny(DenyReason::OwnedOutsider),
            role if role.at_least(required) => Decision::Allow,
            _ => Decision::Deny(DenyReason::InsufficientRank { required }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerritoryConfig;
    use crate::types::{ChunkKey, TerritoryId, WorldId};
    use chrono::Utc;

    const WORLD: WorldId = WorldId(0);

    /// A block in the middle of chunk `(cx, cz)`.
    fn block_in(cx: i32, cz: i32) -> BlockPos {
        BlockPos::new(WORLD, cx * 16 + 8, 64, cz * 16 + 8)
    }

    fn chunk(cx: i32, cz: i32) -> ChunkKey {
        ChunkKey::new(WORLD, cx, cz)
    }

    struct Fixture {
        manager: TerritoryManager,
        engine: DecisionEngine,
        guild: TerritoryId,
        owner: PlayerId,
        admin: PlayerId,
        moderator: PlayerId,
        user: PlayerId,
    }

    /// Guild claims chunk (0,0) and (1,0); SAFE claims (5,0); WAR claims (6,0); WILD claims (7,0).
    fn fixture() -> Fixture {
        let mut manager = TerritoryManager::new(TerritoryConfig::default());
        let owner = PlayerId::new();
        let admin = PlayerId::new();
        let moderator = PlayerId::new();
        let user = PlayerId::new();
        let guild = manager.create("Ravens", owner, Utc::now()).unwrap();
        manager.add_member(guild, admin, Role::Admin).unwrap();
        manager.add_member(guild, moderator, Role::Moderator).unwrap();
        manager.add_member(guild, user, Role::User).unwrap();
        manager.claim(chunk(0, 0), guild).unwrap();
        manager.claim(chunk(1, 0), guild).unwrap();
        manager.claim(chunk(5, 0), TerritoryId::SAFE_ZONE).unwrap();
        manager.claim(chunk(6, 0), TerritoryId::WAR_ZONE).unwrap();
        manager.claim(chunk(7, 0), TerritoryId::WILDERNESS).unwrap();
        Fixture {
            manager,
            engine: DecisionEngine::default(),
            guild,
            owner,
            admin,
            moderator,
            user,
        }
    }

    fn player(id: PlayerId) -> Actor {
        Actor::Player(Requester::player(id))
    }

    #[test]
    fn test_safe_zone_denies_edits_to_non_operators() {
        let f = fixture();
        let stranger = PlayerId::new();

        for action in [ActionKind::BlockBreak, ActionKind::BlockPlace, ActionKind::BucketUse, ActionKind::Ignite] {
            let decision = f.engine.decide(&f.manager, &player(stranger), block_in(5, 0), action);
            assert_eq!(decision, Decision::Deny(DenyReason::SafeZone), "{action:?}");

            let decision = f.engine.decide(&f.manager, &player(f.owner), block_in(5, 0), action);
            assert_eq!(decision, Decision::Deny(DenyReason::SafeZone), "guild owner {action:?}");
        }
    }

    #[test]
    fn test_operator_is_always_allowed() {
        let f = fixture();
        let op = Actor::Player(Requester::operator(PlayerId::new()));

        for location in [block_in(5, 0), block_in(6, 0), block_in(0, 0)] {
            assert!(f.engine.decide(&f.manager, &op, location, ActionKind::BlockBreak).is_allowed());
            assert!(f.engine.decide(&f.manager, &op, location, ActionKind::Interact).is_allowed());
        }
    }

    #[test]
    fn test_unclaimed_land_is_unrestricted() {
        let f = fixture();
        let decision = f.engine.decide(&f.manager, &player(PlayerId::new()), block_in(-20, 40), ActionKind::BlockPlace);
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_war_zone_denies_edits_but_allows_damage() {
        let f = fixture();
        let p = player(PlayerId::new());

        assert_eq!(
            f.engine.decide(&f.manager, &p, block_in(6, 0), ActionKind::BlockPlace),
            Decision::Deny(DenyReason::WarZone)
        );
        assert_eq!(
            f.engine.decide(&f.manager, &p, block_in(6, 0), ActionKind::BucketUse),
            Decision::Deny(DenyReason::WarZone)
        );
        assert!(f.engine.decide(&f.manager, &p, block_in(6, 0), ActionKind::PlayerDamage).is_allowed());
        assert!(f.engine
            .decide(&f.manager, &Actor::Environment, block_in(6, 0), ActionKind::MobSpawn { hostile: true })
            .is_allowed());
    }

    #[test]
    fn test_member_owned_build_requires_rank() {
        let f = fixture();
        let at = block_in(0, 0);

        assert_eq!(
            f.engine.decide(&f.manager, &player(f.user), at, ActionKind::BlockPlace),
            Decision::Deny(DenyReason::OwnedNeedsModerator)
        );
        for id in [f.moderator, f.admin, f.owner] {
            assert!(f.engine.decide(&f.manager, &player(id), at, ActionKind::BlockPlace).is_allowed());
        }
    }

    #[test]
    fn test_moderator_of_other_territory_is_denied() {
        let mut f = fixture();
        let foreign_owner = PlayerId::new();
        let foreign_mod = PlayerId::new();
        let other = f.manager.create("Wolves", foreign_owner, Utc::now()).unwrap();
        f.manager.add_member(other, foreign_mod, Role::Moderator).unwrap();

        let decision = f.engine.decide(&f.manager, &player(foreign_mod), block_in(0, 0), ActionKind::BlockPlace);

        assert_eq!(decision, Decision::Deny(DenyReason::OwnedOutsider));
    }

    #[test]
    fn test_interact_needs_presence_not_rank() {
        let f = fixture();
        let at = block_in(1, 0);

        assert!(f.engine.decide(&f.manager, &player(f.user), at, ActionKind::Interact).is_allowed());
        assert_eq!(
            f.engine.decide(&f.manager, &player(PlayerId::new()), at, ActionKind::Interact),
            Decision::Deny(DenyReason::OwnedOutsider)
        );
    }

    #[test]
    fn test_liquid_flow_from_unclaimed_into_owned_is_denied() {
        let f = fixture();
        let from = block_in(-1, 0);

        let decision = f.engine.decide(&f.manager, &Actor::Environment, block_in(0, 0), ActionKind::LiquidFlow { from });

        assert_eq!(decision, Decision::Deny(DenyReason::CrossBoundary));
    }

    #[test]
    fn test_liquid_flow_inside_same_territory_is_allowed() {
        let f = fixture();
        let from = block_in(0, 0);

        let decision = f.engine.decide(&f.manager, &Actor::Environment, block_in(1, 0), ActionKind::LiquidFlow { from });

        assert!(decision.is_allowed());
    }

    #[test]
    fn test_liquid_flow_into_safe_from_other_territory_is_denied() {
        let f = fixture();
        let decision = f.engine.decide(
            &f.manager,
            &Actor::Environment,
            block_in(5, 0),
            ActionKind::LiquidFlow { from: block_in(7, 0) },
        );
        assert_eq!(decision, Decision::Deny(DenyReason::CrossBoundary));
    }

    #[test]
    fn test_mob_spawning_in_member_owned_denies_only_hostiles() {
        let mut f = fixture();
        let at = block_in(0, 0);

        assert_eq!(
            f.engine.decide(&f.manager, &Actor::Environment, at, ActionKind::MobSpawn { hostile: true }),
            Decision::Deny(DenyReason::HostileMob)
        );
        assert!(f.engine
            .decide(&f.manager, &Actor::Environment, at, ActionKind::MobSpawn { hostile: false })
            .is_allowed());

        f.manager.set_mob_spawning(f.guild, true).unwrap();
        assert!(f.engine
            .decide(&f.manager, &Actor::Environment, at, ActionKind::MobSpawn { hostile: true })
            .is_allowed());
    }

    #[test]
    fn test_safe_zone_blocks_all_spawns_and_player_damage() {
        let f = fixture();
        let at = block_in(5, 0);

        for hostile in [true, false] {
            assert_eq!(
                f.engine.decide(&f.manager, &Actor::Environment, at, ActionKind::MobSpawn { hostile }),
                Decision::Deny(DenyReason::SafeZone)
            );
        }
        assert_eq!(
            f.engine.decide(&f.manager, &Actor::Environment, at, ActionKind::PlayerDamage),
            Decision::Deny(DenyReason::SafeZone)
        );
        assert_eq!(
            f.engine.decide(&f.manager, &Actor::Environment, at, ActionKind::CreatureTarget { hostile: true }),
            Decision::Deny(DenyReason::HostileMob)
        );
    }

    #[test]
    fn test_explosion_in_safe_zone_is_cancelled() {
        let f = fixture();
        let mut blocks = vec![block_in(5, 0), block_in(5, 0).offset(1, 0, 0)];

        let verdict = f.engine.filter_explosion(&f.manager, block_in(5, 0), &mut blocks);

        assert!(verdict.cancelled);
        assert!(blocks.is_empty());
        assert_eq!(verdict.blocks_removed, 2);
    }

    #[test]
    fn test_explosion_in_war_zone_keeps_entity_effects() {
        let f = fixture();
        let mut blocks = vec![block_in(6, 0), block_in(7, 0)];

        let verdict = f.engine.filter_explosion(&f.manager, block_in(6, 0), &mut blocks);

        assert!(!verdict.cancelled);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_explosion_from_wild_cannot_reach_into_guild() {
        let f = fixture();
        let wild = block_in(-1, 0);
        let guild = block_in(0, 0);
        let mut blocks = vec![wild, guild, block_in(5, 0)];

        let verdict = f.engine.filter_explosion(&f.manager, wild, &mut blocks);

        assert!(!verdict.cancelled);
        assert_eq!(blocks, vec![wild]);
        assert_eq!(verdict.blocks_removed, 2);
    }

    #[test]
    fn test_explosion_inside_guild_damages_own_blocks() {
        let f = fixture();
        let origin = block_in(0, 0);
        let mut blocks = vec![origin, block_in(1, 0), block_in(-1, 0)];

        f.engine.filter_explosion(&f.manager, origin, &mut blocks);

        assert_eq!(blocks, vec![origin, block_in(1, 0), block_in(-1, 0)]);
    }

    #[test]
    fn test_burn_denied_in_member_owned_allowed_in_wild() {
        let f = fixture();
        assert_eq!(
            f.engine.decide(&f.manager, &Actor::Environment, block_in(0, 0), ActionKind::Burn),
            Decision::Deny(DenyReason::Protected)
        );
        assert!(f.engine
            .decide(&f.manager, &Actor::Environment, block_in(7, 0), ActionKind::Burn)
            .is_allowed());
    }

    #[test]
    fn test_authorize_commands_by_rank() {
        let f = fixture();
        let guild = f.manager.territory(f.guild).unwrap();

        assert!(f.engine.authorize(guild, &Requester::player(f.admin), Command::Claim).is_allowed());
        assert_eq!(
            f.engine.authorize(guild, &Requester::player(f.moderator), Command::Claim),
            Decision::Deny(DenyReason::InsufficientRank { required: Role::Admin })
        );
        assert!(f.engine.authorize(guild, &Requester::player(f.moderator), Command::Invite).is_allowed());
        assert_eq!(
            f.engine.authorize(guild, &Requester::player(f.admin), Command::Transfer),
            Decision::Deny(DenyReason::InsufficientRank { required: Role::Owner })
        );
        assert_eq!(
            f.engine.authorize(guild, &Requester::player(PlayerId::new()), Command::Invite),
            Decision::Deny(DenyReason::OwnedOutsider)
        );
        assert_eq!(
            f.engine.authorize(guild, &Requester::player(f.owner), Command::SetClaimLimit),
            Decision::Deny(DenyReason::OperatorOnly)
        );
    }

    #[test]
    fn test_pseudo_zone_commands_need_operator() {
        let f = fixture();
        let safe = f.manager.territory(TerritoryId::SAFE_ZONE).unwrap();

        assert_eq!(
            f.engine.authorize(safe, &Requester::player(f.owner), Command::Claim),
            Decision::Deny(DenyReason::OperatorOnly)
        );
        assert!(f.engine.authorize(safe, &Requester::operator(f.owner), Command::Claim).is_allowed());
    }
}
