//! # Enforcement Adapters
//!
//! One module per intercepted event category. Each adapter is a thin
//! translator: it reduces its event to an `(actor, location, action)` intent,
//! lets [`TerritoryGuard`](crate::TerritoryGuard) decide it, and marks the event
//! cancelled on denial. No adapter carries zone logic of its own.
//!
//! ## Adapter Organization
//!
//! - [`blocks`] - block break/place and bucket use, with lock cleanup
//! - [`liquids`] - liquid flow across chunk borders
//! - [`fire`] - ignition, spread and burning
//! - [`explosions`] - blast-level cancellation and per-block filtering
//! - [`creatures`] - spawning, targeting and territory entry
//! - [`damage`] - damage to players, checked at both ends for PvP
//! - [`interact`] - doors, storage, mechanisms and fixture entities, lock first
//!
//! ## Actors
//!
//! Player-caused events carry the player and their operator flag. Natural
//! processes (liquids, fire spread, explosions, creatures) run as
//! `Actor::Environment`, so operator bypass never leaks into them.

pub mod blocks;
pub mod creatures;
pub mod damage;
pub mod explosions;
pub mod fire;
pub mod interact;
pub mod liquids;

#[cfg(test)]
pub(crate) mod fixture {
    use crate::notifier::tests::RecordingSink;
    use crate::TerritoryGuard;
    use chrono::Utc;
    use std::sync::Arc;
    use territory_core::{BlockPos, PlayerId, Requester, Role, TerritoryId, TerritoryService, WorldId};

    /// Guild "Ravens" claims chunks (0,0) and (1,0); SAFE claims (5,0); WAR claims (6,0).
    pub(crate) struct World {
        pub(crate) guard: TerritoryGuard,
        pub(crate) sink: Arc<RecordingSink>,
        pub(crate) guild: TerritoryId,
        pub(crate) owner: PlayerId,
        pub(crate) moderator: PlayerId,
        pub(crate) user: PlayerId,
        pub(crate) op: PlayerId,
    }

    /// A block in the middle of chunk `(cx, cz)`.
    pub(crate) fn block_in(cx: i32, cz: i32) -> BlockPos {
        BlockPos::new(WorldId(0), cx * 16 + 8, 64, cz * 16 + 8)
    }

    pub(crate) fn world() -> World {
        let mut service = TerritoryService::default();
        let owner = PlayerId::new();
        let moderator = PlayerId::new();
        let user = PlayerId::new();
        let op = PlayerId::new();
        let owner_req = Requester::player(owner);
        let op_req = Requester::operator(op);

        let guild = service.create(&owner_req, "Ravens", Utc::now()).unwrap();
        for member in [moderator, user] {
            service.invite(&owner_req, guild, member).unwrap();
            service.accept_invite(&Requester::player(member), guild).unwrap();
        }
        service.set_role(&owner_req, guild, moderator, Role::Moderator).unwrap();
        service.claim_here(&owner_req, block_in(0, 0), None).unwrap();
        service.claim_here(&owner_req, block_in(1, 0), None).unwrap();
        service.claim_here(&op_req, block_in(5, 0), Some(TerritoryId::SAFE_ZONE)).unwrap();
        service.claim_here(&op_req, block_in(6, 0), Some(TerritoryId::WAR_ZONE)).unwrap();

        let sink = Arc::new(RecordingSink::default());
        World {
            guard: TerritoryGuard::new(service, sink.clone()),
            sink,
            guild,
            owner,
            moderator,
            user,
            op,
        }
    }
}
