//! Interaction with doors, storage, mechanisms and fixture-like entities.
//!
//! Protected fixtures go to the lock overlay before territory policy. A lock
//! owner keeps access to their fixture inside any territory; anyone else is
//! refused regardless of rank. Plain terrain is never checked here.

use crate::events::{EntityInteractEvent, InteractEvent};
use crate::TerritoryGuard;
use territory_core::{ActionKind, Actor, Decision, Intent};

impl TerritoryGuard {
    pub fn on_interact(&mut self, event: &mut InteractEvent) -> Decision {
        if event.cancelled || !event.class.is_protected_fixture() {
            return Decision::Allow;
        }
        let actor = Actor::Player(event.actor.into());
        let decision = self.service().decide_fixture(&actor, event.block);
        let decision = self.settle(&actor, decision);
        if decision.is_denied() {
            event.cancelled = true;
        }
        decision
    }

    pub fn on_entity_interact(&mut self, event: &mut EntityInteractEvent) -> Decision {
        if event.cancelled {
            return Decision::Allow;
        }
        let actor = Actor::Player(event.actor.into());
        let decision = if event.class.is_lockable() {
            let decision = self.service().decide_fixture(&actor, event.location);
            self.settle(&actor, decision)
        } else {
            self.enforce(Intent::new(actor, event.location, ActionKind::Interact))
        };
        if decision.is_denied() {
            event.cancelled = true;
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use crate::events::{BlockClass, EntityClass, EntityInteractEvent, EventActor, InteractEvent};
    use crate::handlers::fixture::{block_in, world};
    use territory_core::{Decision, DenyReason, PlayerId, Requester};

    fn open(actor: EventActor, cx: i32, class: BlockClass) -> InteractEvent {
        InteractEvent {
            actor,
            block: block_in(cx, 0),
            class,
            cancelled: false,
        }
    }

    #[test]
    fn test_guild_doors_need_membership_only() {
        let mut w = world();
        let mut by_user = open(EventActor::player(w.user), 0, BlockClass::Door);
        let mut by_stranger = open(EventActor::player(PlayerId::new()), 0, BlockClass::Door);

        assert!(w.guard.on_interact(&mut by_user).is_allowed());
        assert_eq!(w.guard.on_interact(&mut by_stranger), Decision::Deny(DenyReason::OwnedOutsider));
        assert!(by_stranger.cancelled);
    }

    #[test]
    fn test_safe_and_war_zone_fixtures_are_usable() {
        let mut w = world();
        let stranger = PlayerId::new();
        for cx in [5, 6] {
            let mut event = open(EventActor::player(stranger), cx, BlockClass::Mechanism);
            assert!(w.guard.on_interact(&mut event).is_allowed());
        }
    }

    #[test]
    fn test_lock_beats_rank() {
        let mut w = world();
        let chest = block_in(1, 0);
        w.guard.service_mut().lock(&Requester::player(w.user), chest).unwrap();

        let mut by_owner = open(EventActor::player(w.owner), 1, BlockClass::Storage);
        let mut by_locker = open(EventActor::player(w.user), 1, BlockClass::Storage);

        assert_eq!(w.guard.on_interact(&mut by_owner), Decision::Deny(DenyReason::Locked));
        assert!(w.guard.on_interact(&mut by_locker).is_allowed());
        assert_eq!(w.sink.messages_for(w.owner), vec!["This is locked by another player."]);
    }

    #[test]
    fn test_terrain_interaction_is_ignored() {
        let mut w = world();
        let mut event = open(EventActor::player(PlayerId::new()), 0, BlockClass::Terrain);

        assert!(w.guard.on_interact(&mut event).is_allowed());
        assert_eq!(w.guard.stats().total(), 0);
    }

    #[test]
    fn test_hanging_display_respects_locks_and_membership() {
        let mut w = world();
        let frame = block_in(0, 0);
        w.guard.service_mut().lock(&Requester::player(w.moderator), frame).unwrap();

        let mut by_user = EntityInteractEvent {
            actor: EventActor::player(w.user),
            location: frame,
            class: EntityClass::HangingDisplay,
            cancelled: false,
        };
        assert_eq!(w.guard.on_entity_interact(&mut by_user), Decision::Deny(DenyReason::Locked));

        let mut cart = EntityInteractEvent {
            class: EntityClass::MobileStorage,
            ..by_user.clone()
        };
        cart.cancelled = false;
        assert!(w.guard.on_entity_interact(&mut cart).is_allowed());
    }

    #[test]
    fn test_mobile_storage_outside_guild_is_denied_to_strangers() {
        let mut w = world();
        let mut cart = EntityInteractEvent {
            actor: EventActor::player(PlayerId::new()),
            location: block_in(1, 0),
            class: EntityClass::MobileStorage,
            cancelled: false,
        };

        assert_eq!(w.guard.on_entity_interact(&mut cart), Decision::Deny(DenyReason::OwnedOutsider));
    }
}
