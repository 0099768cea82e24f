//! Fire handler: ignition, spread and burning.
//!
//! Only ignition by a player carries an actor. Spread, lava and lightning run
//! as the environment, and burning blocks are checked against the `burn` rule
//! of the chunk they sit in. A block that burns away loses its lock.

use crate::events::{BlockBurnEvent, IgniteCause, IgniteEvent};
use crate::guard::GuardedEvent;
use crate::TerritoryGuard;
use territory_core::{ActionKind, Actor, Decision, Intent};
use tracing::debug;

impl GuardedEvent for IgniteEvent {
    fn intent(&self) -> Intent {
        match self.cause {
            IgniteCause::Player { actor } => Intent::new(Actor::Player(actor.into()), self.block, ActionKind::Ignite),
            IgniteCause::Spread { from } | IgniteCause::Lava { from } => {
                Intent::new(Actor::Environment, self.block, ActionKind::FireSpread { from })
            }
            IgniteCause::Lightning => Intent::new(Actor::Environment, self.block, ActionKind::Burn),
        }
    }
}

impl GuardedEvent for BlockBurnEvent {
    fn intent(&self) -> Intent {
        Intent::new(Actor::Environment, self.block, ActionKind::Burn)
    }
}

impl TerritoryGuard {
    pub fn on_ignite(&mut self, event: &mut IgniteEvent) -> Decision {
        self.guard(event)
    }

    pub fn on_block_burn(&mut self, event: &mut BlockBurnEvent) -> Decision {
        if event.cancelled {
            return Decision::Allow;
        }
        let decision = self.guard(event);
        if decision.is_allowed() {
            if let Some(owner) = self.service_mut().block_destroyed(event.block) {
                debug!("🔓 Lock of {} at {} released by fire", owner, event.block);
            }
        }
        decision
    }
}
