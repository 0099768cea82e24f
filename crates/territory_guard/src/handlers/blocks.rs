//! # Block Handler
//!
//! Block placement, block breaking and bucket use. These are the actions a
//! player repeats most often against a denial, so the notifier's cooldown
//! matters most here.
//!
//! Breaking a protected fixture consults the lock overlay first. When the
//! break goes through, any lock on the block is dropped with it.

use crate::events::{BlockBreakEvent, BlockPlaceEvent, BucketUseEvent};
use crate::guard::GuardedEvent;
use crate::TerritoryGuard;
use territory_core::{ActionKind, Actor, Decision, Intent};
use tracing::debug;

impl GuardedEvent for BlockPlaceEvent {
    fn intent(&self) -> Intent {
        Intent::new(Actor::Player(self.actor.into()), self.block, ActionKind::BlockPlace)
    }
}

impl GuardedEvent for BucketUseEvent {
    fn intent(&self) -> Intent {
        Intent::new(Actor::Player(self.actor.into()), self.target, ActionKind::BucketUse)
    }
}

impl TerritoryGuard {
    pub fn on_block_place(&mut self, event: &mut BlockPlaceEvent) -> Decision {
        self.guard(event)
    }

    pub fn on_bucket_use(&mut self, event: &mut BucketUseEvent) -> Decision {
        self.guard(event)
    }

    pub fn on_block_break(&mut self, event: &mut BlockBreakEvent) -> Decision {
        if event.cancelled {
            return Decision::Allow;
        }
        let actor = Actor::Player(event.actor.into());

        if event.class.is_protected_fixture() {
            if let Some(Decision::Deny(reason)) = self.service().locks().check(&event.block, event.actor.player) {
                if !event.actor.operator {
                    event.cancelled = true;
                    return self.settle(&actor, Decision::Deny(reason));
                }
            }
        }

        let decision = self.enforce(Intent::new(actor, event.block, ActionKind::BlockBreak));
        if decision.is_denied() {
            event.cancelled = true;
        } else if let Some(owner) = self.service_mut().block_destroyed(event.block) {
            debug!("🔓 Lock of {} at {} released by block break", owner, event.block);
        }
        decision
    }
}
