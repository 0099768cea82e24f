//! Liquid flow handler.
//!
//! Flow is decided at the destination block with the source as the origin of
//! the action. Flow that stays inside one chunk can never cross a territory
//! border and skips the lookup.

use crate::events::LiquidFlowEvent;
use crate::guard::GuardedEvent;
use crate::TerritoryGuard;
use territory_core::{ActionKind, Actor, Decision, Intent};

impl GuardedEvent for LiquidFlowEvent {
    fn intent(&self) -> Intent {
        Intent::new(Actor::Environment, self.to, ActionKind::LiquidFlow { from: self.from })
    }
}

impl TerritoryGuard {
    pub fn on_liquid_flow(&mut self, event: &mut LiquidFlowEvent) -> Decision {
        if event.from.chunk() == event.to.chunk() {
            return Decision::Allow;
        }
        self.guard(event)
    }
}
