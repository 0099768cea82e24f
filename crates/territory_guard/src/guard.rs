//! # Territory Guard
//!
//! Owns the [`TerritoryService`] on behalf of the tick thread and applies its
//! decisions to intercepted world events. Every adapter in
//! [`handlers`](crate::handlers) funnels through [`TerritoryGuard::enforce`],
//! which asks the decision engine, records statistics and tells a denied
//! player why.

use crate::notifier::{DenialNotifier, DEFAULT_DENIAL_COOLDOWN};
use std::sync::Arc;
use std::time::{Duration, Instant};
use territory_core::{Actor, Decision, DecisionStats, Intent, MessageSink, TerritoryService};

/// Uniform access to the cancellation flag of an intercepted event.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;
    fn set_cancelled(&mut self, cancelled: bool);
}

/// An event that reduces to exactly one intent.
pub trait GuardedEvent: Cancellable {
    fn intent(&self) -> Intent;
}

macro_rules! impl_cancellable {
    ($($event:ty),* $(,)?) => {
        $(
            impl Cancellable for $event {
                fn is_cancelled(&self) -> bool {
                    self.cancelled
                }

                fn set_cancelled(&mut self, cancelled: bool) {
                    self.cancelled = cancelled;
                }
            }
        )*
    };
}

impl_cancellable!(
    crate::events::BlockBreakEvent,
    crate::events::BlockPlaceEvent,
    crate::events::BucketUseEvent,
    crate::events::IgniteEvent,
    crate::events::BlockBurnEvent,
    crate::events::LiquidFlowEvent,
    crate::events::ExplosionEvent,
    crate::events::CreatureSpawnEvent,
    crate::events::CreatureTargetEvent,
    crate::events::CreatureMoveEvent,
    crate::events::PlayerDamageEvent,
    crate::events::InteractEvent,
    crate::events::EntityInteractEvent,
);

#[derive(Debug)]
pub struct TerritoryGuard {
    service: TerritoryService,
    notifier: DenialNotifier,
    stats: DecisionStats,
}

impl TerritoryGuard {
    pub fn new(service: TerritoryService, sink: Arc<dyn MessageSink>) -> Self {
        Self::with_cooldown(service, sink, DEFAULT_DENIAL_COOLDOWN)
    }

    pub fn with_cooldown(service: TerritoryService, sink: Arc<dyn MessageSink>, cooldown: Duration) -> Self {
        Self {
            service,
            notifier: DenialNotifier::new(sink, cooldown),
            stats: DecisionStats::default(),
        }
    }

    pub fn service(&self) -> &TerritoryService {
        &self.service
    }

    /// Mutable access for management commands.
    pub fn service_mut(&mut self) -> &mut TerritoryService {
        &mut self.service
    }

    pub fn stats(&self) -> &DecisionStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut DecisionStats {
        &mut self.stats
    }

    pub fn notifier_mut(&mut self) -> &mut DenialNotifier {
        &mut self.notifier
    }

    /// Decides `intent`, recording the verdict and notifying a denied player.
    pub fn enforce(&mut self, intent: Intent) -> Decision {
        let decision = self.service.decide(&intent.actor, intent.location, intent.action);
        self.settle(&intent.actor, decision)
    }

    /// Records a decision made elsewhere (lock checks, fixture checks) the same
    /// way [`enforce`](Self::enforce) does.
    pub(crate) fn settle(&mut self, actor: &Actor, decision: Decision) -> Decision {
        self.stats.record(decision, actor.is_operator());
        if let (Decision::Deny(reason), Some(player)) = (decision, actor.player_id()) {
            self.notifier.notify(player, reason, Instant::now());
        }
        decision
    }

    /// Applies the verdict for a single-intent event. Already cancelled events
    /// are left alone.
    pub fn guard<E: GuardedEvent>(&mut self, event: &mut E) -> Decision {
        if event.is_cancelled() {
            return Decision::Allow;
        }
        let decision = self.enforce(event.intent());
        if decision.is_denied() {
            event.set_cancelled(true);
        }
        decision
    }
}
