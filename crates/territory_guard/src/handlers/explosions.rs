//! # Explosion Handler
//!
//! Explosions are the one event that is neither simply allowed nor simply
//! denied. The zone the blast starts in decides the outcome as a whole:
//!
//! - **Cancel** (SAFE): the event is cancelled, entity effects included
//! - **Suppress blocks** (WAR): entity effects stay, the block list is emptied
//! - otherwise every block is kept or dropped by the rules of its own chunk,
//!   so a blast next to a border never damages the territory across it
//!
//! Blocks the blast still destroys lose their locks.

use crate::events::ExplosionEvent;
use crate::TerritoryGuard;
use territory_core::BlastVerdict;
use tracing::debug;

impl TerritoryGuard {
    pub fn on_explosion(&mut self, event: &mut ExplosionEvent) -> BlastVerdict {
        if event.cancelled {
            return BlastVerdict::default();
        }

        let service = self.service();
        let verdict = service
            .engine()
            .filter_explosion(service.manager(), event.origin, &mut event.blocks);

        if verdict.cancelled {
            event.cancelled = true;
        }
        if verdict.blocks_removed > 0 {
            debug!(
                "💣 Explosion at {}: {} blocks protected, {} remain",
                event.origin,
                verdict.blocks_removed,
                event.blocks.len()
            );
        }
        self.stats_mut().record_blast(verdict.blocks_removed);

        if !event.cancelled {
            for pos in event.blocks.iter().copied() {
                if let Some(owner) = self.service_mut().block_destroyed(pos) {
                    debug!("🔓 Lock of {} at {} released by explosion", owner, pos);
                }
            }
        }
        verdict
    }
}
