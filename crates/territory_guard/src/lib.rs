//! # Territory Guard
//!
//! Host-facing enforcement layer for [`territory_core`]. The host intercepts
//! world-mutating events, hands them to a [`TerritoryGuard`], and honours the
//! `cancelled` flag the guard sets on the event.
//!
//! ## Components
//!
//! - **Events** ([`events`]): the intercepted world events, one struct per kind
//! - **Guard** ([`TerritoryGuard`]): owns the territory service on the tick thread
//! - **Handlers** ([`handlers`]): one adapter per event category
//! - **Denial notifier** ([`DenialNotifier`]): rate-limited "why was I refused" messages
//! - **Member notifier** ([`MemberNotifier`]): forwards territory events to online members
//! - **Online directory** ([`OnlinePlayers`]): who is connected right now
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use territory_core::{BlockPos, MessageSink, PlayerId, TerritoryService, WorldId};
//! use territory_guard::events::{BlockPlaceEvent, EventActor};
//! use territory_guard::TerritoryGuard;
//!
//! struct Console;
//!
//! impl MessageSink for Console {
//!     fn send_message(&self, player: PlayerId, message: &str) {
//!         println!("{player}: {message}");
//!     }
//!
//!     fn send_title(&self, _player: PlayerId, _title: &str, _subtitle: &str) {}
//! }
//!
//! let mut guard = TerritoryGuard::new(TerritoryService::default(), Arc::new(Console));
//! let mut event = BlockPlaceEvent {
//!     actor: EventActor::player(PlayerId::new()),
//!     block: BlockPos::new(WorldId(0), 10, 64, 10),
//!     cancelled: false,
//! };
//!
//! // Unclaimed land is open to everyone.
//! assert!(guard.on_block_place(&mut event).is_allowed());
//! assert!(!event.cancelled);
//! ```

pub mod directory;
pub mod events;
pub mod guard;
pub mod handlers;
pub mod limiter;
pub mod notifier;
pub mod observer;

pub use directory::OnlinePlayers;
pub use guard::{Cancellable, GuardedEvent, TerritoryGuard};
pub use limiter::RateLimiter;
pub use notifier::{denial_message, DenialNotifier, DEFAULT_DENIAL_COOLDOWN};
pub use observer::MemberNotifier;
