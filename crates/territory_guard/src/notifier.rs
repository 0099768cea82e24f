//! Denial messages sent back to the player whose action was refused.

use crate::limiter::RateLimiter;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use territory_core::{DenyReason, MessageSink, PlayerId};
use tracing::trace;

/// Default per-player, per-reason message cooldown.
pub const DEFAULT_DENIAL_COOLDOWN: Duration = Duration::from_millis(1500);

/// The single line shown for a denial.
pub fn denial_message(reason: DenyReason) -> Cow<'static, str> {
    match reason {
        DenyReason::SafeZone => "You cannot do that in the SafeZone.".into(),
        DenyReason::WarZone => "You cannot do that in the WarZone.".into(),
        DenyReason::Wilderness => "You cannot do that in the Wilderness.".into(),
        DenyReason::OwnedOutsider => "This land belongs to a territory you are not part of.".into(),
        DenyReason::OwnedNeedsModerator => "You need to be at least a Moderator to build here.".into(),
        DenyReason::Protected => "This land is protected.".into(),
        DenyReason::CrossBoundary => "That cannot cross a territory border.".into(),
        DenyReason::HostileMob => "Hostile creatures are not allowed here.".into(),
        DenyReason::Locked => "This is locked by another player.".into(),
        DenyReason::InsufficientRank { required } => {
            format!("You need to be at least {required} to do that.").into()
        }
        DenyReason::OperatorOnly => "Only server operators can do that.".into(),
    }
}

/// Tells players why their action failed, at most once per cooldown for each
/// reason.
pub struct DenialNotifier {
    sink: Arc<dyn MessageSink>,
    limiter: RateLimiter<(PlayerId, DenyReason)>,
}

impl DenialNotifier {
    pub fn new(sink: Arc<dyn MessageSink>, cooldown: Duration) -> Self {
        Self {
            sink,
            limiter: RateLimiter::cooldown(cooldown),
        }
    }

    /// Sends the message for `reason` unless one was sent recently.
    /// Returns whether a message went out.
    pub fn notify(&mut self, player: PlayerId, reason: DenyReason, now: Instant) -> bool {
        if !self.limiter.check((player, reason), now) {
            trace!("🔇 Suppressed repeated {} notice for {}", reason, player);
            return false;
        }
        self.sink.send_message(player, &denial_message(reason));
        true
    }

    pub fn suppressed(&self) -> u64 {
        self.limiter.blocked_count()
    }

    /// Forgets cooldowns older than `max_age`.
    pub fn prune(&mut self, now: Instant, max_age: Duration) {
        self.limiter.cleanup_old_entries(now, max_age);
    }
}

impl std::fmt::Debug for DenialNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenialNotifier")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use territory_core::Role;

    /// Sink that records every message, shared by the handler tests.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) messages: Mutex<Vec<(PlayerId, String)>>,
    }

    impl RecordingSink {
        pub(crate) fn messages_for(&self, player: PlayerId) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| *p == player)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl MessageSink for RecordingSink {
        fn send_message(&self, player: PlayerId, message: &str) {
            self.messages.lock().unwrap().push((player, message.to_string()));
        }

        fn send_title(&self, player: PlayerId, title: &str, subtitle: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((player, format!("{title} / {subtitle}")));
        }
    }

    #[test]
    fn test_repeated_denials_are_rate_limited() {
        let sink = Arc::new(RecordingSink::default());
        let mut notifier = DenialNotifier::new(sink.clone(), DEFAULT_DENIAL_COOLDOWN);
        let player = PlayerId::new();
        let start = Instant::now();

        for tick in 0..20u64 {
            notifier.notify(player, DenyReason::SafeZone, start + Duration::from_millis(tick * 50));
        }

        assert_eq!(sink.messages_for(player), vec!["You cannot do that in the SafeZone."]);
        assert_eq!(notifier.suppressed(), 19);
    }

    #[test]
    fn test_cooldown_is_per_reason() {
        let sink = Arc::new(RecordingSink::default());
        let mut notifier = DenialNotifier::new(sink.clone(), DEFAULT_DENIAL_COOLDOWN);
        let player = PlayerId::new();
        let now = Instant::now();

        assert!(notifier.notify(player, DenyReason::SafeZone, now));
        assert!(notifier.notify(player, DenyReason::Locked, now));
        assert!(notifier.notify(PlayerId::new(), DenyReason::SafeZone, now));
        assert!(notifier.notify(player, DenyReason::SafeZone, now + DEFAULT_DENIAL_COOLDOWN));
    }

    #[test]
    fn test_rank_message_names_role() {
        let message = denial_message(DenyReason::InsufficientRank { required: Role::Admin });
        assert_eq!(message, "You need to be at least Admin to do that.");
    }
}
