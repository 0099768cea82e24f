//! Stand-ins for the game host's collaborators.
//!
//! The server has no client connections of its own, so player-facing messages
//! are written to the log under the `chat` target. A host embedding the
//! engine supplies its own [`MessageSink`].

use territory_core::{MessageSink, PlayerId};
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn send_message(&self, player: PlayerId, message: &str) {
        info!(target: "chat", %player, "💬 {}", message);
    }

    fn send_title(&self, player: PlayerId, title: &str, subtitle: &str) {
        info!(target: "chat", %player, "🪧 {} | {}", title, subtitle);
    }
}
