//! Forwards territory mutations to the online members they concern.
//!
//! A player who joins a territory also gets a welcome title.

use std::sync::Arc;
use territory_core::{MessageSink, PlayerDirectory, PlayerId, TerritoryEvent, TerritoryObserver};

/// [`TerritoryObserver`] that sends one chat line per event to every online
/// player in the audience.
pub struct MemberNotifier {
    directory: Arc<dyn PlayerDirectory>,
    sink: Arc<dyn MessageSink>,
}

impl MemberNotifier {
    pub fn new(directory: Arc<dyn PlayerDirectory>, sink: Arc<dyn MessageSink>) -> Self {
        Self { directory, sink }
    }

    fn name_of(&self, player: PlayerId) -> String {
        self.directory
            .display_name(player)
            .unwrap_or_else(|| player.to_string())
    }

    fn describe(&self, event: &TerritoryEvent, territory: &str) -> String {
        match event {
            TerritoryEvent::Created { owner, .. } => {
                format!("[{territory}] {} founded the territory.", self.name_of(*owner))
            }
            TerritoryEvent::Renamed { old_name, new_name, .. } => {
                format!("[{new_name}] The territory was renamed from {old_name}.")
            }
            TerritoryEvent::DescriptionChanged { .. } => format!("[{territory}] The description was updated."),
            TerritoryEvent::Disbanded { name, .. } => format!("[{name}] The territory was disbanded."),
            TerritoryEvent::MemberJoined { player, .. } => {
                format!("[{territory}] {} joined the territory.", self.name_of(*player))
            }
            TerritoryEvent::MemberLeft { player, .. } => {
                format!("[{territory}] {} left the territory.", self.name_of(*player))
            }
            TerritoryEvent::MemberKicked { player, .. } => {
                format!("[{territory}] {} was kicked from the territory.", self.name_of(*player))
            }
            TerritoryEvent::RoleChanged { player, role, .. } => {
                format!("[{territory}] {} is now {role}.", self.name_of(*player))
            }
            TerritoryEvent::OwnershipTransferred { owner, .. } => {
                format!("[{territory}] {} is the new owner.", self.name_of(*owner))
            }
            TerritoryEvent::Invited { player, .. } => {
                format!("[{territory}] {} was invited to join.", self.name_of(*player))
            }
            TerritoryEvent::InviteCancelled { player, .. } => {
                format!("[{territory}] The invite for {} was cancelled.", self.name_of(*player))
            }
            TerritoryEvent::InviteDeclined { player, .. } => {
                format!("[{territory}] {} declined the invite.", self.name_of(*player))
            }
            TerritoryEvent::JoinRequested { player, .. } => {
                format!("[{territory}] {} asked to join.", self.name_of(*player))
            }
            TerritoryEvent::JoinRequestDeclined { player, .. } => {
                format!("[{territory}] The join request of {} was declined.", self.name_of(*player))
            }
            TerritoryEvent::FlagChanged { flag, value, .. } => {
                let state = if *value { "enabled" } else { "disabled" };
                format!("[{territory}] {} {state}.", capitalize(flag.label()))
            }
            TerritoryEvent::Claimed { chunk, .. } => format!("[{territory}] Claimed chunk {chunk}."),
            TerritoryEvent::Unclaimed { chunk, .. } => format!("[{territory}] Released chunk {chunk}."),
            TerritoryEvent::ClaimLimitChanged { limit, .. } => {
                format!("[{territory}] Claim limit is now {limit}.")
            }
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl TerritoryObserver for MemberNotifier {
    fn on_territory_event(&self, event: &TerritoryEvent, territory_name: &str, audience: &[PlayerId]) {
        if let TerritoryEvent::MemberJoined { player, .. } = event {
            if self.directory.is_online(*player) {
                self.sink
                    .send_title(*player, &format!("Welcome to {territory_name}"), "You are now a member");
            }
        }

        let online: Vec<PlayerId> = audience
            .iter()
            .copied()
            .filter(|p| self.directory.is_online(*p))
            .collect();
        if online.is_empty() {
            return;
        }
        let line = self.describe(event, territory_name);
        for player in online {
            self.sink.send_message(player, &line);
        }
    }
}
