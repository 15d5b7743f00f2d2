//! Who is in the current room.

use std::collections::BTreeMap;

use tether_protocol::{DisplayName, EntityId, PlayerId};

/// One participant of the current room, as seen from this process.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: PlayerId,
    /// `Player <id>` until the participant's own name arrives.
    pub display_name: DisplayName,
    /// This process produces the participant's input.
    pub input_authority: bool,
    /// This process writes the participant's replicated state.
    pub state_authority: bool,
    /// The participant's avatar, once spawned.
    pub entity: Option<EntityId>,
}

impl Participant {
    fn new(id: PlayerId, local: bool) -> Self {
        Self {
            id,
            display_name: DisplayName::placeholder(id),
            input_authority: local,
            state_authority: local,
            entity: None,
        }
    }
}

/// Participants keyed by id.
#[derive(Debug, Default)]
pub struct Roster {
    local: Option<PlayerId>,
    participants: BTreeMap<PlayerId, Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records which player is this process. Updates the authority flags of
    /// anyone already listed.
    pub fn set_local(&mut self, local: Option<PlayerId>) {
        self.local = local;
        for (id, participant) in &mut self.participants {
            let is_local = Some(*id) == local;
            participant.input_authority = is_local;
            participant.state_authority = is_local;
        }
    }

    /// Adds a participant. Returns `false` if it was already listed.
    pub fn join(&mut self, player: PlayerId) -> bool {
        if self.participants.contains_key(&player) {
            return false;
        }
        let is_local = self.local == Some(player);
        self.participants
            .insert(player, Participant::new(player, is_local));
        true
    }

    pub fn leave(&mut self, player: PlayerId) -> Option<Participant> {
        self.participants.remove(&player)
    }

    /// Sets a participant's name, adding the participant if needed.
    pub fn set_display_name(&mut self, player: PlayerId, name: DisplayName) {
        self.join(player);
        if let Some(p) = self.participants.get_mut(&player) {
            p.display_name = name;
        }
    }

    /// Links an avatar to its owner, adding the owner if needed.
    pub fn attach_entity(&mut self, player: PlayerId, entity: EntityId) {
        self.join(player);
        if let Some(p) = self.participants.get_mut(&player) {
            p.entity = Some(entity);
        }
    }

    /// Unlinks `entity` from whoever owned it.
    pub fn detach_entity(&mut self, entity: EntityId) {
        for p in self.participants.values_mut() {
            if p.entity == Some(entity) {
                p.entity = None;
            }
        }
    }

    pub fn get(&self, player: PlayerId) -> Option<&Participant> {
        self.participants.get(&player)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Forgets everyone, including the local player id.
    pub fn clear(&mut self) {
        self.participants.clear();
        self.local = None;
    }
}
