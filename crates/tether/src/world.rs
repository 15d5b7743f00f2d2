//! The entities this process simulates.
//!
//! One [`EntitySlot`] per networked object the transport has told us
//! about. A slot owns the entity's [`KinematicState`], its character body,
//! and its [`ReplicatedCell`]. Authority is resolved once, when the slot is
//! created, from the spawning player.

use std::collections::BTreeMap;

use tether_movement::{
    AnimationFlags, CharacterBody, KinematicState, PlaneBody, ReplicatedCell,
};
use tether_protocol::{Authority, EntityId, PlayerId, SpawnedEntity, TransportEvent};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// BodyFactory
// ---------------------------------------------------------------------------

/// Builds the character controller for a freshly spawned entity.
pub trait BodyFactory: Send {
    fn create(&self, spawned: &SpawnedEntity) -> Box<dyn CharacterBody>;
}

/// Puts every entity on a flat floor at its spawn height.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneBodies;

impl BodyFactory for PlaneBodies {
    fn create(&self, spawned: &SpawnedEntity) -> Box<dyn CharacterBody> {
        let mut body = PlaneBody::new(spawned.transform.position);
        body.set_rotation(spawned.transform.rotation);
        Box::new(body)
    }
}

impl<F> BodyFactory for F
where
    F: Fn(&SpawnedEntity) -> Box<dyn CharacterBody> + Send,
{
    fn create(&self, spawned: &SpawnedEntity) -> Box<dyn CharacterBody> {
        self(spawned)
    }
}

// ---------------------------------------------------------------------------
// EntitySlot
// ---------------------------------------------------------------------------

/// Simulation state of one entity.
pub struct EntitySlot {
    pub(crate) owner: PlayerId,
    pub(crate) state: KinematicState,
    pub(crate) body: Box<dyn CharacterBody>,
    pub(crate) cell: ReplicatedCell,
    pub(crate) animation: AnimationFlags,
}

impl EntitySlot {
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn authority(&self) -> Authority {
        self.cell.authority()
    }

    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    pub fn body(&self) -> &dyn CharacterBody {
        self.body.as_ref()
    }

    pub fn cell(&self) -> &ReplicatedCell {
        &self.cell
    }

    /// Flags from the last simulated tick, for the animator.
    pub fn animation(&self) -> AnimationFlags {
        self.animation
    }
}

impl std::fmt::Debug for EntitySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySlot")
            .field("owner", &self.owner)
            .field("authority", &self.cell.authority())
            .field("state", &self.state)
            .field("transform", &self.body.transform())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Every simulated entity, keyed by id.
pub struct World {
    slots: BTreeMap<EntityId, EntitySlot>,
    bodies: Box<dyn BodyFactory>,
}

impl World {
    pub fn new(bodies: impl BodyFactory + 'static) -> Self {
        Self {
            slots: BTreeMap::new(),
            bodies: Box::new(bodies),
        }
    }

    /// Applies the spawn, despawn and shutdown events; ignores the rest.
    ///
    /// `local` is the player this process runs as, if it is in a room.
    pub fn observe(&mut self, event: &TransportEvent, local: Option<PlayerId>) {
        match event {
            TransportEvent::EntitySpawned(spawned) => {
                self.insert(spawned, local);
            }
            TransportEvent::EntityDespawned { entity } => {
                self.remove(*entity);
            }
            TransportEvent::Shutdown { .. } => self.clear(),
            _ => {}
        }
    }

    /// Creates the slot for a spawned entity. A repeated spawn for a known
    /// id keeps the existing slot.
    pub fn insert(&mut self, spawned: &SpawnedEntity, local: Option<PlayerId>) -> Authority {
        if let Some(existing) = self.slots.get(&spawned.entity) {
            warn!(entity = %spawned.entity, "entity already simulated, spawn ignored");
            return existing.authority();
        }

        let authority = match local {
            Some(local) => Authority::resolve(spawned.owner, local),
            None => Authority::Remote,
        };
        let slot = EntitySlot {
            owner: spawned.owner,
            state: KinematicState::default(),
            body: self.bodies.create(spawned),
            cell: ReplicatedCell::new(authority),
            animation: AnimationFlags::default(),
        };
        debug!(entity = %spawned.entity, owner = %spawned.owner, %authority, "entity slot created");
        self.slots.insert(spawned.entity, slot);
        authority
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<EntitySlot> {
        let slot = self.slots.remove(&entity);
        if slot.is_some() {
            debug!(%entity, "entity slot removed");
        }
        slot
    }

    /// Drops every slot, ending simulation for the session.
    pub fn clear(&mut self) {
        if !self.slots.is_empty() {
            debug!(count = self.slots.len(), "clearing world");
            self.slots.clear();
        }
    }

    pub fn get(&self, entity: EntityId) -> Option<&EntitySlot> {
        self.slots.get(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntitySlot)> {
        self.slots.iter().map(|(id, slot)| (*id, slot))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut EntitySlot)> {
        self.slots.iter_mut().map(|(id, slot)| (*id, slot))
    }

    /// The first entity this process has state authority over.
    pub fn local_entity(&self) -> Option<EntityId> {
        self.iter()
            .find(|(_, slot)| slot.authority().is_local())
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(PlaneBodies)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.slots.iter()).finish()
    }
}
