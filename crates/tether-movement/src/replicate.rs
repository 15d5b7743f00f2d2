//! State-authority arbitration for replicated transforms.
//!
//! Each simulated entity has one [`ReplicatedCell`]. The process holding
//! state authority writes it after simulating; every other process feeds
//! it whatever the transport delivered and copies it over its local body.

use tether_protocol::{Authority, EntityId, ReplicatedTransform};
use tracing::trace;

use crate::{CharacterBody, ReplicationError};

/// The replicated transform of one entity, plus who may write it.
///
/// Authority is fixed when the cell is created.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicatedCell {
    authority: Authority,
    value: Option<ReplicatedTransform>,
    revision: u64,
}

impl ReplicatedCell {
    pub fn new(authority: Authority) -> Self {
        Self {
            authority,
            value: None,
            revision: 0,
        }
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Writes a freshly simulated transform.
    ///
    /// # Errors
    /// [`ReplicationError::NotAuthority`] unless this process holds state
    /// authority.
    pub fn write(&mut self, transform: ReplicatedTransform) -> Result<(), ReplicationError> {
        if !self.authority.is_local() {
            return Err(ReplicationError::NotAuthority);
        }
        self.store(transform);
        Ok(())
    }

    /// Stores a transform received from the authority holder. Ignored on the
    /// authority holder itself.
    pub fn receive(&mut self, transform: ReplicatedTransform) {
        if self.authority.is_local() {
            trace!("ignoring replicated transform for locally owned entity");
            return;
        }
        self.store(transform);
    }

    /// Latest known value, if any arrived or was written yet.
    pub fn latest(&self) -> Option<ReplicatedTransform> {
        self.value
    }

    /// Number of values stored so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn store(&mut self, transform: ReplicatedTransform) {
        self.value = Some(transform);
        self.revision += 1;
    }
}

/// What [`AuthorityReplicator::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplicationOutcome {
    /// The local simulation result was written to the cell.
    Published(ReplicatedTransform),
    /// The body was overwritten with the replicated value.
    Applied(ReplicatedTransform),
    /// Not the authority and nothing replicated yet; the body is untouched.
    Stale,
}

/// Publishes or applies replicated transforms after each movement tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorityReplicator;

impl AuthorityReplicator {
    /// Reconciles `body` with `cell` for one tick.
    pub fn tick(
        &self,
        entity: EntityId,
        cell: &mut ReplicatedCell,
        body: &mut dyn CharacterBody,
    ) -> Result<ReplicationOutcome, ReplicationError> {
        match cell.authority() {
            Authority::Local => {
                let transform = body.transform();
                cell.write(transform)?;
                trace!(%entity, position = ?transform.position, "transform published");
                Ok(ReplicationOutcome::Published(transform))
            }
            Authority::Remote => match cell.latest() {
                Some(transform) => {
                    body.set_transform(transform);
                    trace!(%entity, position = ?transform.position, "transform applied");
                    Ok(ReplicationOutcome::Applied(transform))
                }
                None => Ok(ReplicationOutcome::Stale),
            },
        }
    }
}
