//! Character movement and state-authority replication for Tether.
//!
//! - [`MovementSimulator`] integrates one tick of walking, sprinting,
//!   crouching, jumping and gravity from an [`InputSnapshot`].
//! - [`AuthorityReplicator`] then either publishes the result (local state
//!   authority) or overwrites it with the replicated transform.
//!
//! The simulator only talks to the engine through [`CharacterBody`],
//! [`CeilingProbe`] and [`InputSampler`]; [`PlaneBody`], [`OpenSky`] and
//! [`ScriptedInput`] are small stand-ins for tests and demos.
//!
//! [`InputSnapshot`]: tether_protocol::InputSnapshot

mod body;
mod config;
mod error;
mod replicate;
mod simulator;
mod state;

pub use body::{CeilingAt, CeilingProbe, CharacterBody, InputSampler, OpenSky, PlaneBody, ScriptedInput};
pub use config::MovementConfig;
pub use error::ReplicationError;
pub use replicate::{AuthorityReplicator, ReplicatedCell, ReplicationOutcome};
pub use simulator::{MovementSimulator, smoothstep};
pub use state::{AnimationFlags, CameraBasis, KinematicState, MovementStep, TickContext};
