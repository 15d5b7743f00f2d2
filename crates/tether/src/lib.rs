//! # Tether
//!
//! Networked session and authoritative movement core for multiplayer game
//! clients.
//!
//! Tether discovers and manages shared rooms, replicates per-tick player
//! input, integrates character movement from that input at a fixed rate,
//! and keeps every participant's copy of each avatar in line with the one
//! process that owns it. The network itself is a [`Transport`] the game
//! provides; [`LocalTransport`] runs everything in-process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! # async fn demo() -> Result<(), TetherError> {
//! let network = LocalNetwork::new();
//! let (transport, events) = network.connect();
//! let mut client = GameClient::builder(Arc::new(transport), events)
//!     .config(ClientConfig::default())
//!     .build();
//! client.manager().create_or_join_room("arena").await?;
//! client.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`Transport`]: tether_transport::Transport
//! [`LocalTransport`]: tether_transport::LocalTransport

mod client;
mod config;
mod error;
pub mod logging;
mod world;

pub use client::{GameClient, GameClientBuilder};
pub use config::{ClientConfig, ConfigError};
pub use error::TetherError;
pub use world::{BodyFactory, EntitySlot, PlaneBodies, World};

pub use tether_movement as movement;
pub use tether_protocol as protocol;
pub use tether_session as session;
pub use tether_tick as tick;
pub use tether_transport as transport;

/// The types most client code needs.
pub mod prelude {
    pub use crate::{BodyFactory, ClientConfig, GameClient, TetherError, World};
    pub use tether_movement::{
        CameraBasis, CeilingProbe, CharacterBody, InputSampler, MovementConfig, PlaneBody,
        ScriptedInput,
    };
    pub use tether_protocol::{EntityId, InputSnapshot, PlayerId, ReplicatedTransform};
    pub use tether_session::{Notification, ProfileSource, SceneLoader, SessionManager};
    pub use tether_transport::{LocalNetwork, LocalTransport, Transport};
}
