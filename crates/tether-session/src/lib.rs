//! Room lifecycle and transport event handling for Tether.
//!
//! ```text
//! Transport events ──→ NetworkEventDispatcher ──→ SessionManager
//!                              │                        │
//!                              ▼                        ▼
//!                            Roster                 Notifier ──→ UI
//! ```
//!
//! - [`SessionManager`] joins the discovery lobby, lists joinable rooms,
//!   creates/joins/leaves rooms and reports abnormal shutdowns.
//! - [`NetworkEventDispatcher`] is the single handler for every
//!   [`TransportEvent`](tether_protocol::TransportEvent). It spawns the
//!   local avatar when the gameplay scene is ready and syncs display names.
//! - [`Notifier`] delivers [`Notification`]s to any number of subscribers.
//!
//! Local scene loading and the stored username are reached through the
//! [`SceneLoader`] and [`ProfileSource`] traits.

mod config;
mod dispatch;
mod error;
mod manager;
mod notify;
mod profile;
mod roster;
mod scene;

pub use config::SessionConfig;
pub use dispatch::NetworkEventDispatcher;
pub use error::SessionError;
pub use manager::SessionManager;
pub use notify::{Notification, Notifier, Subscription};
pub use profile::{FixedProfile, ProfileSource, guest_name};
pub use roster::{Participant, Roster};
pub use scene::{RecordingSceneLoader, SceneLoader};
