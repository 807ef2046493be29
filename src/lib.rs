//! Guaranteed direct-message delivery for chat bots.
//!
//! Payloads addressed to a user are sent right away when a direct room with
//! them already exists. Otherwise the queue creates the room, invites the
//! user, parks the sends, and flushes them in order once the room's invite
//! comes back on the membership stream. An outstanding-work counter signals
//! the run loop to stop when the whole batch has been delivered.

// Collaborator seam (the messaging client is supplied by the host)
pub mod client;

// Core delivery queue
pub mod delivery;

// Supporting modules
pub mod config;
pub mod error;
pub mod listener;
pub mod shutdown;
pub mod telemetry;

pub use client::{
    ChatClient, ClientError, EventId, FileKind, Membership, MembershipEvent, retry_rate_limited,
    RoomId, UserId,
};
pub use config::DeliveryConfig;
pub use delivery::{DeliveryService, DeliveryStats, Payload};
pub use error::{DeliveryError, Result};
pub use listener::MembershipListener;
pub use shutdown::ShutdownCoordinator;
