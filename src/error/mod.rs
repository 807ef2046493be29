use thiserror::Error;

use crate::client::{ClientError, RoomId, UserId};

/// Errors surfaced by the delivery queue
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Creating a direct room (or inviting the recipient into it) failed.
    /// The payload was dropped before any send was attempted.
    #[error("Room creation for {recipient} failed: {source}")]
    RoomCreation {
        recipient: UserId,
        source: ClientError,
    },

    /// An immediate send into an established room failed. The payload is
    /// abandoned; the queue never retries.
    #[error("Send to {room} failed: {source}")]
    Send { room: RoomId, source: ClientError },

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = DeliveryError> = std::result::Result<T, E>;
