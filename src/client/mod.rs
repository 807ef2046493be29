//! The messaging-client seam.
//!
//! The delivery queue does not talk to a homeserver itself; the host hands
//! it an implementation of [`ChatClient`] wrapping whatever SDK it uses.
//! The trait covers only what the queue drives: room lookup, room creation
//! with invite, and the two send shapes it knows how to defer.

mod retry;
mod types;

pub use retry::retry_rate_limited;
pub use types::{EventId, FileKind, Membership, MembershipEvent, RoomId, UserId};

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a messaging client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server asked the caller to slow down and retry later
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The server rejected the request with a diagnostic code
    #[error("request rejected: {code}")]
    Rejected { code: String },

    /// The request never produced a usable response
    #[error("transport error: {0}")]
    Transport(String),
}

/// The slice of a messaging client the delivery queue drives.
///
/// Implementations are expected to handle rate limiting themselves (see
/// [`retry_rate_limited`]) so every call here behaves as a single attempt
/// from the queue's point of view.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The identity this client is logged in as.
    ///
    /// Membership events not sent by this user are ignored by the queue.
    fn user_id(&self) -> &UserId;

    /// Look up an already-established direct room with `recipient`.
    ///
    /// Only rooms the recipient has actually joined count; rooms the queue
    /// is still awaiting an invite for are tracked separately.
    fn find_direct_room(&self, recipient: &UserId) -> Option<RoomId>;

    /// Create a direct room named `display_name` and invite `recipient`
    /// into it, returning the new room's id.
    async fn create_direct_room(
        &self,
        recipient: &UserId,
        display_name: &str,
    ) -> Result<RoomId, ClientError>;

    /// Send a plain text message into `room`.
    async fn send_text(&self, room: &RoomId, body: &str) -> Result<(), ClientError>;

    /// Upload the file at `path` and send it into `room` as `kind`.
    async fn send_file(
        &self,
        room: &RoomId,
        path: &Path,
        kind: FileKind,
    ) -> Result<(), ClientError>;
}
