use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::client::{ChatClient, ClientError, FileKind, RoomId};

/// What gets delivered into a room.
///
/// Built eagerly at dispatch time so a deferred send needs no further
/// context from the caller when it finally executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Plain text message body
    Text { body: String },
    /// Image on local disk, rendered inline by clients
    Image { path: PathBuf },
    /// Arbitrary file on local disk, offered as an attachment
    File { path: PathBuf },
}

impl Payload {
    /// Create a text payload
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    /// Create an image payload from a local path
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::Image { path: path.into() }
    }

    /// Create a file payload from a local path
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Short label for log output
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Text { .. } => "text",
            Payload::Image { .. } => "image",
            Payload::File { .. } => "file",
        }
    }
}

/// A send bound to a room, waiting for the room to become usable.
///
/// Owned by the pending registry until the room's invite comes through;
/// executing consumes the send, so each one runs at most once.
#[derive(Debug)]
pub struct DeferredSend {
    id: Uuid,
    room: RoomId,
    payload: Payload,
    queued_at: DateTime<Utc>,
}

impl DeferredSend {
    pub fn new(room: RoomId, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            room,
            payload,
            queued_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// How long the send has been waiting
    pub fn queued_for(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.queued_at)
    }

    /// Execute the send against `client`, consuming it
    pub async fn execute(self, client: &dyn ChatClient) -> Result<(), ClientError> {
        match self.payload {
            Payload::Text { body } => client.send_text(&self.room, &body).await,
            Payload::Image { path } => client.send_file(&self.room, &path, FileKind::Image).await,
            Payload::File { path } => client.send_file(&self.room, &path, FileKind::File).await,
        }
    }
}
