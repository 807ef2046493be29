use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fully-qualified user identifier, e.g. `@alice:example.org`.
///
/// Opaque to the delivery queue; only equality matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Room identifier, e.g. `!vacqmdlk:example.org`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

/// Event identifier, e.g. `$15163823791gyTxY:example.org`.
///
/// Used only for duplicate suppression of membership notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

macro_rules! impl_id {
    ($id:ident) => {
        impl $id {
            /// Wrap a raw identifier string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $id {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $id {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

impl_id!(UserId);
impl_id!(RoomId);
impl_id!(EventId);

/// Membership state carried by a room member event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    /// The user has been invited but has not joined
    Invite,
    /// The user is a joined member of the room
    Join,
    /// The user left or the invite was withdrawn
    Leave,
    /// The user was banned from the room
    Ban,
    /// The user is knocking to request an invite
    Knock,
}

/// Which message type a file payload is delivered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Rendered inline as an image
    Image,
    /// Offered as a plain downloadable attachment
    File,
}

/// A membership-change notification from the client's event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipEvent {
    /// Unique identifier of the underlying state event
    pub event_id: EventId,
    /// Room the membership change happened in
    pub room_id: RoomId,
    /// User who caused the change (for invites: the inviter)
    pub sender: UserId,
    /// User whose membership changed (for invites: the invitee)
    pub state_key: UserId,
    /// The new membership state
    pub membership: Membership,
    /// Server-side timestamp of the event (milliseconds on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub origin_server_ts: DateTime<Utc>,
}

impl MembershipEvent {
    /// How old the event is according to its server timestamp
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.origin_server_ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        let user = UserId::new("@alice:example.org");
        assert_eq!(user.as_str(), "@alice:example.org");
        assert_eq!(user.to_string(), "@alice:example.org");
        assert_eq!(user, UserId::from("@alice:example.org"));
    }

    #[test]
    fn test_parse_membership_event() {
        let json = r#"{
            "event_id": "$15163823791gyTxY:example.org",
            "room_id": "!vacqmdlk:example.org",
            "sender": "@bot:example.org",
            "state_key": "@alice:example.org",
            "membership": "invite",
            "origin_server_ts": 1700000000000
        }"#;

        let event: MembershipEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_id, EventId::from("$15163823791gyTxY:example.org"));
        assert_eq!(event.sender, UserId::from("@bot:example.org"));
        assert_eq!(event.membership, Membership::Invite);
        assert_eq!(event.origin_server_ts.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_membership_rename() {
        assert_eq!(serde_json::to_string(&Membership::Join).unwrap(), r#""join""#);
        assert_eq!(
            serde_json::from_str::<Membership>(r#""leave""#).unwrap(),
            Membership::Leave
        );
    }

    #[test]
    fn test_event_age() {
        let event = MembershipEvent {
            event_id: EventId::from("$old"),
            room_id: RoomId::from("!room:example.org"),
            sender: UserId::from("@bot:example.org"),
            state_key: UserId::from("@alice:example.org"),
            membership: Membership::Invite,
            origin_server_ts: Utc::now() - chrono::Duration::seconds(20),
        };

        assert!(event.age() > chrono::Duration::seconds(15));
        assert!(event.age() < chrono::Duration::seconds(60));
    }
}
