use std::collections::{HashMap, VecDeque};

use smallvec::SmallVec;

use crate::client::{RoomId, UserId};

use super::payload::DeferredSend;

/// Bookkeeping for rooms whose invite has not come through yet.
///
/// Two maps kept in lock step: every room with a queue is indexed under the
/// recipient awaiting it, and a recipient entry exists exactly as long as at
/// least one of their rooms is pending. All access happens under the
/// delivery service's lock, so no interior synchronization here.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    /// room_id -> deferred sends in enqueue order
    room_queues: HashMap<RoomId, VecDeque<DeferredSend>>,
    /// recipient -> rooms with an outstanding invite. Almost always a single
    /// room; independent dispatches racing before one existed can leave more.
    recipient_rooms: HashMap<UserId, SmallVec<[RoomId; 1]>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly created room awaiting its first deferred send
    pub fn register_room(&mut self, room: RoomId) {
        self.room_queues.entry(room).or_default();
    }

    /// First room `recipient` is still waiting on, if any
    pub fn first_pending_room(&self, recipient: &UserId) -> Option<&RoomId> {
        self.recipient_rooms
            .get(recipient)
            .and_then(|rooms| rooms.first())
    }

    /// Queue `send` for its room and index the room under `recipient`
    pub fn enqueue(&mut self, recipient: &UserId, send: DeferredSend) {
        let room = send.room().clone();

        self.room_queues.entry(room.clone()).or_default().push_back(send);

        let rooms = self.recipient_rooms.entry(recipient.clone()).or_default();
        if !rooms.contains(&room) {
            rooms.push(room);
        }
    }

    /// Whether `room` has a pending queue
    pub fn has_room(&self, room: &RoomId) -> bool {
        self.room_queues.contains_key(room)
    }

    /// Whether `recipient` is waiting on `room` specifically
    pub fn is_pending_for(&self, recipient: &UserId, room: &RoomId) -> bool {
        self.recipient_rooms
            .get(recipient)
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// Remove and return the whole queue for `room`
    pub fn take_queue(&mut self, room: &RoomId) -> Option<VecDeque<DeferredSend>> {
        self.room_queues.remove(room)
    }

    /// Drop `room` from `recipient`'s pending set, removing the recipient
    /// entry once it holds no rooms
    pub fn release_room(&mut self, recipient: &UserId, room: &RoomId) {
        if let Some(rooms) = self.recipient_rooms.get_mut(recipient) {
            rooms.retain(|r| r != room);
            if rooms.is_empty() {
                self.recipient_rooms.remove(recipient);
            }
        }
    }

    /// Number of rooms with a pending queue
    pub fn room_count(&self) -> usize {
        self.room_queues.len()
    }

    /// Number of recipients with at least one pending room
    pub fn recipient_count(&self) -> usize {
        self.recipient_rooms.len()
    }

    /// Total sends parked across all pending rooms
    pub fn queued_sends(&self) -> usize {
        self.room_queues.values().map(VecDeque::len).sum()
    }
}
