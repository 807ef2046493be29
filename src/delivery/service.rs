use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::client::{ChatClient, Membership, MembershipEvent, RoomId, UserId};
use crate::config::DeliveryConfig;
use crate::error::{DeliveryError, Result};
use crate::shutdown::ShutdownCoordinator;

use super::dedup::RecentEventCache;
use super::payload::{DeferredSend, Payload};
use super::registry::PendingRegistry;

/// Snapshot of the queue's bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStats {
    /// Rooms with a pending queue
    pub pending_rooms: usize,
    /// Recipients with at least one pending room
    pub pending_recipients: usize,
    /// Sends parked across all pending rooms
    pub queued_sends: usize,
    /// Declared sends not yet completed (queued, in flight, or not yet
    /// dispatched by the host)
    pub outstanding: usize,
    /// Membership-event ids currently remembered for duplicate suppression
    pub seen_events: usize,
}

/// Everything `send` and `on_membership` read or mutate, behind one mutex.
///
/// The lock is held across the room-creation and send awaits. That is what
/// keeps concurrent dispatches from creating two rooms for one recipient,
/// and a flush from interleaving with a send into the same room; do not
/// split this into finer-grained locks.
struct QueueState {
    registry: PendingRegistry,
    seen: RecentEventCache,
    outstanding: usize,
}

impl QueueState {
    /// Account one finished send (delivered or abandoned after acceptance)
    /// and fire the shutdown signal on the edge to zero.
    fn complete_send(&mut self, shutdown: &ShutdownCoordinator) {
        assert!(self.outstanding > 0, "outstanding send count underflow");
        self.outstanding -= 1;
        if self.outstanding == 0 {
            shutdown.trigger();
        }
    }
}

/// Guarantees payloads reach a direct room with their recipient.
///
/// Payloads for an established room are sent immediately. When no room with
/// the recipient exists yet, the service creates one, invites them, parks the
/// send, and flushes everything parked for that room in order once the invite
/// event comes back on the membership stream. Each accepted payload is
/// executed at most once.
pub struct DeliveryService {
    client: Arc<dyn ChatClient>,
    config: DeliveryConfig,
    state: Mutex<QueueState>,
    shutdown: ShutdownCoordinator,
}

impl DeliveryService {
    /// Create a service with default configuration
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self::with_config(client, DeliveryConfig::default())
    }

    /// Create a service with custom configuration
    pub fn with_config(client: Arc<dyn ChatClient>, config: DeliveryConfig) -> Self {
        let state = QueueState {
            registry: PendingRegistry::new(),
            seen: RecentEventCache::new(config.dedup_capacity),
            outstanding: 0,
        };
        Self {
            client,
            config,
            state: Mutex::new(state),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Declare `count` payloads as outstanding before dispatching them.
    ///
    /// The membership listener keeps running until every declared payload
    /// has finished. A payload abandoned by a failed room creation never
    /// finishes; the caller sees the error from [`DeliveryService::send`]
    /// and decides what to do with the batch.
    pub async fn add_outstanding(&self, count: usize) {
        let mut state = self.state.lock().await;
        state.outstanding += count;
        tracing::debug!(
            added = count,
            outstanding = state.outstanding,
            "Declared outstanding sends"
        );
    }

    /// Receiver for the all-work-done signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Whether the all-work-done signal has fired
    pub fn is_finished(&self) -> bool {
        self.shutdown.triggered()
    }

    /// Snapshot of the current bookkeeping
    pub async fn stats(&self) -> DeliveryStats {
        let state = self.state.lock().await;
        DeliveryStats {
            pending_rooms: state.registry.room_count(),
            pending_recipients: state.registry.recipient_count(),
            queued_sends: state.registry.queued_sends(),
            outstanding: state.outstanding,
            seen_events: state.seen.len(),
        }
    }

    /// Deliver `payload` to `recipient`, creating a direct room and inviting
    /// them when none exists yet.
    ///
    /// Returns the room the payload was sent to or parked in. A parked send
    /// is executed by [`DeliveryService::on_membership`] once the invite for
    /// its room arrives; callers that already know the target room pass it
    /// as `existing_room` and skip every lookup.
    #[tracing::instrument(
        name = "delivery.send",
        skip(self, payload),
        fields(
            recipient = %recipient,
            payload_kind = payload.kind()
        )
    )]
    pub async fn send(
        &self,
        recipient: &UserId,
        payload: Payload,
        existing_room: Option<RoomId>,
        room_name: &str,
    ) -> Result<RoomId> {
        // One guard for the whole call, held across the awaits below. A
        // second send for the same recipient blocks here until this one has
        // either found a room or registered the one it created.
        let mut state = self.state.lock().await;

        let (room_id, room_ready) = match existing_room {
            Some(room) => (room, true),
            None => self.resolve_room(&mut state, recipient, room_name).await?,
        };

        let send = DeferredSend::new(room_id.clone(), payload);

        if room_ready {
            let send_id = send.id();
            let outcome = send.execute(self.client.as_ref()).await;
            state.complete_send(&self.shutdown);

            if let Err(source) = outcome {
                // No retry: the payload is spent and the failure goes to
                // the caller.
                tracing::warn!(
                    send_id = %send_id,
                    room = %room_id,
                    error = %source,
                    "Immediate send failed"
                );
                return Err(DeliveryError::Send { room: room_id, source });
            }

            tracing::debug!(send_id = %send_id, room = %room_id, "Sent immediately");
        } else {
            tracing::debug!(
                send_id = %send.id(),
                room = %room_id,
                "Parked send until the room's invite arrives"
            );
            state.registry.enqueue(recipient, send);
        }

        Ok(room_id)
    }

    /// Find or create the room for `recipient`.
    ///
    /// Resolution order: a direct room the client already shares with them,
    /// then a room this service is still awaiting an invite for, then a new
    /// room. Only the first case is ready for immediate sends.
    async fn resolve_room(
        &self,
        state: &mut QueueState,
        recipient: &UserId,
        room_name: &str,
    ) -> Result<(RoomId, bool)> {
        if let Some(room) = self.client.find_direct_room(recipient) {
            tracing::debug!(room = %room, "Using established direct room");
            return Ok((room, true));
        }

        if let Some(room) = state.registry.first_pending_room(recipient) {
            tracing::debug!(room = %room, "Reusing room already awaiting its invite");
            return Ok((room.clone(), false));
        }

        let room = self
            .client
            .create_direct_room(recipient, room_name)
            .await
            .map_err(|source| {
                tracing::error!(error = %source, "Failed to create direct room");
                DeliveryError::RoomCreation {
                    recipient: recipient.clone(),
                    source,
                }
            })?;

        tracing::info!(room = %room, "Created direct room, invite underway");
        state.registry.register_room(room.clone());

        Ok((room, false))
    }

    /// React to a membership-change notification.
    ///
    /// Duplicate, stale, foreign-sender, non-invite, and irrelevant events
    /// are discarded without touching the queue. An invite this client sent,
    /// for a room with a pending queue, flushes that queue: every parked
    /// send executes in enqueue order, failures are logged and skipped, and
    /// the room and (if emptied) recipient bookkeeping is dropped.
    #[tracing::instrument(
        name = "delivery.on_membership",
        skip(self, event),
        fields(
            event_id = %event.event_id,
            room = %event.room_id,
            membership = ?event.membership
        )
    )]
    pub async fn on_membership(&self, event: MembershipEvent) {
        let mut state = self.state.lock().await;

        state.seen.trim();
        if !state.seen.should_process(&event.event_id) {
            tracing::debug!("Skipping already-processed membership event");
            return;
        }

        let max_age = chrono::Duration::seconds(self.config.max_event_age_secs as i64);
        if event.age() > max_age {
            tracing::debug!(
                age_ms = event.age().num_milliseconds(),
                "Ignoring stale membership event"
            );
            return;
        }

        if event.sender != *self.client.user_id() {
            tracing::debug!(sender = %event.sender, "Ignoring membership event from another sender");
            return;
        }

        if event.membership != Membership::Invite {
            tracing::debug!("Ignoring non-invite membership event");
            return;
        }

        if !state.registry.has_room(&event.room_id) {
            tracing::debug!("No sends waiting on this room");
            return;
        }

        let recipient = &event.state_key;
        if !state.registry.is_pending_for(recipient, &event.room_id) {
            tracing::debug!(recipient = %recipient, "Invited user has nothing pending for this room");
            return;
        }

        let Some(queue) = state.registry.take_queue(&event.room_id) else {
            return;
        };

        tracing::info!(
            recipient = %recipient,
            queued = queue.len(),
            "Invite arrived, flushing parked sends"
        );

        for send in queue {
            let send_id = send.id();
            let waited_ms = send.queued_for().num_milliseconds();

            match send.execute(self.client.as_ref()).await {
                Ok(()) => {
                    tracing::debug!(send_id = %send_id, waited_ms = waited_ms, "Parked send delivered");
                }
                Err(error) => {
                    // Skipped, not retried: the rest of the queue still runs.
                    tracing::warn!(send_id = %send_id, error = %error, "Parked send failed");
                }
            }

            state.complete_send(&self.shutdown);
        }

        state.registry.release_room(recipient, &event.room_id);

        tracing::debug!(
            pending_rooms = state.registry.room_count(),
            outstanding = state.outstanding,
            "Room queue flushed"
        );
    }
}
