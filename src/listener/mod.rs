//! Run loop over the membership notification stream.
//!
//! The host bridges its client's membership callbacks into a stream or an
//! mpsc channel; the listener drains it into
//! [`DeliveryService::on_membership`] until the service reports that every
//! declared payload has finished, then stops.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;

use crate::client::MembershipEvent;
use crate::delivery::DeliveryService;

/// Drives the delivery service from a stream of membership events
pub struct MembershipListener {
    service: Arc<DeliveryService>,
    shutdown: broadcast::Receiver<()>,
}

impl MembershipListener {
    /// Create a listener for `service`.
    ///
    /// Subscribes to the shutdown signal immediately, so construct the
    /// listener before dispatching the batch.
    pub fn new(service: Arc<DeliveryService>) -> Self {
        let shutdown = service.subscribe_shutdown();
        Self { service, shutdown }
    }

    /// Consume `events` until all outstanding work is done or the stream
    /// ends.
    ///
    /// Each event is handled to completion before the next is read, so
    /// cancellation never lands mid-flush; it only stops further iterations.
    pub async fn run<S>(mut self, mut events: S)
    where
        S: Stream<Item = MembershipEvent> + Unpin,
    {
        // The batch may have drained before the loop ever started; the
        // broadcast signal from that is not replayed to late subscribers.
        if self.service.is_finished() {
            tracing::info!("All work already finished, listener not starting");
            return;
        }

        tracing::info!("Membership listener started");

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("All sends finished, stopping listener");
                    break;
                }
                event = events.next() => {
                    match event {
                        Some(event) => self.service.on_membership(event).await,
                        None => {
                            tracing::warn!("Membership event stream ended");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Membership listener stopped");
    }

    /// Convenience for hosts that bridge membership callbacks through an
    /// mpsc channel
    pub async fn run_channel(self, events: mpsc::Receiver<MembershipEvent>) {
        self.run(ReceiverStream::new(events)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;

    use crate::client::{ChatClient, ClientError, FileKind, RoomId, UserId};

    use super::*;

    struct NoopClient {
        own_id: UserId,
    }

    #[async_trait]
    impl ChatClient for NoopClient {
        fn user_id(&self) -> &UserId {
            &self.own_id
        }

        fn find_direct_room(&self, _recipient: &UserId) -> Option<RoomId> {
            Some(RoomId::from("!direct:example.org"))
        }

        async fn create_direct_room(
            &self,
            _recipient: &UserId,
            _display_name: &str,
        ) -> Result<RoomId, ClientError> {
            Ok(RoomId::from("!created:example.org"))
        }

        async fn send_text(&self, _room: &RoomId, _body: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn send_file(
            &self,
            _room: &RoomId,
            _path: &Path,
            _kind: FileKind,
        ) -> Result<(), ClientError> {
            Ok(())
        }
    }

    fn noop_service() -> Arc<DeliveryService> {
        Arc::new(DeliveryService::new(Arc::new(NoopClient {
            own_id: UserId::from("@bot:example.org"),
        })))
    }

    #[tokio::test]
    async fn test_listener_stops_when_stream_ends() {
        let listener = MembershipListener::new(noop_service());
        let (tx, rx) = mpsc::channel(4);
        drop(tx);

        // Returns instead of hanging on a closed channel
        listener.run_channel(rx).await;
    }

    #[tokio::test]
    async fn test_listener_skips_run_after_batch_already_drained() {
        let service = noop_service();

        // One payload into an established room drains the batch immediately
        service.add_outstanding(1).await;
        service
            .send(
                &UserId::from("@alice:example.org"),
                crate::delivery::Payload::text("hi"),
                None,
                "bot chat",
            )
            .await
            .unwrap();
        assert!(service.is_finished());

        // Subscribed after the signal fired, so the broadcast message is
        // gone; the channel stays open; only the pre-loop check can end this.
        let listener = MembershipListener::new(service.clone());
        let (_tx, rx) = mpsc::channel(4);
        listener.run_channel(rx).await;
    }
}
