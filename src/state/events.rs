use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::events::ServerEvent;

/// Broadcast hub fanning out match events to the SSE streams of that match.
///
/// Channels are created lazily on first subscription and dropped once the
/// last subscriber disconnects, so finished matches do not pin memory.
pub struct MatchEventHub {
    channels: DashMap<Uuid, broadcast::Sender<ServerEvent>>,
    capacity: usize,
}

impl MatchEventHub {
    /// Construct the hub with the per-match broadcast channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Register a subscriber for one match, creating its channel if needed.
    pub fn subscribe(&self, match_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to the subscribers of one match, ignoring delivery
    /// errors. Matches nobody listens to have no channel and cost nothing.
    pub fn broadcast(&self, match_id: Uuid, event: ServerEvent) {
        if let Some(sender) = self.channels.get(&match_id) {
            let _ = sender.send(event);
        }
    }

    /// Drop the channel of a match once its last subscriber is gone.
    pub fn prune(&self, match_id: Uuid) {
        self.channels
            .remove_if(&match_id, |_, sender| sender.receiver_count() == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> ServerEvent {
        ServerEvent {
            event: Some(name.to_string()),
            data: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn subscribers_only_see_their_own_match() {
        let hub = MatchEventHub::new(8);
        let first_match = Uuid::new_v4();
        let second_match = Uuid::new_v4();

        let mut first_rx = hub.subscribe(first_match);
        let mut second_rx = hub.subscribe(second_match);

        hub.broadcast(first_match, event("new-question"));

        let received = first_rx.recv().await.unwrap();
        assert_eq!(received.event.as_deref(), Some("new-question"));
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcasting_without_subscribers_is_a_no_op() {
        let hub = MatchEventHub::new(8);

        // No channel exists yet, so nothing is allocated or sent.
        hub.broadcast(Uuid::new_v4(), event("game-finished"));
    }

    #[tokio::test]
    async fn prune_removes_the_channel_once_everybody_left() {
        let hub = MatchEventHub::new(8);
        let match_id = Uuid::new_v4();

        let rx = hub.subscribe(match_id);
        hub.prune(match_id);
        // Still one live receiver, the channel must survive.
        assert!(hub.channels.contains_key(&match_id));

        drop(rx);
        hub.prune(match_id);
        assert!(!hub.channels.contains_key(&match_id));
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let hub = MatchEventHub::new(8);
        let match_id = Uuid::new_v4();

        let _early = hub.subscribe(match_id);
        hub.broadcast(match_id, event("new-question"));

        let mut late = hub.subscribe(match_id);
        assert!(late.try_recv().is_err());
    }
}
