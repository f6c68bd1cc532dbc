use crossbeam_channel::{Receiver, Sender};
use worldsync_common::EntityId;

use crate::message::PlayerSynchronizationMessage;

/// Accepts assembled messages for delivery. Sending is fire-and-forget: the
/// synchronizer never waits on, or learns about, delivery.
pub trait MessageSink: Sync {
    fn send(&self, observer: EntityId, message: PlayerSynchronizationMessage);
}

/// Hands messages to a network layer over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<(EntityId, PlayerSynchronizationMessage)>,
}

impl ChannelSink {
    /// Create a sink and the receiving end the network layer drains.
    pub fn new() -> (Self, Receiver<(EntityId, PlayerSynchronizationMessage)>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, observer: EntityId, message: PlayerSynchronizationMessage) {
        if self.tx.send((observer, message)).is_err() {
            tracing::debug!(%observer, "message receiver gone, dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SynchronizationSegment;
    use worldsync_common::{Directions, Position};

    fn message() -> PlayerSynchronizationMessage {
        PlayerSynchronizationMessage {
            last_known_region: Position::new(0, 0),
            position: Position::new(0, 0),
            region_changed: false,
            segment: SynchronizationSegment::Movement {
                blocks: Default::default(),
                directions: Directions::NONE,
            },
            local_mobs: 0,
            segments: Vec::new(),
        }
    }

    #[test]
    fn channel_sink_delivers() {
        let (sink, rx) = ChannelSink::new();
        sink.send(EntityId(4), message());
        let (observer, received) = rx.try_recv().unwrap();
        assert_eq!(observer, EntityId(4));
        assert_eq!(received, message());
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.send(EntityId(1), message());
    }
}
