//! In-process broadcast bus for cross-script signaling.
//!
//! Scripts publish [`ChannelMessage`]s tagged with a channel name and the
//! sender's session identity; subscribers receive only the channel they
//! asked for. The bus is a thin wrapper over `tokio::sync::broadcast`, so
//! delivery is fan-out and slow subscribers can lag (lagged messages are
//! dropped with a warning, never blocking the publisher).

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Identity of the local avatar session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A broadcast message: channel name, raw body, and sender identity.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub channel: String,
    pub body: String,
    pub sender: SessionId,
    pub timestamp: DateTime<Local>,
}

impl ChannelMessage {
    pub fn new(channel: impl Into<String>, body: impl Into<String>, sender: SessionId) -> Self {
        Self {
            channel: channel.into(),
            body: body.into(),
            sender,
            timestamp: Local::now(),
        }
    }
}

impl fmt::Display for ChannelMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.body.chars().take(32).collect();
        write!(f, "{} [{}] {}", self.timestamp, self.channel, preview)
    }
}

/// Fan-out message bus shared by every script in the process.
#[derive(Debug, Clone)]
pub struct MessageBus {
    sender: broadcast::Sender<ChannelMessage>,
}

impl MessageBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes a message to every live subscriber.
    ///
    /// Returns the number of subscribers the message reached. Zero
    /// subscribers is not an error; the message is simply dropped.
    pub fn publish(&self, message: ChannelMessage) -> usize {
        match self.sender.send(message) {
            Ok(count) => count,
            Err(broadcast::error::SendError(message)) => {
                debug!("No subscribers for message: {}", message);
                0
            }
        }
    }

    /// Subscribes to a named channel.
    ///
    /// The returned [`Subscription`] filters out other channels on receive.
    /// Unsubscribing is dropping the subscription.
    pub fn subscribe(&self, channel: impl Into<String>) -> Subscription {
        let channel = channel.into();
        debug!("New subscription on channel: {}", channel);
        Subscription {
            channel,
            receiver: self.sender.subscribe(),
        }
    }
}

/// A live subscription to one named channel.
pub struct Subscription {
    channel: String,
    receiver: broadcast::Receiver<ChannelMessage>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Receives the next message addressed to this subscription's channel.
    ///
    /// Returns `None` once the bus has shut down. Lagged messages are
    /// skipped with a warning.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message.channel == self.channel => return Some(message),
                Ok(message) => {
                    debug!(
                        "Skipping message for channel {} (subscribed to {})",
                        message.channel, self.channel
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscription on {} lagged, dropped {} messages",
                        self.channel, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_matching_channel_only() {
        let bus = MessageBus::new(16);
        let mut subscription = bus.subscribe("hands");

        let sender = SessionId::new("avatar-1");
        bus.publish(ChannelMessage::new("other", "ignored", sender.clone()));
        bus.publish(ChannelMessage::new("hands", "hello", sender.clone()));

        let message = subscription.recv().await.expect("bus still open");
        assert_eq!(message.channel, "hands");
        assert_eq!(message.body, "hello");
        assert_eq!(message.sender, sender);
    }

    #[tokio::test]
    async fn publish_without_subscribers_reaches_nobody() {
        let bus = MessageBus::new(16);
        let reached = bus.publish(ChannelMessage::new(
            "hands",
            "{}",
            SessionId::new("avatar-1"),
        ));
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn recv_returns_none_after_bus_drop() {
        let bus = MessageBus::new(16);
        let mut subscription = bus.subscribe("hands");
        drop(bus);
        assert!(subscription.recv().await.is_none());
    }
}
