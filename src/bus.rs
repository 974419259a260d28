use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{
    unbounded_channel, UnboundedReceiver, UnboundedSender,
};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{timeout, Duration};

use crate::async_result::AsyncResult;
use crate::message::SmsMessage;

/// Lifecycle events for messages passing through the server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MessageSubmitted,
    MessageDelivered,
    MessageFailed,
    MessageExpired,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SmsEvent {
    pub event_type: EventType,
    pub message_id: String,
    pub data: HashMap<String, String>,
}

impl SmsEvent {
    pub fn new(event_type: EventType, message_id: &str) -> Self {
        Self {
            event_type,
            message_id: String::from(message_id),
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(String::from(key), String::from(value));
        self
    }
}

/// Fan-out stream of SmsEvents.  Every subscriber receives every event
/// emitted after it subscribed, so several adapters (and tests) can watch
/// the same bus.  Cheaply cloneable; clones share the subscriber list.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<UnboundedSender<SmsEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<SmsEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    pub fn emit(&self, event: SmsEvent) {
        // Drop subscribers whose receiving side has gone away
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// The two unbounded FIFO queues connecting the server to its upstream:
/// incoming carries messages received from ESMEs, outgoing supplies
/// messages for delivery to bound receivers.
pub struct SmsQueue {
    incoming_tx: UnboundedSender<SmsMessage>,
    incoming_rx: AsyncMutex<UnboundedReceiver<SmsMessage>>,
    outgoing_tx: UnboundedSender<SmsMessage>,
    outgoing_rx: AsyncMutex<UnboundedReceiver<SmsMessage>>,
}

impl SmsQueue {
    pub fn new() -> Self {
        let (incoming_tx, incoming_rx) = unbounded_channel();
        let (outgoing_tx, outgoing_rx) = unbounded_channel();
        Self {
            incoming_tx,
            incoming_rx: AsyncMutex::new(incoming_rx),
            outgoing_tx,
            outgoing_rx: AsyncMutex::new(outgoing_rx),
        }
    }

    /// Queue a message for delivery to a bound receiver.
    pub fn send(&self, sms: SmsMessage) -> AsyncResult<()> {
        self.outgoing_tx
            .send(sms)
            .map_err(|_| "outgoing SMS queue closed".into())
    }

    /// Take the next message received from an ESME.
    pub async fn receive(&self) -> Option<SmsMessage> {
        self.incoming_rx.lock().await.recv().await
    }

    pub fn push_incoming(&self, sms: SmsMessage) -> AsyncResult<()> {
        self.incoming_tx
            .send(sms)
            .map_err(|_| "incoming SMS queue closed".into())
    }

    /// Wait up to `wait` for an outgoing message.  None means the poll
    /// tick elapsed, so the caller can observe shutdown.
    pub async fn poll_outgoing(&self, wait: Duration) -> Option<SmsMessage> {
        let mut rx = self.outgoing_rx.lock().await;
        timeout(wait, rx.recv()).await.ok().flatten()
    }
}

impl Default for SmsQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_outgoing_messages_come_back_in_order() {
        let queue = SmsQueue::new();
        queue.send(SmsMessage::new("1", "2", "first")).unwrap();
        queue.send(SmsMessage::new("1", "2", "second")).unwrap();

        let a = queue.poll_outgoing(Duration::from_millis(10)).await.unwrap();
        let b = queue.poll_outgoing(Duration::from_millis(10)).await.unwrap();
        assert_eq!(a.message, "first");
        assert_eq!(b.message, "second");
    }

    #[tokio::test]
    async fn poll_outgoing_times_out_when_queue_is_empty() {
        let queue = SmsQueue::new();
        assert!(queue
            .poll_outgoing(Duration::from_millis(10))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(SmsEvent::new(EventType::MessageDelivered, "abc123"));

        assert_eq!(first.recv().await.unwrap().message_id, "abc123");
        assert_eq!(second.recv().await.unwrap().message_id, "abc123");
    }

    #[tokio::test]
    async fn dropped_subscribers_are_forgotten() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        drop(first);
        bus.emit(SmsEvent::new(EventType::MessageSubmitted, "abc123"));

        let mut second = bus.subscribe();
        bus.emit(SmsEvent::new(EventType::MessageFailed, "def456"));
        assert_eq!(second.recv().await.unwrap().message_id, "def456");
    }
}
