use std::{
    borrow::Borrow,
    collections::{HashMap, VecDeque},
    fmt::{Debug, Formatter},
    sync::Arc,
};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{
    consumer::{Consumer, ConsumerId},
    message::Message,
    newtype, newtype_id,
};

pub type Queue = Arc<QueueInner>;

#[derive(Debug)]
pub enum QueueEvent {
    /// A fanned-out copy published to this queue.
    Publish(Message),
    /// A failed delivery coming back; goes to the front of the store.
    Requeue(Message),
    /// Wake-up after a consumer registered, so waiting messages move.
    DeliverPending,
    Shutdown,
}

pub type QueueEventSender = mpsc::Sender<QueueEvent>;
pub type QueueEventReceiver = mpsc::Receiver<QueueEvent>;

newtype_id!(pub QueueId);

newtype!(
    /// The name of a queue. A newtype wrapper around `Arc<str>`, which guarantees cheap clones.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub QueueName: Arc<str>
);

impl Borrow<str> for QueueName {
    fn borrow(&self) -> &str {
        Borrow::borrow(&self.0)
    }
}

#[derive(Debug)]
pub struct QueueInner {
    pub id: QueueId,
    /// The visible name of the queue
    pub name: QueueName,
    pub messages: MessageStore,
    /// Whether the queue should be kept when the server restarts
    pub durable: bool,
    /// Auto-delete queues shut down once their last consumer cancels
    pub deletion: QueueDeletion,
    pub consumers: Mutex<HashMap<ConsumerId, Consumer>>,
    pub event_send: QueueEventSender,
}

#[derive(Debug)]
pub enum QueueDeletion {
    Auto,
    Manual,
}

/// Messages awaiting delivery, oldest first. Redeliveries go back to the
/// front so a failed message keeps its place in line.
pub struct MessageStore {
    deque: Mutex<VecDeque<Message>>,
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deque: Mutex::default(),
        }
    }

    pub fn append(&self, message: Message) {
        self.deque.lock().push_back(message);
    }

    pub fn requeue_front(&self, message: Message) {
        self.deque.lock().push_front(message);
    }

    #[must_use]
    pub fn try_next(&self) -> Option<Message> {
        self.deque.lock().pop_front()
    }

    /// Takes every stored message out, front first. Used on shutdown so
    /// the worker can release each one.
    #[must_use]
    pub fn drain(&self) -> VecDeque<Message> {
        std::mem::take(&mut *self.deque.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deque.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MessageStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::MessageStore;
    use crate::{
        chunk::ContentChunk,
        message::{Message, MessageId, Metadata},
    };

    fn message(id: u64) -> Message {
        let mut message = Message::new(Metadata::new(MessageId::new(id), "x", "a"));
        message.add_chunk(ContentChunk::new(Bytes::from_static(b"body")));
        message
    }

    #[test]
    fn append_is_fifo() {
        let store = MessageStore::new();
        store.append(message(1));
        store.append(message(2));

        assert_eq!(store.len(), 2);
        assert_eq!(store.try_next().unwrap().metadata().id(), MessageId::new(1));
        assert_eq!(store.try_next().unwrap().metadata().id(), MessageId::new(2));
        assert!(store.try_next().is_none());
    }

    #[test]
    fn requeue_front_takes_priority() {
        let store = MessageStore::new();
        store.append(message(1));
        store.requeue_front(message(2));

        assert_eq!(store.try_next().unwrap().metadata().id(), MessageId::new(2));
        assert_eq!(store.try_next().unwrap().metadata().id(), MessageId::new(1));
    }

    #[test]
    fn drain_empties_the_store() {
        let store = MessageStore::new();
        store.append(message(1));
        store.append(message(2));

        let drained = store.drain();
        assert_eq!(drained.len(), 2);
        assert!(store.is_empty());
    }
}
