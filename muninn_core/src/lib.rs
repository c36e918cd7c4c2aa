#![warn(rust_2018_idioms)]

pub mod chunk;
pub mod consumer;
pub mod error;
mod macros;
pub mod message;
pub mod queue;

use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    message::{MessageId, MessageIdGenerator},
    queue::{Queue, QueueName},
};

pub type SingleVec<T> = smallvec::SmallVec<[T; 1]>;

/// The broker's shared state: the queue registry and the internal
/// message id source. Cheap to clone, all handles point at the same state.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<Mutex<BrokerInner>>,
    message_ids: Arc<MessageIdGenerator>,
}

impl Debug for Broker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[broker]")
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BrokerInner {
                queues: HashMap::new(),
            })),
            message_ids: Arc::new(MessageIdGenerator::new()),
        }
    }
}

impl Broker {
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, BrokerInner> {
        self.inner.lock()
    }

    /// Allocates a fresh internal id. Each queue-local copy of a message
    /// gets its own id so acknowledgement tracking can tell them apart.
    #[must_use]
    pub fn next_message_id(&self) -> MessageId {
        self.message_ids.next()
    }
}

#[derive(Debug)]
pub struct BrokerInner {
    pub queues: HashMap<QueueName, Queue>,
}

pub fn random_uuid() -> Uuid {
    Uuid::from_bytes(rand::random())
}
