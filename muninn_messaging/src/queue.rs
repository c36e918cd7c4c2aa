use std::sync::Arc;

use muninn_core::{
    error::BrokerError,
    queue::{MessageStore, Queue, QueueDeletion, QueueEvent, QueueId, QueueInner, QueueName},
    Broker,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{queue_worker::QueueTask, Result};

/// Registers a queue with the broker and starts its worker task.
///
/// Declaring a name that already exists returns the existing queue. An
/// empty name gets a generated one.
pub fn declare(broker: &Broker, name: &str, durable: bool, auto_delete: bool) -> Queue {
    let name = if name.is_empty() {
        format!("q_{}", muninn_core::random_uuid())
    } else {
        name.to_owned()
    };
    let name = QueueName::new(name.into());

    let (event_send, event_recv) = mpsc::channel(16);

    let queue = Arc::new(QueueInner {
        id: QueueId::random(),
        name: name.clone(),
        messages: MessageStore::new(),
        durable,
        deletion: if auto_delete {
            QueueDeletion::Auto
        } else {
            QueueDeletion::Manual
        },
        consumers: Mutex::default(),
        event_send,
    });

    {
        let mut broker_lock = broker.lock();
        if let Some(existing) = broker_lock.queues.get(&name) {
            return Arc::clone(existing);
        }
        broker_lock.queues.insert(name.clone(), Arc::clone(&queue));
    }

    debug!(%name, "Creating queue");

    let queue_task = QueueTask::new(event_recv, Arc::clone(&queue));
    tokio::spawn(async move { queue_task.start().await });

    queue
}

/// Removes the queue from the broker and shuts its worker down. The
/// worker releases every message still stored on the way out.
pub async fn delete(broker: &Broker, name: &str) -> Result<()> {
    let queue = broker
        .lock()
        .queues
        .remove(name)
        .ok_or_else(|| BrokerError::QueueNotFound(QueueName::new(name.into())))?;

    // A closed channel means the worker is already gone.
    let _ = queue.event_send.send(QueueEvent::Shutdown).await;
    Ok(())
}
