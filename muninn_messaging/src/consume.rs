use std::sync::Arc;

use muninn_core::{
    consumer::{Consumer, ConsumerId, DeliverySender},
    error::BrokerError,
    queue::{QueueDeletion, QueueEvent, QueueName},
    Broker,
};
use tracing::{debug, info};

use crate::Result;

/// Registers a consumer on a queue and wakes the queue's worker so
/// messages already waiting reach the new consumer.
pub fn consume(
    broker: &Broker,
    queue_name: &str,
    consumer_tag: &str,
    delivery_send: DeliverySender,
) -> Result<Consumer> {
    let consumer_tag = if consumer_tag.is_empty() {
        muninn_core::random_uuid().to_string()
    } else {
        consumer_tag.to_owned()
    };

    let queue = broker
        .lock()
        .queues
        .get(queue_name)
        .cloned()
        .ok_or_else(|| BrokerError::QueueNotFound(QueueName::new(queue_name.into())))?;

    let consumer = Consumer {
        id: ConsumerId::random(),
        tag: consumer_tag.clone(),
        queue: Arc::clone(&queue),
        delivery_send,
    };

    queue.consumers.lock().insert(consumer.id, consumer.clone());

    // If the event channel is full the worker has work pending anyway and
    // flushes on the next event.
    let _ = queue.event_send.try_send(QueueEvent::DeliverPending);

    info!(%queue_name, %consumer_tag, "Consumer started consuming");

    Ok(consumer)
}

/// Unregisters a consumer. An auto-delete queue loses its registration
/// and shuts down when the last consumer cancels.
pub async fn cancel(broker: &Broker, consumer: &Consumer) {
    let queue = &consumer.queue;

    let remaining = {
        let mut consumers = queue.consumers.lock();
        consumers.remove(&consumer.id);
        consumers.len()
    };

    debug!(queue = %queue.name, tag = %consumer.tag, "Consumer cancelled");

    if remaining == 0 && matches!(queue.deletion, QueueDeletion::Auto) {
        broker.lock().queues.remove(&queue.name);
        let _ = queue.event_send.send(QueueEvent::Shutdown).await;
    }
}
