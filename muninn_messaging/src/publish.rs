use muninn_core::{
    error::BrokerError,
    message::Message,
    queue::{Queue, QueueEvent},
    Broker,
};
use tracing::{debug, error};

use crate::Result;

/// Distributes one canonical message to every matched destination queue.
///
/// Each destination receives an independently tracked copy carrying a
/// fresh internal id, the same routing key, and the queue's name as its
/// destination; every copy starts its own delivery history. The canonical
/// message is released once distribution is done, whether or not every
/// hand-off succeeded.
pub fn publish(broker: &Broker, mut message: Message, destinations: &[Queue]) -> Result<()> {
    debug!(
        id = %message.metadata().id(),
        destinations = destinations.len(),
        "Publishing message"
    );

    let result = fan_out(broker, &message, destinations);
    message.release();
    result
}

fn fan_out(broker: &Broker, message: &Message, destinations: &[Queue]) -> Result<()> {
    for queue in destinations {
        let copy = message.shallow_copy_with(
            broker.next_message_id(),
            message.metadata().routing_key(),
            queue.name.to_string(),
        );

        // A copy that never reaches its queue is dropped here, which
        // hands its chunk references back.
        queue
            .event_send
            .try_send(QueueEvent::Publish(copy))
            .map_err(|err| {
                error!(?err, queue = %queue.name, "Failed to hand message to queue");
                BrokerError::QueueUnavailable(queue.name.clone())
            })?;
    }
    Ok(())
}
