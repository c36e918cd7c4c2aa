use muninn_core::{
    error::BrokerError,
    message::Message,
    queue::{Queue, QueueEvent},
};
use tracing::{debug, error};

use crate::Result;

/// Requeues a failed delivery at the front of its queue and returns the
/// new attempt count.
///
/// The requeued copy keeps the failed attempt's delivery history and is
/// marked redelivered before it is dispatched again. The failed instance
/// stays with the caller, who still releases it exactly once.
pub fn requeue(queue: &Queue, message: &Message) -> Result<u32> {
    let mut copy = message.shallow_copy();
    let count = copy.set_redeliver();

    debug!(
        id = %copy.metadata().id(),
        count,
        queue = %queue.name,
        "Requeuing failed delivery"
    );

    queue
        .event_send
        .try_send(QueueEvent::Requeue(copy))
        .map_err(|err| {
            error!(?err, queue = %queue.name, "Failed to requeue message");
            BrokerError::QueueUnavailable(queue.name.clone())
        })?;

    Ok(count)
}
