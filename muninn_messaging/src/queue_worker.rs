use std::borrow::Borrow;

use muninn_core::{
    consumer::Delivery,
    message::Message,
    queue::{Queue, QueueEvent, QueueEventReceiver},
};
use tracing::{debug, info};

/// Runs the delivery loop of one queue: accepts published copies, moves
/// them to a consumer when one can take them, and stores them otherwise.
#[derive(Debug)]
pub struct QueueTask {
    event_recv: QueueEventReceiver,
    queue: Queue,
}

impl QueueTask {
    fn show_name(&self) -> &str {
        self.queue.name.borrow()
    }

    pub fn new(event_recv: QueueEventReceiver, queue: Queue) -> Self {
        Self { event_recv, queue }
    }

    #[tracing::instrument(skip(self), fields(name = self.show_name()))]
    pub async fn start(mut self) {
        info!("Started queue worker task");

        loop {
            let next_event = self.event_recv.recv().await;

            match next_event {
                Some(QueueEvent::Publish(message)) => self.handle_publish(message),
                Some(QueueEvent::Requeue(message)) => self.handle_requeue(message),
                Some(QueueEvent::DeliverPending) => self.flush_pending(),
                Some(QueueEvent::Shutdown) | None => {
                    self.cleanup();
                    return;
                }
            }
        }
    }

    #[tracing::instrument(skip(self), fields(name = self.show_name()), level = "debug")]
    fn handle_publish(&mut self, message: Message) {
        self.queue.messages.append(message);
        self.flush_pending();
    }

    #[tracing::instrument(skip(self), fields(name = self.show_name()), level = "debug")]
    fn handle_requeue(&mut self, message: Message) {
        self.queue.messages.requeue_front(message);
        self.flush_pending();
    }

    /// Delivers stored messages in order until none are left or no
    /// consumer can take more.
    fn flush_pending(&mut self) {
        while let Some(message) = self.queue.messages.try_next() {
            if let Err(message) = self.try_deliver(message) {
                self.queue.messages.requeue_front(message);
                break;
            }
        }
    }

    /// Hands the message to the first consumer that can take it. On
    /// success the queue's copy is released; the delivery carries its own
    /// view of the body. On failure the message is handed back.
    #[tracing::instrument(skip(self), level = "trace")]
    fn try_deliver(&self, mut message: Message) -> Result<(), Message> {
        let consumers = self.queue.consumers.lock();
        let Some(consumer) = consumers.values().next() else {
            return Err(message);
        };

        let metadata = message.metadata();
        let delivery = Delivery {
            consumer_tag: consumer.tag.clone(),
            message_id: metadata.id(),
            exchange: metadata.exchange().to_owned(),
            routing_key: metadata.routing_key().to_owned(),
            destination: metadata.destination().to_owned(),
            redelivered: message.is_redelivered(),
            redelivery_count: message.redelivery_count(),
            body: message
                .content_chunks()
                .iter()
                .map(|chunk| chunk.payload().clone())
                .collect(),
        };

        match consumer.delivery_send.try_send(delivery) {
            Ok(()) => {
                drop(consumers);
                message.release();
                Ok(())
            }
            Err(_) => Err(message),
        }
    }

    /// Releases every message still stored when the queue shuts down.
    fn cleanup(&mut self) {
        let stored = self.queue.messages.drain();
        if !stored.is_empty() {
            debug!(name = self.show_name(), count = stored.len(), "Releasing stored messages");
        }
        for mut message in stored {
            message.release();
        }
    }
}
