use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{message::MessageId, newtype_id, queue::Queue, SingleVec};

newtype_id!(pub ConsumerId);

#[derive(Debug, Clone)]
pub struct Consumer {
    pub id: ConsumerId,
    pub tag: String,
    pub queue: Queue,
    pub delivery_send: DeliverySender,
}

/// What a consumer receives: this copy's delivery metadata and a view of
/// the body. The body bytes are shared with the chunk storage; the queue's
/// own handles are released once the delivery is handed off.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub consumer_tag: String,
    pub message_id: MessageId,
    pub exchange: String,
    pub routing_key: String,
    pub destination: String,
    pub redelivered: bool,
    pub redelivery_count: u32,
    pub body: SingleVec<Bytes>,
}

pub type DeliverySender = mpsc::Sender<Delivery>;
pub type DeliveryReceiver = mpsc::Receiver<Delivery>;
