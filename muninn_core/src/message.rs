use std::{
    fmt::{Display, Formatter},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{chunk::ContentChunk, SingleVec};

/// Broker-internal message identity. Every queue-local copy of a message
/// carries its own id; the id is opaque outside the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(u64);

impl MessageId {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Monotonic source of internal message ids, shared by ingestion and
/// fan-out across threads.
#[derive(Debug)]
pub struct MessageIdGenerator {
    next: AtomicU64,
}

impl MessageIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn next(&self) -> MessageId {
        MessageId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-delivery routing and header information.
///
/// Every [`Message`] owns exactly one `Metadata`. Copies are value copies;
/// two instances never share one. Fields are set at creation (`new` plus
/// the `with_*` builders) and can only be overridden afterwards through
/// [`shallow_copy_with`](Metadata::shallow_copy_with), which re-targets
/// the id, routing key and destination on an otherwise verbatim copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    id: MessageId,
    exchange: String,
    routing_key: String,
    destination: String,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    body_size: u64,
}

impl Metadata {
    #[must_use]
    pub fn new(id: MessageId, exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            id,
            exchange: exchange.into(),
            routing_key: routing_key.into(),
            destination: String::new(),
            headers: Vec::new(),
            content_type: None,
            body_size: 0,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_body_size(mut self, body_size: u64) -> Self {
        self.body_size = body_size;
        self
    }

    /// An independent copy with the identity fields re-targeted and every
    /// other field copied verbatim.
    #[must_use]
    pub fn shallow_copy_with(
        &self,
        id: MessageId,
        routing_key: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id,
            routing_key: routing_key.into(),
            destination: destination.into(),
            exchange: self.exchange.clone(),
            headers: self.headers.clone(),
            content_type: self.content_type.clone(),
            body_size: self.body_size,
        }
    }

    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// The exchange the message was originally published to.
    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    #[must_use]
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// The queue this copy is bound for. Empty until the message has been
    /// fanned out to a destination.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Application headers, in publisher order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn body_size(&self) -> u64 {
        self.body_size
    }
}

/// A message as it moves through the broker: one owned [`Metadata`], the
/// shared body chunks, and this instance's own redelivery state.
///
/// The chunk sequence is append-only while the message is being built and
/// is preserved verbatim across every copy. After fan-out each instance
/// belongs to exactly one queue context; nothing on it needs locking.
/// [`release`](Message::release) must be called exactly once per instance
/// when the holding queue is done with it.
#[derive(Debug)]
pub struct Message {
    metadata: Metadata,
    chunks: SingleVec<ContentChunk>,
    redelivered: bool,
    redelivery_count: u32,
    released: bool,
}

impl Message {
    #[must_use]
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            chunks: SingleVec::new(),
            redelivered: false,
            redelivery_count: 0,
            released: false,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Read-only view of the body chunks, in arrival order.
    #[must_use]
    pub fn content_chunks(&self) -> &[ContentChunk] {
        &self.chunks
    }

    /// Appends a chunk during the build phase. The message takes over the
    /// caller's handle; the chunk is not retained again.
    pub fn add_chunk(&mut self, chunk: ContentChunk) {
        assert!(!self.released, "chunk appended to a released message");
        self.chunks.push(chunk);
    }

    /// Releases every chunk handle this instance holds, exactly once per
    /// chunk. Releasing an instance twice is a broker bug and panics.
    pub fn release(&mut self) {
        assert!(!self.released, "message released twice");
        self.released = true;
        for chunk in self.chunks.drain(..) {
            chunk.release();
        }
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// A copy for re-delivering the same logical delivery attempt: own
    /// metadata, retained chunk handles, and the delivery history carried
    /// over.
    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        assert!(!self.released, "copied a released message");
        Self {
            metadata: self.metadata.clone(),
            chunks: self.chunks.clone(),
            redelivered: self.redelivered,
            redelivery_count: self.redelivery_count,
            released: false,
        }
    }

    /// A copy for delivering to a new destination: re-targeted identity
    /// and a fresh delivery history starting at zero.
    #[must_use]
    pub fn shallow_copy_with(
        &self,
        id: MessageId,
        routing_key: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        assert!(!self.released, "copied a released message");
        Self {
            metadata: self.metadata.shallow_copy_with(id, routing_key, destination),
            chunks: self.chunks.clone(),
            redelivered: false,
            redelivery_count: 0,
            released: false,
        }
    }

    /// Marks this instance redelivered and returns the new attempt count.
    /// Sibling copies are unaffected.
    pub fn set_redeliver(&mut self) -> u32 {
        self.redelivered = true;
        self.redelivery_count += 1;
        self.redelivery_count
    }

    #[must_use]
    pub fn redelivery_count(&self) -> u32 {
        self.redelivery_count
    }

    #[must_use]
    pub fn is_redelivered(&self) -> bool {
        self.redelivered
    }
}
