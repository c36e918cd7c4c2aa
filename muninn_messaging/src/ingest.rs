use bytes::Bytes;
use muninn_core::{
    chunk::ContentChunk,
    message::{Message, Metadata},
};
use tracing::trace;

/// Assembles the canonical message from a publisher's body frames.
///
/// Every frame becomes one content chunk; the chunk order is the frame
/// arrival order and is preserved verbatim across every later copy.
pub fn ingest<I>(metadata: Metadata, frames: I) -> Message
where
    I: IntoIterator<Item = Bytes>,
{
    let mut message = Message::new(metadata);
    for frame in frames {
        message.add_chunk(ContentChunk::new(frame));
    }
    trace!(
        id = %message.metadata().id(),
        chunks = message.content_chunks().len(),
        "Ingested message"
    );
    message
}
