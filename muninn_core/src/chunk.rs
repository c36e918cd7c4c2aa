use std::sync::Arc;

use bytes::Bytes;

/// One unit of message body bytes.
///
/// The payload lives in shared, atomically reference-counted storage and
/// never changes after creation. Cloning a handle retains the storage —
/// the count moves together with handle creation, so an uncounted copy
/// cannot exist. The storage is freed when the last handle goes, exactly
/// once. Releasing a handle more often than it was retained cannot be
/// written: [`release`](ContentChunk::release) consumes the handle.
#[derive(Debug)]
pub struct ContentChunk {
    storage: Arc<ChunkStorage>,
}

#[derive(Debug)]
struct ChunkStorage {
    payload: Bytes,
}

impl ContentChunk {
    #[must_use]
    pub fn new(payload: Bytes) -> Self {
        Self {
            storage: Arc::new(ChunkStorage { payload }),
        }
    }

    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.storage.payload
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.payload.is_empty()
    }

    /// Number of live handles sharing this chunk's storage.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.storage)
    }

    /// Gives this handle's reference back. Dropping a handle has the same
    /// effect; `release` spells the discipline out at the call site.
    pub fn release(self) {
        drop(self.storage);
    }
}

impl Clone for ContentChunk {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::ContentChunk;

    #[test]
    fn clone_shares_storage() {
        let chunk = ContentChunk::new(Bytes::from_static(b"hello"));
        let copy = chunk.clone();

        assert_eq!(chunk.payload(), copy.payload());
        assert_eq!(chunk.payload().as_ptr(), copy.payload().as_ptr());
    }

    #[test]
    fn clone_and_release_move_the_count() {
        let chunk = ContentChunk::new(Bytes::from_static(b"body"));
        assert_eq!(chunk.ref_count(), 1);

        let copy = chunk.clone();
        let another = chunk.clone();
        assert_eq!(chunk.ref_count(), 3);

        copy.release();
        assert_eq!(chunk.ref_count(), 2);

        another.release();
        assert_eq!(chunk.ref_count(), 1);
    }

    #[test]
    fn payload_survives_sibling_release() {
        let chunk = ContentChunk::new(Bytes::from_static(b"payload"));
        let copy = chunk.clone();

        chunk.release();

        assert_eq!(copy.payload().as_ref(), b"payload");
        assert_eq!(copy.ref_count(), 1);
    }

    #[test]
    fn empty_chunk() {
        let chunk = ContentChunk::new(Bytes::new());
        assert!(chunk.is_empty());
        assert_eq!(chunk.len(), 0);
    }
}
