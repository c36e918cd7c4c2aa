use std::sync::Arc;

use bytes::Bytes;
use muninn_core::{error::BrokerError, message::Metadata, Broker};
use tokio::sync::mpsc;

use crate::{
    consume::{cancel, consume},
    ingest::ingest,
    publish::publish,
    queue, redelivery,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Yields to the queue workers until `condition` holds.
async fn wait_for(condition: impl Fn() -> bool + Send) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("queue workers never reached the expected state");
}

#[tokio::test]
async fn publish_fans_out_to_all_destinations() {
    init_tracing();
    let broker = Broker::default();
    let q1 = queue::declare(&broker, "q1", false, false);
    let q2 = queue::declare(&broker, "q2", false, false);

    let (send1, mut recv1) = mpsc::channel(8);
    let (send2, mut recv2) = mpsc::channel(8);
    consume(&broker, "q1", "c1", send1).unwrap();
    consume(&broker, "q2", "c2", send2).unwrap();

    let metadata = Metadata::new(broker.next_message_id(), "x", "a").with_body_size(7);
    let message = ingest(
        metadata,
        [Bytes::from_static(b"pay"), Bytes::from_static(b"load")],
    );
    let probe = message.content_chunks()[0].clone();
    let original_id = message.metadata().id();

    publish(&broker, message, &[Arc::clone(&q1), Arc::clone(&q2)]).unwrap();

    let first = recv1.recv().await.unwrap();
    let second = recv2.recv().await.unwrap();

    let expected = [Bytes::from_static(b"pay"), Bytes::from_static(b"load")];
    assert_eq!(first.body.as_slice(), expected.as_slice());
    assert_eq!(second.body.as_slice(), expected.as_slice());

    assert_eq!(first.destination, "q1");
    assert_eq!(second.destination, "q2");
    assert_eq!(first.exchange, "x");
    assert_eq!(first.routing_key, "a");
    assert_eq!(first.consumer_tag, "c1");
    assert!(!first.redelivered);

    assert_ne!(first.message_id, original_id);
    assert_ne!(second.message_id, original_id);
    assert_ne!(first.message_id, second.message_id);

    // Both queue copies and the canonical message have released their
    // handles; only the probe still holds the chunk.
    wait_for(|| probe.ref_count() == 1).await;
}

#[tokio::test]
async fn messages_wait_for_a_consumer() {
    init_tracing();
    let broker = Broker::default();
    let q = queue::declare(&broker, "waiting", false, false);

    let metadata = Metadata::new(broker.next_message_id(), "x", "a");
    let message = ingest(metadata, [Bytes::from_static(b"stored")]);
    publish(&broker, message, &[Arc::clone(&q)]).unwrap();

    wait_for(|| !q.messages.is_empty()).await;

    let (send, mut recv) = mpsc::channel(8);
    consume(&broker, "waiting", "", send).unwrap();

    let delivery = recv.recv().await.unwrap();
    let expected = [Bytes::from_static(b"stored")];
    assert_eq!(delivery.body.as_slice(), expected.as_slice());
    assert!(!delivery.consumer_tag.is_empty());
    assert!(q.messages.is_empty());
}

#[tokio::test]
async fn requeued_message_jumps_the_line() {
    init_tracing();
    let broker = Broker::default();
    let q = queue::declare(&broker, "retries", false, false);

    for body in [Bytes::from_static(b"first"), Bytes::from_static(b"second")] {
        let metadata = Metadata::new(broker.next_message_id(), "x", "a");
        publish(&broker, ingest(metadata, [body]), &[Arc::clone(&q)]).unwrap();
    }

    // A delivery that failed; its copy goes back to the front of the line.
    let metadata = Metadata::new(broker.next_message_id(), "x", "a");
    let mut failed = ingest(metadata, [Bytes::from_static(b"retry")]);
    let count = redelivery::requeue(&q, &failed).unwrap();
    assert_eq!(count, 1);
    failed.release();

    let (send, mut recv) = mpsc::channel(8);
    consume(&broker, "retries", "c", send).unwrap();

    let redelivered = recv.recv().await.unwrap();
    assert_eq!(redelivered.body[0], Bytes::from_static(b"retry"));
    assert!(redelivered.redelivered);
    assert_eq!(redelivered.redelivery_count, 1);

    let next = recv.recv().await.unwrap();
    assert_eq!(next.body[0], Bytes::from_static(b"first"));
    assert!(!next.redelivered);

    let last = recv.recv().await.unwrap();
    assert_eq!(last.body[0], Bytes::from_static(b"second"));
    assert_eq!(last.redelivery_count, 0);
}

#[tokio::test]
async fn delete_releases_stored_messages() {
    init_tracing();
    let broker = Broker::default();
    let q = queue::declare(&broker, "stash", false, false);

    let metadata = Metadata::new(broker.next_message_id(), "x", "a");
    let message = ingest(metadata, [Bytes::from_static(b"kept")]);
    let probe = message.content_chunks()[0].clone();
    publish(&broker, message, &[Arc::clone(&q)]).unwrap();

    wait_for(|| !q.messages.is_empty()).await;
    assert_eq!(probe.ref_count(), 2);

    queue::delete(&broker, "stash").await.unwrap();
    wait_for(|| probe.ref_count() == 1).await;

    let err = queue::delete(&broker, "stash").await.unwrap_err();
    assert!(matches!(err, BrokerError::QueueNotFound(_)));
}

#[tokio::test]
async fn auto_delete_queue_goes_with_its_last_consumer() {
    init_tracing();
    let broker = Broker::default();
    queue::declare(&broker, "ephemeral", false, true);

    let (send, _recv) = mpsc::channel(8);
    let consumer = consume(&broker, "ephemeral", "c", send).unwrap();

    cancel(&broker, &consumer).await;

    assert!(broker.lock().queues.get("ephemeral").is_none());

    let (send, _recv) = mpsc::channel(8);
    let err = consume(&broker, "ephemeral", "c", send).unwrap_err();
    assert!(matches!(err, BrokerError::QueueNotFound(_)));
}

#[tokio::test]
async fn declare_reuses_existing_queues_and_generates_names() {
    init_tracing();
    let broker = Broker::default();

    let first = queue::declare(&broker, "dup", true, false);
    let second = queue::declare(&broker, "dup", true, false);
    assert_eq!(first.id, second.id);

    let named = queue::declare(&broker, "", false, false);
    assert!(named.name.starts_with("q_"));
}
