use crate::queue::QueueName;

/// Operational errors surfaced by broker operations. Contract violations
/// on the message object model (double release, append after release) are
/// broker bugs and panic instead of showing up here.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("queue '{0}' does not exist")]
    QueueNotFound(QueueName),
    #[error("queue '{0}' is not accepting messages")]
    QueueUnavailable(QueueName),
}
