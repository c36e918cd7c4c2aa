#![warn(rust_2018_idioms)]
#![deny(clippy::future_not_send)]

pub mod consume;
pub mod ingest;
pub mod publish;
pub mod queue;
pub mod redelivery;
mod queue_worker;

#[cfg(test)]
mod tests;

use muninn_core::error::BrokerError;

pub use crate::{ingest::ingest, publish::publish};

type Result<T> = std::result::Result<T, BrokerError>;
