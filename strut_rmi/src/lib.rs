#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes an application configuration section.
mod config;
pub use self::config::RmiConfig;

/// Exposes the shared error taxonomy used across this crate's fallible
/// boundaries.
pub mod error;

/// Exposes the wire document model: envelopes, requests, replies, and
/// progress reports.
mod document;
pub use self::document::{Body, Envelope, Exception, Progress, Reply, Request};

/// Exposes the execution-window evaluator.
mod window;
pub use self::window::Window;

/// Exposes the in-process cancellation registry.
mod tracker;
pub use self::tracker::Tracker;

/// Exposes the broker-agnostic adapter contract.
pub mod adapter;

/// Exposes the broker URL parser and the scheme-to-driver registry.
mod registry;
pub use self::registry::{default_port, BrokerUrl, Registry};

/// Exposes the reliability wrapper: transparent reconnect-and-retry for
/// adapter operations.
pub mod reliability;
pub use self::reliability::{Fault, Messenger};

/// Exposes the consumer pipeline: one task per subscribed queue.
pub mod consumer;
pub use self::consumer::{Consumer, ConsumerHandle, ConsumerState, Executor, OpenReader};

/// Exposes the durable, on-disk pending queue.
mod pending;
pub use self::pending::PendingQueue;

/// Exposes the pending queue's pump loop.
mod dispatcher;
pub use self::dispatcher::{DispatcherHandle, PendingDispatcher};

/// Exposes the `lapin`-backed concrete adapter.
pub mod rabbitmq;
