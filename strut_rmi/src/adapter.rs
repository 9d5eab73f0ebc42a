use crate::error::SendError;
use async_trait::async_trait;
use std::time::Duration;

/// A durable, long-lived transport to a message broker.
///
/// Implementations own whatever socket, channel, or link state their
/// underlying driver needs. [`Session`]s, [`Sender`]s, and [`Reader`]s are
/// strictly nested beneath a `Connection`: closing it closes everything
/// derived from it.
#[async_trait]
pub trait Connection: Send + Sync {
    /// The [`Session`] type this connection produces.
    type Session: Session;

    /// The broker URL this connection was opened against, for logging and
    /// for [`repair`](Connection::repair).
    fn url(&self) -> &str;

    /// Opens the transport. Idempotent: calling this on an already-open
    /// connection is a no-op.
    async fn open(&mut self) -> Result<(), crate::error::TransientFault>;

    /// Closes the transport and everything derived from it.
    async fn close(&mut self);

    /// Idempotent repair: closes any broken transport and re-establishes
    /// the connection using the same URL and credentials.
    async fn repair(&mut self) -> Result<(), crate::error::TransientFault>;

    /// Borrows a new [`Session`] from this connection.
    async fn session(&self) -> Result<Self::Session, crate::error::TransientFault>;
}

/// A session borrowed from a [`Connection`], producing [`Sender`]s and
/// [`Reader`]s and acknowledging inbound messages.
#[async_trait]
pub trait Session: Send + Sync {
    /// The [`Sender`] type this session produces.
    type Sender: Sender;
    /// The [`Reader`] type this session produces.
    type Reader: Reader;

    /// Opens a sender bound to the given address.
    async fn sender(&self, address: &str) -> Result<Self::Sender, crate::error::TransientFault>;

    /// Opens a reader bound to the given address.
    async fn receiver(&self, address: &str) -> Result<Self::Reader, crate::error::TransientFault>;
}

/// Sends messages to a single address.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Sends `body` to this sender's address.
    ///
    /// Returns once the broker has accepted the message. `ttl` and
    /// `durable`, when given, are passed through to the broker as delivery
    /// properties.
    async fn send(
        &self,
        body: Vec<u8>,
        ttl: Option<Duration>,
        durable: bool,
    ) -> Result<(), SendError>;
}

/// A single inbound message, not yet acknowledged.
#[async_trait]
pub trait Message: Send + Sync {
    /// The raw, undecoded body of this message.
    fn body(&self) -> &[u8];

    /// Acknowledges this message, permanently removing it from the broker.
    async fn ack(self: Box<Self>);

    /// Rejects this message. Depending on the broker and queue
    /// configuration, this typically triggers redelivery or dead-lettering.
    async fn reject(self: Box<Self>);
}

/// Reads messages from a single address.
#[async_trait]
pub trait Reader: Send + Sync {
    /// The concrete [`Message`] type produced by this reader.
    type Message: Message;

    /// Waits up to `timeout` for the next message.
    ///
    /// Returns `None` on timeout; never acks or rejects on the caller's
    /// behalf.
    async fn next(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Self::Message>, crate::error::TransientFault>;

    /// Closes this reader. Safe to call more than once.
    async fn close(&mut self);
}

/// Declares, deletes, binds, and unbinds exchanges.
///
/// Declarations are idempotent: re-declaring an exchange that already
/// exists with matching properties must succeed.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Declares the named exchange of the given kind.
    async fn declare(&self, name: &str, kind: &str) -> Result<(), crate::error::TransientFault>;

    /// Deletes the named exchange, if present.
    async fn delete(&self, name: &str) -> Result<(), crate::error::TransientFault>;

    /// Binds `queue` to `exchange` using `routing_key`.
    async fn bind(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), crate::error::TransientFault>;

    /// Unbinds `queue` from `exchange`.
    async fn unbind(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), crate::error::TransientFault>;
}

/// Declares and deletes queues.
///
/// Declarations are idempotent, matching [`Exchange`]'s contract.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Declares the named queue.
    async fn declare(&self, name: &str, durable: bool) -> Result<(), crate::error::TransientFault>;

    /// Deletes the named queue, if present.
    async fn delete(&self, name: &str) -> Result<(), crate::error::TransientFault>;
}
