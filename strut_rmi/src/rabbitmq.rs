use crate::adapter::{self, Message as MessageTrait};
use crate::error::{SendError, SendState, TransientFault};
use async_trait::async_trait;
use lapin::acker::Acker;
use lapin::message::Delivery;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ExchangeBindOptions, ExchangeDeclareOptions,
    ExchangeDeleteOptions, ExchangeUnbindOptions, QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use futures::StreamExt;
use strut_rabbitmq::{Connector, Gateway, Handle};

/// The `lapin`-backed implementation of this crate's adapter contract.
///
/// Connection maintenance (reconnect, backoff) is entirely delegated to
/// [`strut_rabbitmq::Connector`]/[`Gateway`]: this type just asks the gateway
/// for a fresh [`Channel`] whenever it needs one, so [`repair`](LapinConnection::repair)
/// is a no-op — the gateway has already been quietly reconnecting in the
/// background the whole time.
pub struct LapinConnection {
    url: String,
    gateway: Gateway,
}

impl LapinConnection {
    /// Starts a [`Connector`] for `handle` and wraps its [`Gateway`].
    pub fn start(handle: impl AsRef<Handle>) -> Self {
        let handle = handle.as_ref();
        let url = handle.identifier().to_string();
        let gateway = Connector::start(handle);

        Self { url, gateway }
    }
}

#[async_trait]
impl adapter::Connection for LapinConnection {
    type Session = LapinSession;

    fn url(&self) -> &str {
        &self.url
    }

    async fn open(&mut self) -> Result<(), TransientFault> {
        // The gateway lazily connects on first channel request; there is
        // nothing to eagerly open here.
        Ok(())
    }

    async fn close(&mut self) {
        // Closing the underlying connection is the connector's job, driven
        // by the global AppContext's termination; this adapter has no
        // separate handle to close.
    }

    async fn repair(&mut self) -> Result<(), TransientFault> {
        Ok(())
    }

    async fn session(&self) -> Result<Self::Session, TransientFault> {
        let channel = self.gateway.channel().await;
        Ok(LapinSession { channel })
    }
}

/// A `lapin` [`Channel`], wearing this crate's [`Session`](adapter::Session)
/// contract.
pub struct LapinSession {
    channel: Channel,
}

#[async_trait]
impl adapter::Session for LapinSession {
    type Sender = LapinSender;
    type Reader = LapinReader;

    async fn sender(&self, address: &str) -> Result<Self::Sender, TransientFault> {
        Ok(LapinSender {
            channel: self.channel.clone(),
            address: address.to_string(),
        })
    }

    async fn receiver(&self, address: &str) -> Result<Self::Reader, TransientFault> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let tag = format!(
            "strut-rmi:{}:{}",
            address,
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );

        let consumer = self
            .channel
            .basic_consume(
                address,
                &tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|error| TransientFault(error.to_string()))?;

        Ok(LapinReader { consumer })
    }
}

/// Publishes messages to a single address (queue or exchange-routing-key
/// pair, depending on how `address` was declared) over a `lapin` [`Channel`].
pub struct LapinSender {
    channel: Channel,
    address: String,
}

#[async_trait]
impl adapter::Sender for LapinSender {
    async fn send(
        &self,
        body: Vec<u8>,
        ttl: Option<Duration>,
        durable: bool,
    ) -> Result<(), SendError> {
        let mut properties = BasicProperties::default().with_delivery_mode(if durable {
            2
        } else {
            1
        });

        if let Some(ttl) = ttl {
            properties = properties.with_expiration(ttl.as_millis().to_string().into());
        }

        let confirmation = self
            .channel
            .basic_publish(
                "",
                &self.address,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await
            .map_err(|error| SendError::rejected(error.to_string()))?
            .await
            .map_err(|error| SendError::rejected(error.to_string()))?;

        match confirmation {
            Confirmation::Ack(_) => Ok(()),
            Confirmation::Nack(_) => Err(SendError {
                state: SendState::Released,
                description: "broker nacked the message".to_string(),
            }),
            Confirmation::NotRequested => Ok(()),
        }
    }
}

/// Reads messages from a single `lapin` consumer.
pub struct LapinReader {
    consumer: lapin::Consumer,
}

#[async_trait]
impl adapter::Reader for LapinReader {
    type Message = LapinMessage;

    async fn next(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Self::Message>, TransientFault> {
        let next = tokio::time::timeout(timeout, StreamExt::next(&mut self.consumer)).await;

        match next {
            Err(_elapsed) => Ok(None),
            Ok(None) => Err(TransientFault("RabbitMQ consumer ran dry".to_string())),
            Ok(Some(Err(error))) => Err(TransientFault(error.to_string())),
            Ok(Some(Ok(delivery))) => Ok(Some(LapinMessage { delivery })),
        }
    }

    async fn close(&mut self) {
        let _ = self.consumer.cancel().await;
    }
}

/// A single inbound `lapin` [`Delivery`], not yet acknowledged.
pub struct LapinMessage {
    delivery: Delivery,
}

#[async_trait]
impl MessageTrait for LapinMessage {
    fn body(&self) -> &[u8] {
        &self.delivery.data
    }

    async fn ack(self: Box<Self>) {
        if let Err(error) = self.delivery.ack(lapin::options::BasicAckOptions::default()).await {
            tracing::warn!(%error, "Failed to ack a RabbitMQ delivery");
        }
    }

    async fn reject(self: Box<Self>) {
        if let Err(error) = self
            .delivery
            .reject(lapin::options::BasicRejectOptions::default())
            .await
        {
            tracing::warn!(%error, "Failed to reject a RabbitMQ delivery");
        }
    }
}

/// Declares, deletes, binds, and unbinds exchanges over a `lapin` [`Channel`].
pub struct LapinExchange {
    channel: Channel,
}

impl LapinExchange {
    /// Wraps the given channel for exchange declarations.
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl adapter::Exchange for LapinExchange {
    async fn declare(&self, name: &str, kind: &str) -> Result<(), TransientFault> {
        let kind = match kind {
            "direct" => lapin::ExchangeKind::Direct,
            "fanout" => lapin::ExchangeKind::Fanout,
            "topic" => lapin::ExchangeKind::Topic,
            "headers" => lapin::ExchangeKind::Headers,
            other => lapin::ExchangeKind::Custom(other.to_string()),
        };

        match self
            .channel
            .exchange_declare(
                name,
                kind,
                ExchangeDeclareOptions {
                    passive: false,
                    durable: true,
                    auto_delete: false,
                    internal: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(error) if is_already_exists(&error) => Ok(()),
            Err(error) => Err(TransientFault(error.to_string())),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), TransientFault> {
        self.channel
            .exchange_delete(name, ExchangeDeleteOptions::default())
            .await
            .map_err(|error| TransientFault(error.to_string()))
    }

    async fn bind(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), TransientFault> {
        self.channel
            .exchange_bind(
                queue,
                exchange,
                routing_key,
                ExchangeBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|error| TransientFault(error.to_string()))
    }

    async fn unbind(
        &self,
        exchange: &str,
        queue: &str,
        routing_key: &str,
    ) -> Result<(), TransientFault> {
        self.channel
            .exchange_unbind(
                queue,
                exchange,
                routing_key,
                ExchangeUnbindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|error| TransientFault(error.to_string()))
    }
}

/// Declares and deletes queues over a `lapin` [`Channel`].
pub struct LapinQueue {
    channel: Channel,
}

impl LapinQueue {
    /// Wraps the given channel for queue declarations.
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl adapter::Queue for LapinQueue {
    async fn declare(&self, name: &str, durable: bool) -> Result<(), TransientFault> {
        match self
            .channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    passive: false,
                    durable,
                    exclusive: false,
                    auto_delete: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await
        {
            Ok(_queue) => Ok(()),
            Err(error) if is_already_exists(&error) => Ok(()),
            Err(error) => Err(TransientFault(error.to_string())),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), TransientFault> {
        self.channel
            .queue_delete(name, QueueDeleteOptions::default())
            .await
            .map_err(|error| TransientFault(error.to_string()))?;

        Ok(())
    }
}

/// Reports whether a `lapin` error is the broker's "already exists with
/// matching properties" response, which declarations treat as success.
fn is_already_exists(error: &lapin::Error) -> bool {
    error.to_string().contains("PRECONDITION_FAILED") && error.to_string().contains("exists")
}
