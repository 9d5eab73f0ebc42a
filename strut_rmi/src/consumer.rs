use crate::adapter::{Message, Reader};
use crate::document::Envelope;
use crate::error::InvalidDocument;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use strut_core::AppContext;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// How long a single poll for the next message is allowed to block.
const POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait before retrying after the reader fails to open, or after
/// any unexpected failure while running.
const RETRY_DELAY: Duration = Duration::from_secs(60);

/// The extension points a surrounding application supplies to a [`Consumer`].
///
/// The consumer itself holds no application state beyond its reader: every
/// decision about what an accepted or rejected envelope actually *means* is
/// delegated here.
#[async_trait]
pub trait Executor<T>: Send + Sync {
    /// The error [`dispatch`](Executor::dispatch) reports on failure.
    type Error: std::fmt::Display + Send + 'static;

    /// Handles a successfully decoded and validated envelope.
    ///
    /// An `Err` here means the envelope was *not* durably handled: the
    /// consumer does not ack the underlying message, closes its reader, and
    /// reopens it, so the broker redelivers after the reconnect.
    async fn dispatch(&self, envelope: Envelope<T>) -> Result<(), Self::Error>;

    /// Handles an envelope that failed validation (most commonly a missing
    /// `sn`), after which the underlying message is still acknowledged: a
    /// rejected document is not redelivered.
    async fn rejected(&self, rejection: InvalidDocument);
}

/// A factory for opening (or re-opening) a [`Reader`] bound to this
/// consumer's queue.
#[async_trait]
pub trait OpenReader: Send + Sync {
    /// The concrete [`Reader`] this factory produces.
    type Reader: Reader;

    /// Opens a fresh reader.
    async fn open(&self) -> Result<Self::Reader, crate::error::TransientFault>;
}

/// The lifecycle state of a [`Consumer`] task, exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Not yet attempted to open a reader.
    Starting,
    /// Actively trying to open a reader.
    Opening,
    /// Reader open, polling for messages.
    Running,
    /// Stop requested; finishing the current poll before exiting.
    Draining,
    /// Reader closed, task finished.
    Stopped,
}

/// Sends the stop signal to a running [`Consumer`].
pub struct ConsumerHandle {
    stop: watch::Sender<bool>,
}

impl ConsumerHandle {
    /// Requests that the consumer drain and stop.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// Runs one subscribed queue: opens a [`Reader`], decodes and validates each
/// incoming message, and calls into an [`Executor`] to dispatch or reject it.
///
/// Exactly one `ack`/`reject` is issued per message: the consumer acks after
/// a successful dispatch or a clean rejection, and never acks on a
/// recoverable failure, so the broker redelivers after a reconnect.
pub struct Consumer<F, E, T>
where
    F: OpenReader,
{
    name: String,
    open_reader: F,
    reader: Option<F::Reader>,
    executor: E,
    stop: watch::Receiver<bool>,
    _marker: std::marker::PhantomData<T>,
}

impl<F, E, T> Consumer<F, E, T>
where
    F: OpenReader,
    E: Executor<T>,
    T: DeserializeOwned + Send,
{
    /// Creates a new consumer, along with the [`ConsumerHandle`] used to stop
    /// it.
    pub fn new(name: impl Into<String>, open_reader: F, executor: E) -> (Self, ConsumerHandle) {
        let (tx, rx) = watch::channel(false);

        (
            Self {
                name: name.into(),
                open_reader,
                reader: None,
                executor,
                stop: rx,
                _marker: std::marker::PhantomData,
            },
            ConsumerHandle { stop: tx },
        )
    }

    /// Runs the Starting → Opening → Running → Draining → Stopped state
    /// machine until a stop is requested or the global [`AppContext`]
    /// terminates.
    pub async fn run(mut self) {
        let mut state = ConsumerState::Starting;

        loop {
            state = match state {
                ConsumerState::Starting => ConsumerState::Opening,
                ConsumerState::Opening => self.open().await,
                ConsumerState::Running => self.run_loop().await,
                ConsumerState::Draining => {
                    self.close_reader().await;
                    ConsumerState::Stopped
                }
                ConsumerState::Stopped => break,
            };
        }

        info!(consumer = self.name.as_str(), "Consumer stopped");
    }

    async fn open(&mut self) -> ConsumerState {
        loop {
            if self.should_stop() {
                return ConsumerState::Draining;
            }

            match self.open_reader.open().await {
                Ok(reader) => {
                    self.reader = Some(reader);
                    return ConsumerState::Running;
                }
                Err(error) => {
                    error!(
                        alert = true,
                        consumer = self.name.as_str(),
                        %error,
                        "Failed to open a reader; retrying",
                    );

                    if self.sleep_or_stop(RETRY_DELAY).await {
                        return ConsumerState::Draining;
                    }
                }
            }
        }
    }

    async fn run_loop(&mut self) -> ConsumerState {
        loop {
            if self.should_stop() {
                return ConsumerState::Draining;
            }

            let Some(reader) = self.reader.as_mut() else {
                return ConsumerState::Opening;
            };

            match reader.next(POLL_TIMEOUT).await {
                Ok(Some(message)) => {
                    if !self.handle_message(message).await {
                        self.close_reader().await;

                        if self.sleep_or_stop(RETRY_DELAY).await {
                            return ConsumerState::Draining;
                        }

                        return ConsumerState::Opening;
                    }
                }
                Ok(None) => continue,
                Err(error) => {
                    error!(
                        alert = true,
                        consumer = self.name.as_str(),
                        %error,
                        "Unexpected failure while polling; reopening reader",
                    );

                    self.close_reader().await;

                    if self.sleep_or_stop(RETRY_DELAY).await {
                        return ConsumerState::Draining;
                    }

                    return ConsumerState::Opening;
                }
            }
        }
    }

    /// Handles one incoming message, returning `false` iff dispatch failed
    /// and the caller should close and reopen the reader without acking.
    async fn handle_message(&self, message: <F::Reader as Reader>::Message) -> bool {
        let bytes = message.body().to_vec();

        match Envelope::<T>::load(&bytes).and_then(|envelope| {
            envelope.validate(&bytes)?;
            Ok(envelope)
        }) {
            Ok(envelope) => {
                let sn = envelope.sn.clone();
                debug!(consumer = self.name.as_str(), sn = %sn, "Dispatching envelope");

                match self.executor.dispatch(envelope).await {
                    Ok(()) => {
                        Box::new(message).ack().await;
                        true
                    }
                    Err(error) => {
                        error!(
                            alert = true,
                            consumer = self.name.as_str(),
                            sn = %sn,
                            %error,
                            "Dispatch failed; leaving message unacked for redelivery",
                        );
                        false
                    }
                }
            }
            Err(rejection) => {
                warn!(
                    consumer = self.name.as_str(),
                    code = rejection.code,
                    "Rejecting undecodable document",
                );
                self.executor.rejected(rejection).await;
                Box::new(message).ack().await;
                true
            }
        }
    }

    fn should_stop(&self) -> bool {
        *self.stop.borrow() || AppContext::is_terminated()
    }

    /// Sleeps for `duration`, returning `true` if a stop was requested (by
    /// handle or application shutdown) before the sleep elapsed.
    async fn sleep_or_stop(&mut self, duration: Duration) -> bool {
        select! {
            _ = tokio::time::sleep(duration) => false,
            _ = self.stop.changed() => true,
            _ = AppContext::terminated() => true,
        }
    }

    async fn close_reader(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.close().await;
        }
    }
}
