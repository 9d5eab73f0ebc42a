use crate::consumer::Executor;
use crate::document::Envelope;
use crate::pending::PendingQueue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use strut_core::AppContext;
use tokio::select;
use tokio::sync::watch;
use tracing::{error, info};

/// How long a single poll of the pending queue is allowed to block before
/// re-checking whether the dispatcher should stop.
const POLL_WAIT: Duration = Duration::from_secs(3);

/// Sends the stop signal to a running [`PendingDispatcher`].
pub struct DispatcherHandle {
    stop: watch::Sender<bool>,
}

impl DispatcherHandle {
    /// Requests that the dispatcher stop after its current poll.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// A long-lived task that pumps dispatchable envelopes out of a
/// [`PendingQueue`] into an [`Executor`].
///
/// Committing a dispatched envelope (calling
/// [`PendingQueue::commit`](crate::pending::PendingQueue::commit)) is the
/// executor's responsibility, performed once it has actually finished
/// (or durably handed off) the request: a crash before that commit means the
/// envelope is re-served after restart, which is the intended at-least-once
/// guarantee.
pub struct PendingDispatcher<T, E> {
    queue: Arc<PendingQueue<T>>,
    executor: E,
    stop: watch::Receiver<bool>,
}

impl<T, E> PendingDispatcher<T, E>
where
    T: DeserializeOwned + Serialize + Clone + Send + 'static,
    E: Executor<T>,
{
    /// Creates a new dispatcher pumping `queue` into `executor`, along with
    /// the [`DispatcherHandle`] used to stop it.
    pub fn new(queue: Arc<PendingQueue<T>>, executor: E) -> (Self, DispatcherHandle) {
        let (tx, rx) = watch::channel(false);

        (
            Self {
                queue,
                executor,
                stop: rx,
            },
            DispatcherHandle { stop: tx },
        )
    }

    /// Runs the pump loop until a stop is requested or the global
    /// [`AppContext`] terminates.
    pub async fn run(mut self) {
        loop {
            if *self.stop.borrow() || AppContext::is_terminated() {
                break;
            }

            let envelope = select! {
                envelope = self.queue.get(POLL_WAIT) => envelope,
                _ = self.stop.changed() => break,
                _ = AppContext::terminated() => break,
            };

            if let Some(envelope) = envelope {
                self.dispatch(envelope).await;
            }
        }

        info!("Pending dispatcher stopped");
    }

    async fn dispatch(&self, envelope: Envelope<T>) {
        let sn = envelope.sn.clone();

        if let Err(error) = self.executor.dispatch(envelope).await {
            error!(
                alert = true,
                sn = %sn,
                %error,
                "Pending dispatch failed; entry stays uncommitted for retry after restart",
            );
        }
    }
}
