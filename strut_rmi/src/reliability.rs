use crate::error::{NotFound, ReliabilityError, SendState, TransientFault};
use std::future::Future;
use std::time::Duration;
use strut_core::AppContext;
use strut_util::Backoff;
use tokio::select;
use tokio::time::sleep;
use tracing::error;

/// Fallback delay used on the rare tick where `backoff` reports it is
/// exhausted (a configured `max_elapsed_time` was hit); `reliable` keeps
/// retrying regardless, so this just resets the backoff and tries again
/// after a flat pause rather than spinning.
pub const DELAY: Duration = Duration::from_secs(10);

/// Delay between successive resend attempts after a `Released` rejection.
pub const RESEND_DELAY: Duration = Duration::from_secs(10);

/// Ceiling on the number of resend attempts: roughly 24 hours at
/// [`RESEND_DELAY`].
pub const MAX_RESEND: u32 = (24 * 60 * 60) / RESEND_DELAY.as_secs() as u32;

/// Anything that knows how to repair itself after a transient broker fault.
///
/// The adapter-level [`Connection`](crate::adapter::Connection)s are the
/// canonical implementors: `repair()` there is exactly
/// [`Connection::repair`](crate::adapter::Connection::repair).
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    /// Re-establishes whatever this messenger needs to operate, after a
    /// transient fault. Idempotent.
    async fn repair(&mut self) -> Result<(), TransientFault>;
}

/// Wraps `operation` so that transient broker failures become transparent
/// reconnect-and-retry, instead of propagating to the caller.
///
/// `operation` is called repeatedly (on a fresh `messenger` state each time,
/// since `repair` runs first after any failure) until it either succeeds, a
/// [`NotFound`] terminates the loop, or the global [`AppContext`] is
/// terminated. The delay between attempts comes from `backoff` (typically
/// built from [`RmiConfig::backoff`](crate::config::RmiConfig::backoff)),
/// which is reset on success so the next call starts from its initial
/// interval again.
///
/// The retry sleep races the shutdown signal, rather than polling an abort
/// flag, so a shutdown during the sleep is observed immediately.
pub async fn reliable<M, F, Fut, T, E>(
    messenger: &mut M,
    backoff: &Backoff,
    mut operation: F,
) -> Result<T, ReliabilityError<E>>
where
    M: Messenger,
    F: FnMut(&mut M) -> Fut,
    Fut: Future<Output = Result<T, Fault<E>>>,
{
    let mut needs_repair = false;

    loop {
        if AppContext::is_terminated() {
            return Err(ReliabilityError::ShutDown);
        }

        if needs_repair {
            let _ = messenger.repair().await;
            needs_repair = false;
        }

        match operation(messenger).await {
            Ok(value) => {
                backoff.reset();
                return Ok(value);
            }
            Err(Fault::NotFound(not_found)) => return Err(ReliabilityError::NotFound(not_found)),
            Err(Fault::Transient(fault)) => {
                error!(alert = true, fault = %fault, "transient RabbitMQ fault, will retry");
                needs_repair = true;

                let delay = backoff.next().unwrap_or_else(|| {
                    backoff.reset();
                    DELAY
                });

                select! {
                    _ = sleep(delay) => {}
                    _ = AppContext::terminated() => return Err(ReliabilityError::ShutDown),
                }
            }
            Err(Fault::Terminal(error)) => return Err(ReliabilityError::Terminal(error)),
        }
    }
}

/// The set of failures an operation wrapped by [`reliable`] may report.
#[derive(Debug)]
pub enum Fault<E> {
    /// The addressed resource is gone; not retried.
    NotFound(NotFound),
    /// A connection- or link-level fault other than resource disappearance;
    /// retried after [`DELAY`] and a [`Messenger::repair`].
    Transient(TransientFault),
    /// Any other, non-retriable failure.
    Terminal(E),
}

/// Wraps a send `operation` in [`reliable`], additionally retrying broker
/// rejections whose state is [`SendState::Released`], up to [`MAX_RESEND`]
/// times, sleeping [`RESEND_DELAY`] between attempts.
///
/// All other send failures propagate immediately as
/// [`Fault::Terminal`](Fault::Terminal), without consuming a resend attempt.
pub async fn resend<M, F, Fut, T>(
    messenger: &mut M,
    backoff: &Backoff,
    mut operation: F,
) -> Result<T, ReliabilityError<crate::error::SendError>>
where
    M: Messenger,
    F: FnMut(&mut M) -> Fut,
    Fut: Future<Output = Result<T, Fault<crate::error::SendError>>>,
{
    reliable(messenger, backoff, |messenger| {
        let mut retry = MAX_RESEND;
        let operation = &mut operation;

        async move {
            loop {
                match operation(messenger).await {
                    Ok(value) => return Ok(value),
                    Err(Fault::Terminal(send_error)) if send_error.state == SendState::Released => {
                        if retry == 0 {
                            return Err(Fault::Terminal(send_error));
                        }
                        retry -= 1;

                        select! {
                            _ = sleep(RESEND_DELAY) => {}
                            _ = AppContext::terminated() => {
                                return Err(Fault::Terminal(send_error));
                            }
                        }
                    }
                    other => return other,
                }
            }
        }
    })
    .await
}
