use thiserror::Error;

/// A stable, opaque rejection code attached to an [`InvalidDocument`] error.
///
/// These strings are part of the wire contract: callers and operators key off
/// of them, so they must never change once published.
pub mod rejection {
    /// No `sn` (serial number) present on the incoming document.
    pub const SN_MISSING: &str = "sn-missing";
    /// The document's `version` tag is not supported by this agent.
    pub const VERSION_UNSUPPORTED: &str = "version-unsupported";
    /// The document's signature or shared secret did not match.
    pub const AUTH_FAILED: &str = "auth-failed";
    /// The document's execution window is in the past and was not cancelled.
    pub const EXPIRED: &str = "expired";
    /// The document could not be parsed as a well-formed envelope at all
    /// (invalid JSON, or missing/malformed required fields other than `sn`).
    pub const MALFORMED: &str = "malformed-document";
}

/// Represents a document that was received but could not be accepted for
/// execution.
///
/// Carries enough information for the consumer to report the rejection (via
/// an executor's `rejected` hook) and then acknowledge the underlying message,
/// without ever having dispatched it.
#[derive(Error, Debug, Clone)]
#[error("invalid document ({code}): {description}")]
pub struct InvalidDocument {
    /// One of the stable [`rejection`] codes.
    pub code: &'static str,
    /// A human-readable explanation, safe to log.
    pub description: String,
    /// The original bytes of the rejected document, for diagnostics.
    pub bytes: Vec<u8>,
}

impl InvalidDocument {
    /// Creates a new [`InvalidDocument`] with the given stable `code`.
    pub fn new(code: &'static str, description: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            code,
            description: description.into(),
            bytes,
        }
    }

    /// Shorthand for the [`rejection::SN_MISSING`] rejection.
    pub fn sn_missing(bytes: Vec<u8>) -> Self {
        Self::new(
            rejection::SN_MISSING,
            "the document carries no (or an empty) serial number",
            bytes,
        )
    }

    /// Shorthand for the [`rejection::VERSION_UNSUPPORTED`] rejection.
    pub fn version_unsupported(version: &str, bytes: Vec<u8>) -> Self {
        Self::new(
            rejection::VERSION_UNSUPPORTED,
            format!("unsupported protocol version '{}'", version),
            bytes,
        )
    }

    /// Shorthand for the [`rejection::EXPIRED`] rejection.
    pub fn expired(sn: &str, bytes: Vec<u8>) -> Self {
        Self::new(
            rejection::EXPIRED,
            format!("the execution window for '{}' has already closed", sn),
            bytes,
        )
    }

    /// Shorthand for the [`rejection::MALFORMED`] rejection.
    pub fn malformed(description: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(rejection::MALFORMED, description, bytes)
    }
}

/// Represents the broker having told us that a requested resource (an
/// exchange, a queue, a link) no longer exists.
///
/// Per the reliability wrapper's contract, this is the one adapter failure
/// that is **not** transparently retried: the caller is expected to recreate
/// whatever resource went missing.
#[derive(Error, Debug, Clone)]
#[error("RabbitMQ resource not found: {0}")]
pub struct NotFound(pub String);

/// The broker-reported outcome of a rejected `send`, used to decide whether
/// the [resend](crate::reliability::resend) wrapper should retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// The broker released the message; retrying is expected to succeed.
    Released,
    /// Any other terminal outcome; retrying would not help.
    Rejected,
}

/// Represents a failed attempt to send a message through a [`Sender`](crate::adapter::Sender).
#[derive(Error, Debug, Clone)]
#[error("failed to send message: {description}")]
pub struct SendError {
    /// The broker-reported [`SendState`] that caused this failure.
    pub state: SendState,
    /// A human-readable explanation, safe to log.
    pub description: String,
}

impl SendError {
    /// Creates a new [`SendError`] with [`SendState::Released`].
    pub fn released(description: impl Into<String>) -> Self {
        Self {
            state: SendState::Released,
            description: description.into(),
        }
    }

    /// Creates a new [`SendError`] with [`SendState::Rejected`].
    pub fn rejected(description: impl Into<String>) -> Self {
        Self {
            state: SendState::Rejected,
            description: description.into(),
        }
    }
}

/// Represents a transient, retry-eligible fault surfaced by an adapter:
/// either the connection itself was lost, or a link detached for a reason
/// other than the resource having actually disappeared.
#[derive(Error, Debug, Clone)]
#[error("transient RabbitMQ fault: {0}")]
pub struct TransientFault(pub String);

/// The unified failure type produced by an operation run under the
/// [reliability wrapper](crate::reliability::reliable), after retries are
/// exhausted or a terminal condition is hit.
#[derive(Error, Debug, Clone)]
pub enum ReliabilityError<E> {
    /// The resource addressed by the operation is gone; see [`NotFound`].
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// The application shut down while the operation was being retried.
    #[error("shut down while retrying a RabbitMQ operation")]
    ShutDown,
    /// The wrapped operation failed terminally (not a transient fault).
    #[error(transparent)]
    Terminal(E),
}

/// Represents the URL scheme not matching any registered adapter driver.
#[derive(Error, Debug, Clone)]
#[error("no adapter registered for broker URL scheme '{scheme}'")]
pub struct InvalidAdapter {
    /// The unrecognized scheme.
    pub scheme: String,
}
