//! Error types for each stage of the notification pipeline

use std::process::ExitStatus;
use thiserror::Error;

/// Raised by the encoder when an event cannot be framed safely
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field `{field}` contains a newline")]
    SeparatorInField { field: &'static str },

    #[error("sender `{0}` cannot be split back out of the title")]
    AmbiguousSender(String),
}

/// Raised by the decoder for payloads that are not a valid frame
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("expected {expected} fields, found {found}")]
    MissingFields { expected: usize, found: usize },

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("unknown urgency: {0}")]
    UnknownUrgency(String),

    #[error("invalid display time: {0}")]
    InvalidDisplayTime(String),
}

/// Raised by the transport dispatcher when a payload could not be delivered
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while sending: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {output}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        output: String,
    },

    #[error("timed out after {0} ms")]
    Timeout(u64),
}

/// Raised when a local notifier process cannot be launched or fails
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {output}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

/// Raised by the chat relay when an event could not be sent
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
