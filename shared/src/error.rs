//! Error types shared by transports and actuators

use crate::ConnectionHandle;
use thiserror::Error;

/// Errors reported by a transport provider
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No open link for handle {0}")]
    UnknownHandle(ConnectionHandle),

    #[error("Link {0} closed before the write was queued")]
    LinkClosed(ConnectionHandle),

    #[error("Write queue for link {0} is full, frame dropped")]
    Congested(ConnectionHandle),

    #[error("Radio error: {0}")]
    Radio(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported while driving the output line
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("GPIO line {line}: {reason}")]
    Pin { line: u32, reason: String },

    #[error("GPIO I/O error: {0}")]
    Io(#[from] std::io::Error),
}
