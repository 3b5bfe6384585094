//! # Error Types
//!
//! Structured error handling for dispatch. Handler authors return
//! [`anyhow::Result`]; the mediator wraps whatever they return into a
//! [`MediatorError`] that names the message shape and the handler involved.

use std::fmt;
use thiserror::Error;

use crate::registry::ContractKind;

/// Errors surfaced by the mediator to callers of `send`, `send_command` and `publish`
#[derive(Debug, Error)]
pub enum MediatorError {
    /// No handler is registered for a request or command contract
    #[error("No {kind} handler registered for {shape}")]
    HandlerNotRegistered {
        kind: ContractKind,
        shape: &'static str,
    },

    /// The single handler of a request or command failed
    #[error("Handler {handler} failed while handling {shape}: {source}")]
    HandlerFailed {
        shape: &'static str,
        handler: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// One or more notification handlers failed
    #[error(transparent)]
    NotificationFailed(#[from] AggregateNotificationFailure),

    /// A provider handed out an instance that does not implement the requested contract
    #[error("Handler resolved for {shape} does not implement {expected}")]
    ContractMismatch {
        shape: &'static str,
        expected: &'static str,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MediatorError {
    /// True when the failure came from a handler rather than from resolution
    pub fn is_handler_failure(&self) -> bool {
        matches!(
            self,
            MediatorError::HandlerFailed { .. } | MediatorError::NotificationFailed(_)
        )
    }
}

impl From<config::ConfigError> for MediatorError {
    fn from(error: config::ConfigError) -> Self {
        MediatorError::Configuration(error.to_string())
    }
}

pub type MediatorResult<T> = std::result::Result<T, MediatorError>;

/// A single failed notification handler
#[derive(Debug)]
pub struct NotificationHandlerFailure {
    pub handler: &'static str,
    pub error: anyhow::Error,
    /// Set when the handler panicked instead of returning an error
    pub panicked: bool,
}

impl fmt::Display for NotificationHandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.panicked {
            write!(f, "{} panicked: {}", self.handler, self.error)
        } else {
            write!(f, "{} failed: {}", self.handler, self.error)
        }
    }
}

/// Every failure of a single publish, collected after all handlers finished
#[derive(Debug, Error)]
#[error("{} of {handler_count} handlers failed for {shape}: {}", .failures.len(), summarize(.failures))]
pub struct AggregateNotificationFailure {
    pub shape: &'static str,
    pub handler_count: usize,
    pub failures: Vec<NotificationHandlerFailure>,
}

impl AggregateNotificationFailure {
    pub fn failed_handlers(&self) -> Vec<&'static str> {
        self.failures.iter().map(|f| f.handler).collect()
    }
}

fn summarize(failures: &[NotificationHandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
