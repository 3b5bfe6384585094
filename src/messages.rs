//! # Message Contracts
//!
//! Marker traits for the three kinds of message the mediator dispatches.
//!
//! - [`Request`] - answered by exactly one handler with a typed response
//! - [`Command`] - handled by exactly one handler, no response
//! - [`Notification`] - broadcast to zero or more handlers
//!
//! The response type of a request is an associated type, so the pairing of a
//! request shape with its response is fixed when the shape is declared and a
//! caller can never ask for a response of the wrong type.
//!
//! ```rust
//! use m3diator::{Command, Notification, Request};
//!
//! struct Greeting;
//! impl Request for Greeting {
//!     type Response = String;
//! }
//!
//! struct NoOp;
//! impl Command for NoOp {}
//!
//! struct PingEvent;
//! impl Notification for PingEvent {}
//! ```

/// A message answered by exactly one handler with a `Response`
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// A message handled by exactly one handler, producing no response
pub trait Command: Send + Sync + 'static {}

/// A message delivered to every subscribed handler
pub trait Notification: Send + Sync + 'static {}

/// Name used for a message shape in errors and logs
pub fn shape_name<T: ?Sized + 'static>() -> &'static str {
    std::any::type_name::<T>()
}
