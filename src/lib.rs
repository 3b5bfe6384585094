#![allow(clippy::doc_markdown)] // Allow technical terms like TypeId, DashMap in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # M3diator
//!
//! In-process request/response and publish/subscribe dispatcher.
//!
//! ## Overview
//!
//! Callers hand the [`Mediator`] a message object; the mediator finds the
//! handler registered for that message shape and runs it, without the caller
//! knowing which concrete handler type exists.
//!
//! - **Requests** are answered by exactly one handler with a typed response
//! - **Commands** are handled by exactly one handler with no response
//! - **Notifications** are broadcast to zero or more independent handlers
//!
//! ## Architecture
//!
//! Handler lookup goes through an injected [`HandlerProvider`]. The first
//! dispatch of a shape resolves its handler and stores a typed invocation
//! entry in a per-kind [`ResolutionCache`](dispatch::ResolutionCache); every
//! later dispatch of that shape is a cache hit. Response types are associated
//! types of the request shape, so a mismatch between what a caller expects
//! and what a handler returns is a compile error.
//!
//! ## Module Organization
//!
//! - [`messages`] - Request, command and notification contracts
//! - [`handlers`] - Handler traits and closure adapters
//! - [`registry`] - Handler provider boundary and the default registry
//! - [`dispatch`] - Resolution cache, invocation entries and the mediator
//! - [`outcome`] - Success/failure envelope for handler responses
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use m3diator::{HandlerRegistry, Mediator, Notification, NotificationHandler};
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//!
//! struct PingEvent;
//! impl Notification for PingEvent {}
//!
//! struct AuditTrail;
//!
//! #[async_trait]
//! impl NotificationHandler<PingEvent> for AuditTrail {
//!     async fn handle(&self, _: &PingEvent, _: CancellationToken) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mediator = Mediator::from_registry(
//!     HandlerRegistry::builder()
//!         .notification_handler::<PingEvent, _>(AuditTrail)
//!         .build(),
//! );
//! mediator.publish(PingEvent).await.unwrap();
//! # });
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod messages;
pub mod outcome;
pub mod registry;

pub use config::{LogFormat, LoggingConfig, MediatorConfig, PublishStrategy};
pub use dispatch::{CacheStats, Mediator, Publisher, Sender};
pub use error::{
    AggregateNotificationFailure, MediatorError, MediatorResult, NotificationHandlerFailure,
};
pub use handlers::{
    command_fn, notification_fn, request_fn, CommandHandler, NotificationHandler, RequestHandler,
};
pub use logging::init_structured_logging;
pub use messages::{Command, Notification, Request};
pub use outcome::Outcome;
pub use registry::{
    ContractKind, HandlerContract, HandlerModule, HandlerProvider, HandlerRegistry,
    HandlerRegistryBuilder, RegistryStats, ResolvedHandler,
};
