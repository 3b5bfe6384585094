//! # Mediator
//!
//! The object callers talk to. It owns the three resolution caches and the
//! injected [`HandlerProvider`], and exposes:
//!
//! - `send` for requests: one handler, typed response
//! - `send_command` for commands: one handler, no response
//! - `publish` for notifications: every subscriber, joined
//!
//! Each operation has a `_with_cancellation` form that forwards the caller's
//! token to the handler untouched.
//!
//! ## Usage
//!
//! ```rust
//! use m3diator::{HandlerRegistry, Mediator, Request, RequestHandler};
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Greeting;
//! impl Request for Greeting {
//!     type Response = String;
//! }
//!
//! struct GreetingHandler;
//!
//! #[async_trait]
//! impl RequestHandler<Greeting> for GreetingHandler {
//!     async fn handle(&self, _: Greeting, _: CancellationToken) -> anyhow::Result<String> {
//!         Ok("Hello Mundo!".to_string())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let registry = HandlerRegistry::builder()
//!     .request_handler::<Greeting, _>(GreetingHandler)
//!     .build();
//! let mediator = Mediator::from_registry(registry);
//!
//! let reply = mediator.send(Greeting).await.unwrap();
//! assert_eq!(reply, "Hello Mundo!");
//! # });
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::cache::ResolutionCache;
use super::invocation::{CommandInvocation, NotificationFanOut, RequestInvocation};
use crate::config::MediatorConfig;
use crate::error::MediatorResult;
use crate::messages::{Command, Notification, Request};
use crate::registry::{ContractKind, HandlerContract, HandlerProvider, HandlerRegistry};

/// Request and command dispatch capability
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send_with_cancellation<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> MediatorResult<R::Response>;

    async fn send_command_with_cancellation<C: Command>(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> MediatorResult<()>;

    async fn send<R: Request>(&self, request: R) -> MediatorResult<R::Response> {
        self.send_with_cancellation(request, CancellationToken::new())
            .await
    }

    async fn send_command<C: Command>(&self, command: C) -> MediatorResult<()> {
        self.send_command_with_cancellation(command, CancellationToken::new())
            .await
    }
}

/// Notification broadcast capability
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish_with_cancellation<N: Notification>(
        &self,
        notification: N,
        cancellation: CancellationToken,
    ) -> MediatorResult<()>;

    async fn publish<N: Notification>(&self, notification: N) -> MediatorResult<()> {
        self.publish_with_cancellation(notification, CancellationToken::new())
            .await
    }
}

/// In-process dispatcher
///
/// Cheap to clone; clones share the provider and the caches. Intended to be
/// created once and shared for the life of the process.
#[derive(Clone)]
pub struct Mediator {
    provider: Arc<dyn HandlerProvider>,
    requests: Arc<ResolutionCache>,
    commands: Arc<ResolutionCache>,
    notifications: Arc<ResolutionCache>,
    config: Arc<MediatorConfig>,
}

impl Mediator {
    pub fn new(provider: Arc<dyn HandlerProvider>) -> Self {
        Self::with_config(provider, MediatorConfig::default())
    }

    pub fn with_config(provider: Arc<dyn HandlerProvider>, config: MediatorConfig) -> Self {
        Self {
            provider,
            requests: Arc::new(ResolutionCache::new(ContractKind::Request)),
            commands: Arc::new(ResolutionCache::new(ContractKind::Command)),
            notifications: Arc::new(ResolutionCache::new(ContractKind::Notification)),
            config: Arc::new(config),
        }
    }

    pub fn from_registry(registry: HandlerRegistry) -> Self {
        Self::new(Arc::new(registry))
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn HandlerProvider> {
        &self.provider
    }

    /// Dispatch a request to its handler and return the handler's response
    pub async fn send<R: Request>(&self, request: R) -> MediatorResult<R::Response> {
        self.send_with_cancellation(request, CancellationToken::new())
            .await
    }

    pub async fn send_with_cancellation<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> MediatorResult<R::Response> {
        let contract = HandlerContract::request::<R>();
        trace!(contract = %contract, "Sending request");
        let invocation = self.requests.get_or_build(&contract, |contract| {
            RequestInvocation::<R>::build(self.provider.as_ref(), contract)
        })?;
        invocation.invoke(request, cancellation).await
    }

    /// Dispatch a command to its handler and wait for it to finish
    pub async fn send_command<C: Command>(&self, command: C) -> MediatorResult<()> {
        self.send_command_with_cancellation(command, CancellationToken::new())
            .await
    }

    pub async fn send_command_with_cancellation<C: Command>(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> MediatorResult<()> {
        let contract = HandlerContract::command::<C>();
        trace!(contract = %contract, "Sending command");
        let invocation = self.commands.get_or_build(&contract, |contract| {
            CommandInvocation::<C>::build(self.provider.as_ref(), contract)
        })?;
        invocation.invoke(command, cancellation).await
    }

    /// Deliver a notification to every subscriber
    ///
    /// Returns once all subscribers have finished. Having no subscribers is
    /// not an error.
    pub async fn publish<N: Notification>(&self, notification: N) -> MediatorResult<()> {
        self.publish_with_cancellation(notification, CancellationToken::new())
            .await
    }

    pub async fn publish_with_cancellation<N: Notification>(
        &self,
        notification: N,
        cancellation: CancellationToken,
    ) -> MediatorResult<()> {
        let contract = HandlerContract::notification::<N>();
        trace!(contract = %contract, "Publishing notification");
        let fan_out = self.notifications.get_or_build(&contract, |contract| {
            NotificationFanOut::<N>::build(self.provider.as_ref(), contract)
        })?;
        fan_out
            .invoke(notification, cancellation, self.config.publish_strategy)
            .await
    }

    /// Number of shapes with a cached invocation entry, per kind
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            request_shapes: self.requests.len(),
            command_shapes: self.commands.len(),
            notification_shapes: self.notifications.len(),
        }
    }
}

#[async_trait]
impl Sender for Mediator {
    async fn send_with_cancellation<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> MediatorResult<R::Response> {
        Mediator::send_with_cancellation(self, request, cancellation).await
    }

    async fn send_command_with_cancellation<C: Command>(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> MediatorResult<()> {
        Mediator::send_command_with_cancellation(self, command, cancellation).await
    }
}

#[async_trait]
impl Publisher for Mediator {
    async fn publish_with_cancellation<N: Notification>(
        &self,
        notification: N,
        cancellation: CancellationToken,
    ) -> MediatorResult<()> {
        Mediator::publish_with_cancellation(self, notification, cancellation).await
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("cache", &self.cache_stats())
            .field("publish_strategy", &self.config.publish_strategy)
            .finish()
    }
}

/// Statistics about the resolution caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub request_shapes: usize,
    pub command_shapes: usize,
    pub notification_shapes: usize,
}
