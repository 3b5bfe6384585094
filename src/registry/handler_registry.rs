//! # Handler Registry
//!
//! The default [`HandlerProvider`]: an immutable map from handler contracts
//! to handler instances, assembled once at start-up through
//! [`HandlerRegistryBuilder`].
//!
//! ## Registration Rules
//!
//! - Request and command contracts hold a single handler. Registering a
//!   second handler for the same contract replaces the first (last
//!   registration wins) and logs a warning.
//! - Notification contracts hold any number of handlers, kept in
//!   registration order.
//!
//! ## Usage
//!
//! ```rust
//! use m3diator::{HandlerRegistry, Request, RequestHandler};
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
//! let registry = HandlerRegistry::builder()
//!     .request_handler::<Greeting, _>(GreetingHandler)
//!     .build();
//! assert_eq!(registry.stats().request_handlers, 1);
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::module::HandlerModule;
use super::provider::{ContractKind, HandlerContract, HandlerProvider, ResolvedHandler};
use crate::error::{MediatorError, MediatorResult};
use crate::handlers::{CommandHandler, NotificationHandler, RequestHandler};
use crate::logging::log_registry_operation;
use crate::messages::{Command, Notification, Request};

/// Immutable handler container
#[derive(Default)]
pub struct HandlerRegistry {
    /// Request and command handlers, one per contract
    single: HashMap<(ContractKind, TypeId), (HandlerContract, ResolvedHandler)>,
    /// Notification subscribers per shape
    subscribers: HashMap<TypeId, (HandlerContract, Vec<ResolvedHandler>)>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// True when at least one handler is registered for the contract
    pub fn is_registered(&self, contract: &HandlerContract) -> bool {
        match contract.kind {
            ContractKind::Notification => self
                .subscribers
                .get(&contract.shape)
                .is_some_and(|(_, handlers)| !handlers.is_empty()),
            _ => self.single.contains_key(&contract.key()),
        }
    }

    /// All registered contracts, for diagnostics
    pub fn contracts(&self) -> Vec<HandlerContract> {
        self.single
            .values()
            .map(|(contract, _)| *contract)
            .chain(self.subscribers.values().map(|(contract, _)| *contract))
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            notification_shapes: self.subscribers.len(),
            notification_handlers: self.subscribers.values().map(|(_, h)| h.len()).sum(),
            ..RegistryStats::default()
        };
        for (kind, _) in self.single.keys() {
            match kind {
                ContractKind::Request => stats.request_handlers += 1,
                ContractKind::Command => stats.command_handlers += 1,
                ContractKind::Notification => {}
            }
        }
        stats
    }
}

impl HandlerProvider for HandlerRegistry {
    fn resolve_required(&self, contract: &HandlerContract) -> MediatorResult<ResolvedHandler> {
        self.single
            .get(&contract.key())
            .map(|(_, resolved)| resolved.clone())
            .ok_or(MediatorError::HandlerNotRegistered {
                kind: contract.kind,
                shape: contract.shape_name,
            })
    }

    fn resolve_all(&self, contract: &HandlerContract) -> Vec<ResolvedHandler> {
        if contract.kind != ContractKind::Notification {
            return Vec::new();
        }
        self.subscribers
            .get(&contract.shape)
            .map(|(_, handlers)| handlers.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Statistics about registered handlers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub request_handlers: usize,
    pub command_handlers: usize,
    pub notification_shapes: usize,
    pub notification_handlers: usize,
}

/// Collects handler registrations and freezes them into a [`HandlerRegistry`]
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    registry: HandlerRegistry,
}

impl HandlerRegistryBuilder {
    /// Register the handler for request shape `R`
    pub fn request_handler<R, H>(self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.register_single(
            HandlerContract::request::<R>(),
            std::any::type_name::<H>(),
            Arc::new(handler),
        )
    }

    /// Register an already shared handler for request shape `R`
    pub fn request_handler_arc<R: Request>(self, handler: Arc<dyn RequestHandler<R>>) -> Self {
        self.register_single(
            HandlerContract::request::<R>(),
            std::any::type_name::<dyn RequestHandler<R>>(),
            Arc::new(handler),
        )
    }

    /// Register the handler for command shape `C`
    pub fn command_handler<C, H>(self, handler: H) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        self.register_single(
            HandlerContract::command::<C>(),
            std::any::type_name::<H>(),
            Arc::new(handler),
        )
    }

    /// Register an already shared handler for command shape `C`
    pub fn command_handler_arc<C: Command>(self, handler: Arc<dyn CommandHandler<C>>) -> Self {
        self.register_single(
            HandlerContract::command::<C>(),
            std::any::type_name::<dyn CommandHandler<C>>(),
            Arc::new(handler),
        )
    }

    /// Add a subscriber for notification shape `N`
    pub fn notification_handler<N, H>(self, handler: H) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let handler: Arc<dyn NotificationHandler<N>> = Arc::new(handler);
        self.register_subscriber(
            HandlerContract::notification::<N>(),
            std::any::type_name::<H>(),
            Arc::new(handler),
        )
    }

    /// Add an already shared subscriber for notification shape `N`
    pub fn notification_handler_arc<N: Notification>(
        self,
        handler: Arc<dyn NotificationHandler<N>>,
    ) -> Self {
        self.register_subscriber(
            HandlerContract::notification::<N>(),
            std::any::type_name::<dyn NotificationHandler<N>>(),
            Arc::new(handler),
        )
    }

    /// Apply every registration a module contributes
    pub fn module<M: HandlerModule + ?Sized>(self, module: &M) -> Self {
        log_registry_operation("register_module", None, Some(module.name()), "applied");
        module.register(self)
    }

    pub fn build(self) -> HandlerRegistry {
        let stats = self.registry.stats();
        tracing::debug!(
            request_handlers = stats.request_handlers,
            command_handlers = stats.command_handlers,
            notification_handlers = stats.notification_handlers,
            "Handler registry built"
        );
        self.registry
    }

    fn register_single(
        mut self,
        contract: HandlerContract,
        handler_name: &'static str,
        instance: Arc<dyn std::any::Any + Send + Sync>,
    ) -> Self {
        let resolved = ResolvedHandler {
            handler_name,
            instance,
        };
        if let Some((_, previous)) = self
            .registry
            .single
            .insert(contract.key(), (contract, resolved))
        {
            warn!(
                contract = %contract,
                previous = previous.handler_name,
                replacement = handler_name,
                "Replacing existing handler registration"
            );
            log_registry_operation(
                "register",
                Some(&contract),
                Some(handler_name),
                "replaced",
            );
        } else {
            log_registry_operation(
                "register",
                Some(&contract),
                Some(handler_name),
                "registered",
            );
        }
        self
    }

    fn register_subscriber(
        mut self,
        contract: HandlerContract,
        handler_name: &'static str,
        instance: Arc<dyn std::any::Any + Send + Sync>,
    ) -> Self {
        self.registry
            .subscribers
            .entry(contract.shape)
            .or_insert_with(|| (contract, Vec::new()))
            .1
            .push(ResolvedHandler {
                handler_name,
                instance,
            });
        log_registry_operation("subscribe", Some(&contract), Some(handler_name), "registered");
        self
    }
}
