//! # Handler Provider
//!
//! The boundary between the mediator and whatever container holds handler
//! instances. The mediator only ever asks two questions: "give me the single
//! handler for this contract" and "give me every handler for this contract".
//!
//! Handler instances cross the boundary type-erased as
//! `Arc<dyn Any + Send + Sync>`. The erased value is always the typed
//! contract object, e.g. an `Arc<dyn RequestHandler<R>>`, so the dispatcher
//! recovers it with one downcast against the same `TypeId` the contract was
//! keyed by.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::MediatorResult;
use crate::messages::{shape_name, Command, Notification, Request};

/// The three handler contract families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Request,
    Command,
    Notification,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractKind::Request => write!(f, "request"),
            ContractKind::Command => write!(f, "command"),
            ContractKind::Notification => write!(f, "notification"),
        }
    }
}

/// Identifies a handler contract: the contract family plus the message shape
///
/// Equality and hashing only consider `kind` and `shape`; the names are kept
/// for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContract {
    pub kind: ContractKind,
    pub shape: TypeId,
    pub shape_name: &'static str,
    /// Declared response type, for request contracts only
    pub response_name: Option<&'static str>,
}

impl HandlerContract {
    pub fn request<R: Request>() -> Self {
        Self {
            kind: ContractKind::Request,
            shape: TypeId::of::<R>(),
            shape_name: shape_name::<R>(),
            response_name: Some(shape_name::<R::Response>()),
        }
    }

    pub fn command<C: Command>() -> Self {
        Self {
            kind: ContractKind::Command,
            shape: TypeId::of::<C>(),
            shape_name: shape_name::<C>(),
            response_name: None,
        }
    }

    pub fn notification<N: Notification>() -> Self {
        Self {
            kind: ContractKind::Notification,
            shape: TypeId::of::<N>(),
            shape_name: shape_name::<N>(),
            response_name: None,
        }
    }

    pub fn key(&self) -> (ContractKind, TypeId) {
        (self.kind, self.shape)
    }
}

impl PartialEq for HandlerContract {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HandlerContract {}

impl std::hash::Hash for HandlerContract {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for HandlerContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.response_name {
            Some(response) => write!(f, "{}<{}, {}>", self.kind, self.shape_name, response),
            None => write!(f, "{}<{}>", self.kind, self.shape_name),
        }
    }
}

/// A handler instance as handed out by a provider
#[derive(Clone)]
pub struct ResolvedHandler {
    pub handler_name: &'static str,
    pub instance: Arc<dyn Any + Send + Sync>,
}

impl ResolvedHandler {
    /// Recover the typed contract object, e.g. `Arc<dyn RequestHandler<R>>`
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.instance.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for ResolvedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHandler")
            .field("handler_name", &self.handler_name)
            .field("instance", &"<Arc<dyn Any>>")
            .finish()
    }
}

/// Locates handler instances for contracts
///
/// Implementations must be safe to query from many tasks at once. The
/// mediator caches what it resolves, so a provider is asked about a given
/// contract at most once per successful resolution.
pub trait HandlerProvider: Send + Sync {
    /// The single handler for a request or command contract
    ///
    /// Fails with [`MediatorError::HandlerNotRegistered`](crate::MediatorError::HandlerNotRegistered)
    /// when nothing implements the contract.
    fn resolve_required(&self, contract: &HandlerContract) -> MediatorResult<ResolvedHandler>;

    /// Every handler for a notification contract, possibly none
    ///
    /// Request and command contracts have no subscribers and yield an empty list.
    fn resolve_all(&self, contract: &HandlerContract) -> Vec<ResolvedHandler>;
}

impl<P: HandlerProvider + ?Sized> HandlerProvider for Arc<P> {
    fn resolve_required(&self, contract: &HandlerContract) -> MediatorResult<ResolvedHandler> {
        (**self).resolve_required(contract)
    }

    fn resolve_all(&self, contract: &HandlerContract) -> Vec<ResolvedHandler> {
        (**self).resolve_all(contract)
    }
}
