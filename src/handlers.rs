//! # Handler Contracts
//!
//! One trait per message kind. Handlers are shared between concurrent callers
//! as `Arc<dyn ...>`, so every contract is object safe and `Send + Sync`.
//!
//! Every `handle` receives the caller's [`CancellationToken`] unchanged. The
//! mediator never cancels on its own; a handler that performs I/O should
//! watch the token.
//!
//! For small handlers that do not warrant a dedicated type, [`request_fn`],
//! [`command_fn`] and [`notification_fn`] adapt async closures.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

use crate::messages::{Command, Notification, Request};

/// Handles a single request shape and produces its response
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: R, cancellation: CancellationToken)
        -> anyhow::Result<R::Response>;
}

/// Handles a single command shape
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C, cancellation: CancellationToken) -> anyhow::Result<()>;
}

/// Subscribes to a notification shape
///
/// Several handlers may subscribe to the same shape; each receives a shared
/// reference to the same notification instance.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    async fn handle(&self, notification: &N, cancellation: CancellationToken)
        -> anyhow::Result<()>;
}

/// Request handler backed by a closure
pub struct RequestFn<R, F> {
    f: F,
    _shape: PhantomData<fn(R)>,
}

/// Wrap an async closure as a [`RequestHandler`]
pub fn request_fn<R, F>(f: F) -> RequestFn<R, F>
where
    R: Request,
    F: Fn(R, CancellationToken) -> BoxFuture<'static, anyhow::Result<R::Response>>
        + Send
        + Sync,
{
    RequestFn {
        f,
        _shape: PhantomData,
    }
}

#[async_trait]
impl<R, F> RequestHandler<R> for RequestFn<R, F>
where
    R: Request,
    F: Fn(R, CancellationToken) -> BoxFuture<'static, anyhow::Result<R::Response>>
        + Send
        + Sync,
{
    async fn handle(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> anyhow::Result<R::Response> {
        (self.f)(request, cancellation).await
    }
}

/// Command handler backed by a closure
pub struct CommandFn<C, F> {
    f: F,
    _shape: PhantomData<fn(C)>,
}

/// Wrap an async closure as a [`CommandHandler`]
pub fn command_fn<C, F>(f: F) -> CommandFn<C, F>
where
    C: Command,
    F: Fn(C, CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync,
{
    CommandFn {
        f,
        _shape: PhantomData,
    }
}

#[async_trait]
impl<C, F> CommandHandler<C> for CommandFn<C, F>
where
    C: Command,
    F: Fn(C, CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync,
{
    async fn handle(&self, command: C, cancellation: CancellationToken) -> anyhow::Result<()> {
        (self.f)(command, cancellation).await
    }
}

/// Notification handler backed by a closure
///
/// The closure borrows the notification for the lifetime of the returned
/// future, so it can read fields without cloning the whole message.
pub struct NotificationFn<N, F> {
    f: F,
    _shape: PhantomData<fn(&N)>,
}

/// Wrap an async closure as a [`NotificationHandler`]
pub fn notification_fn<N, F>(f: F) -> NotificationFn<N, F>
where
    N: Notification,
    F: for<'a> Fn(&'a N, CancellationToken) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync,
{
    NotificationFn {
        f,
        _shape: PhantomData,
    }
}

#[async_trait]
impl<N, F> NotificationHandler<N> for NotificationFn<N, F>
where
    N: Notification,
    F: for<'a> Fn(&'a N, CancellationToken) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync,
{
    async fn handle(&self, notification: &N, cancellation: CancellationToken) -> anyhow::Result<()> {
        (self.f)(notification, cancellation).await
    }
}
