//! # Invocation Entries
//!
//! What the resolution cache stores: one entry per message shape, holding the
//! resolved handler(s) behind their typed contract. Building an entry asks the
//! provider for the handler and nothing more; `handle` only runs from
//! `invoke`.
//!
//! Every entry normalizes its handler's outcome into a [`MediatorResult`], so
//! the mediator calls every shape the same way.

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::PublishStrategy;
use crate::error::{
    AggregateNotificationFailure, MediatorError, MediatorResult, NotificationHandlerFailure,
};
use crate::handlers::{CommandHandler, NotificationHandler, RequestHandler};
use crate::messages::{shape_name, Command, Notification, Request};
use crate::registry::{HandlerContract, HandlerProvider, ResolvedHandler};

fn downcast_contract<T: Clone + 'static>(
    contract: &HandlerContract,
    resolved: &ResolvedHandler,
) -> MediatorResult<T> {
    resolved
        .downcast::<T>()
        .ok_or(MediatorError::ContractMismatch {
            shape: contract.shape_name,
            expected: std::any::type_name::<T>(),
        })
}

/// Cached entry for a request shape
pub struct RequestInvocation<R: Request> {
    handler: Arc<dyn RequestHandler<R>>,
    handler_name: &'static str,
}

impl<R: Request> RequestInvocation<R> {
    pub fn build(provider: &dyn HandlerProvider, contract: &HandlerContract) -> MediatorResult<Self> {
        let resolved = provider.resolve_required(contract)?;
        Ok(Self {
            handler: downcast_contract(contract, &resolved)?,
            handler_name: resolved.handler_name,
        })
    }

    pub fn handler_name(&self) -> &'static str {
        self.handler_name
    }

    pub fn invoke(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, MediatorResult<R::Response>> {
        let handler = Arc::clone(&self.handler);
        let handler_name = self.handler_name;
        async move {
            handler
                .handle(request, cancellation)
                .await
                .map_err(|source| MediatorError::HandlerFailed {
                    shape: shape_name::<R>(),
                    handler: handler_name,
                    source,
                })
        }
        .boxed()
    }
}

/// Cached entry for a command shape
pub struct CommandInvocation<C: Command> {
    handler: Arc<dyn CommandHandler<C>>,
    handler_name: &'static str,
}

impl<C: Command> CommandInvocation<C> {
    pub fn build(provider: &dyn HandlerProvider, contract: &HandlerContract) -> MediatorResult<Self> {
        let resolved = provider.resolve_required(contract)?;
        Ok(Self {
            handler: downcast_contract(contract, &resolved)?,
            handler_name: resolved.handler_name,
        })
    }

    pub fn handler_name(&self) -> &'static str {
        self.handler_name
    }

    pub fn invoke(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, MediatorResult<()>> {
        let handler = Arc::clone(&self.handler);
        let handler_name = self.handler_name;
        async move {
            handler
                .handle(command, cancellation)
                .await
                .map_err(|source| MediatorError::HandlerFailed {
                    shape: shape_name::<C>(),
                    handler: handler_name,
                    source,
                })
        }
        .boxed()
    }
}

/// Cached entry for a notification shape: every subscriber, in registration order
pub struct NotificationFanOut<N: Notification> {
    handlers: Vec<(&'static str, Arc<dyn NotificationHandler<N>>)>,
}

impl<N: Notification> NotificationFanOut<N> {
    pub fn build(provider: &dyn HandlerProvider, contract: &HandlerContract) -> MediatorResult<Self> {
        let handlers = provider
            .resolve_all(contract)
            .iter()
            .map(|resolved| Ok((resolved.handler_name, downcast_contract(contract, resolved)?)))
            .collect::<MediatorResult<Vec<_>>>()?;
        Ok(Self { handlers })
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|(name, _)| *name).collect()
    }

    /// Run every subscriber and wait for all of them
    ///
    /// All subscribers start regardless of how the others fare. Failures are
    /// gathered into one [`AggregateNotificationFailure`] once the last
    /// subscriber has finished.
    pub async fn invoke(
        &self,
        notification: N,
        cancellation: CancellationToken,
        strategy: PublishStrategy,
    ) -> MediatorResult<()> {
        if self.handlers.is_empty() {
            return Ok(());
        }

        debug!(
            shape = shape_name::<N>(),
            handlers = self.handlers.len(),
            strategy = ?strategy,
            "Publishing notification"
        );

        let failures = match strategy {
            PublishStrategy::Concurrent => self.run_concurrent(&notification, &cancellation).await,
            PublishStrategy::Spawned => self.run_spawned(notification, &cancellation).await,
        };

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateNotificationFailure {
                shape: shape_name::<N>(),
                handler_count: self.handlers.len(),
                failures,
            }
            .into())
        }
    }

    async fn run_concurrent(
        &self,
        notification: &N,
        cancellation: &CancellationToken,
    ) -> Vec<NotificationHandlerFailure> {
        let futures = self.handlers.iter().map(|(name, handler)| {
            let token = cancellation.clone();
            async move { (*name, handler.handle(notification, token).await) }
        });

        join_all(futures)
            .await
            .into_iter()
            .filter_map(|(handler, result)| {
                result.err().map(|error| NotificationHandlerFailure {
                    handler,
                    error,
                    panicked: false,
                })
            })
            .collect()
    }

    async fn run_spawned(
        &self,
        notification: N,
        cancellation: &CancellationToken,
    ) -> Vec<NotificationHandlerFailure> {
        let notification = Arc::new(notification);
        let tasks = self.handlers.iter().map(|(name, handler)| {
            let handler = Arc::clone(handler);
            let notification = Arc::clone(&notification);
            let token = cancellation.clone();
            let task = tokio::spawn(async move { handler.handle(&notification, token).await });
            async move { (*name, task.await) }
        });

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|(handler, outcome)| match outcome {
                Ok(Ok(())) => None,
                Ok(Err(error)) => Some(NotificationHandlerFailure {
                    handler,
                    error,
                    panicked: false,
                }),
                Err(join_error) => Some(NotificationHandlerFailure {
                    handler,
                    panicked: join_error.is_panic(),
                    error: anyhow::anyhow!("handler task did not complete: {join_error}"),
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{command_fn, notification_fn, request_fn};
    use crate::registry::{ContractKind, HandlerRegistry};
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Square(u32);
    impl Request for Square {
        type Response = u32;
    }

    struct Purge;
    impl Command for Purge {}

    struct Alert(&'static str);
    impl Notification for Alert {}

    fn counting(counter: Arc<AtomicUsize>) -> impl NotificationHandler<Alert> {
        notification_fn(move |_: &Alert, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }.boxed()
        })
    }

    fn failing() -> impl NotificationHandler<Alert> {
        notification_fn(|alert: &Alert, _| {
            let message = alert.0;
            async move { Err(anyhow::anyhow!("rejected {message}")) }.boxed()
        })
    }

    #[tokio::test]
    async fn test_request_invocation_wraps_handler_error() {
        let registry = HandlerRegistry::builder()
            .request_handler::<Square, _>(request_fn(|request: Square, _| {
                async move {
                    if request.0 > 100 {
                        anyhow::bail!("too large");
                    }
                    Ok(request.0 * request.0)
                }
                .boxed()
            }))
            .build();
        let contract = HandlerContract::request::<Square>();
        let invocation = RequestInvocation::<Square>::build(&registry, &contract).unwrap();
        assert!(invocation.handler_name().contains("RequestFn"));

        let ok = invocation.invoke(Square(4), CancellationToken::new()).await;
        assert_eq!(ok.unwrap(), 16);

        let err = invocation.invoke(Square(101), CancellationToken::new()).await;
        match err {
            Err(MediatorError::HandlerFailed { shape, source, .. }) => {
                assert!(shape.ends_with("Square"));
                assert_eq!(source.to_string(), "too large");
            }
            other => panic!("expected HandlerFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_invocation_names_failing_handler() {
        let registry = HandlerRegistry::builder()
            .command_handler::<Purge, _>(command_fn(|_: Purge, _| {
                async { anyhow::bail!("table locked") }.boxed()
            }))
            .build();
        let contract = HandlerContract::command::<Purge>();
        let invocation = CommandInvocation::<Purge>::build(&registry, &contract).unwrap();
        assert!(invocation.handler_name().contains("CommandFn"));

        match invocation.invoke(Purge, CancellationToken::new()).await {
            Err(MediatorError::HandlerFailed {
                handler, source, ..
            }) => {
                assert_eq!(handler, invocation.handler_name());
                assert_eq!(source.to_string(), "table locked");
            }
            other => panic!("expected HandlerFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_build_without_handler_fails() {
        let registry = HandlerRegistry::builder().build();
        let contract = HandlerContract::request::<Square>();
        let result = RequestInvocation::<Square>::build(&registry, &contract);
        assert!(matches!(
            result,
            Err(MediatorError::HandlerNotRegistered {
                kind: ContractKind::Request,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fan_out_without_subscribers() {
        let registry = HandlerRegistry::builder().build();
        let contract = HandlerContract::notification::<Alert>();
        let fan_out = NotificationFanOut::<Alert>::build(&registry, &contract).unwrap();

        assert!(fan_out.is_empty());
        fan_out
            .invoke(Alert("quiet"), CancellationToken::new(), PublishStrategy::Concurrent)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fan_out_runs_everyone_despite_failure() {
        for strategy in [PublishStrategy::Concurrent, PublishStrategy::Spawned] {
            let counter = Arc::new(AtomicUsize::new(0));
            let registry = HandlerRegistry::builder()
                .notification_handler::<Alert, _>(counting(counter.clone()))
                .notification_handler::<Alert, _>(failing())
                .notification_handler::<Alert, _>(counting(counter.clone()))
                .build();
            let contract = HandlerContract::notification::<Alert>();
            let fan_out = NotificationFanOut::<Alert>::build(&registry, &contract).unwrap();
            assert_eq!(fan_out.len(), 3);
            let names = fan_out.handler_names();
            assert!(names.iter().all(|name| name.contains("NotificationFn")));

            let result = fan_out
                .invoke(Alert("disk full"), CancellationToken::new(), strategy)
                .await;

            assert_eq!(counter.load(Ordering::SeqCst), 2, "strategy {strategy:?}");
            match result {
                Err(MediatorError::NotificationFailed(aggregate)) => {
                    assert_eq!(aggregate.handler_count, 3);
                    assert_eq!(aggregate.failures.len(), 1);
                    assert_eq!(aggregate.failures[0].handler, names[1]);
                    assert!(aggregate.failures[0]
                        .error
                        .to_string()
                        .contains("rejected disk full"));
                }
                other => panic!("expected aggregate failure, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_spawned_panic_becomes_failure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::builder()
            .notification_handler::<Alert, _>(notification_fn(|_: &Alert, _| {
                async { panic!("handler exploded") }.boxed()
            }))
            .notification_handler::<Alert, _>(counting(counter.clone()))
            .build();
        let contract = HandlerContract::notification::<Alert>();
        let fan_out = NotificationFanOut::<Alert>::build(&registry, &contract).unwrap();

        let result = fan_out
            .invoke(Alert("boom"), CancellationToken::new(), PublishStrategy::Spawned)
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        match result {
            Err(MediatorError::NotificationFailed(aggregate)) => {
                assert_eq!(aggregate.failures.len(), 1);
                assert!(aggregate.failures[0].panicked);
            }
            other => panic!("expected aggregate failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_panic_unwinds_publish() {
        let finished = Arc::new(AtomicUsize::new(0));
        let sibling = finished.clone();
        let registry = HandlerRegistry::builder()
            .notification_handler::<Alert, _>(notification_fn(|_: &Alert, _| {
                async { panic!("handler exploded") }.boxed()
            }))
            .notification_handler::<Alert, _>(notification_fn(move |_: &Alert, _| {
                let sibling = sibling.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    sibling.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                .boxed()
            }))
            .build();
        let contract = HandlerContract::notification::<Alert>();
        let fan_out = Arc::new(NotificationFanOut::<Alert>::build(&registry, &contract).unwrap());

        let publish = tokio::spawn(async move {
            fan_out
                .invoke(Alert("boom"), CancellationToken::new(), PublishStrategy::Concurrent)
                .await
        });

        assert!(publish.await.unwrap_err().is_panic());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
