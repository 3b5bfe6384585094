//! Shared fixtures for mediator integration tests: sample messages, handlers
//! that record their invocations, and provider doubles that count lookups.

#![allow(dead_code)]

use async_trait::async_trait;
use m3diator::{
    Command, CommandHandler, HandlerContract, HandlerProvider, HandlerRegistry, MediatorError,
    MediatorResult, Notification, NotificationHandler, Request, RequestHandler, ResolvedHandler,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// === Messages ===

#[derive(Debug, Clone)]
pub struct Greeting;

impl Request for Greeting {
    type Response = String;
}

#[derive(Debug, Clone)]
pub struct Echo(pub i64);

impl Request for Echo {
    type Response = i64;
}

#[derive(Debug, Clone)]
pub struct NoOp;

impl Command for NoOp {}

#[derive(Debug, Clone)]
pub struct FailingCommand(pub &'static str);

impl Command for FailingCommand {}

#[derive(Debug, Clone)]
pub struct PingEvent(pub u32);

impl Notification for PingEvent {}

#[derive(Debug, Clone)]
pub struct UnheardEvent;

impl Notification for UnheardEvent {}

#[derive(Debug, Clone)]
pub struct Drain;

impl Command for Drain {}

#[derive(Debug, Clone)]
pub struct ShutdownEvent;

impl Notification for ShutdownEvent {}

#[derive(Debug, Clone)]
pub struct SlowRequest(pub Duration);

impl Request for SlowRequest {
    type Response = &'static str;
}

// === Handlers ===

pub struct GreetingHandler;

#[async_trait]
impl RequestHandler<Greeting> for GreetingHandler {
    async fn handle(&self, _: Greeting, _: CancellationToken) -> anyhow::Result<String> {
        Ok("Hello Mundo!".to_string())
    }
}

pub struct EchoHandler;

#[async_trait]
impl RequestHandler<Echo> for EchoHandler {
    async fn handle(&self, request: Echo, _: CancellationToken) -> anyhow::Result<i64> {
        Ok(request.0)
    }
}

#[derive(Default)]
pub struct RecordingCommandHandler {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CommandHandler<NoOp> for RecordingCommandHandler {
    async fn handle(&self, _: NoOp, _: CancellationToken) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FailingCommandHandler;

#[async_trait]
impl CommandHandler<FailingCommand> for FailingCommandHandler {
    async fn handle(&self, command: FailingCommand, _: CancellationToken) -> anyhow::Result<()> {
        anyhow::bail!("command rejected: {}", command.0)
    }
}

/// Notification subscriber that counts deliveries and remembers payloads
pub struct RecordingSubscriber {
    pub name: &'static str,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<u32>>,
    pub delay: Option<Duration>,
    pub fail: bool,
}

impl RecordingSubscriber {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            delay: None,
            fail: false,
        })
    }

    pub fn slow(name: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            delay: Some(delay),
            fail: false,
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            delay: None,
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationHandler<PingEvent> for RecordingSubscriber {
    async fn handle(&self, event: &PingEvent, _: CancellationToken) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(event.0);
        if self.fail {
            anyhow::bail!("{} refused ping {}", self.name, event.0);
        }
        Ok(())
    }
}

/// Waits for its work or for cancellation, whichever comes first
pub struct CancellableHandler;

#[async_trait]
impl RequestHandler<SlowRequest> for CancellableHandler {
    async fn handle(
        &self,
        request: SlowRequest,
        cancellation: CancellationToken,
    ) -> anyhow::Result<&'static str> {
        tokio::select! {
            _ = cancellation.cancelled() => Ok("cancelled"),
            _ = tokio::time::sleep(request.0) => Ok("finished"),
        }
    }
}

/// Records how many calls arrived and how many carried a cancelled token
#[derive(Default)]
pub struct TokenObserver {
    pub observed: AtomicUsize,
    pub cancelled: AtomicUsize,
}

impl TokenObserver {
    fn record(&self, cancellation: &CancellationToken) {
        self.observed.fetch_add(1, Ordering::SeqCst);
        if cancellation.is_cancelled() {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn observed(&self) -> usize {
        self.observed.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandHandler<Drain> for TokenObserver {
    async fn handle(&self, _: Drain, cancellation: CancellationToken) -> anyhow::Result<()> {
        self.record(&cancellation);
        Ok(())
    }
}

#[async_trait]
impl NotificationHandler<ShutdownEvent> for TokenObserver {
    async fn handle(
        &self,
        _: &ShutdownEvent,
        cancellation: CancellationToken,
    ) -> anyhow::Result<()> {
        self.record(&cancellation);
        Ok(())
    }
}

// === Provider doubles ===

/// Delegates to a registry and counts every lookup
pub struct CountingProvider {
    inner: HandlerRegistry,
    required_lookups: AtomicUsize,
    all_lookups: AtomicUsize,
    contracts: Mutex<Vec<HandlerContract>>,
}

impl CountingProvider {
    pub fn new(inner: HandlerRegistry) -> Arc<Self> {
        Arc::new(Self {
            inner,
            required_lookups: AtomicUsize::new(0),
            all_lookups: AtomicUsize::new(0),
            contracts: Mutex::new(Vec::new()),
        })
    }

    pub fn required_lookups(&self) -> usize {
        self.required_lookups.load(Ordering::SeqCst)
    }

    pub fn all_lookups(&self) -> usize {
        self.all_lookups.load(Ordering::SeqCst)
    }

    pub fn lookups_for(&self, contract: &HandlerContract) -> usize {
        self.contracts.lock().iter().filter(|c| *c == contract).count()
    }
}

impl HandlerProvider for CountingProvider {
    fn resolve_required(&self, contract: &HandlerContract) -> MediatorResult<ResolvedHandler> {
        self.required_lookups.fetch_add(1, Ordering::SeqCst);
        self.contracts.lock().push(*contract);
        self.inner.resolve_required(contract)
    }

    fn resolve_all(&self, contract: &HandlerContract) -> Vec<ResolvedHandler> {
        self.all_lookups.fetch_add(1, Ordering::SeqCst);
        self.contracts.lock().push(*contract);
        self.inner.resolve_all(contract)
    }
}

/// Reports every contract as unregistered for the first `failures` lookups
pub struct FlakyProvider {
    inner: HandlerRegistry,
    remaining_failures: AtomicUsize,
    lookups: AtomicUsize,
}

impl FlakyProvider {
    pub fn new(inner: HandlerRegistry, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            remaining_failures: AtomicUsize::new(failures),
            lookups: AtomicUsize::new(0),
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl HandlerProvider for FlakyProvider {
    fn resolve_required(&self, contract: &HandlerContract) -> MediatorResult<ResolvedHandler> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MediatorError::HandlerNotRegistered {
                kind: contract.kind,
                shape: contract.shape_name,
            });
        }
        self.inner.resolve_required(contract)
    }

    fn resolve_all(&self, contract: &HandlerContract) -> Vec<ResolvedHandler> {
        self.inner.resolve_all(contract)
    }
}

/// Answers every contract with a plain `Arc<u32>` that implements no handler trait
pub struct MisdirectedProvider;

impl MisdirectedProvider {
    fn bogus() -> ResolvedHandler {
        ResolvedHandler {
            handler_name: "u32",
            instance: Arc::new(Arc::new(7_u32)),
        }
    }
}

impl HandlerProvider for MisdirectedProvider {
    fn resolve_required(&self, _: &HandlerContract) -> MediatorResult<ResolvedHandler> {
        Ok(Self::bogus())
    }

    fn resolve_all(&self, _: &HandlerContract) -> Vec<ResolvedHandler> {
        vec![Self::bogus()]
    }
}

/// Registry with one handler for each sample shape
pub fn sample_registry(subscribers: &[Arc<RecordingSubscriber>]) -> HandlerRegistry {
    let mut builder = HandlerRegistry::builder()
        .request_handler::<Greeting, _>(GreetingHandler)
        .request_handler::<Echo, _>(EchoHandler)
        .request_handler::<SlowRequest, _>(CancellableHandler)
        .command_handler::<FailingCommand, _>(FailingCommandHandler);
    for subscriber in subscribers {
        let handler: Arc<dyn NotificationHandler<PingEvent>> = subscriber.clone();
        builder = builder.notification_handler_arc(handler);
    }
    builder.build()
}
