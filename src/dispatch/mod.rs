//! # Dispatch Engine
//!
//! Type-indexed handler resolution and invocation.
//!
//! ## Architecture
//!
//! ```text
//! caller ─► Mediator::send / send_command / publish
//!              │
//!              ▼
//!           ResolutionCache (one per contract kind)
//!              │  miss: build entry once
//!              ▼
//!           HandlerProvider::resolve_required / resolve_all
//!              │
//!              ▼
//!           RequestInvocation / CommandInvocation / NotificationFanOut
//!              │
//!              ▼
//!           handler.handle(message, cancellation)
//! ```

pub mod cache;
pub mod invocation;
pub mod mediator;

pub use cache::ResolutionCache;
pub use invocation::{CommandInvocation, NotificationFanOut, RequestInvocation};
pub use mediator::{CacheStats, Mediator, Publisher, Sender};
