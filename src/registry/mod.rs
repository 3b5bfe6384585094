//! # Registry Infrastructure
//!
//! Where handler instances live and how the mediator finds them.
//!
//! ## Overview
//!
//! The mediator depends on the [`HandlerProvider`] trait only; it is handed a
//! provider at construction and never looks anything up globally. The crate
//! ships [`HandlerRegistry`] as the default provider, but any container that
//! can answer "single handler for this contract" and "all handlers for this
//! contract" will do, including test doubles.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── HandlerProvider       (lookup boundary consumed by the mediator)
//! ├── HandlerRegistry       (default immutable provider)
//! │   └── HandlerRegistryBuilder
//! └── HandlerModule         (bundles of registrations composed at start-up)
//! ```

pub mod handler_registry;
pub mod module;
pub mod provider;

pub use handler_registry::{HandlerRegistry, HandlerRegistryBuilder, RegistryStats};
pub use module::HandlerModule;
pub use provider::{ContractKind, HandlerContract, HandlerProvider, ResolvedHandler};
