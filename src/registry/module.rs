//! # Handler Modules
//!
//! A module bundles the registrations of one code unit so an application
//! can compose its handler set at start-up without listing every handler in
//! one place.
//!
//! ```rust
//! use m3diator::{HandlerModule, HandlerRegistry, HandlerRegistryBuilder};
//!
//! struct BillingModule;
//!
//! impl HandlerModule for BillingModule {
//!     fn name(&self) -> &str {
//!         "billing"
//!     }
//!
//!     fn register(&self, builder: HandlerRegistryBuilder) -> HandlerRegistryBuilder {
//!         // builder.request_handler::<ChargeCard, _>(ChargeCardHandler::new())
//!         builder
//!     }
//! }
//!
//! let registry = HandlerRegistry::builder().module(&BillingModule).build();
//! ```

use super::handler_registry::HandlerRegistryBuilder;

/// A set of handler registrations contributed by one code unit
pub trait HandlerModule {
    /// Name used in registration logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn register(&self, builder: HandlerRegistryBuilder) -> HandlerRegistryBuilder;
}
