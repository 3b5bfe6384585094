//! # Resolution Cache
//!
//! Memoizes the invocation entry built for each message shape so handler
//! lookup is paid once per shape rather than once per dispatch.
//!
//! ## Concurrency
//!
//! Entries live in a [`DashMap`] keyed by the shape's `TypeId`. A hit only
//! takes a shard read lock. On a miss the builder runs with no lock held, then
//! the result is offered with `entry().or_insert()`: the first entry stored
//! wins and every racer gets that entry back. A losing racer's entry is
//! dropped, which is harmless because builders only resolve handlers and
//! never invoke them.
//!
//! A builder error is returned to the caller and nothing is stored, so the
//! next dispatch of that shape retries resolution.

use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{MediatorError, MediatorResult};
use crate::registry::{ContractKind, HandlerContract};

type CachedEntry = Arc<dyn Any + Send + Sync>;

/// Per-shape memo of invocation entries for one contract kind
pub struct ResolutionCache {
    kind: ContractKind,
    entries: DashMap<TypeId, CachedEntry>,
}

impl ResolutionCache {
    pub fn new(kind: ContractKind) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
        }
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Return the entry for `contract`, building it on first use
    pub fn get_or_build<T, F>(&self, contract: &HandlerContract, builder: F) -> MediatorResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce(&HandlerContract) -> MediatorResult<T>,
    {
        debug_assert_eq!(contract.kind, self.kind, "contract routed to the wrong cache");

        let cached = self
            .entries
            .get(&contract.shape)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(entry) = cached {
            trace!(contract = %contract, "Resolution cache hit");
            return Self::typed(contract, entry);
        }

        let built: CachedEntry = Arc::new(builder(contract)?);
        let retained = Arc::clone(
            self.entries
                .entry(contract.shape)
                .or_insert_with(|| Arc::clone(&built))
                .value(),
        );

        if Arc::ptr_eq(&built, &retained) {
            debug!(contract = %contract, "Built and cached invocation entry");
        } else {
            trace!(contract = %contract, "Discarded duplicate invocation entry");
        }

        Self::typed(contract, retained)
    }

    pub fn contains(&self, contract: &HandlerContract) -> bool {
        self.entries.contains_key(&contract.shape)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn typed<T: Any + Send + Sync>(
        contract: &HandlerContract,
        entry: CachedEntry,
    ) -> MediatorResult<Arc<T>> {
        entry
            .downcast::<T>()
            .map_err(|_| MediatorError::ContractMismatch {
                shape: contract.shape_name,
                expected: std::any::type_name::<T>(),
            })
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("kind", &self.kind)
            .field("entries", &self.entries.len())
            .finish()
    }
}
