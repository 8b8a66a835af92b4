//! Command execution pipeline for the product aggregate.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load product from the catalog (or start from an empty aggregate)
//!   ↓
//! 2. Handle command (pure decision logic, produces events)
//!   ↓
//! 3. Apply events and save the product (skipped when no events)
//! ```
//!
//! This module contains no IO itself; it composes the `ProductCatalog` trait.

use tracing::debug;

use stockdate_core::{Aggregate, AggregateRoot, DomainError, ProductId};
use stockdate_products::{Product, ProductCommand, ProductEvent};

use crate::catalog::{CatalogError, ProductCatalog};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Domain validation failure (deterministic).
    #[error("validation failed: {0}")]
    Validation(String),
    /// Domain invariant failure (deterministic).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// The command conflicts with current state (e.g. duplicate create).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The product does not exist.
    #[error("not found")]
    NotFound,
    /// Loading or saving the product failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Runs product commands against a catalog.
///
/// Writes are last-writer-wins: there is no version check between load and
/// save, matching the attribute-level semantics of the host platform.
#[derive(Debug)]
pub struct CommandDispatcher<C> {
    catalog: C,
}

impl<C> CommandDispatcher<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }
}

impl<C: ProductCatalog> CommandDispatcher<C> {
    /// Dispatch a command and return the events it produced.
    ///
    /// An empty result means the command was a no-op and nothing was saved.
    pub fn dispatch(
        &self,
        product_id: ProductId,
        command: ProductCommand,
    ) -> Result<Vec<ProductEvent>, DispatchError> {
        let mut product = self
            .catalog
            .load(product_id)?
            .unwrap_or_else(|| Product::empty(product_id));

        let events = product.handle(&command)?;
        if events.is_empty() {
            return Ok(events);
        }

        for event in &events {
            product.apply(event);
        }
        self.catalog.save(&product)?;

        for event in &events {
            debug!(
                product_id = %product_id,
                event_type = event.event_type(),
                version = product.version(),
                "product event committed"
            );
        }

        Ok(events)
    }
}
