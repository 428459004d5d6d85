use meeple_catalog::{StoreError, ValidationError};
use thiserror::Error;

/// Failures surfaced by the [`Reconciler`](crate::Reconciler).
///
/// "Not found" is never an error here; lookups that miss return `None`.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
