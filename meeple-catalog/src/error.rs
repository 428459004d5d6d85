use thiserror::Error;

/// A game failed an entity-level invariant check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Game name must not be blank")]
    BlankName,

    #[error("Game '{0}' cannot be its own base game")]
    SelfReference(String),

    #[error("Average rating {0} is outside 0-10")]
    RatingOutOfRange(f64),

    #[error("Average weight {0} must be a non-negative number")]
    InvalidWeight(f64),

    #[error("Player count {min}-{max} is inverted")]
    PlayerRange { min: u32, max: u32 },
}

/// A persistence backend failed.
///
/// The backend's own error is kept as the source so callers can downcast
/// or display it unchanged.
#[derive(Debug, Error)]
#[error("Storage error: {source}")]
pub struct StoreError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl StoreError {
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Borrow the backend error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }
}
