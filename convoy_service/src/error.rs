use convoy_providers::provider::ProviderError;
use convoy_store::error::StoreError;
use thiserror::Error;

/// Everything the optimization core can fail with. Inside a worker these are
/// all translated into one terminal `failed` status update; nothing escapes
/// to crash the worker loop.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("{0}")]
    Validation(String),

    #[error("Routing provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("No feasible solution found")]
    Infeasible,

    #[error("Optimization timed out")]
    Timeout,

    #[error("Optimization request not found")]
    NotFound,

    #[error("Optimization queue unavailable")]
    ServiceUnavailable,

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for OptimizeError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Validation(message) => OptimizeError::Validation(message),
            other => OptimizeError::Store(other),
        }
    }
}
