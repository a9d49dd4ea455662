pub mod coordinator;
pub mod directory;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::BookingCoordinator;
pub use directory::FlightDirectory;
pub use verifier::PaymentVerifier;

use aerobook_core::payment::GatewayError;
use aerobook_core::{CoreError, StoreError, UnitOfWork};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ValidationFailed(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Invalid signature")]
    SignatureMismatch,
    #[error("Internal failure: {0}")]
    Internal(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => BookingError::NotFound(format!("{} not found", what)),
            StoreError::Conflict(msg) => BookingError::Conflict(msg),
            StoreError::Backend(msg) => BookingError::Internal(msg),
        }
    }
}

impl From<CoreError> for BookingError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => BookingError::ValidationFailed(msg),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Commit the unit of work if `outcome` succeeded, otherwise roll it back.
/// The unit is consumed either way, so it is always released.
pub(crate) async fn finish<T>(uow: Box<dyn UnitOfWork>, outcome: BookingResult<T>) -> BookingResult<T> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed, transaction released on drop");
            }
            Err(e)
        }
    }
}
