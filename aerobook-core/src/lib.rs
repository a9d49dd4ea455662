pub mod account;
pub mod booking;
pub mod flight;
pub mod payment;
pub mod repository;
pub mod search;

pub use repository::{Store, StoreError, StoreResult, UnitOfWork};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Trimmed, non-empty text or a validation error naming the field.
pub(crate) fn required_text(field: &str, value: Option<String>) -> CoreResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::ValidationError(format!("{} is required", field))),
    }
}
