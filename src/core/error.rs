use thiserror::Error;

/// User input rejected before a conversion is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter a valid amount to convert")]
    InvalidAmount,
    #[error("Select different currencies to convert")]
    SameCurrency,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to record conversion: {0}")]
    Persistence(#[source] anyhow::Error),
}
