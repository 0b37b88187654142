//! Error taxonomy shared by every AlphaVault crate

use thiserror::Error;

pub type MarketResult<T> = Result<T, MarketError>;

/// Errors raised by the access-control and execution services.
///
/// Lifecycle and configuration violations come back as `Err`; business
/// failures (denied purchase, failed execution) travel inside the outcome
/// structs so callers can render them without unwinding.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0} has not been initialized")]
    NotInitialized(&'static str),

    #[error("access control service is not ready")]
    ServiceNotReady,

    #[error("dependency not ready: {0}")]
    DependencyNotReady(String),

    #[error("configuration is immutable after initialization")]
    ImmutableConfig,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}
