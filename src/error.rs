use thiserror::Error;

/// Unified error type for the bundle engine, covering both structural
/// decode failures and backend-surfaced problems.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("invalid header byte 0x{found:02x} for {expected}")]
    InvalidHeader { expected: &'static str, found: u8 },

    #[error("key not found")]
    KeyNotFound,

    #[error("write attempted on a read-only transaction")]
    ReadOnlyViolation,

    #[error("transaction conflict, please retry")]
    Conflict,

    #[error("key cannot be empty")]
    EmptyKey,

    #[error("transaction has already been discarded")]
    DiscardedTransaction,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("bundle engine corruption: {0}")]
    Corrupt(String),
}

impl BundleError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        BundleError::Backend(err.to_string())
    }

    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        BundleError::Corrupt(msg.into())
    }
}

pub type BundleResult<T> = Result<T, BundleError>;
