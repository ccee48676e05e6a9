use thiserror::Error;

/// Failure while reading or rewriting the durable record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors reported by catalog operations.
///
/// `NotFound` covers unknown ids, `InvalidField` covers empty required text,
/// the checkout pair covers precondition failures, and `Store` carries
/// persistence failures through to the caller.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no book with id {id}")]
    NotFound { id: String },
    #[error("{field} must not be empty")]
    InvalidField { field: &'static str },
    #[error("book {id} is already checked out")]
    AlreadyCheckedOut { id: String },
    #[error("book {id} is not checked out")]
    NotCheckedOut { id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
