//! Error types for the store, identity and mail collaborators.

/// Errors reported by the data store or identity provider.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The addressed row does not exist or belongs to someone else.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected before reaching the store.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// The store answered with a body we could not interpret.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Errors reported by the email transport.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
