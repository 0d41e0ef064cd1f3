//! Error types for the resolver swap orchestrator

use thiserror::Error;

/// Main error type for swap-aware resolver operations
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No resolver contract configured for chain {chain_id}")]
    ChainNotConfigured { chain_id: u64 },

    #[error("Token {address} is not in the token registry")]
    TokenNotSupported { address: String },

    #[error("Aggregator returned HTTP {status}: {body}")]
    AggregatorStatus { status: u16, body: String },

    #[error("Aggregator transport failure: {0}")]
    AggregatorTransport(#[from] reqwest::Error),

    #[error("Aggregator response malformed: {0}")]
    AggregatorResponse(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ResolverError {
    /// Check whether a wrapping policy layer could reasonably retry.
    ///
    /// Nothing in this crate retries automatically; a blind retry on a swap
    /// quote risks acting on stale pricing. This only classifies failures for
    /// callers that implement their own policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolverError::AggregatorTransport(_))
    }

    /// Check if error is a fatal configuration problem
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ResolverError::Config(_)
                | ResolverError::ChainNotConfigured { .. }
                | ResolverError::TokenNotSupported { .. }
        )
    }
}

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;
