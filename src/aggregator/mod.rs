//! Aggregator module - typed access to the DEX aggregator HTTP API
//!
//! The client is deliberately dumb: no caching, no retries, no circuit
//! breaking. Those concerns belong to a wrapping policy layer, which keeps
//! this contract testable with a mocked transport.

pub mod client;
pub mod types;

pub use client::HttpAggregatorClient;
pub use types::{is_native, Quote, SwapParameters, NATIVE_TOKEN};

use crate::error::ResolverResult;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

/// Quote and swap-parameter lookup against a DEX aggregator.
///
/// The seam the orchestrator mocks in tests; production code uses
/// [`HttpAggregatorClient`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AggregatorApi: Send + Sync {
    /// Fetch a price quote for swapping `amount` of `src` into `dst`.
    ///
    /// `amount` is in the source token's smallest unit. The native asset is
    /// represented by the all-zero address sentinel.
    async fn fetch_quote(
        &self,
        src: Address,
        dst: Address,
        amount: U256,
    ) -> ResolverResult<Quote>;

    /// Fetch executable swap parameters (router address plus opaque calldata)
    /// for swapping `amount` of `src` into `dst` on behalf of `from`.
    ///
    /// `slippage_bps` must lie in (0, 5000]; out-of-range values are a caller
    /// programming error rejected before any network I/O. When `exact_output`
    /// is set, `amount` denominates the destination token instead.
    async fn fetch_swap_params(
        &self,
        src: Address,
        dst: Address,
        amount: U256,
        from: Address,
        slippage_bps: u32,
        exact_output: bool,
    ) -> ResolverResult<SwapParameters>;
}
