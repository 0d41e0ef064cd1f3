//! Typed views over the aggregator's quote and swap-parameter payloads

use crate::error::{ResolverError, ResolverResult};

use alloy_primitives::{Address, Bytes, U256};
use serde::Deserialize;

/// Sentinel address representing the chain's native asset in aggregator
/// requests and order parameters
pub const NATIVE_TOKEN: Address = Address::ZERO;

/// Check whether an address is the native-asset sentinel
pub fn is_native(token: Address) -> bool {
    token == NATIVE_TOKEN
}

/// A price quote for a token pair.
///
/// Fetched fresh per request and never cached; prices move between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub src_token: Address,
    pub dst_token: Address,
    pub src_amount: U256,
    pub dst_amount: U256,
    pub estimated_gas: u64,
    /// Routing breakdown as reported by the aggregator; informational only
    pub protocols: Option<serde_json::Value>,
}

/// Executable swap parameters derived from a quote plus slippage tolerance.
///
/// `calldata` is opaque bytes produced by the aggregator for its own router
/// contract; nothing in this crate interprets or re-encodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParameters {
    pub router: Address,
    pub calldata: Bytes,
    /// Input amount the aggregator actually routed for. Approvals must use
    /// this value, not the caller's nominal amount, to tolerate
    /// aggregator-side rounding.
    pub src_amount: U256,
    pub dst_amount: U256,
    pub gas: u64,
}

/// Wire format of the `/quote` endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct QuoteResponse {
    #[serde(rename = "dstAmount")]
    pub dst_amount: String,
    #[serde(default)]
    pub gas: u64,
    #[serde(default)]
    pub protocols: Option<serde_json::Value>,
}

/// Wire format of the `/swap_params` endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct SwapResponse {
    pub router: String,
    /// Opaque router calldata, 0x-prefixed hex
    pub params: String,
    #[serde(rename = "srcAmount")]
    pub src_amount: String,
    #[serde(rename = "dstAmount")]
    pub dst_amount: String,
    #[serde(default)]
    pub gas: u64,
}

/// Parse a decimal base-unit amount from an aggregator payload
pub(crate) fn parse_amount(field: &str, value: &str) -> ResolverResult<U256> {
    U256::from_str_radix(value, 10).map_err(|e| {
        ResolverError::AggregatorResponse(format!("bad {} amount {:?}: {}", field, value, e))
    })
}

/// Parse a hex address from an aggregator payload
pub(crate) fn parse_address(field: &str, value: &str) -> ResolverResult<Address> {
    value.parse::<Address>().map_err(|e| {
        ResolverError::AggregatorResponse(format!("bad {} address {:?}: {}", field, value, e))
    })
}

/// Parse 0x-prefixed hex calldata from an aggregator payload
pub(crate) fn parse_calldata(field: &str, value: &str) -> ResolverResult<Bytes> {
    value.parse::<Bytes>().map_err(|e| {
        ResolverError::AggregatorResponse(format!("bad {} calldata: {}", field, e))
    })
}
