//! Conversion orchestrator - decides whether a token conversion is needed and
//! produces the ordered call list that funds an escrow operation
//!
//! Policy and mechanism are kept separate: [`needs_conversion`] is the pure
//! decision, [`ConversionOrchestrator::prepare_conversion`] is the mechanism
//! and must only be invoked when the decision was positive.

use crate::aggregator::client::{validate_amount, validate_slippage};
use crate::aggregator::{is_native, AggregatorApi};
use crate::calls::{build_approval_call, build_swap_call, ArbitraryCall};
use crate::error::{ResolverError, ResolverResult};

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::debug;

/// Decide whether holding `held` requires a conversion to satisfy `required`.
///
/// Pure and synchronous; equal addresses (case-insensitivity is inherent to
/// the parsed address type) mean no conversion and no aggregator round-trip.
pub fn needs_conversion(held: Address, required: Address) -> bool {
    held != required
}

/// A conversion the resolver intends to execute, as an explicit sum type.
///
/// Replaces ad-hoc scenario presets: each variant carries exactly the fields
/// it needs, and the constructors reject same-token pairs, so a degenerate
/// "convert a token into itself" intent cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionIntent {
    /// Swap the chain's native asset into an ERC-20 token
    NativeToToken { token: Address },
    /// Swap an ERC-20 token into the chain's native asset
    TokenToNative { token: Address },
    /// Swap one ERC-20 token into another
    TokenToToken { src: Address, dst: Address },
}

impl ConversionIntent {
    /// Classify a held/required token pair into an intent.
    ///
    /// Fails when the pair needs no conversion; callers gate on
    /// [`needs_conversion`] first.
    pub fn between(held: Address, required: Address) -> ResolverResult<Self> {
        if held == required {
            return Err(ResolverError::InvalidParameter(format!(
                "conversion intent between identical tokens {:#x}",
                held
            )));
        }
        Ok(match (is_native(held), is_native(required)) {
            (true, _) => ConversionIntent::NativeToToken { token: required },
            (_, true) => ConversionIntent::TokenToNative { token: held },
            _ => ConversionIntent::TokenToToken {
                src: held,
                dst: required,
            },
        })
    }

    /// Source token, with the all-zero sentinel for the native asset
    pub fn source(&self) -> Address {
        match self {
            ConversionIntent::NativeToToken { .. } => Address::ZERO,
            ConversionIntent::TokenToNative { token } => *token,
            ConversionIntent::TokenToToken { src, .. } => *src,
        }
    }

    /// Destination token, with the all-zero sentinel for the native asset
    pub fn destination(&self) -> Address {
        match self {
            ConversionIntent::NativeToToken { token } => *token,
            ConversionIntent::TokenToNative { .. } => Address::ZERO,
            ConversionIntent::TokenToToken { dst, .. } => *dst,
        }
    }
}

/// The ordered conversion calls plus the aggregator-reported expectations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedConversion {
    /// Approval of the source token to the router; absent for native sources
    pub approval: Option<ArbitraryCall>,
    pub swap: ArbitraryCall,
    pub expected_input: U256,
    pub expected_output: U256,
    pub gas: u64,
    pub router: Address,
}

impl PreparedConversion {
    /// The execution-ordered call list: approval (if any) strictly before swap
    pub fn into_calls(self) -> Vec<ArbitraryCall> {
        let mut calls = Vec::with_capacity(2);
        if let Some(approval) = self.approval {
            calls.push(approval);
        }
        calls.push(self.swap);
        calls
    }
}

/// Decision engine turning a conversion intent into executable calls
pub struct ConversionOrchestrator {
    api: Arc<dyn AggregatorApi>,
}

impl ConversionOrchestrator {
    pub fn new(api: Arc<dyn AggregatorApi>) -> Self {
        Self { api }
    }

    /// Price a conversion without committing to it.
    ///
    /// Quotes are fetched fresh every time; they are never cached because
    /// prices move between calls.
    pub async fn quote(
        &self,
        intent: &ConversionIntent,
        amount: U256,
    ) -> ResolverResult<crate::aggregator::Quote> {
        validate_amount(amount)?;
        self.api
            .fetch_quote(intent.source(), intent.destination(), amount)
            .await
    }

    /// Fetch swap parameters and build the approve/swap call pair.
    ///
    /// The approval amount is the aggregator-reported input, never the
    /// caller's nominal `amount`, to tolerate aggregator-side rounding.
    /// Aggregator failures propagate unchanged; no partial result is ever
    /// returned, since an escrow call without its funding swap would leave
    /// the resolver unable to fulfill the order.
    pub async fn prepare_conversion(
        &self,
        intent: &ConversionIntent,
        amount: U256,
        from: Address,
        slippage_bps: u32,
        exact_output: bool,
    ) -> ResolverResult<PreparedConversion> {
        validate_amount(amount)?;
        validate_slippage(slippage_bps)?;

        let src = intent.source();
        let dst = intent.destination();
        debug!(
            src = %src,
            dst = %dst,
            %amount,
            slippage_bps,
            exact_output,
            "preparing conversion"
        );

        let params = self
            .api
            .fetch_swap_params(src, dst, amount, from, slippage_bps, exact_output)
            .await?;

        let approval = (!is_native(src))
            .then(|| build_approval_call(src, params.router, params.src_amount));
        let swap = build_swap_call(params.router, params.calldata);

        Ok(PreparedConversion {
            approval,
            swap,
            expected_input: params.src_amount,
            expected_output: params.dst_amount,
            gas: params.gas,
            router: params.router,
        })
    }
}
