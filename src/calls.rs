//! Low-level call descriptors spliced into escrow operations
//!
//! Both builders are pure and deterministic; they can be unit tested without
//! a live chain or aggregator.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    function approve(address spender, uint256 amount) external returns (bool);
}

/// A single owner-authorized call executed by the resolver contract:
/// a target address plus ABI-encoded call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitraryCall {
    pub target: Address,
    pub data: Bytes,
}

/// Build a standard ERC-20 approval call: `approve(spender, amount)` against
/// `token`.
///
/// `amount` covers the full uint256 range; encoding is exact (no floats
/// anywhere in the path).
pub fn build_approval_call(token: Address, spender: Address, amount: U256) -> ArbitraryCall {
    let data = approveCall { spender, amount }.abi_encode();
    ArbitraryCall {
        target: token,
        data: data.into(),
    }
}

/// Wrap aggregator-produced router calldata as a call against the router.
///
/// Pure passthrough: the calldata is opaque to this crate and is never
/// inspected or re-encoded.
pub fn build_swap_call(router: Address, calldata: Bytes) -> ArbitraryCall {
    ArbitraryCall {
        target: router,
        data: calldata,
    }
}
