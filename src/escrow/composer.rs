//! Composition of conversion calls with the canonical escrow call
//!
//! Each composition is a single synchronous assembly. Ordering is mandatory:
//! for deployment the funding calls (approve source, swap, approve factory)
//! must precede the deploy; for withdraw and cancel the escrow call must come
//! first, since funds only exist in the resolver's control afterwards.

use super::{IEscrowResolver, Immutables, PreparedCall};
use crate::aggregator::is_native;
use crate::calls::{build_approval_call, ArbitraryCall};
use crate::config::ChainAddresses;
use crate::error::{ResolverError, ResolverResult};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use tracing::debug;

/// Unsigned transaction request: target, call data, and attached native value.
///
/// Signing and broadcasting are the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// A fully composed escrow operation.
///
/// `calls` is the logical on-chain execution order, with the canonical escrow
/// call as its own element; `request` is the single unsigned transaction that
/// encodes the sequence through the resolver contract entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedTransaction {
    pub calls: Vec<ArbitraryCall>,
    pub request: TransactionRequest,
}

impl ComposedTransaction {
    fn new(resolver: Address, data: Vec<u8>, value: U256, calls: Vec<ArbitraryCall>) -> Self {
        let data = Bytes::from(data);
        Self {
            calls,
            request: TransactionRequest {
                to: resolver,
                data,
                value,
            },
        }
    }
}

/// Compose the deploy-destination operation.
///
/// `conversion_calls` is the ordered approve/swap pair from the orchestrator,
/// or empty when the inventory already holds the order's token. The empty
/// path produces a single-call transaction and never touches the aggregator.
/// On the conversion path a factory approval for the (now swapped) order
/// token is appended before the deploy.
pub fn compose_deploy_destination(
    addresses: ChainAddresses,
    conversion_calls: Vec<ArbitraryCall>,
    immutables: Immutables,
    src_cancellation_timestamp: U256,
) -> ResolverResult<ComposedTransaction> {
    let mut calls = conversion_calls;
    let dst_token = immutables.token;

    if !calls.is_empty() && !is_native(dst_token) {
        calls.push(build_approval_call(
            dst_token,
            addresses.escrow_factory,
            immutables.amount,
        ));
    }

    // Native destination assets ride along as transaction value
    let value = if is_native(dst_token) {
        immutables
            .amount
            .checked_add(immutables.safetyDeposit)
            .ok_or_else(|| {
                ResolverError::InvalidParameter("amount + safety deposit overflows".to_string())
            })?
    } else {
        immutables.safetyDeposit
    };

    let preparatory: Vec<PreparedCall> = calls.iter().map(PreparedCall::from).collect();
    let data = IEscrowResolver::deployDstCall {
        preparatoryCalls: preparatory,
        immutables,
        srcCancellationTimestamp: src_cancellation_timestamp,
    }
    .abi_encode();

    calls.push(ArbitraryCall {
        target: addresses.resolver,
        data: data.clone().into(),
    });

    debug!(
        call_count = calls.len(),
        value = %value,
        "composed deploy-destination transaction"
    );
    Ok(ComposedTransaction::new(addresses.resolver, data, value, calls))
}

/// Compose the withdraw operation: the escrow withdrawal executes first, any
/// conversion of the released funds after.
pub fn compose_withdraw(
    addresses: ChainAddresses,
    escrow: Address,
    secret: B256,
    immutables: Immutables,
    conversion_calls: Vec<ArbitraryCall>,
) -> ComposedTransaction {
    let follow_up: Vec<PreparedCall> = conversion_calls.iter().map(PreparedCall::from).collect();
    let data = IEscrowResolver::withdrawCall {
        escrow,
        secret,
        immutables,
        followUpCalls: follow_up,
    }
    .abi_encode();

    let mut calls = vec![ArbitraryCall {
        target: addresses.resolver,
        data: data.clone().into(),
    }];
    calls.extend(conversion_calls);

    debug!(call_count = calls.len(), %escrow, "composed withdraw transaction");
    ComposedTransaction::new(addresses.resolver, data, U256::ZERO, calls)
}

/// Compose the cancel operation: identical ordering to withdraw, with the
/// escrowed funds returning to the resolver before any conversion.
pub fn compose_cancel(
    addresses: ChainAddresses,
    escrow: Address,
    immutables: Immutables,
    conversion_calls: Vec<ArbitraryCall>,
) -> ComposedTransaction {
    let follow_up: Vec<PreparedCall> = conversion_calls.iter().map(PreparedCall::from).collect();
    let data = IEscrowResolver::cancelCall {
        escrow,
        immutables,
        followUpCalls: follow_up,
    }
    .abi_encode();

    let mut calls = vec![ArbitraryCall {
        target: addresses.resolver,
        data: data.clone().into(),
    }];
    calls.extend(conversion_calls);

    debug!(call_count = calls.len(), %escrow, "composed cancel transaction");
    ComposedTransaction::new(addresses.resolver, data, U256::ZERO, calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::build_swap_call;

    fn addresses() -> ChainAddresses {
        ChainAddresses {
            resolver: Address::repeat_byte(0x11),
            escrow_factory: Address::repeat_byte(0x22),
        }
    }

    fn immutables(token: Address, amount: u64, safety_deposit: u64) -> Immutables {
        Immutables {
            orderHash: B256::repeat_byte(0x01),
            hashlock: B256::repeat_byte(0x02),
            maker: Address::repeat_byte(0x03),
            taker: Address::repeat_byte(0x04),
            token,
            amount: U256::from(amount),
            safetyDeposit: U256::from(safety_deposit),
            timelocks: U256::from(0u64),
        }
    }

    fn conversion_pair(src: Address, router: Address, input: u64) -> Vec<ArbitraryCall> {
        vec![
            build_approval_call(src, router, U256::from(input)),
            build_swap_call(router, Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])),
        ]
    }

    #[test]
    fn test_deploy_without_conversion_is_single_call() {
        let token = Address::repeat_byte(0xaa);
        let tx = compose_deploy_destination(
            addresses(),
            Vec::new(),
            immutables(token, 1_000_000, 500),
            U256::from(1_700_000_000u64),
        )
        .unwrap();

        assert_eq!(tx.calls.len(), 1);
        assert_eq!(tx.calls[0].target, addresses().resolver);
        assert_eq!(tx.request.to, addresses().resolver);
        assert_eq!(tx.request.value, U256::from(500u64));
    }

    #[test]
    fn test_deploy_with_conversion_orders_calls() {
        let src = Address::repeat_byte(0xaa);
        let dst = Address::repeat_byte(0xbb);
        let router = Address::repeat_byte(0xcc);
        let tx = compose_deploy_destination(
            addresses(),
            conversion_pair(src, router, 999_500),
            immutables(dst, 1_000_000, 500),
            U256::from(1_700_000_000u64),
        )
        .unwrap();

        // approve src -> swap -> approve factory -> deploy
        assert_eq!(tx.calls.len(), 4);
        assert_eq!(tx.calls[0].target, src);
        assert_eq!(tx.calls[1].target, router);
        assert_eq!(tx.calls[2].target, dst);
        assert_eq!(tx.calls[3].target, addresses().resolver);

        // Factory approval covers the exact order amount
        let approve_factory = &tx.calls[2];
        assert_eq!(&approve_factory.data[16..36], addresses().escrow_factory.as_slice());
        assert_eq!(
            U256::from_be_slice(&approve_factory.data[36..68]),
            U256::from(1_000_000u64)
        );
    }

    #[test]
    fn test_deploy_native_destination_attaches_amount_as_value() {
        let tx = compose_deploy_destination(
            addresses(),
            Vec::new(),
            immutables(Address::ZERO, 1_000_000, 500),
            U256::from(1_700_000_000u64),
        )
        .unwrap();
        assert_eq!(tx.request.value, U256::from(1_000_500u64));
    }

    #[test]
    fn test_deploy_native_destination_skips_factory_approval() {
        let src = Address::repeat_byte(0xaa);
        let router = Address::repeat_byte(0xcc);
        let tx = compose_deploy_destination(
            addresses(),
            conversion_pair(src, router, 999_500),
            immutables(Address::ZERO, 1_000_000, 500),
            U256::from(1_700_000_000u64),
        )
        .unwrap();

        // approve src -> swap -> deploy (nothing to approve for native)
        assert_eq!(tx.calls.len(), 3);
        assert_eq!(tx.calls[2].target, addresses().resolver);
    }

    #[test]
    fn test_withdraw_escrow_call_comes_first() {
        let escrow = Address::repeat_byte(0xee);
        let src = Address::repeat_byte(0xaa);
        let router = Address::repeat_byte(0xcc);
        let tx = compose_withdraw(
            addresses(),
            escrow,
            B256::repeat_byte(0x05),
            immutables(src, 1_000_000, 500),
            conversion_pair(src, router, 999_500),
        );

        assert_eq!(tx.calls.len(), 3);
        assert_eq!(tx.calls[0].target, addresses().resolver);
        assert_eq!(tx.calls[1].target, src);
        assert_eq!(tx.calls[2].target, router);
        assert_eq!(tx.request.value, U256::ZERO);
    }

    #[test]
    fn test_cancel_without_conversion_is_single_call() {
        let tx = compose_cancel(
            addresses(),
            Address::repeat_byte(0xee),
            immutables(Address::repeat_byte(0xaa), 1_000_000, 500),
            Vec::new(),
        );
        assert_eq!(tx.calls.len(), 1);
        assert_eq!(tx.calls[0].target, addresses().resolver);
    }

    #[test]
    fn test_withdraw_request_encodes_follow_up_calls() {
        let escrow = Address::repeat_byte(0xee);
        let src = Address::repeat_byte(0xaa);
        let router = Address::repeat_byte(0xcc);
        let with = compose_withdraw(
            addresses(),
            escrow,
            B256::repeat_byte(0x05),
            immutables(src, 1_000_000, 500),
            conversion_pair(src, router, 999_500),
        );
        let without = compose_withdraw(
            addresses(),
            escrow,
            B256::repeat_byte(0x05),
            immutables(src, 1_000_000, 500),
            Vec::new(),
        );
        // The follow-up calls are folded into the entrypoint encoding
        assert!(with.request.data.len() > without.request.data.len());
    }
}
