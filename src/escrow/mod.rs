//! Escrow module - the resolver-contract call interface and transaction
//! composition
//!
//! The escrow protocol itself (hash-locked timelocked escrows, address
//! derivation, timelock semantics) is an external collaborator; this module
//! only encodes calls against its known entrypoints.

pub mod composer;

pub use composer::{
    compose_cancel, compose_deploy_destination, compose_withdraw, ComposedTransaction,
    TransactionRequest,
};

use crate::calls::ArbitraryCall;

use alloy_sol_types::sol;

sol! {
    /// Immutable order parameters pinned into the escrow at deployment
    #[derive(Debug, PartialEq, Eq)]
    struct Immutables {
        bytes32 orderHash;
        bytes32 hashlock;
        address maker;
        address taker;
        address token;
        uint256 amount;
        uint256 safetyDeposit;
        uint256 timelocks;
    }

    /// A target/data pair the resolver contract executes around the escrow
    /// operation
    #[derive(Debug, PartialEq, Eq)]
    struct PreparedCall {
        address target;
        bytes data;
    }

    interface IEscrowResolver {
        /// Deploy the destination-side escrow, executing `preparatoryCalls`
        /// first. Payable: carries the safety deposit, plus the order amount
        /// when the destination asset is native.
        function deployDst(
            PreparedCall[] calldata preparatoryCalls,
            Immutables calldata immutables,
            uint256 srcCancellationTimestamp
        ) external payable;

        /// Withdraw from a deployed escrow with the revealed secret, then
        /// execute `followUpCalls`.
        function withdraw(
            address escrow,
            bytes32 secret,
            Immutables calldata immutables,
            PreparedCall[] calldata followUpCalls
        ) external;

        /// Cancel a deployed escrow after its timelock, then execute
        /// `followUpCalls`.
        function cancel(
            address escrow,
            Immutables calldata immutables,
            PreparedCall[] calldata followUpCalls
        ) external;
    }
}

impl From<&ArbitraryCall> for PreparedCall {
    fn from(call: &ArbitraryCall) -> Self {
        PreparedCall {
            target: call.target,
            data: call.data.clone(),
        }
    }
}
