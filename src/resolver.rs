//! Resolver transaction facade - the public surface combining orchestration,
//! call building, and escrow composition
//!
//! Each method returns an unsigned [`ComposedTransaction`]; signing and
//! broadcasting belong to the caller. The facade holds only immutable
//! configuration, so concurrent invocations are safe without locks.

use crate::aggregator::{is_native, AggregatorApi, HttpAggregatorClient};
use crate::calls::ArbitraryCall;
use crate::config::{ChainAddressTable, Settings, TokenRegistry};
use crate::error::ResolverResult;
use crate::escrow::{
    compose_cancel, compose_deploy_destination, compose_withdraw, ComposedTransaction, Immutables,
};
use crate::orchestrator::{needs_conversion, ConversionIntent, ConversionOrchestrator};

use alloy_primitives::{Address, B256, U256};
use std::sync::Arc;
use tracing::{debug, info};

/// Swap-aware resolver transaction builder.
///
/// Constructed once per resolver session; the address table, token registry,
/// and aggregator endpoint are immutable for its lifetime.
pub struct SwapResolver {
    chains: ChainAddressTable,
    tokens: TokenRegistry,
    orchestrator: ConversionOrchestrator,
    default_slippage_bps: u32,
}

impl SwapResolver {
    /// Create a facade from pre-built parts
    pub fn new(
        chains: ChainAddressTable,
        tokens: TokenRegistry,
        api: Arc<dyn AggregatorApi>,
        default_slippage_bps: u32,
    ) -> ResolverResult<Self> {
        crate::aggregator::client::validate_slippage(default_slippage_bps)?;
        Ok(Self {
            chains,
            tokens,
            orchestrator: ConversionOrchestrator::new(api),
            default_slippage_bps,
        })
    }

    /// Create a facade from loaded settings, with an HTTP aggregator client
    pub fn from_settings(settings: &Settings) -> ResolverResult<Self> {
        let api = Arc::new(HttpAggregatorClient::new(&settings.aggregator)?);
        let resolver = Self::new(
            settings.chain_addresses()?,
            settings.token_registry()?,
            api,
            settings.defaults.slippage_bps,
        )?;
        info!(
            chains = ?resolver.chains.chain_ids(),
            "swap resolver initialized"
        );
        Ok(resolver)
    }

    /// Deploy the destination-side escrow, converting inventory first when it
    /// does not hold the order's token.
    ///
    /// `source_inventory_token` is what the resolver holds on `chain_id`;
    /// `immutables.token` is what the order demands. When they match, the
    /// aggregator is never contacted and the transaction carries the deploy
    /// call alone. The conversion is quoted exact-output: the escrow must be
    /// funded with exactly the order amount.
    pub async fn deploy_destination_with_swap(
        &self,
        chain_id: u64,
        source_inventory_token: Address,
        immutables: Immutables,
        src_cancellation_timestamp: U256,
        slippage_bps: Option<u32>,
    ) -> ResolverResult<ComposedTransaction> {
        let addresses = self.chains.get(chain_id)?;
        let required = immutables.token;

        let conversion_calls = if needs_conversion(source_inventory_token, required) {
            debug!(
                chain_id,
                held = %source_inventory_token,
                required = %required,
                "inventory mismatch, converting before deploy"
            );
            let intent = self.checked_intent(source_inventory_token, required)?;
            self.orchestrator
                .prepare_conversion(
                    &intent,
                    immutables.amount,
                    addresses.resolver,
                    slippage_bps.unwrap_or(self.default_slippage_bps),
                    true,
                )
                .await?
                .into_calls()
        } else {
            Vec::new()
        };

        compose_deploy_destination(
            addresses,
            conversion_calls,
            immutables,
            src_cancellation_timestamp,
        )
    }

    /// Withdraw from a deployed escrow, optionally converting the released
    /// funds into `convert_to` afterwards.
    ///
    /// The withdrawal executes first; released funds are swapped exact-input
    /// for whatever they fetch within the slippage tolerance.
    pub async fn withdraw_with_swap(
        &self,
        chain_id: u64,
        escrow: Address,
        secret: B256,
        immutables: Immutables,
        convert_to: Option<Address>,
        slippage_bps: Option<u32>,
    ) -> ResolverResult<ComposedTransaction> {
        let addresses = self.chains.get(chain_id)?;
        let conversion_calls = self
            .follow_up_conversion(immutables.token, immutables.amount, convert_to, slippage_bps, addresses.resolver)
            .await?;

        Ok(compose_withdraw(
            addresses,
            escrow,
            secret,
            immutables,
            conversion_calls,
        ))
    }

    /// Cancel a deployed escrow, optionally converting the returned funds
    /// into `convert_to` afterwards. Identical ordering to withdrawal.
    pub async fn cancel_with_swap(
        &self,
        chain_id: u64,
        escrow: Address,
        immutables: Immutables,
        convert_to: Option<Address>,
        slippage_bps: Option<u32>,
    ) -> ResolverResult<ComposedTransaction> {
        let addresses = self.chains.get(chain_id)?;
        let conversion_calls = self
            .follow_up_conversion(immutables.token, immutables.amount, convert_to, slippage_bps, addresses.resolver)
            .await?;

        Ok(compose_cancel(addresses, escrow, immutables, conversion_calls))
    }

    /// Token registry lookup surface for callers checking support up front
    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// Price the conversion an operation would need, without composing it.
    ///
    /// Fetched fresh per call; quotes are never cached because prices move.
    pub async fn quote_conversion(
        &self,
        held: Address,
        required: Address,
        amount: U256,
    ) -> ResolverResult<crate::aggregator::Quote> {
        let intent = self.checked_intent(held, required)?;
        self.orchestrator.quote(&intent, amount).await
    }

    /// Build the reverse-conversion call list for withdraw/cancel, or an
    /// empty list when none was requested or the tokens already match
    async fn follow_up_conversion(
        &self,
        released_token: Address,
        amount: U256,
        convert_to: Option<Address>,
        slippage_bps: Option<u32>,
        from: Address,
    ) -> ResolverResult<Vec<ArbitraryCall>> {
        let target = match convert_to {
            Some(target) if needs_conversion(released_token, target) => target,
            _ => return Ok(Vec::new()),
        };

        let intent = self.checked_intent(released_token, target)?;
        Ok(self
            .orchestrator
            .prepare_conversion(
                &intent,
                amount,
                from,
                slippage_bps.unwrap_or(self.default_slippage_bps),
                false,
            )
            .await?
            .into_calls())
    }

    /// Classify the conversion and verify both ERC-20 legs are registered
    fn checked_intent(&self, held: Address, required: Address) -> ResolverResult<ConversionIntent> {
        for token in [held, required] {
            if !is_native(token) {
                self.tokens.require(token)?;
            }
        }
        ConversionIntent::between(held, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{MockAggregatorApi, SwapParameters};
    use crate::config::ChainAddresses;
    use crate::error::ResolverError;
    use alloy_primitives::Bytes;

    const CHAIN_ID: u64 = 42793;

    fn usdc() -> Address {
        "0xc2132d05d31c914a87c6611c10748aeb04b58e8f".parse().unwrap()
    }

    fn wxtz() -> Address {
        "0xb1ea698633d57705e93b0e40c1077d46cd6a51d8".parse().unwrap()
    }

    fn router() -> Address {
        Address::repeat_byte(0xcc)
    }

    fn chains() -> ChainAddressTable {
        let mut table = ChainAddressTable::new();
        table.insert(
            CHAIN_ID,
            ChainAddresses {
                resolver: Address::repeat_byte(0x11),
                escrow_factory: Address::repeat_byte(0x22),
            },
        );
        table
    }

    fn tokens() -> TokenRegistry {
        let mut registry = TokenRegistry::new();
        registry.insert("USDC".to_string(), usdc(), 6);
        registry.insert("WXTZ".to_string(), wxtz(), 18);
        registry
    }

    fn immutables(token: Address, amount: u64) -> Immutables {
        Immutables {
            orderHash: B256::repeat_byte(0x01),
            hashlock: B256::repeat_byte(0x02),
            maker: Address::repeat_byte(0x03),
            taker: Address::repeat_byte(0x04),
            token,
            amount: U256::from(amount),
            safetyDeposit: U256::from(500u64),
            timelocks: U256::ZERO,
        }
    }

    fn resolver_with(mock: MockAggregatorApi) -> SwapResolver {
        SwapResolver::new(chains(), tokens(), Arc::new(mock), 100).unwrap()
    }

    #[tokio::test]
    async fn test_same_token_deploy_skips_aggregator() {
        // No expectations: a single aggregator call would panic the mock
        let resolver = resolver_with(MockAggregatorApi::new());

        let tx = resolver
            .deploy_destination_with_swap(
                CHAIN_ID,
                usdc(),
                immutables(usdc(), 1_000_000),
                U256::from(1_700_000_000u64),
                None,
            )
            .await
            .unwrap();

        assert_eq!(tx.calls.len(), 1);
        assert_eq!(tx.request.to, Address::repeat_byte(0x11));
    }

    #[tokio::test]
    async fn test_cross_token_deploy_call_sequence() {
        let mut mock = MockAggregatorApi::new();
        mock.expect_fetch_swap_params()
            .times(1)
            .returning(|_, _, _, _, _, _| {
                Ok(SwapParameters {
                    router: router(),
                    calldata: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
                    src_amount: U256::from(999_500u64),
                    dst_amount: U256::from(500_000_000_000_000_000u64),
                    gas: 310_000,
                })
            });
        let resolver = resolver_with(mock);

        let tx = resolver
            .deploy_destination_with_swap(
                CHAIN_ID,
                usdc(),
                immutables(wxtz(), 1_000_000),
                U256::from(1_700_000_000u64),
                Some(200),
            )
            .await
            .unwrap();

        // approve(USDC, router, expected_input) -> swap(router, calldata)
        // -> approve(WXTZ, factory, amount) -> deploy
        assert_eq!(tx.calls.len(), 4);
        assert_eq!(tx.calls[0].target, usdc());
        assert_eq!(U256::from_be_slice(&tx.calls[0].data[36..68]), U256::from(999_500u64));
        assert_eq!(tx.calls[1].target, router());
        assert_eq!(tx.calls[1].data, Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(tx.calls[2].target, wxtz());
        assert_eq!(U256::from_be_slice(&tx.calls[2].data[36..68]), U256::from(1_000_000u64));
        assert_eq!(tx.calls[3].target, Address::repeat_byte(0x11));
        // Safety deposit rides along as value for an ERC-20 destination
        assert_eq!(tx.request.value, U256::from(500u64));
    }

    #[tokio::test]
    async fn test_aggregator_failure_yields_no_transaction() {
        let mut mock = MockAggregatorApi::new();
        mock.expect_fetch_swap_params()
            .times(1)
            .returning(|_, _, _, _, _, _| {
                Err(ResolverError::AggregatorStatus {
                    status: 500,
                    body: "router exploded".to_string(),
                })
            });
        let resolver = resolver_with(mock);

        let result = resolver
            .deploy_destination_with_swap(
                CHAIN_ID,
                usdc(),
                immutables(wxtz(), 1_000_000),
                U256::from(1_700_000_000u64),
                None,
            )
            .await;

        assert!(matches!(
            result,
            Err(ResolverError::AggregatorStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_chain_fails_before_orchestration() {
        let resolver = resolver_with(MockAggregatorApi::new());
        let err = resolver
            .deploy_destination_with_swap(
                1,
                usdc(),
                immutables(wxtz(), 1_000_000),
                U256::from(1_700_000_000u64),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::ChainNotConfigured { chain_id: 1 }));
    }

    #[tokio::test]
    async fn test_unregistered_token_is_configuration_error() {
        let resolver = resolver_with(MockAggregatorApi::new());
        let unknown = Address::repeat_byte(0x99);
        let err = resolver
            .deploy_destination_with_swap(
                CHAIN_ID,
                unknown,
                immutables(wxtz(), 1_000_000),
                U256::from(1_700_000_000u64),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::TokenNotSupported { .. }));
    }

    #[tokio::test]
    async fn test_withdraw_without_conversion_is_single_call() {
        let resolver = resolver_with(MockAggregatorApi::new());
        let tx = resolver
            .withdraw_with_swap(
                CHAIN_ID,
                Address::repeat_byte(0xee),
                B256::repeat_byte(0x05),
                immutables(usdc(), 1_000_000),
                Some(usdc()), // same token: no conversion, no aggregator call
                None,
            )
            .await
            .unwrap();
        assert_eq!(tx.calls.len(), 1);
        assert_eq!(tx.calls[0].target, Address::repeat_byte(0x11));
    }

    #[tokio::test]
    async fn test_withdraw_conversion_follows_escrow_call() {
        let mut mock = MockAggregatorApi::new();
        mock.expect_fetch_swap_params()
            .times(1)
            .returning(|_, _, _, _, _, _| {
                Ok(SwapParameters {
                    router: router(),
                    calldata: Bytes::from(vec![0xbe, 0xef]),
                    src_amount: U256::from(1_000_000u64),
                    dst_amount: U256::from(400_000_000_000_000_000u64),
                    gas: 250_000,
                })
            });
        let resolver = resolver_with(mock);

        let tx = resolver
            .withdraw_with_swap(
                CHAIN_ID,
                Address::repeat_byte(0xee),
                B256::repeat_byte(0x05),
                immutables(usdc(), 1_000_000),
                Some(wxtz()),
                None,
            )
            .await
            .unwrap();

        // withdraw -> approve(USDC, router) -> swap
        assert_eq!(tx.calls.len(), 3);
        assert_eq!(tx.calls[0].target, Address::repeat_byte(0x11));
        assert_eq!(tx.calls[1].target, usdc());
        assert_eq!(tx.calls[2].target, router());
    }

    #[tokio::test]
    async fn test_cancel_conversion_follows_escrow_call() {
        let mut mock = MockAggregatorApi::new();
        mock.expect_fetch_swap_params()
            .times(1)
            .returning(|_, _, _, _, _, _| {
                Ok(SwapParameters {
                    router: router(),
                    calldata: Bytes::from(vec![0xbe, 0xef]),
                    src_amount: U256::from(1_000_000u64),
                    dst_amount: U256::from(400_000_000_000_000_000u64),
                    gas: 250_000,
                })
            });
        let resolver = resolver_with(mock);

        let tx = resolver
            .cancel_with_swap(
                CHAIN_ID,
                Address::repeat_byte(0xee),
                immutables(usdc(), 1_000_000),
                Some(wxtz()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(tx.calls.len(), 3);
        assert_eq!(tx.calls[0].target, Address::repeat_byte(0x11));
        assert_eq!(tx.calls[1].target, usdc());
        assert_eq!(tx.calls[2].target, router());
    }
}
