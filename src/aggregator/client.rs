//! HTTP client for the DEX aggregator quote and swap-parameter endpoints

use super::types::{
    parse_address, parse_amount, parse_calldata, Quote, QuoteResponse, SwapParameters,
    SwapResponse,
};
use super::AggregatorApi;
use crate::config::AggregatorConfig;
use crate::error::{ResolverError, ResolverResult};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Maximum accepted slippage tolerance, in basis points (50%)
pub const MAX_SLIPPAGE_BPS: u32 = 5000;

/// Stateless HTTP client for the aggregator API.
///
/// One instance per resolver session; holds only immutable configuration and
/// the underlying connection pool, so concurrent use needs no locks.
pub struct HttpAggregatorClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpAggregatorClient {
    /// Create a client from aggregator configuration
    pub fn new(config: &AggregatorConfig) -> ResolverResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ResolverError::Config(format!("Invalid aggregator base URL: {}", e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let http = builder
            .build()
            .map_err(|e| ResolverError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> ResolverResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ResolverError::Config("Aggregator base URL cannot be a base".into()))?
            .pop_if_empty()
            .push(path);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("apiKey", key);
        }
        Ok(url)
    }

    fn quote_url(&self, src: Address, dst: Address, amount: U256) -> ResolverResult<Url> {
        let mut url = self.endpoint("quote")?;
        url.query_pairs_mut()
            .append_pair("src", &format!("{:#x}", src))
            .append_pair("dst", &format!("{:#x}", dst))
            .append_pair("amount", &amount.to_string());
        Ok(url)
    }

    #[allow(clippy::too_many_arguments)]
    fn swap_url(
        &self,
        src: Address,
        dst: Address,
        amount: U256,
        from: Address,
        slippage_bps: u32,
        exact_output: bool,
    ) -> ResolverResult<Url> {
        let mut url = self.endpoint("swap_params")?;
        url.query_pairs_mut()
            .append_pair("src", &format!("{:#x}", src))
            .append_pair("dst", &format!("{:#x}", dst))
            .append_pair("amount", &amount.to_string())
            .append_pair("from", &format!("{:#x}", from))
            .append_pair("slippage", &slippage_bps.to_string())
            .append_pair("exactOutput", if exact_output { "true" } else { "false" });
        Ok(url)
    }

    /// Issue a GET and surface non-2xx bodies in the error for diagnosability
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> ResolverResult<T> {
        debug!(url = %url, "aggregator request");
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "aggregator request failed");
            return Err(ResolverError::AggregatorStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ResolverError::AggregatorResponse(format!("{}: {}", e, body)))
    }
}

/// Reject zero amounts before any network round-trip
pub(crate) fn validate_amount(amount: U256) -> ResolverResult<()> {
    if amount.is_zero() {
        return Err(ResolverError::InvalidParameter(
            "amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Reject slippage outside (0, 5000] basis points before any network round-trip
pub(crate) fn validate_slippage(slippage_bps: u32) -> ResolverResult<()> {
    if slippage_bps == 0 || slippage_bps > MAX_SLIPPAGE_BPS {
        return Err(ResolverError::InvalidParameter(format!(
            "slippage {} bps outside (0, {}]",
            slippage_bps, MAX_SLIPPAGE_BPS
        )));
    }
    Ok(())
}

#[async_trait]
impl AggregatorApi for HttpAggregatorClient {
    async fn fetch_quote(
        &self,
        src: Address,
        dst: Address,
        amount: U256,
    ) -> ResolverResult<Quote> {
        validate_amount(amount)?;

        let url = self.quote_url(src, dst, amount)?;
        let resp: QuoteResponse = self.get_json(url).await?;

        Ok(Quote {
            src_token: src,
            dst_token: dst,
            src_amount: amount,
            dst_amount: parse_amount("dstAmount", &resp.dst_amount)?,
            estimated_gas: resp.gas,
            protocols: resp.protocols,
        })
    }

    async fn fetch_swap_params(
        &self,
        src: Address,
        dst: Address,
        amount: U256,
        from: Address,
        slippage_bps: u32,
        exact_output: bool,
    ) -> ResolverResult<SwapParameters> {
        validate_amount(amount)?;
        validate_slippage(slippage_bps)?;

        let url = self.swap_url(src, dst, amount, from, slippage_bps, exact_output)?;
        let resp: SwapResponse = self.get_json(url).await?;

        Ok(SwapParameters {
            router: parse_address("router", &resp.router)?,
            calldata: parse_calldata("params", &resp.params)?,
            src_amount: parse_amount("srcAmount", &resp.src_amount)?,
            dst_amount: parse_amount("dstAmount", &resp.dst_amount)?,
            gas: resp.gas,
        })
    }
}
