//! Configuration management for the resolver swap orchestrator
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::error::{ResolverError, ResolverResult};

use alloy_primitives::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub aggregator: AggregatorConfig,
    pub chains: HashMap<String, ChainConfig>,
    pub tokens: HashMap<String, TokenConfig>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub resolver_address: String,
    pub escrow_factory_address: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    pub slippage_bps: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { slippage_bps: 100 }
    }
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> ResolverResult<Self> {
        let config_path = env::var("RESOLVER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path).map_err(|e| {
            ResolverError::Config(format!("Failed to read config file {:?}: {}", config_path, e))
        })?;

        Self::parse(&config_str)
    }

    /// Parse settings from a TOML string, substituting `${ENV_VAR}` references
    pub fn parse(config_str: &str) -> ResolverResult<Self> {
        let config_str = substitute_env_vars(config_str)?;

        let settings: Settings = toml::from_str(&config_str)
            .map_err(|e| ResolverError::Config(format!("Failed to parse configuration: {}", e)))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> ResolverResult<()> {
        if self.enabled_chains().is_empty() {
            return Err(ResolverError::Config(
                "At least one chain must be enabled".to_string(),
            ));
        }

        if self.aggregator.base_url.is_empty() {
            return Err(ResolverError::Config(
                "Aggregator base_url must not be empty".to_string(),
            ));
        }

        for (name, chain) in &self.chains {
            if !chain.enabled {
                continue;
            }
            chain.resolver_address.parse::<Address>().map_err(|e| {
                ResolverError::Config(format!("Chain {} has invalid resolver address: {}", name, e))
            })?;
            chain.escrow_factory_address.parse::<Address>().map_err(|e| {
                ResolverError::Config(format!("Chain {} has invalid factory address: {}", name, e))
            })?;
        }

        for (symbol, token) in &self.tokens {
            token.address.parse::<Address>().map_err(|e| {
                ResolverError::Config(format!("Token {} has invalid address: {}", symbol, e))
            })?;
        }

        if self.defaults.slippage_bps == 0 || self.defaults.slippage_bps > 5000 {
            return Err(ResolverError::Config(format!(
                "Default slippage {} bps outside (0, 5000]",
                self.defaults.slippage_bps
            )));
        }

        Ok(())
    }

    /// Get list of enabled chains
    pub fn enabled_chains(&self) -> Vec<(&String, &ChainConfig)> {
        self.chains.iter().filter(|(_, c)| c.enabled).collect()
    }

    /// Build the per-chain address table from the enabled chains
    pub fn chain_addresses(&self) -> ResolverResult<ChainAddressTable> {
        let mut table = ChainAddressTable::new();
        for (_, chain) in self.enabled_chains() {
            let resolver = chain
                .resolver_address
                .parse::<Address>()
                .map_err(|e| ResolverError::Config(e.to_string()))?;
            let escrow_factory = chain
                .escrow_factory_address
                .parse::<Address>()
                .map_err(|e| ResolverError::Config(e.to_string()))?;
            table.insert(
                chain.chain_id,
                ChainAddresses {
                    resolver,
                    escrow_factory,
                },
            );
        }
        Ok(table)
    }

    /// Build the token registry from the configured token table
    pub fn token_registry(&self) -> ResolverResult<TokenRegistry> {
        let mut registry = TokenRegistry::new();
        for (symbol, token) in &self.tokens {
            let address = token
                .address
                .parse::<Address>()
                .map_err(|e| ResolverError::Config(e.to_string()))?;
            registry.insert(symbol.clone(), address, token.decimals);
        }
        Ok(registry)
    }
}

/// Per-chain contract addresses the orchestrator targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainAddresses {
    /// Resolver contract executing the composed call sequence
    pub resolver: Address,
    /// Escrow factory the deploy operation targets
    pub escrow_factory: Address,
}

/// Mapping from chain id to resolver-side contract addresses.
///
/// A missing entry is a fatal configuration error at call time, never a
/// silently defaulted value.
#[derive(Debug, Clone, Default)]
pub struct ChainAddressTable {
    entries: HashMap<u64, ChainAddresses>,
}

impl ChainAddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chain_id: u64, addresses: ChainAddresses) {
        self.entries.insert(chain_id, addresses);
    }

    /// Look up the addresses for a chain, failing fast when absent
    pub fn get(&self, chain_id: u64) -> ResolverResult<ChainAddresses> {
        self.entries
            .get(&chain_id)
            .copied()
            .ok_or(ResolverError::ChainNotConfigured { chain_id })
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        self.entries.keys().copied().collect()
    }
}

/// Token metadata for introspection and support checks.
///
/// The registry never participates in swap math; the aggregator API is
/// authoritative for amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Mapping from lowercased token address to token metadata
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_address: HashMap<Address, TokenInfo>,
    by_symbol: HashMap<String, Address>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: String, address: Address, decimals: u8) {
        self.by_symbol.insert(symbol.clone(), address);
        self.by_address.insert(address, TokenInfo { symbol, decimals });
    }

    pub fn by_address(&self, address: Address) -> Option<&TokenInfo> {
        self.by_address.get(&address)
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<Address> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn is_supported(&self, address: Address) -> bool {
        self.by_address.contains_key(&address)
    }

    /// Look up a token, surfacing an explicit error for unknown addresses
    pub fn require(&self, address: Address) -> ResolverResult<&TokenInfo> {
        self.by_address(address)
            .ok_or_else(|| ResolverError::TokenNotSupported {
                address: format!("{:#x}", address),
            })
    }
}

/// Substitute environment variables in the format ${VAR_NAME}.
///
/// An unresolved reference is a configuration error naming the variable, not
/// a silent empty string that would surface later as an opaque parse failure.
fn substitute_env_vars(input: &str) -> ResolverResult<String> {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).map_err(|_| {
            ResolverError::Config(format!("Environment variable {} is not set", var_name))
        })?;
        result = result.replace(&cap[0], &var_value);
    }

    Ok(result)
}
