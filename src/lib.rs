//! resolver-swap - swap-aware transaction composition for cross-chain
//! atomic-swap resolvers
//!
//! When a resolver's inventory does not hold the exact token a counterparty
//! order demands, this crate converts it through a third-party DEX-aggregator
//! HTTP API and splices the conversion into the escrow operation as a single
//! atomic multi-call transaction: token approval, swap execution, and the
//! escrow call (deploy-destination, withdraw, or cancel) in the order the
//! escrow protocol requires.
//!
//! The crate produces unsigned transaction requests only. Signing,
//! broadcasting, and the escrow protocol itself are external collaborators.
//!
//! ```no_run
//! use resolver_swap::{Settings, SwapResolver};
//!
//! # async fn run() -> resolver_swap::ResolverResult<()> {
//! let settings = Settings::load()?;
//! let resolver = SwapResolver::from_settings(&settings)?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod calls;
pub mod config;
pub mod error;
pub mod escrow;
pub mod orchestrator;
pub mod resolver;

pub use aggregator::{AggregatorApi, HttpAggregatorClient, Quote, SwapParameters, NATIVE_TOKEN};
pub use calls::{build_approval_call, build_swap_call, ArbitraryCall};
pub use config::{ChainAddressTable, ChainAddresses, Settings, TokenInfo, TokenRegistry};
pub use error::{ResolverError, ResolverResult};
pub use escrow::{ComposedTransaction, Immutables, TransactionRequest};
pub use orchestrator::{needs_conversion, ConversionIntent, ConversionOrchestrator};
pub use resolver::SwapResolver;
