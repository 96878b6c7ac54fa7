//! Catcher: wallet and trading engine for Solana token sniping
//!
//! Custodial per-owner wallets, cached multi-source balance lookups, token
//! discovery and metadata screening, and Jupiter swap execution with a
//! simulated mode for testing.

pub mod client;
pub mod config;
pub mod core;
pub mod engine;
pub mod scout;
pub mod trading;

pub use config::EngineConfig;
pub use crate::core::*;
pub use engine::{EngineParts, TradingEngine};
pub use scout::{MetadataResolver, ScanCriteria, ScanReport, TokenDiscoveryAggregator, TokenScanner};
pub use trading::{ExecutionMode, SwapExecutor, TradeLedger};
