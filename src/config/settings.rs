//! Engine configuration
//!
//! Loaded from a TOML file where every field is optional, then overridden
//! from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{SwapParams, BALANCE_FRESH_WINDOW, BALANCE_STALE_WINDOW};
use crate::scout::{DiscoveryConfig, ScanCriteria};
use crate::trading::{LedgerConfig, SimulationConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub rpc: RpcConfig,
    pub providers: ProviderConfig,
    pub trading: TradingConfig,
    pub simulation: SimulationConfig,
    pub discovery: DiscoveryConfig,
    pub balance: BalanceConfig,
    pub ledger: LedgerConfig,
    pub scan: ScanCriteria,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding every owner's keypair
    pub wallet_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            wallet_file: PathBuf::from("wallets.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RpcConfig {
    /// Solana JSON-RPC endpoint for balances and submission
    pub url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// MEV-protected submission endpoint
    pub mev_url: Option<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
            timeout_secs: 10,
            mev_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Solscan public API (secondary balance, metadata)
    pub solscan_url: String,
    /// Jupiter V6 quote and swap API
    pub jupiter_url: String,
    pub dexscreener_url: String,
    pub pumpfun_url: String,
    pub birdeye_url: String,
    /// Sent as `X-API-KEY`; Birdeye answers unauthenticated calls with an error
    pub birdeye_api_key: Option<String>,
    /// Timeout for balance and metadata lookups, in seconds
    pub timeout_secs: u64,
    /// Timeout for Jupiter and the MEV relay, in seconds
    pub swap_timeout_secs: u64,
    /// Timeout for discovery feeds, in seconds
    pub discovery_timeout_secs: u64,
    /// Pairs kept from each DexScreener pair endpoint
    pub dexscreener_pairs_per_endpoint: usize,
    /// Pairs kept per trending token
    pub dexscreener_pairs_per_token: usize,
    /// Tokens kept from each pump.fun response
    pub pumpfun_limit: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            solscan_url: "https://api.solscan.io".to_string(),
            jupiter_url: "https://quote-api.jup.ag/v6".to_string(),
            dexscreener_url: "https://api.dexscreener.com".to_string(),
            pumpfun_url: "https://api.pump.fun".to_string(),
            birdeye_url: "https://public-api.birdeye.so".to_string(),
            birdeye_api_key: None,
            timeout_secs: 10,
            swap_timeout_secs: 15,
            discovery_timeout_secs: 12,
            dexscreener_pairs_per_endpoint: 20,
            dexscreener_pairs_per_token: 3,
            pumpfun_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TradingConfig {
    /// Simulated execution instead of live swaps
    pub simulated: bool,
    /// Default slippage tolerance in basis points
    pub slippage_bps: u16,
    /// Default priority fee in SOL
    pub priority_fee_sol: f64,
    /// Route submissions through `rpc.mev_url` by default
    pub mev_protection: bool,
}

impl Default for TradingConfig {
    fn default() -> Self {
        let params = SwapParams::default();
        Self {
            simulated: false,
            slippage_bps: params.slippage_bps,
            priority_fee_sol: params.priority_fee_sol,
            mev_protection: params.mev_protection,
        }
    }
}

impl TradingConfig {
    pub fn swap_params(&self) -> SwapParams {
        SwapParams {
            slippage_bps: self.slippage_bps,
            priority_fee_sol: self.priority_fee_sol,
            mev_protection: self.mev_protection,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BalanceConfig {
    /// Cached balances younger than this skip the network
    pub fresh_secs: u64,
    /// Cached balances younger than this are served when every source fails
    pub stale_secs: u64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            fresh_secs: BALANCE_FRESH_WINDOW.as_secs(),
            stale_secs: BALANCE_STALE_WINDOW.as_secs(),
        }
    }
}

impl BalanceConfig {
    pub fn fresh_window(&self) -> Duration {
        Duration::from_secs(self.fresh_secs)
    }

    pub fn stale_window(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }
}

impl EngineConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// File config when a path is given, defaults otherwise; environment applied on top
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("SOLANA_RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(flag) = get("TEST_MODE") {
            self.trading.simulated = flag == "1";
        }
        if let Some(key) = get("BIRDEYE_API_KEY") {
            self.providers.birdeye_api_key = Some(key);
        }
        if let Some(file) = get("WALLET_FILE") {
            self.storage.wallet_file = PathBuf::from(file);
        }
        if let Some(url) = get("MEV_RPC_URL") {
            self.rpc.mev_url = Some(url);
        }
    }
}
