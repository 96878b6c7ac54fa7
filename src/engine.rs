//! Engine facade
//!
//! Owns every component and hands out shared references. Build it from config
//! for live providers, or from parts to inject fakes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::client::{
    BalanceSource, BirdeyeClient, ChainSubmitter, DexScreenerEndpoint, DexScreenerFeed, DiscoveryFeed,
    MetadataSource, PumpFunClient, SolanaRpcClient, SolscanClient,
};
use crate::config::EngineConfig;
use crate::core::{BalanceResolver, EngineResult, SwapOverrides, TradeOutcome, TradeRecord, WalletStore};
use crate::scout::{MetadataResolver, TokenDiscoveryAggregator, TokenScanner};
use crate::trading::{ExecutionMode, ExecutorDeps, JupiterClient, SwapExecutor, SwapGateway, TradeLedger};

/// Providers and settings an engine is assembled from
pub struct EngineParts {
    pub config: EngineConfig,
    pub balance_sources: Vec<Arc<dyn BalanceSource>>,
    pub discovery_feeds: Vec<Arc<dyn DiscoveryFeed>>,
    pub metadata_sources: Vec<Arc<dyn MetadataSource>>,
    pub gateway: Arc<dyn SwapGateway>,
    pub submitter: Arc<dyn ChainSubmitter>,
    pub protected_submitter: Option<Arc<dyn ChainSubmitter>>,
}

impl EngineParts {
    /// Live HTTP providers built from `config`
    pub fn live(config: EngineConfig) -> EngineResult<Self> {
        let providers = &config.providers;
        let rpc = Arc::new(SolanaRpcClient::new(&config.rpc.url, config.rpc.timeout_secs)?);
        let solscan = Arc::new(SolscanClient::new(&providers.solscan_url, providers.timeout_secs)?);
        let pumpfun = Arc::new(PumpFunClient::new(
            &providers.pumpfun_url,
            providers.pumpfun_limit,
            providers.discovery_timeout_secs,
        )?);
        let birdeye = Arc::new(BirdeyeClient::new(
            &providers.birdeye_url,
            providers.birdeye_api_key.clone(),
            providers.timeout_secs,
        )?);
        let jupiter = Arc::new(JupiterClient::new(&providers.jupiter_url, providers.swap_timeout_secs)?);

        let mut discovery_feeds: Vec<Arc<dyn DiscoveryFeed>> = Vec::new();
        for endpoint in DexScreenerEndpoint::ALL {
            discovery_feeds.push(Arc::new(DexScreenerFeed::new(
                &providers.dexscreener_url,
                endpoint,
                providers.dexscreener_pairs_per_endpoint,
                providers.dexscreener_pairs_per_token,
                providers.discovery_timeout_secs,
            )?));
        }
        discovery_feeds.push(pumpfun.clone() as Arc<dyn DiscoveryFeed>);

        let protected_submitter = match &config.rpc.mev_url {
            Some(url) => {
                let relay = SolanaRpcClient::named("mev relay", url, providers.swap_timeout_secs)?;
                Some(Arc::new(relay) as Arc<dyn ChainSubmitter>)
            }
            None => None,
        };

        let balance_sources = vec![rpc.clone() as Arc<dyn BalanceSource>, solscan.clone() as Arc<dyn BalanceSource>];
        let metadata_sources = vec![
            birdeye as Arc<dyn MetadataSource>,
            solscan as Arc<dyn MetadataSource>,
            pumpfun as Arc<dyn MetadataSource>,
        ];

        Ok(Self {
            balance_sources,
            discovery_feeds,
            metadata_sources,
            gateway: jupiter,
            submitter: rpc,
            protected_submitter,
            config,
        })
    }
}

pub struct TradingEngine {
    config: EngineConfig,
    wallets: Arc<WalletStore>,
    balances: Arc<BalanceResolver>,
    discovery: Arc<TokenDiscoveryAggregator>,
    metadata: Arc<MetadataResolver>,
    scanner: Arc<TokenScanner>,
    executor: Arc<SwapExecutor>,
    ledger: Arc<TradeLedger>,
    auto_buy: AtomicBool,
}

impl TradingEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Ok(Self::from_parts(EngineParts::live(config)?))
    }

    pub fn from_parts(parts: EngineParts) -> Self {
        let EngineParts {
            config,
            balance_sources,
            discovery_feeds,
            metadata_sources,
            gateway,
            submitter,
            protected_submitter,
        } = parts;

        let wallets = Arc::new(WalletStore::open(&config.storage.wallet_file));
        let balances = Arc::new(BalanceResolver::with_windows(
            wallets.clone(),
            balance_sources,
            config.balance.fresh_window(),
            config.balance.stale_window(),
        ));
        let discovery = Arc::new(TokenDiscoveryAggregator::new(discovery_feeds, config.discovery.clone()));
        let metadata = Arc::new(MetadataResolver::new(metadata_sources));
        let scanner = Arc::new(TokenScanner::new(metadata.clone(), config.scan.clone()));
        let ledger = Arc::new(TradeLedger::new(config.ledger.clone()));

        let executor = Arc::new(SwapExecutor::new(
            ExecutionMode::from_flag(config.trading.simulated),
            config.trading.swap_params(),
            config.simulation.clone(),
            ExecutorDeps {
                wallets: wallets.clone(),
                balances: balances.clone(),
                metadata: metadata.clone(),
                ledger: ledger.clone(),
                gateway,
                submitter,
                protected_submitter,
            },
        ));

        info!(
            "🚀 Trading engine ready: {} wallets, mode {:?}",
            wallets.len(),
            executor.mode()
        );

        Self {
            config,
            wallets,
            balances,
            discovery,
            metadata,
            scanner,
            executor,
            ledger,
            auto_buy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn wallets(&self) -> &Arc<WalletStore> {
        &self.wallets
    }

    pub fn balances(&self) -> &Arc<BalanceResolver> {
        &self.balances
    }

    pub fn discovery(&self) -> &Arc<TokenDiscoveryAggregator> {
        &self.discovery
    }

    pub fn metadata(&self) -> &Arc<MetadataResolver> {
        &self.metadata
    }

    pub fn scanner(&self) -> &Arc<TokenScanner> {
        &self.scanner
    }

    pub fn executor(&self) -> &Arc<SwapExecutor> {
        &self.executor
    }

    pub fn ledger(&self) -> &Arc<TradeLedger> {
        &self.ledger
    }

    /// Returns the new state
    pub fn set_auto_buy(&self, enabled: bool) -> bool {
        self.auto_buy.store(enabled, Ordering::SeqCst);
        info!("🤖 Auto-buy {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    pub fn auto_buy_enabled(&self) -> bool {
        self.auto_buy.load(Ordering::SeqCst)
    }

    pub async fn buy(
        &self,
        owner_id: &str,
        token_address: &str,
        amount: f64,
        overrides: Option<SwapOverrides>,
    ) -> TradeOutcome {
        self.executor.buy(owner_id, token_address, amount, overrides).await
    }

    pub async fn sell(
        &self,
        owner_id: &str,
        token_address: &str,
        percentage: f64,
        overrides: Option<SwapOverrides>,
    ) -> TradeOutcome {
        self.executor.sell(owner_id, token_address, percentage, overrides).await
    }

    pub async fn recent_trades(&self, owner_id: &str, minutes_back: i64) -> Vec<TradeRecord> {
        self.ledger.recent(owner_id, minutes_back).await
    }
}
