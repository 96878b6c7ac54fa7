//! Swap execution
//!
//! Buys and sells run as a quote -> build -> sign -> submit pipeline against
//! the swap gateway and chain submitter, or through the simulator in test
//! mode. Every call ends in a `TradeOutcome`; no error escapes.

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::jupiter_client::{sign_swap_transaction, QuoteRequest, SwapGateway};
use super::ledger::TradeLedger;
use super::simulator::{SimulationConfig, TradeSimulator};
use crate::client::ChainSubmitter;
use crate::core::{
    explorer_url, lamports_to_sol, normalize_owner, sol_to_lamports, BalanceResolver, EngineError,
    SwapOverrides, SwapParams, SwapStage, TokenMetadata, TradeOutcome, TradeRecord, TradeSide,
    WalletStore, NATIVE_MINT,
};
use crate::scout::MetadataResolver;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Fabricated outcomes, no network calls
    Simulated,
    Live,
}

impl ExecutionMode {
    pub fn from_flag(simulated: bool) -> Self {
        if simulated {
            ExecutionMode::Simulated
        } else {
            ExecutionMode::Live
        }
    }
}

/// Collaborators the executor drives
#[derive(Clone)]
pub struct ExecutorDeps {
    pub wallets: Arc<WalletStore>,
    pub balances: Arc<BalanceResolver>,
    pub metadata: Arc<MetadataResolver>,
    pub ledger: Arc<TradeLedger>,
    pub gateway: Arc<dyn SwapGateway>,
    pub submitter: Arc<dyn ChainSubmitter>,
    /// MEV-protected relay, used when a trade asks for protection
    pub protected_submitter: Option<Arc<dyn ChainSubmitter>>,
}

/// A signed transaction ready for submission, with what the quote promised
struct PreparedSwap {
    signed_b64: String,
    out_amount: u64,
    stage: SwapStage,
}

pub struct SwapExecutor {
    mode: ExecutionMode,
    defaults: SwapParams,
    deps: ExecutorDeps,
    simulator: TradeSimulator,
    owner_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SwapExecutor {
    pub fn new(mode: ExecutionMode, defaults: SwapParams, simulation: SimulationConfig, deps: ExecutorDeps) -> Self {
        info!("🎯 Swap executor created:");
        info!("   • Mode: {:?}", mode);
        info!("   • Slippage: {} bps", defaults.slippage_bps);
        info!("   • Priority fee: {} SOL", defaults.priority_fee_sol);
        info!("   • MEV protection: {}", defaults.mev_protection);

        Self {
            mode,
            defaults,
            deps,
            simulator: TradeSimulator::new(simulation),
            owner_locks: DashMap::new(),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn defaults(&self) -> SwapParams {
        self.defaults
    }

    /// Spend `amount` SOL on `token_address`
    #[instrument(skip(self, overrides), fields(mode = ?self.mode))]
    pub async fn buy(
        &self,
        owner_id: &str,
        token_address: &str,
        amount: f64,
        overrides: Option<SwapOverrides>,
    ) -> TradeOutcome {
        let owner = normalize_owner(owner_id);
        let token = token_address.trim();

        if !amount.is_finite() || amount <= 0.0 {
            return TradeOutcome::failed(
                "validate",
                &EngineError::InvalidRequest(format!("amount must be positive, got {}", amount)),
            );
        }
        if token.is_empty() {
            return TradeOutcome::failed("validate", &EngineError::InvalidRequest("empty token address".into()));
        }

        let params = self.defaults.merged(overrides);
        let lock = self.owner_lock(&owner);
        let outcome = {
            let _guard = lock.lock().await;
            info!("🛒 Buy {} SOL of {} for {}", amount, token, owner);
            match self.mode {
                ExecutionMode::Simulated => self.simulate(&owner, token, TradeSide::Buy, amount).await,
                ExecutionMode::Live => self.live_buy(&owner, token, amount, params).await,
            }
        };
        self.release_owner_lock(&owner, &lock);

        log_outcome(&outcome);
        outcome
    }

    /// Sell `percentage` (0, 100] of the owner's holding of `token_address`
    #[instrument(skip(self, overrides), fields(mode = ?self.mode))]
    pub async fn sell(
        &self,
        owner_id: &str,
        token_address: &str,
        percentage: f64,
        overrides: Option<SwapOverrides>,
    ) -> TradeOutcome {
        let owner = normalize_owner(owner_id);
        let token = token_address.trim();

        if !percentage.is_finite() || percentage <= 0.0 || percentage > 100.0 {
            return TradeOutcome::failed(
                "validate",
                &EngineError::InvalidRequest(format!("percentage must be in (0, 100], got {}", percentage)),
            );
        }
        if token.is_empty() {
            return TradeOutcome::failed("validate", &EngineError::InvalidRequest("empty token address".into()));
        }

        let params = self.defaults.merged(overrides);
        let lock = self.owner_lock(&owner);
        let outcome = {
            let _guard = lock.lock().await;
            info!("💸 Sell {}% of {} for {}", percentage, token, owner);
            match self.mode {
                ExecutionMode::Simulated => self.simulate(&owner, token, TradeSide::Sell, 0.0).await,
                ExecutionMode::Live => self.live_sell(&owner, token, percentage, params).await,
            }
        };
        self.release_owner_lock(&owner, &lock);

        log_outcome(&outcome);
        outcome
    }

    fn owner_lock(&self, owner: &str) -> Arc<Mutex<()>> {
        self.owner_locks.entry(owner.to_string()).or_default().clone()
    }

    /// Drop the owner's lock entry once no other call holds or waits on it.
    /// Callers clone the lock under the same shard lock, so a waiter keeps it alive.
    fn release_owner_lock(&self, owner: &str, lock: &Arc<Mutex<()>>) {
        self.owner_locks
            .remove_if(owner, |_, held| Arc::ptr_eq(held, lock) && Arc::strong_count(held) == 2);
    }

    /// Owners with a trade in flight or queued
    pub fn active_owner_locks(&self) -> usize {
        self.owner_locks.len()
    }

    async fn simulate(&self, owner: &str, token: &str, side: TradeSide, amount: f64) -> TradeOutcome {
        if let Err(e) = self.deps.wallets.get(owner) {
            return TradeOutcome::failed("wallet", &e);
        }

        let Some(signature) = self.simulator.execute(token, amount).await else {
            return TradeOutcome::failed_with("simulated trade failed");
        };

        let symbol = TokenMetadata::empty(token).display_symbol();
        if side == TradeSide::Buy {
            self.deps.balances.debit(owner, amount);
        }
        self.record(owner, token, &symbol, side, amount, &signature).await;
        TradeOutcome::confirmed(signature, amount, Some(symbol))
    }

    async fn live_buy(&self, owner: &str, token: &str, amount: f64, params: SwapParams) -> TradeOutcome {
        let request = QuoteRequest {
            input_mint: NATIVE_MINT.to_string(),
            output_mint: token.to_string(),
            amount: sol_to_lamports(amount),
            slippage_bps: params.slippage_bps,
        };

        let mut prepared = match self.prepare(owner, request, params).await {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };
        let signature = match self.submit(&mut prepared, params).await {
            Ok(signature) => signature,
            Err(outcome) => return outcome,
        };

        let symbol = self.deps.metadata.resolve(token).await.display_symbol();
        self.deps.balances.debit(owner, amount);
        self.record(owner, token, &symbol, TradeSide::Buy, amount, &signature).await;
        TradeOutcome::confirmed(signature, amount, Some(symbol)).at(prepared.stage)
    }

    async fn live_sell(&self, owner: &str, token: &str, percentage: f64, params: SwapParams) -> TradeOutcome {
        let wallet = match self.deps.wallets.get(owner) {
            Ok(wallet) => wallet,
            Err(e) => return TradeOutcome::failed("wallet", &e),
        };

        let held = match self.deps.submitter.token_balance(&wallet.public_key, token).await {
            Ok(held) => held,
            Err(e) => return TradeOutcome::failed("balance", &e),
        };
        let raw_amount = portion(held, percentage);
        if raw_amount == 0 {
            return TradeOutcome::failed(
                "balance",
                &EngineError::InvalidRequest(format!("no {} balance to sell", token)),
            );
        }
        debug!("📦 Holding {} raw units of {}, selling {}", held, token, raw_amount);

        let request = QuoteRequest {
            input_mint: token.to_string(),
            output_mint: NATIVE_MINT.to_string(),
            amount: raw_amount,
            slippage_bps: params.slippage_bps,
        };

        let mut prepared = match self.prepare(owner, request, params).await {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };
        let signature = match self.submit(&mut prepared, params).await {
            Ok(signature) => signature,
            Err(outcome) => return outcome,
        };

        let proceeds = lamports_to_sol(prepared.out_amount);
        let symbol = self.deps.metadata.resolve(token).await.display_symbol();
        self.deps.balances.invalidate(owner);
        self.record(owner, token, &symbol, TradeSide::Sell, proceeds, &signature).await;
        TradeOutcome::confirmed(signature, proceeds, Some(symbol)).at(prepared.stage)
    }

    /// Quote, build and sign. Fails with the outcome naming the step that broke.
    async fn prepare(&self, owner: &str, request: QuoteRequest, params: SwapParams) -> Result<PreparedSwap, TradeOutcome> {
        let mut stage = SwapStage::Idle;

        let wallet = self
            .deps
            .wallets
            .get(owner)
            .map_err(|e| TradeOutcome::failed("wallet", &e))?;
        let keypair = wallet.keypair().map_err(|e| TradeOutcome::failed("wallet", &e))?;

        advance(&mut stage, SwapStage::QuoteRequested);
        let quote = self
            .deps
            .gateway
            .quote(&request)
            .await
            .map_err(|e| TradeOutcome::failed("quote", &e).at(stage))?;
        advance(&mut stage, SwapStage::QuoteReceived);

        let fee_lamports = sol_to_lamports(params.priority_fee_sol);
        let unsigned = self
            .deps
            .gateway
            .build_swap(&quote, &wallet.public_key, fee_lamports)
            .await
            .map_err(|e| TradeOutcome::failed("build", &e).at(stage))?;
        advance(&mut stage, SwapStage::TransactionBuilt);

        let signed_b64 = sign_swap_transaction(&unsigned, &keypair).map_err(|e| {
            let step = match e {
                EngineError::Decode { .. } => "decode",
                _ => "sign",
            };
            TradeOutcome::failed(step, &e).at(stage)
        })?;
        advance(&mut stage, SwapStage::Signed);

        Ok(PreparedSwap {
            signed_b64,
            out_amount: quote.out_amount,
            stage,
        })
    }

    /// Submit with preflight skipped
    async fn submit(&self, prepared: &mut PreparedSwap, params: SwapParams) -> Result<String, TradeOutcome> {
        let submitter = self.submitter_for(params);
        let signature = submitter
            .send_transaction(&prepared.signed_b64, true)
            .await
            .map_err(|e| TradeOutcome::failed("submit", &e).at(prepared.stage))?;
        advance(&mut prepared.stage, SwapStage::Submitted);

        debug!("📡 Submitted via {}: {}", submitter.name(), signature);
        advance(&mut prepared.stage, SwapStage::Confirmed);
        Ok(signature)
    }

    fn submitter_for(&self, params: SwapParams) -> &Arc<dyn ChainSubmitter> {
        if !params.mev_protection {
            return &self.deps.submitter;
        }
        match &self.deps.protected_submitter {
            Some(protected) => protected,
            None => {
                warn!("⚠️ MEV protection requested but no protected endpoint configured, using default RPC");
                &self.deps.submitter
            }
        }
    }

    async fn record(&self, owner: &str, token: &str, symbol: &str, side: TradeSide, amount: f64, signature: &str) {
        self.deps
            .ledger
            .record(TradeRecord {
                owner_id: owner.to_string(),
                timestamp: Utc::now(),
                side,
                token_address: token.to_string(),
                symbol: symbol.to_string(),
                amount,
                success: true,
                tx_signature: Some(signature.to_string()),
                explorer_url: Some(explorer_url(signature)),
            })
            .await;
    }
}

fn advance(stage: &mut SwapStage, next: SwapStage) {
    debug!("🔁 {:?} -> {:?}", stage, next);
    *stage = next;
}

/// `percentage` of `held` raw units, rounded down
fn portion(held: u64, percentage: f64) -> u64 {
    let basis_points = (percentage * 100.0).round() as u128;
    (held as u128 * basis_points / 10_000) as u64
}

fn log_outcome(outcome: &TradeOutcome) {
    match (&outcome.tx_signature, &outcome.error) {
        (Some(signature), _) => info!("✅ Trade confirmed: {}", signature),
        (None, Some(err)) => error!("❌ Trade failed: {}", err),
        (None, None) => error!("❌ Trade failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portion() {
        assert_eq!(portion(1_000, 100.0), 1_000);
        assert_eq!(portion(1_000, 50.0), 500);
        assert_eq!(portion(3, 50.0), 1);
        assert_eq!(portion(1, 10.0), 0);
        assert_eq!(portion(u64::MAX, 100.0), u64::MAX);
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(ExecutionMode::from_flag(true), ExecutionMode::Simulated);
        assert_eq!(ExecutionMode::from_flag(false), ExecutionMode::Live);
    }
}
