//! Shared data model for wallets, discovery, metadata and trades

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::constants::explorer_url;
use super::error::EngineError;

/// Feed a discovery candidate came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    DexScreener,
    PumpFun,
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::DexScreener => write!(f, "dexscreener"),
            FeedSource::PumpFun => write!(f, "pump.fun"),
        }
    }
}

/// A token surfaced by one discovery cycle. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenCandidate {
    /// Mint address, unique within one discovery cycle
    pub address: String,
    pub symbol: String,
    pub name: String,
    /// Pool liquidity in USD; 0 for bare token listings
    pub liquidity_usd: f64,
    /// `None` when the feed gave no usable creation timestamp
    pub age_hours: Option<f64>,
    pub source: FeedSource,
    /// RFC 3339 creation time, when the feed gave one
    pub created_at: Option<String>,
    pub price_usd: Option<f64>,
    /// 24h volume in USD
    pub volume_24h: Option<f64>,
    /// 24h price change in percent
    pub price_change_24h: Option<f64>,
    /// Venue the pair trades on, e.g. "raydium"
    pub dex_id: Option<String>,
}

impl TokenCandidate {
    pub fn is_fresh(&self, max_age_hours: f64) -> bool {
        matches!(self.age_hours, Some(age) if age < max_age_hours)
    }
}

/// Token metadata merged across providers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    pub address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
    /// Largest liquidity any provider reported, in USD
    pub liquidity_usd: f64,
}

/// What a single metadata provider knows about a token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialMetadata {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
    pub liquidity_usd: Option<f64>,
}

impl TokenMetadata {
    pub fn empty(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Default::default()
        }
    }

    /// Fold a provider's answer in. Text fields are fill-only; liquidity
    /// is replaced only by a strictly larger value.
    pub fn merge(&mut self, partial: PartialMetadata) {
        fill(&mut self.symbol, partial.symbol);
        fill(&mut self.name, partial.name);
        fill(&mut self.website, partial.website);
        fill(&mut self.twitter, partial.twitter);
        fill(&mut self.telegram, partial.telegram);
        fill(&mut self.discord, partial.discord);

        if let Some(liquidity) = partial.liquidity_usd {
            if liquidity.is_finite() && liquidity > self.liquidity_usd {
                self.liquidity_usd = liquidity;
            }
        }
    }

    pub fn has_core_socials(&self) -> bool {
        self.website.is_some() && self.twitter.is_some() && self.telegram.is_some()
    }

    /// Symbol for display, falling back to the first characters of the address
    pub fn display_symbol(&self) -> String {
        self.symbol
            .clone()
            .unwrap_or_else(|| self.address.chars().take(6).collect())
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value.filter(|v| !v.trim().is_empty());
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// An executed trade. Immutable once appended to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    /// Lower-cased owner id
    pub owner_id: String,
    /// When the trade was recorded
    pub timestamp: DateTime<Utc>,
    pub side: TradeSide,
    pub token_address: String,
    pub symbol: String,
    /// Native units spent (buy) or estimated native proceeds (sell)
    pub amount: f64,
    pub success: bool,
    /// Base58 signature, synthetic in simulated mode
    pub tx_signature: Option<String>,
    pub explorer_url: Option<String>,
}

/// Effective swap parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SwapParams {
    /// Slippage tolerance in basis points (2000 = 20%)
    pub slippage_bps: u16,
    /// Priority fee paid to land the swap, in SOL
    pub priority_fee_sol: f64,
    /// Submit through the MEV-protected relay
    pub mev_protection: bool,
}

impl Default for SwapParams {
    fn default() -> Self {
        Self {
            slippage_bps: 2000,
            priority_fee_sol: 0.0015,
            mev_protection: false,
        }
    }
}

/// Caller-supplied overrides, merged over `SwapParams` defaults
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SwapOverrides {
    pub slippage_bps: Option<u16>,
    pub priority_fee_sol: Option<f64>,
    pub mev_protection: Option<bool>,
}

impl SwapParams {
    pub fn merged(self, overrides: Option<SwapOverrides>) -> Self {
        let Some(o) = overrides else { return self };
        Self {
            slippage_bps: o.slippage_bps.unwrap_or(self.slippage_bps),
            priority_fee_sol: o.priority_fee_sol.unwrap_or(self.priority_fee_sol),
            mev_protection: o.mev_protection.unwrap_or(self.mev_protection),
        }
    }
}

/// Pipeline position of a swap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwapStage {
    Idle,
    QuoteRequested,
    QuoteReceived,
    TransactionBuilt,
    Signed,
    Submitted,
    Confirmed,
    Failed,
}

/// Structured result of `buy` / `sell`; no error crosses the engine boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeOutcome {
    pub success: bool,
    /// Terminal stage: `Confirmed` or `Failed`
    pub stage: SwapStage,
    /// Last pipeline stage completed before the outcome was decided
    pub reached: SwapStage,
    pub tx_signature: Option<String>,
    pub explorer_url: Option<String>,
    pub error: Option<String>,
    /// SOL spent on a buy, estimated SOL proceeds on a sell
    pub amount: Option<f64>,
    pub symbol: Option<String>,
}

impl TradeOutcome {
    pub fn confirmed(signature: String, amount: f64, symbol: Option<String>) -> Self {
        Self {
            success: true,
            stage: SwapStage::Confirmed,
            reached: SwapStage::Confirmed,
            explorer_url: Some(explorer_url(&signature)),
            tx_signature: Some(signature),
            error: None,
            amount: Some(amount),
            symbol,
        }
    }

    /// Record the pipeline stage the trade got to before failing
    pub fn at(mut self, reached: SwapStage) -> Self {
        self.reached = reached;
        self
    }

    /// Failure message prefixed with the failing step, e.g. `quote failed: ...`
    pub fn failed(step: &str, err: &EngineError) -> Self {
        Self::failed_with(format!("{} failed: {}", step, err))
    }

    pub fn failed_with(message: impl Into<String>) -> Self {
        Self {
            success: false,
            stage: SwapStage::Failed,
            reached: SwapStage::Idle,
            tx_signature: None,
            explorer_url: None,
            error: Some(message.into()),
            amount: None,
            symbol: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(symbol: &str, liquidity: f64) -> PartialMetadata {
        PartialMetadata {
            symbol: Some(symbol.to_string()),
            liquidity_usd: Some(liquidity),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_first_symbol_wins_larger_liquidity_wins() {
        let mut meta = TokenMetadata::empty("Mint111");
        meta.merge(partial("X", 100.0));
        meta.merge(partial("Y", 500.0));
        assert_eq!(meta.symbol.as_deref(), Some("X"));
        assert_eq!(meta.liquidity_usd, 500.0);
    }

    #[test]
    fn test_merge_smaller_liquidity_ignored() {
        let mut meta = TokenMetadata::empty("Mint111");
        meta.merge(partial("X", 800.0));
        meta.merge(partial("Y", 20.0));
        assert_eq!(meta.liquidity_usd, 800.0);
    }

    #[test]
    fn test_merge_fills_gaps_and_skips_blank() {
        let mut meta = TokenMetadata::empty("Mint111");
        meta.merge(PartialMetadata {
            website: Some("".into()),
            twitter: Some("https://x.com/a".into()),
            ..Default::default()
        });
        meta.merge(PartialMetadata {
            website: Some("https://a.io".into()),
            twitter: Some("https://x.com/b".into()),
            ..Default::default()
        });
        assert_eq!(meta.website.as_deref(), Some("https://a.io"));
        assert_eq!(meta.twitter.as_deref(), Some("https://x.com/a"));
        assert!(!meta.has_core_socials());
    }

    #[test]
    fn test_params_merge_over_defaults() {
        let params = SwapParams::default().merged(Some(SwapOverrides {
            slippage_bps: Some(500),
            ..Default::default()
        }));
        assert_eq!(params.slippage_bps, 500);
        assert_eq!(params.priority_fee_sol, 0.0015);
        assert!(!params.mev_protection);
        assert_eq!(SwapParams::default().merged(None), SwapParams::default());
    }

    #[test]
    fn test_failed_outcome_names_step() {
        let outcome = TradeOutcome::failed("quote", &EngineError::NoRoute("Mint111".into()));
        assert!(!outcome.success);
        assert_eq!(outcome.stage, SwapStage::Failed);
        assert_eq!(
            outcome.error.as_deref(),
            Some("quote failed: No swap route found for Mint111")
        );
        assert_eq!(outcome.reached, SwapStage::Idle);
        assert_eq!(outcome.at(SwapStage::QuoteRequested).reached, SwapStage::QuoteRequested);
    }
}
