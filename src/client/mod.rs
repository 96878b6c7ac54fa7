//! External data providers
//!
//! Every collaborator the engine talks to sits behind one of the traits here so
//! the engine can run against live HTTP clients or in-process fakes.

pub mod birdeye;
pub mod dexscreener;
pub mod pumpfun;
pub mod rpc;
pub mod solscan;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::core::{EngineError, EngineResult, FeedSource, PartialMetadata};

pub use birdeye::BirdeyeClient;
pub use dexscreener::{DexScreenerEndpoint, DexScreenerFeed};
pub use pumpfun::PumpFunClient;
pub use rpc::SolanaRpcClient;
pub use solscan::SolscanClient;

/// Browser-like agent; the public listing APIs rate-limit bare clients
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of a wallet's native balance, in lamports
#[async_trait]
pub trait BalanceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lamports(&self, public_key: &str) -> EngineResult<u64>;
}

/// Per-provider token metadata lookup
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, address: &str) -> EngineResult<PartialMetadata>;
}

/// One discovery feed; yields raw listings for the aggregator to reconcile
#[async_trait]
pub trait DiscoveryFeed: Send + Sync {
    fn source(&self) -> FeedSource;

    fn name(&self) -> &str;

    async fn fetch(&self) -> EngineResult<Vec<FeedRecord>>;
}

/// Transaction submission and token account reads against the chain
#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    fn name(&self) -> &str;

    /// Submit a base64 wire transaction and return its signature
    async fn send_transaction(&self, signed_b64: &str, skip_preflight: bool) -> EngineResult<String>;

    /// Raw token units of `mint` held by `owner` across its token accounts
    async fn token_balance(&self, owner: &str, mint: &str) -> EngineResult<u64>;
}

/// One side of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListedToken {
    pub address: String,
    pub symbol: String,
    pub name: Option<String>,
}

/// Raw listing as reported by a discovery feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRecord {
    /// A trading pair; either side may be the interesting token
    Pair {
        base: ListedToken,
        quote: ListedToken,
        liquidity_usd: Option<f64>,
        /// Epoch millis, epoch seconds, or an ISO-8601 string
        created_at: Option<Value>,
        price_usd: Option<f64>,
        volume_24h: Option<f64>,
        price_change_24h: Option<f64>,
        dex_id: Option<String>,
    },
    /// A bare token listing with no pair context
    Token {
        token: ListedToken,
        created_at: Option<Value>,
    },
}

pub(crate) fn http_client(timeout_secs: u64) -> EngineResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| EngineError::Config(format!("failed to create HTTP client: {}", e)))
}

/// Send a prepared request and parse a 2xx JSON body; anything else is a provider failure
pub(crate) async fn get_json(provider: &str, request: reqwest::RequestBuilder) -> EngineResult<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| EngineError::from_http(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EngineError::unavailable(
            provider,
            format!("HTTP {} {}", status.as_u16(), truncate(&body, 200)),
        ));
    }

    let text = response
        .text()
        .await
        .map_err(|e| EngineError::from_http(provider, e))?;
    serde_json::from_str(&text).map_err(|e| EngineError::decode(provider, e))
}

/// Lenient number read: JSON numbers and numeric strings both count
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    let parsed: Option<f64> = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_strings_and_numbers() {
        assert_eq!(number(Some(&json!(12.5))), Some(12.5));
        assert_eq!(number(Some(&json!("0.0042"))), Some(0.0042));
        assert_eq!(number(Some(&json!("n/a"))), None);
        assert_eq!(number(Some(&json!(null))), None);
        assert_eq!(number(None), None);
    }

    #[test]
    fn test_text_skips_blank() {
        assert_eq!(text(Some(&json!(" PUMP "))), Some("PUMP".to_string()));
        assert_eq!(text(Some(&json!(""))), None);
        assert_eq!(text(Some(&json!(7))), None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
