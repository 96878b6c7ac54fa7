//! DexScreener discovery feeds
//!
//! Three endpoints, each polled as its own feed: newly listed pairs, recently
//! updated pairs, and trending tokens (which nest their pairs).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{get_json, http_client, number, DiscoveryFeed, FeedRecord, ListedToken};
use crate::core::{EngineError, EngineResult, FeedSource};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexScreenerPair {
    dex_id: Option<String>,
    base_token: Option<DexScreenerToken>,
    quote_token: Option<DexScreenerToken>,
    price_usd: Option<Value>,
    liquidity: Option<DexScreenerLiquidity>,
    volume: Option<DexScreenerWindow>,
    price_change: Option<DexScreenerWindow>,
    pair_created_at: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct DexScreenerToken {
    address: String,
    symbol: String,
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DexScreenerLiquidity {
    usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct DexScreenerWindow {
    h24: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexScreenerEndpoint {
    NewPairs,
    RecentPairs,
    TrendingTokens,
}

impl DexScreenerEndpoint {
    pub const ALL: [DexScreenerEndpoint; 3] = [
        DexScreenerEndpoint::NewPairs,
        DexScreenerEndpoint::RecentPairs,
        DexScreenerEndpoint::TrendingTokens,
    ];

    fn path(&self) -> &'static str {
        match self {
            DexScreenerEndpoint::NewPairs => "/latest/dex/pairs/solana/new",
            DexScreenerEndpoint::RecentPairs => "/latest/dex/pairs/solana/recent",
            DexScreenerEndpoint::TrendingTokens => "/latest/dex/tokens/solana/trending",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DexScreenerEndpoint::NewPairs => "dexscreener new",
            DexScreenerEndpoint::RecentPairs => "dexscreener recent",
            DexScreenerEndpoint::TrendingTokens => "dexscreener trending",
        }
    }
}

pub struct DexScreenerFeed {
    client: Client,
    base_url: String,
    endpoint: DexScreenerEndpoint,
    pairs_per_response: usize,
    pairs_per_token: usize,
}

impl DexScreenerFeed {
    pub fn new(
        base_url: impl Into<String>,
        endpoint: DexScreenerEndpoint,
        pairs_per_response: usize,
        pairs_per_token: usize,
        timeout_secs: u64,
    ) -> EngineResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoint,
            pairs_per_response,
            pairs_per_token,
        })
    }
}

/// Pull pairs out of either response shape: `{pairs: [...]}` or `{tokens: [{pairs: [...]}]}`
pub(crate) fn parse_response(
    provider: &str,
    body: &Value,
    pairs_per_response: usize,
    pairs_per_token: usize,
) -> EngineResult<Vec<FeedRecord>> {
    let raw_pairs: Vec<Value> = if let Some(pairs) = body.get("pairs").and_then(Value::as_array) {
        pairs.iter().take(pairs_per_response).cloned().collect()
    } else if let Some(tokens) = body.get("tokens").and_then(Value::as_array) {
        tokens
            .iter()
            .take(pairs_per_response)
            .filter_map(|token| token.get("pairs").and_then(Value::as_array))
            .flat_map(|pairs| pairs.iter().take(pairs_per_token).cloned())
            .collect()
    } else if body.get("pairs").map(Value::is_null).unwrap_or(false) {
        Vec::new()
    } else {
        return Err(EngineError::decode(provider, "neither pairs nor tokens in response"));
    };

    Ok(raw_pairs
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<DexScreenerPair>(raw).ok())
        .filter_map(into_record)
        .collect())
}

fn into_record(pair: DexScreenerPair) -> Option<FeedRecord> {
    let listed = |token: DexScreenerToken| ListedToken {
        address: token.address,
        symbol: token.symbol,
        name: token.name,
    };

    Some(FeedRecord::Pair {
        base: listed(pair.base_token?),
        quote: listed(pair.quote_token?),
        liquidity_usd: pair.liquidity.and_then(|l| l.usd),
        created_at: pair.pair_created_at.filter(|v| !v.is_null()),
        price_usd: number(pair.price_usd.as_ref()),
        volume_24h: pair.volume.and_then(|v| v.h24),
        price_change_24h: pair.price_change.and_then(|p| p.h24),
        dex_id: pair.dex_id,
    })
}

#[async_trait]
impl DiscoveryFeed for DexScreenerFeed {
    fn source(&self) -> FeedSource {
        FeedSource::DexScreener
    }

    fn name(&self) -> &str {
        self.endpoint.label()
    }

    async fn fetch(&self) -> EngineResult<Vec<FeedRecord>> {
        let url = format!("{}{}", self.base_url, self.endpoint.path());
        let body = get_json(self.endpoint.label(), self.client.get(&url)).await?;
        parse_response(
            self.endpoint.label(),
            &body,
            self.pairs_per_response,
            self.pairs_per_token,
        )
    }
}
