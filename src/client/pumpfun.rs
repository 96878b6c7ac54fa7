//! pump.fun: latest launches feed and per-token metadata

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{get_json, http_client, text, DiscoveryFeed, FeedRecord, ListedToken, MetadataSource};
use crate::core::{EngineError, EngineResult, FeedSource, PartialMetadata};

const PROVIDER: &str = "pump.fun";

pub struct PumpFunClient {
    client: Client,
    base_url: String,
    limit: usize,
}

impl PumpFunClient {
    pub fn new(base_url: impl Into<String>, limit: usize, timeout_secs: u64) -> EngineResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit,
        })
    }
}

pub(crate) fn parse_latest(body: &Value, limit: usize) -> EngineResult<Vec<FeedRecord>> {
    let tokens = body
        .get("tokens")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::decode(PROVIDER, "missing tokens array"))?;

    Ok(tokens
        .iter()
        .take(limit)
        .filter_map(|token| {
            let address = text(token.get("address"))?;
            Some(FeedRecord::Token {
                token: ListedToken {
                    address,
                    symbol: text(token.get("symbol")).unwrap_or_else(|| "UNKNOWN".to_string()),
                    name: text(token.get("name")),
                },
                created_at: token.get("created_at").filter(|v| !v.is_null()).cloned(),
            })
        })
        .collect())
}

pub(crate) fn parse_token(body: &Value) -> PartialMetadata {
    let Some(token) = body.get("token") else {
        return PartialMetadata::default();
    };

    PartialMetadata {
        symbol: text(token.get("symbol")),
        name: text(token.get("name")),
        website: text(token.get("websiteUrl")),
        twitter: text(token.get("twitterUrl")),
        telegram: text(token.get("telegramUrl")),
        discord: text(token.get("discordUrl")),
        liquidity_usd: None,
    }
}

#[async_trait]
impl DiscoveryFeed for PumpFunClient {
    fn source(&self) -> FeedSource {
        FeedSource::PumpFun
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch(&self) -> EngineResult<Vec<FeedRecord>> {
        let url = format!("{}/tokens/latest", self.base_url);
        let body = get_json(PROVIDER, self.client.get(&url)).await?;
        parse_latest(&body, self.limit)
    }
}

#[async_trait]
impl MetadataSource for PumpFunClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch(&self, address: &str) -> EngineResult<PartialMetadata> {
        let url = format!("{}/token/{}", self.base_url, address);
        let body = get_json(PROVIDER, self.client.get(&url)).await?;
        Ok(parse_token(&body))
    }
}
