//! Birdeye token metadata, first in the metadata priority order

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{get_json, http_client, number, text, MetadataSource};
use crate::core::{EngineResult, PartialMetadata};

const PROVIDER: &str = "birdeye";

pub struct BirdeyeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BirdeyeClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> EngineResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.unwrap_or_default(),
        })
    }
}

pub(crate) fn parse_metadata(body: &Value) -> PartialMetadata {
    if !body.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return PartialMetadata::default();
    }
    let Some(data) = body.get("data") else {
        return PartialMetadata::default();
    };

    // Newer responses nest socials under `extensions`
    let link = |key: &str| text(data.get(key)).or_else(|| text(data.pointer(&format!("/extensions/{}", key))));

    PartialMetadata {
        symbol: text(data.get("symbol")),
        name: text(data.get("name")),
        website: link("website"),
        twitter: link("twitter"),
        telegram: link("telegram"),
        discord: link("discord"),
        liquidity_usd: number(data.get("liquidity")),
    }
}

#[async_trait]
impl MetadataSource for BirdeyeClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch(&self, address: &str) -> EngineResult<PartialMetadata> {
        let url = format!("{}/public/token_metadata", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("address", address)])
            .header("X-API-KEY", &self.api_key);
        let body = get_json(PROVIDER, request).await?;
        Ok(parse_metadata(&body))
    }
}
