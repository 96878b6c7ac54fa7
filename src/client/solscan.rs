//! Solscan public API: secondary balance source and a metadata provider

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{get_json, http_client, text, BalanceSource, MetadataSource};
use crate::core::{EngineError, EngineResult, PartialMetadata};

const PROVIDER: &str = "solscan";

pub struct SolscanClient {
    client: Client,
    base_url: String,
}

impl SolscanClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> EngineResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

/// Lamports from an account response; accepts both the flat and the `data` envelope
pub(crate) fn parse_account_lamports(body: &Value) -> EngineResult<u64> {
    body.get("lamports")
        .or_else(|| body.pointer("/data/lamports"))
        .and_then(Value::as_u64)
        .ok_or_else(|| EngineError::decode(PROVIDER, "missing lamports"))
}

pub(crate) fn parse_token_meta(body: &Value) -> PartialMetadata {
    if !body.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return PartialMetadata::default();
    }
    let Some(data) = body.get("data") else {
        return PartialMetadata::default();
    };

    let social = |key: &str| {
        text(data.pointer(&format!("/socials/{}", key))).or_else(|| text(data.get(key)))
    };

    PartialMetadata {
        symbol: text(data.get("symbol")),
        name: text(data.get("name")),
        website: social("website"),
        twitter: social("twitter"),
        telegram: social("telegram"),
        discord: social("discord"),
        liquidity_usd: None,
    }
}

#[async_trait]
impl BalanceSource for SolscanClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lamports(&self, public_key: &str) -> EngineResult<u64> {
        let url = format!("{}/account", self.base_url);
        let body = get_json(PROVIDER, self.client.get(&url).query(&[("address", public_key)])).await?;
        parse_account_lamports(&body)
    }
}

#[async_trait]
impl MetadataSource for SolscanClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch(&self, address: &str) -> EngineResult<PartialMetadata> {
        let url = format!("{}/token/meta", self.base_url);
        let body = get_json(PROVIDER, self.client.get(&url).query(&[("token", address)])).await?;
        Ok(parse_token_meta(&body))
    }
}
