//! Solana JSON-RPC client
//!
//! Primary balance source and the transaction submission path. Also used, with a
//! different URL, as the MEV-protected relay submitter.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{get_json, http_client, BalanceSource, ChainSubmitter};
use crate::core::{EngineError, EngineResult};

pub struct SolanaRpcClient {
    client: Client,
    url: String,
    name: String,
}

impl SolanaRpcClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> EngineResult<Self> {
        Self::named("solana rpc", url, timeout_secs)
    }

    pub fn named(name: impl Into<String>, url: impl Into<String>, timeout_secs: u64) -> EngineResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            url: url.into(),
            name: name.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a JSON-RPC call and return the full response envelope
    async fn call(&self, method: &str, params: Value) -> EngineResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        debug!("📡 {} {} -> {}", self.name, method, self.url);
        get_json(&self.name, self.client.post(&self.url).json(&body)).await
    }

    fn rpc_error(envelope: &Value) -> String {
        envelope
            .get("error")
            .map(|e| {
                e.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string())
            })
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// `result.value` of a getBalance response
pub(crate) fn parse_balance(provider: &str, envelope: &Value) -> EngineResult<u64> {
    if envelope.get("result").is_none() {
        return Err(EngineError::unavailable(provider, SolanaRpcClient::rpc_error(envelope)));
    }

    envelope
        .pointer("/result/value")
        .and_then(Value::as_u64)
        .ok_or_else(|| EngineError::decode(provider, "missing result.value"))
}

/// Sum of `tokenAmount.amount` across a jsonParsed getTokenAccountsByOwner response
pub(crate) fn parse_token_accounts(provider: &str, envelope: &Value) -> EngineResult<u64> {
    let accounts = envelope
        .pointer("/result/value")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::decode(provider, "missing result.value"))?;

    let mut total: u64 = 0;
    for account in accounts {
        let amount = account
            .pointer("/account/data/parsed/info/tokenAmount/amount")
            .and_then(Value::as_str)
            .and_then(|a| a.parse::<u64>().ok())
            .ok_or_else(|| EngineError::decode(provider, "token account without amount"))?;
        total = total.saturating_add(amount);
    }
    Ok(total)
}

#[async_trait]
impl BalanceSource for SolanaRpcClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(provider = %self.name))]
    async fn lamports(&self, public_key: &str) -> EngineResult<u64> {
        let envelope = self.call("getBalance", json!([public_key])).await?;
        parse_balance(&self.name, &envelope)
    }
}

#[async_trait]
impl ChainSubmitter for SolanaRpcClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, signed_b64), fields(provider = %self.name))]
    async fn send_transaction(&self, signed_b64: &str, skip_preflight: bool) -> EngineResult<String> {
        let envelope = self
            .call(
                "sendTransaction",
                json!([
                    signed_b64,
                    {
                        "encoding": "base64",
                        "skipPreflight": skip_preflight,
                        "preflightCommitment": "processed",
                    }
                ]),
            )
            .await?;

        match envelope.get("result").and_then(Value::as_str) {
            Some(signature) => Ok(signature.to_string()),
            None => Err(EngineError::unavailable(
                &self.name,
                format!("transaction rejected: {}", Self::rpc_error(&envelope)),
            )),
        }
    }

    async fn token_balance(&self, owner: &str, mint: &str) -> EngineResult<u64> {
        let envelope = self
            .call(
                "getTokenAccountsByOwner",
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed" }]),
            )
            .await?;

        if envelope.get("result").is_none() {
            return Err(EngineError::unavailable(&self.name, Self::rpc_error(&envelope)));
        }
        parse_token_accounts(&self.name, &envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_balance() {
        let ok = json!({"jsonrpc": "2.0", "id": 1, "result": {"context": {"slot": 1}, "value": 2_500_000_000u64}});
        assert_eq!(parse_balance("rpc", &ok).unwrap(), 2_500_000_000);

        let err = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "Invalid param"}});
        match parse_balance("rpc", &err) {
            Err(EngineError::ProviderUnavailable { reason, .. }) => assert_eq!(reason, "Invalid param"),
            other => panic!("unexpected {:?}", other),
        }

        let malformed = json!({"result": {"value": "lots"}});
        assert!(matches!(parse_balance("rpc", &malformed), Err(EngineError::Decode { .. })));
    }

    #[test]
    fn test_parse_token_accounts_sums_accounts() {
        let envelope = json!({
            "result": {"value": [
                {"account": {"data": {"parsed": {"info": {"tokenAmount": {"amount": "1000", "decimals": 6}}}}}},
                {"account": {"data": {"parsed": {"info": {"tokenAmount": {"amount": "250", "decimals": 6}}}}}}
            ]}
        });
        assert_eq!(parse_token_accounts("rpc", &envelope).unwrap(), 1250);

        let empty = json!({"result": {"value": []}});
        assert_eq!(parse_token_accounts("rpc", &empty).unwrap(), 0);
    }
}
