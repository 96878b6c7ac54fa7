//! Jupiter V6 swap aggregator client
//!
//! Quotes a route, asks Jupiter to build the unsigned swap transaction for the
//! user, and signs that transaction locally with the owner's keypair.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{debug, instrument};

use crate::client::{http_client, number, truncate};
use crate::core::{EngineError, EngineResult, NATIVE_MINT};

const PROVIDER: &str = "jupiter";

/// Jupiter error codes that mean "no liquidity path", not "service down"
const NO_ROUTE_CODES: &[&str] = &["COULD_NOT_FIND_ANY_ROUTE", "NO_ROUTES_FOUND", "TOKEN_NOT_TRADABLE"];

/// Quote and transaction-build seam of the swap pipeline
#[async_trait]
pub trait SwapGateway: Send + Sync {
    fn name(&self) -> &str;

    async fn quote(&self, request: &QuoteRequest) -> EngineResult<SwapQuote>;

    /// Unsigned base64 swap transaction for `user_public_key`
    async fn build_swap(
        &self,
        quote: &SwapQuote,
        user_public_key: &str,
        prioritization_fee_lamports: u64,
    ) -> EngineResult<String>;
}

/// Quote request for an exact-in swap
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Mint being spent
    pub input_mint: String,
    /// Mint being received
    pub output_mint: String,
    /// Amount in the input mint's smallest unit
    pub amount: u64,
    /// Slippage tolerance in basis points (2000 = 20%)
    pub slippage_bps: u16,
}

impl QuoteRequest {
    /// The non-native side of the swap
    pub fn token(&self) -> &str {
        if self.input_mint == NATIVE_MINT {
            &self.output_mint
        } else {
            &self.input_mint
        }
    }
}

/// A routable quote. `raw` is passed back verbatim when building the swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuote {
    pub raw: Value,
    pub in_amount: u64,
    pub out_amount: u64,
    pub price_impact_pct: Option<f64>,
    /// AMM labels along the route, e.g. "Raydium", "Orca"
    pub route_labels: Vec<String>,
}

impl SwapQuote {
    /// Validate a quote body. A quote without a route plan or an output amount
    /// cannot be swapped and is reported as `NoRoute` for `token`.
    pub fn from_response(raw: Value, token: &str) -> EngineResult<Self> {
        let route_plan = raw
            .get("routePlan")
            .and_then(Value::as_array)
            .filter(|plan| !plan.is_empty())
            .ok_or_else(|| EngineError::NoRoute(token.to_string()))?;

        let route_labels = route_plan
            .iter()
            .filter_map(|step| step.pointer("/swapInfo/label").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        let out_amount = raw_amount(raw.get("outAmount")).ok_or_else(|| EngineError::NoRoute(token.to_string()))?;
        let in_amount = raw_amount(raw.get("inAmount")).unwrap_or(0);
        let price_impact_pct = number(raw.get("priceImpactPct"));

        Ok(Self {
            raw,
            in_amount,
            out_amount,
            price_impact_pct,
            route_labels,
        })
    }
}

/// Smallest-unit amount; Jupiter sends these as decimal strings
fn raw_amount(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: Option<String>,
    last_valid_block_height: Option<u64>,
}

pub struct JupiterClient {
    client: Client,
    api_url: String,
}

impl JupiterClient {
    pub fn new(api_url: impl Into<String>, timeout_secs: u64) -> EngineResult<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }
}

/// Whether a failed quote response body names a routing failure
fn is_no_route(body: &str) -> bool {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|v| v.get("errorCode"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    NO_ROUTE_CODES.contains(&code) || body.contains("Could not find any route")
}

#[async_trait]
impl SwapGateway for JupiterClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(skip(self), fields(token = %request.token()))]
    async fn quote(&self, request: &QuoteRequest) -> EngineResult<SwapQuote> {
        debug!(
            "🔍 Getting Jupiter quote: {} {} -> {}",
            request.amount, request.input_mint, request.output_mint
        );

        let url = format!("{}/quote", self.api_url);
        let params = [
            ("inputMint", request.input_mint.clone()),
            ("outputMint", request.output_mint.clone()),
            ("amount", request.amount.to_string()),
            ("slippageBps", request.slippage_bps.to_string()),
            ("onlyDirectRoutes", "false".to_string()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| EngineError::from_http(PROVIDER, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::from_http(PROVIDER, e))?;

        if !status.is_success() {
            if is_no_route(&body) {
                return Err(EngineError::NoRoute(request.token().to_string()));
            }
            return Err(EngineError::unavailable(
                PROVIDER,
                format!("HTTP {} {}", status.as_u16(), truncate(&body, 200)),
            ));
        }

        let raw: Value = serde_json::from_str(&body).map_err(|e| EngineError::decode(PROVIDER, e))?;
        let quote = SwapQuote::from_response(raw, request.token())?;

        debug!(
            "📊 Quote received: {} -> {} (impact: {:?}%, route: {})",
            quote.in_amount,
            quote.out_amount,
            quote.price_impact_pct,
            quote.route_labels.join(" > ")
        );
        Ok(quote)
    }

    async fn build_swap(
        &self,
        quote: &SwapQuote,
        user_public_key: &str,
        prioritization_fee_lamports: u64,
    ) -> EngineResult<String> {
        let url = format!("{}/swap", self.api_url);
        let body = json!({
            "quoteResponse": quote.raw,
            "userPublicKey": user_public_key,
            "wrapAndUnwrapSol": true,
            "dynamicComputeUnitLimit": true,
            "prioritizationFeeLamports": prioritization_fee_lamports,
        });

        debug!("📤 Requesting swap transaction from Jupiter");
        let value = crate::client::get_json(PROVIDER, self.client.post(&url).json(&body)).await?;
        let response: SwapResponse = serde_json::from_value(value).map_err(|e| EngineError::decode(PROVIDER, e))?;

        debug!("📥 Swap transaction received (valid until block {:?})", response.last_valid_block_height);
        response
            .swap_transaction
            .filter(|tx| !tx.is_empty())
            .ok_or_else(|| EngineError::decode(PROVIDER, "missing swapTransaction"))
    }
}

/// Decode an unsigned base64 wire transaction, sign it with `keypair`, and
/// re-encode it. The keypair must be the transaction's only required signer.
pub fn sign_swap_transaction(unsigned_b64: &str, keypair: &Keypair) -> EngineResult<String> {
    let bytes = STANDARD
        .decode(unsigned_b64.trim())
        .map_err(|e| EngineError::decode(PROVIDER, format!("invalid base64 transaction: {}", e)))?;

    let unsigned: VersionedTransaction = bincode::deserialize(&bytes)
        .map_err(|e| EngineError::decode(PROVIDER, format!("invalid transaction bytes: {}", e)))?;

    let signed = VersionedTransaction::try_new(unsigned.message, &[keypair])
        .map_err(|e| EngineError::Signing(e.to_string()))?;

    let wire = bincode::serialize(&signed).map_err(|e| EngineError::Signing(e.to_string()))?;
    debug!("✍️ Transaction signed ({} bytes)", wire.len());
    Ok(STANDARD.encode(wire))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::message::{Message, VersionedMessage};
    use solana_sdk::signature::{Signature, Signer};
    use solana_sdk::system_instruction;

    fn unsigned_transfer(payer: &Keypair) -> String {
        let to = Keypair::new().pubkey();
        let message = Message::new(&[system_instruction::transfer(&payer.pubkey(), &to, 1_000)], Some(&payer.pubkey()));
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(message),
        };
        STANDARD.encode(bincode::serialize(&tx).unwrap())
    }

    #[test]
    fn test_sign_swap_transaction() {
        let payer = Keypair::new();
        let signed_b64 = sign_swap_transaction(&unsigned_transfer(&payer), &payer).unwrap();

        let signed: VersionedTransaction = bincode::deserialize(&STANDARD.decode(signed_b64).unwrap()).unwrap();
        assert_ne!(signed.signatures[0], Signature::default());
        assert!(signed.verify_with_results().into_iter().all(|ok| ok));
    }

    #[test]
    fn test_sign_with_wrong_keypair_fails() {
        let payer = Keypair::new();
        let stranger = Keypair::new();
        let result = sign_swap_transaction(&unsigned_transfer(&payer), &stranger);
        assert!(matches!(result, Err(EngineError::Signing(_))));
    }

    #[test]
    fn test_sign_rejects_garbage() {
        let payer = Keypair::new();
        assert!(matches!(
            sign_swap_transaction("not base64!!", &payer),
            Err(EngineError::Decode { .. })
        ));
        assert!(matches!(
            sign_swap_transaction(&STANDARD.encode([1u8, 2, 3]), &payer),
            Err(EngineError::Decode { .. })
        ));
    }

    #[test]
    fn test_quote_without_route_is_no_route() {
        let raw = json!({"inAmount": "1000", "outAmount": "5", "routePlan": []});
        assert_eq!(
            SwapQuote::from_response(raw, "Mint111"),
            Err(EngineError::NoRoute("Mint111".into()))
        );
    }

    #[test]
    fn test_quote_parses_amounts_and_labels() {
        let raw = json!({
            "inputMint": NATIVE_MINT,
            "outputMint": "Mint111",
            "inAmount": "100000000",
            "outAmount": "4200000",
            "priceImpactPct": "0.12",
            "routePlan": [{"swapInfo": {"label": "Raydium"}, "percent": 100}]
        });
        let quote = SwapQuote::from_response(raw, "Mint111").unwrap();
        assert_eq!(quote.in_amount, 100_000_000);
        assert_eq!(quote.out_amount, 4_200_000);
        assert_eq!(quote.price_impact_pct, Some(0.12));
        assert_eq!(quote.route_labels, vec!["Raydium"]);
    }

    #[test]
    fn test_large_amounts_keep_full_precision() {
        let raw = json!({
            "inAmount": "18446744073709551615",
            "outAmount": "9007199254740993",
            "routePlan": [{"swapInfo": {"label": "Meteora"}}]
        });
        let quote = SwapQuote::from_response(raw, "Mint111").unwrap();
        assert_eq!(quote.in_amount, u64::MAX);
        assert_eq!(quote.out_amount, 9_007_199_254_740_993);

        assert_eq!(raw_amount(Some(&json!(42))), Some(42));
        assert_eq!(raw_amount(Some(&json!("1.5"))), None);
        assert_eq!(raw_amount(Some(&json!(-3))), None);
    }

    #[test]
    fn test_no_route_detection() {
        assert!(is_no_route(r#"{"error":"Could not find any route","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#));
        assert!(!is_no_route(r#"{"error":"Rate limit exceeded"}"#));
    }

    #[test]
    fn test_request_token_is_non_native_side() {
        let buy = QuoteRequest {
            input_mint: NATIVE_MINT.into(),
            output_mint: "Mint111".into(),
            amount: 1,
            slippage_bps: 2000,
        };
        let sell = QuoteRequest {
            input_mint: "Mint111".into(),
            output_mint: NATIVE_MINT.into(),
            ..buy.clone()
        };
        assert_eq!(buy.token(), "Mint111");
        assert_eq!(sell.token(), "Mint111");
    }
}
