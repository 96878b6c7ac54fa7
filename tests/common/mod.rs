#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use solana_sdk::message::{Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::VersionedTransaction;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use catcher::client::{BalanceSource, ChainSubmitter, DiscoveryFeed, FeedRecord, ListedToken, MetadataSource};
use catcher::config::EngineConfig;
use catcher::core::{EngineError, EngineResult, FeedSource, PartialMetadata};
use catcher::trading::{QuoteRequest, SwapGateway, SwapQuote};
use catcher::{EngineParts, TradingEngine};

pub struct FakeBalance {
    pub name: String,
    pub lamports: Mutex<EngineResult<u64>>,
    pub calls: AtomicUsize,
}

impl FakeBalance {
    pub fn ok(lamports: u64) -> Arc<Self> {
        Self::with(Ok(lamports))
    }

    pub fn down() -> Arc<Self> {
        Self::with(Err(EngineError::unavailable("fake balance", "connection refused")))
    }

    fn with(result: EngineResult<u64>) -> Arc<Self> {
        Arc::new(Self {
            name: "fake balance".to_string(),
            lamports: Mutex::new(result),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, result: EngineResult<u64>) {
        *self.lamports.lock().unwrap() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceSource for FakeBalance {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lamports(&self, _public_key: &str) -> EngineResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lamports.lock().unwrap().clone()
    }
}

pub struct FakeFeed {
    pub source: FeedSource,
    pub result: EngineResult<Vec<FeedRecord>>,
}

impl FakeFeed {
    pub fn new(source: FeedSource, records: Vec<FeedRecord>) -> Arc<Self> {
        Arc::new(Self {
            source,
            result: Ok(records),
        })
    }

    pub fn failing(source: FeedSource) -> Arc<Self> {
        Arc::new(Self {
            source,
            result: Err(EngineError::decode("fake feed", "unexpected body")),
        })
    }
}

#[async_trait]
impl DiscoveryFeed for FakeFeed {
    fn source(&self) -> FeedSource {
        self.source
    }

    fn name(&self) -> &str {
        "fake feed"
    }

    async fn fetch(&self) -> EngineResult<Vec<FeedRecord>> {
        self.result.clone()
    }
}

pub fn token(address: &str, symbol: &str) -> ListedToken {
    ListedToken {
        address: address.to_string(),
        symbol: symbol.to_string(),
        name: Some(format!("{} Token", symbol)),
    }
}

pub fn pair(base: ListedToken, quote: ListedToken, liquidity: f64, created_ms: Option<i64>) -> FeedRecord {
    FeedRecord::Pair {
        base,
        quote,
        liquidity_usd: Some(liquidity),
        created_at: created_ms.map(|ms| json!(ms)),
        price_usd: Some(0.001),
        volume_24h: None,
        price_change_24h: None,
        dex_id: Some("raydium".to_string()),
    }
}

pub fn sol() -> ListedToken {
    token("So11111111111111111111111111111111111111112", "SOL")
}

pub struct FakeMetadata {
    pub name: String,
    pub result: EngineResult<PartialMetadata>,
}

impl FakeMetadata {
    pub fn new(name: &str, result: EngineResult<PartialMetadata>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            result,
        })
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _address: &str) -> EngineResult<PartialMetadata> {
        self.result.clone()
    }
}

/// What `build_swap` hands back
#[derive(Debug, Clone)]
pub enum BuildMode {
    /// Unsigned transfer paid by the user
    Valid,
    Fail(EngineError),
    /// Payload that is not base64
    Garbage,
    /// Well-formed transaction whose fee payer is someone else
    ForeignPayer,
}

/// Quotes every request and builds a real unsigned transfer paid by the user
pub struct FakeGateway {
    pub quote_result: Mutex<Option<EngineError>>,
    pub build_mode: Mutex<BuildMode>,
    pub requests: Mutex<Vec<QuoteRequest>>,
    pub out_amount: u64,
}

impl FakeGateway {
    pub fn new(out_amount: u64) -> Arc<Self> {
        Arc::new(Self {
            quote_result: Mutex::new(None),
            build_mode: Mutex::new(BuildMode::Valid),
            requests: Mutex::new(Vec::new()),
            out_amount,
        })
    }

    pub fn fail_quotes_with(&self, err: EngineError) {
        *self.quote_result.lock().unwrap() = Some(err);
    }

    pub fn build_with(&self, mode: BuildMode) {
        *self.build_mode.lock().unwrap() = mode;
    }

    pub fn requests(&self) -> Vec<QuoteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapGateway for FakeGateway {
    fn name(&self) -> &str {
        "fake jupiter"
    }

    async fn quote(&self, request: &QuoteRequest) -> EngineResult<SwapQuote> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(err) = self.quote_result.lock().unwrap().clone() {
            return Err(err);
        }
        SwapQuote::from_response(
            json!({
                "inputMint": request.input_mint,
                "outputMint": request.output_mint,
                "inAmount": request.amount.to_string(),
                "outAmount": self.out_amount.to_string(),
                "priceImpactPct": "0.01",
                "routePlan": [{"swapInfo": {"label": "Raydium"}, "percent": 100}]
            }),
            request.token(),
        )
    }

    async fn build_swap(
        &self,
        _quote: &SwapQuote,
        user_public_key: &str,
        _prioritization_fee_lamports: u64,
    ) -> EngineResult<String> {
        let mode = self.build_mode.lock().unwrap().clone();
        let payer = match mode {
            BuildMode::Valid => Pubkey::from_str(user_public_key).map_err(|e| EngineError::decode("fake jupiter", e))?,
            BuildMode::Fail(err) => return Err(err),
            BuildMode::Garbage => return Ok("%%% not a transaction %%%".to_string()),
            BuildMode::ForeignPayer => Pubkey::new_unique(),
        };
        let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 1_000);
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(Message::new(&[ix], Some(&payer))),
        };
        let bytes = bincode::serialize(&tx).map_err(|e| EngineError::decode("fake jupiter", e))?;
        Ok(STANDARD.encode(bytes))
    }
}

/// Accepts every transaction and answers with its first signature
pub struct FakeSubmitter {
    pub name: String,
    pub sent: Mutex<Vec<(VersionedTransaction, bool)>>,
    pub reject_with: Mutex<Option<String>>,
    pub token_units: u64,
}

impl FakeSubmitter {
    pub fn new(name: &str, token_units: u64) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            sent: Mutex::new(Vec::new()),
            reject_with: Mutex::new(None),
            token_units,
        })
    }

    pub fn reject(&self, reason: &str) {
        *self.reject_with.lock().unwrap() = Some(reason.to_string());
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainSubmitter for FakeSubmitter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_transaction(&self, signed_b64: &str, skip_preflight: bool) -> EngineResult<String> {
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(EngineError::unavailable(&self.name, format!("transaction rejected: {}", reason)));
        }
        let bytes = STANDARD.decode(signed_b64).map_err(|e| EngineError::decode(&self.name, e))?;
        let tx: VersionedTransaction = bincode::deserialize(&bytes).map_err(|e| EngineError::decode(&self.name, e))?;
        let signature = tx.signatures[0].to_string();
        self.sent.lock().unwrap().push((tx, skip_preflight));
        Ok(signature)
    }

    async fn token_balance(&self, _owner: &str, _mint: &str) -> EngineResult<u64> {
        Ok(self.token_units)
    }
}

pub struct Harness {
    pub engine: TradingEngine,
    pub balance: Arc<FakeBalance>,
    pub gateway: Arc<FakeGateway>,
    pub submitter: Arc<FakeSubmitter>,
    pub protected: Option<Arc<FakeSubmitter>>,
}

pub fn config(dir: &Path, simulated: bool) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.storage.wallet_file = dir.join("wallets.json");
    config.trading.simulated = simulated;
    config
}

pub fn harness(config: EngineConfig, balance: Arc<FakeBalance>, with_protected: bool) -> Harness {
    let gateway = FakeGateway::new(250_000_000);
    let submitter = FakeSubmitter::new("fake rpc", 1_000);
    let protected = with_protected.then(|| FakeSubmitter::new("fake relay", 1_000));

    let metadata = FakeMetadata::new(
        "fake meta",
        Ok(PartialMetadata {
            symbol: Some("CAT".to_string()),
            ..Default::default()
        }),
    );

    let engine = TradingEngine::from_parts(EngineParts {
        config,
        balance_sources: vec![balance.clone() as Arc<dyn BalanceSource>],
        discovery_feeds: Vec::new(),
        metadata_sources: vec![metadata as Arc<dyn MetadataSource>],
        gateway: gateway.clone(),
        submitter: submitter.clone(),
        protected_submitter: protected.clone().map(|p| p as Arc<dyn ChainSubmitter>),
    });

    Harness {
        engine,
        balance,
        gateway,
        submitter,
        protected,
    }
}
