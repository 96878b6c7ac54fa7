//! In-memory record of executed trades, per owner
//!
//! Nothing is persisted. Each owner's list keeps insertion order and is capped
//! at `max_records_per_owner`; the oldest records go first.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::{normalize_owner, TradeRecord};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// `None` keeps every record for the process lifetime
    pub max_records_per_owner: Option<usize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_records_per_owner: Some(1000),
        }
    }
}

pub struct TradeLedger {
    trades: RwLock<HashMap<String, Vec<TradeRecord>>>,
    config: LedgerConfig,
}

impl TradeLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            trades: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub async fn record(&self, trade: TradeRecord) {
        let owner = normalize_owner(&trade.owner_id);
        let mut trades = self.trades.write().await;
        let history = trades.entry(owner.clone()).or_default();
        history.push(trade);

        if let Some(max) = self.config.max_records_per_owner {
            if history.len() > max {
                let excess = history.len() - max;
                history.drain(..excess);
                debug!("🧹 Dropped {} old trade records for {}", excess, owner);
            }
        }
    }

    /// Trades for `owner_id` no older than `minutes_back`, in insertion order.
    /// A window reaching past the representable time range returns everything.
    pub async fn recent(&self, owner_id: &str, minutes_back: i64) -> Vec<TradeRecord> {
        let cutoff = cutoff(Utc::now(), minutes_back);
        let trades = self.trades.read().await;

        trades
            .get(&normalize_owner(owner_id))
            .map(|history| {
                history
                    .iter()
                    .filter(|trade| cutoff.map_or(true, |cutoff| trade.timestamp >= cutoff))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of records held for `owner_id`, regardless of age
    pub async fn count(&self, owner_id: &str) -> usize {
        self.trades
            .read()
            .await
            .get(&normalize_owner(owner_id))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Oldest timestamp inside the window; `None` when the window is unbounded
fn cutoff(now: DateTime<Utc>, minutes_back: i64) -> Option<DateTime<Utc>> {
    minutes_back
        .checked_mul(60)
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
