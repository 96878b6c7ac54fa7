//! Token discovery across DexScreener and pump.fun feeds
//!
//! All feeds are polled concurrently. Results are reconciled in feed order so
//! the first feed that reports an address owns it for the cycle.

use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::client::{DiscoveryFeed, FeedRecord, ListedToken};
use crate::core::{is_major_symbol, FeedSource, TokenCandidate, FRESH_TOKEN_AGE_HOURS, MAX_DISCOVERY_RESULTS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Pairs reporting less than this much liquidity are ignored
    pub min_liquidity_usd: f64,
    pub fresh_age_hours: f64,
    pub max_results: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_liquidity_usd: 100.0,
            fresh_age_hours: FRESH_TOKEN_AGE_HOURS,
            max_results: MAX_DISCOVERY_RESULTS,
        }
    }
}

pub struct TokenDiscoveryAggregator {
    feeds: Vec<Arc<dyn DiscoveryFeed>>,
    config: DiscoveryConfig,
}

impl TokenDiscoveryAggregator {
    pub fn new(feeds: Vec<Arc<dyn DiscoveryFeed>>, config: DiscoveryConfig) -> Self {
        Self { feeds, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// One discovery cycle. Feed failures are logged and skipped; the result
    /// is empty only when every feed came back empty or failed.
    #[instrument(skip(self), fields(feeds = self.feeds.len()))]
    pub async fn discover(&self) -> Vec<TokenCandidate> {
        let results = join_all(self.feeds.iter().map(|feed| feed.fetch())).await;
        let now = Utc::now();

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for (feed, result) in self.feeds.iter().zip(results) {
            let records = match result {
                Ok(records) => records,
                Err(e) => {
                    warn!("⚠️ Discovery feed {} failed: {}", feed.name(), e);
                    continue;
                }
            };
            debug!("📥 {} returned {} records", feed.name(), records.len());

            for record in records {
                for candidate in self.candidates_from(record, feed.source(), now) {
                    if seen.insert(candidate.address.clone()) {
                        candidates.push(candidate);
                    }
                }
            }
        }

        let ranked = rank(candidates, self.config.fresh_age_hours, self.config.max_results);
        info!("🔍 Discovery cycle produced {} candidates", ranked.len());
        ranked
    }

    fn candidates_from(&self, record: FeedRecord, source: FeedSource, now: DateTime<Utc>) -> Vec<TokenCandidate> {
        match record {
            FeedRecord::Pair {
                base,
                quote,
                liquidity_usd,
                created_at,
                price_usd,
                volume_24h,
                price_change_24h,
                dex_id,
            } => {
                let liquidity = liquidity_usd.unwrap_or(0.0);
                if liquidity < self.config.min_liquidity_usd {
                    return Vec::new();
                }
                let age_hours = created_at.as_ref().and_then(|v| age_hours(v, now));
                let created = created_at.as_ref().and_then(|v| created_at_string(v));

                [(base, price_usd), (quote, None)]
                    .into_iter()
                    .filter(|(token, _)| !is_major_symbol(&token.symbol))
                    .map(|(token, price)| TokenCandidate {
                        price_usd: price,
                        volume_24h,
                        price_change_24h,
                        dex_id: dex_id.clone(),
                        ..candidate(token, liquidity, age_hours, source, created.clone())
                    })
                    .collect()
            }
            FeedRecord::Token { token, created_at } => {
                if is_major_symbol(&token.symbol) {
                    return Vec::new();
                }
                let age_hours = created_at.as_ref().and_then(|v| age_hours(v, now));
                let created = created_at.as_ref().and_then(|v| created_at_string(v));
                vec![candidate(token, 0.0, age_hours, source, created)]
            }
        }
    }
}

fn candidate(
    token: ListedToken,
    liquidity_usd: f64,
    age_hours: Option<f64>,
    source: FeedSource,
    created_at: Option<String>,
) -> TokenCandidate {
    TokenCandidate {
        name: token.name.unwrap_or_else(|| token.symbol.clone()),
        address: token.address,
        symbol: token.symbol,
        liquidity_usd,
        age_hours,
        source,
        created_at,
        price_usd: None,
        volume_24h: None,
        price_change_24h: None,
        dex_id: None,
    }
}

/// Fresh candidates first by liquidity descending, then everything else in
/// discovery order
pub fn rank(candidates: Vec<TokenCandidate>, fresh_age_hours: f64, max_results: usize) -> Vec<TokenCandidate> {
    let (mut fresh, rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| c.is_fresh(fresh_age_hours));

    // stable sort keeps discovery order among equal liquidity
    fresh.sort_by(|a, b| b.liquidity_usd.partial_cmp(&a.liquidity_usd).unwrap_or(Ordering::Equal));

    fresh.into_iter().chain(rest).take(max_results).collect()
}

/// Parse a creation timestamp. Numbers above 1e12 are epoch millis, other
/// numbers epoch seconds; strings may be ISO-8601 or numeric.
pub fn parse_created_at(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => from_epoch(n.as_f64()?),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.with_timezone(&Utc));
            }
            let head = s.split('.').next().unwrap_or(s);
            if let Ok(naive) = NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S") {
                return Some(naive.and_utc());
            }
            s.parse::<f64>().ok().and_then(from_epoch)
        }
        _ => None,
    }
}

fn from_epoch(raw: f64) -> Option<DateTime<Utc>> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let millis = if raw > 1e12 { raw } else { raw * 1000.0 };
    DateTime::from_timestamp_millis(millis as i64)
}

/// Hours between creation and `now`; future timestamps are treated as unknown
pub fn age_hours(value: &Value, now: DateTime<Utc>) -> Option<f64> {
    let created = parse_created_at(value)?;
    let hours = (now - created).num_milliseconds() as f64 / 3_600_000.0;
    (hours >= 0.0).then_some(hours)
}

fn created_at_string(value: &Value) -> Option<String> {
    parse_created_at(value).map(|ts| ts.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fresh(address: &str, liquidity: f64, age: Option<f64>) -> TokenCandidate {
        candidate(
            ListedToken {
                address: address.to_string(),
                symbol: address.to_string(),
                name: None,
            },
            liquidity,
            age,
            FeedSource::DexScreener,
            None,
        )
    }

    #[test]
    fn test_rank_fresh_by_liquidity_then_rest_in_order() {
        let ranked = rank(
            vec![
                fresh("old", 9000.0, Some(100.0)),
                fresh("small", 100.0, Some(1.0)),
                fresh("unknown", 5000.0, None),
                fresh("big", 800.0, Some(3.0)),
            ],
            48.0,
            30,
        );
        let order: Vec<_> = ranked.iter().map(|c| c.address.as_str()).collect();
        assert_eq!(order, vec!["big", "small", "old", "unknown"]);
    }

    #[test]
    fn test_rank_truncates() {
        let many = (0..40).map(|i| fresh(&format!("T{}", i), i as f64, Some(1.0))).collect();
        assert_eq!(rank(many, 48.0, 30).len(), 30);
    }

    #[test]
    fn test_parse_created_at_formats() {
        let millis = parse_created_at(&json!(1714557600000u64)).unwrap();
        let secs = parse_created_at(&json!(1714557600u64)).unwrap();
        assert_eq!(millis, secs);

        let iso = parse_created_at(&json!("2024-05-01T10:00:00Z")).unwrap();
        assert_eq!(iso, secs);
        let fractional = parse_created_at(&json!("2024-05-01T10:00:00.123")).unwrap();
        assert_eq!(fractional, secs);
        let numeric = parse_created_at(&json!("1714557600")).unwrap();
        assert_eq!(numeric, secs);

        assert!(parse_created_at(&json!("yesterday")).is_none());
        assert!(parse_created_at(&json!(-5)).is_none());
        assert!(parse_created_at(&json!(null)).is_none());
    }

    #[test]
    fn test_age_hours() {
        let now = DateTime::parse_from_rfc3339("2024-05-02T10:00:00Z").unwrap().with_timezone(&Utc);
        let age = age_hours(&json!("2024-05-01T10:00:00Z"), now).unwrap();
        assert!((age - 24.0).abs() < 1e-9);
        assert!(age_hours(&json!("2024-05-03T10:00:00Z"), now).is_none());
    }
}
