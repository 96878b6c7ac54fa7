//! Simulated execution for test mode
//!
//! No network calls: a random delay, a weighted coin flip, and a synthetic
//! signature shaped like a real one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Probability a simulated trade succeeds, in [0, 1]
    pub success_rate: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            success_rate: 0.9,
            seed: None,
        }
    }
}

pub struct TradeSimulator {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
}

impl TradeSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Wait out the simulated confirmation delay and decide the outcome.
    /// Returns a synthetic signature on success.
    pub async fn execute(&self, token_address: &str, amount: f64) -> Option<String> {
        let (delay, success) = self.roll();
        tokio::time::sleep(delay).await;

        debug!("🎲 Simulated trade on {} after {:?}: success={}", token_address, delay, success);
        success.then(|| synthetic_signature(token_address, amount))
    }

    fn roll(&self) -> (Duration, bool) {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let low = self.config.min_delay_ms.min(self.config.max_delay_ms);
        let high = self.config.max_delay_ms.max(low);
        let delay = Duration::from_millis(rng.gen_range(low..=high));
        let success = rng.gen_bool(self.config.success_rate.clamp(0.0, 1.0));
        (delay, success)
    }
}

/// 64 pseudo-random bytes derived from the trade, base58-encoded like a real
/// transaction signature
pub fn synthetic_signature(token_address: &str, amount: f64) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let input = format!("{}:{}:{}", token_address, amount, nanos);

    let bytes: Vec<u8> = (0..8u64)
        .flat_map(|seed| xxh64(input.as_bytes(), seed).to_le_bytes())
        .collect();
    bs58::encode(bytes).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_signature_shape() {
        let sig = synthetic_signature("Mint111", 0.1);
        let decoded = bs58::decode(&sig).into_vec().unwrap();
        assert_eq!(decoded.len(), 64);
        assert!(sig.len() > 80 && sig.len() <= 88);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_succeeds_at_rate_one() {
        let simulator = TradeSimulator::new(SimulationConfig {
            success_rate: 1.0,
            seed: Some(7),
            ..Default::default()
        });
        for _ in 0..20 {
            assert!(simulator.execute("Mint111", 0.1).await.is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_within_bounds() {
        let simulator = TradeSimulator::new(SimulationConfig {
            seed: Some(1),
            ..Default::default()
        });
        let start = tokio::time::Instant::now();
        simulator.execute("Mint111", 0.1).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed <= Duration::from_millis(3001));
    }
}
