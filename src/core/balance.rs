//! Native balance resolution with a short-lived cache
//!
//! Lookups go through the configured sources in order. A reading younger than
//! the fresh window is served straight from cache; when every source fails, a
//! reading younger than the stale window is served instead of zero.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::constants::{lamports_to_sol, BALANCE_FRESH_WINDOW, BALANCE_STALE_WINDOW};
use super::wallet_management::{normalize_owner, WalletStore};
use crate::client::BalanceSource;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedBalance {
    pub owner_id: String,
    pub amount: f64,
    pub fetched_at: Instant,
}

pub struct BalanceResolver {
    wallets: Arc<WalletStore>,
    sources: Vec<Arc<dyn BalanceSource>>,
    cache: DashMap<String, CachedBalance>,
    fresh_window: Duration,
    stale_window: Duration,
}

impl BalanceResolver {
    pub fn new(wallets: Arc<WalletStore>, sources: Vec<Arc<dyn BalanceSource>>) -> Self {
        Self::with_windows(wallets, sources, BALANCE_FRESH_WINDOW, BALANCE_STALE_WINDOW)
    }

    pub fn with_windows(
        wallets: Arc<WalletStore>,
        sources: Vec<Arc<dyn BalanceSource>>,
        fresh_window: Duration,
        stale_window: Duration,
    ) -> Self {
        Self {
            wallets,
            sources,
            cache: DashMap::new(),
            fresh_window,
            stale_window,
        }
    }

    /// Native balance in SOL. Never fails: an owner without a wallet, or with
    /// every source down and no usable cache entry, reads as 0.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, owner_id: &str, force_refresh: bool) -> f64 {
        let owner = normalize_owner(owner_id);

        if !force_refresh {
            if let Some(cached) = self.cached_within(&owner, self.fresh_window) {
                debug!("💾 Cached balance for {}: {:.6} SOL", owner, cached);
                return cached;
            }
        }

        let public_key = match self.wallets.get(&owner) {
            Ok(wallet) => wallet.public_key,
            Err(_) => {
                debug!("No wallet for {}, balance is 0", owner);
                return 0.0;
            }
        };

        for source in &self.sources {
            match source.lamports(&public_key).await {
                Ok(lamports) => {
                    let amount = lamports_to_sol(lamports);
                    self.cache.insert(
                        owner.clone(),
                        CachedBalance {
                            owner_id: owner.clone(),
                            amount,
                            fetched_at: Instant::now(),
                        },
                    );
                    info!("💰 Balance for {} via {}: {:.6} SOL", owner, source.name(), amount);
                    return amount;
                }
                Err(e) => warn!("⚠️ Balance source {} failed for {}: {}", source.name(), owner, e),
            }
        }

        if let Some(stale) = self.cached_within(&owner, self.stale_window) {
            warn!("⚠️ All balance sources failed for {}, serving cached {:.6} SOL", owner, stale);
            return stale;
        }

        warn!("⚠️ All balance sources failed for {}, reporting 0", owner);
        0.0
    }

    /// Current cache entry, regardless of age
    pub fn cached(&self, owner_id: &str) -> Option<CachedBalance> {
        self.cache.get(&normalize_owner(owner_id)).map(|entry| entry.clone())
    }

    /// Optimistically reduce a cached balance after a spend. Floors at zero;
    /// does nothing when the owner has no cache entry.
    pub fn debit(&self, owner_id: &str, amount: f64) {
        if let Some(mut entry) = self.cache.get_mut(&normalize_owner(owner_id)) {
            entry.amount = (entry.amount - amount).max(0.0);
        }
    }

    pub fn invalidate(&self, owner_id: &str) {
        self.cache.remove(&normalize_owner(owner_id));
    }

    fn cached_within(&self, owner: &str, window: Duration) -> Option<f64> {
        self.cache
            .get(owner)
            .filter(|entry| entry.fetched_at.elapsed() < window)
            .map(|entry| entry.amount)
    }
}
