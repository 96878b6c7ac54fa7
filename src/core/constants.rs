//! Chain and policy constants shared across the engine

use std::time::Duration;

/// Wrapped SOL mint, the native side of every swap
pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Cached balances younger than this are returned without a network call
pub const BALANCE_FRESH_WINDOW: Duration = Duration::from_secs(30);

/// Cached balances younger than this are still served when every provider fails
pub const BALANCE_STALE_WINDOW: Duration = Duration::from_secs(300);

/// Candidates younger than this are ranked by liquidity
pub const FRESH_TOKEN_AGE_HOURS: f64 = 48.0;

pub const MAX_DISCOVERY_RESULTS: usize = 30;

pub const EXPLORER_TX_BASE: &str = "https://solscan.io/tx";

/// Symbols never offered as discovery candidates
pub const MAJOR_SYMBOLS: &[&str] = &[
    "SOL", "USDC", "USDT", "BONK", "WIF", "JUP", "RNDR", "RAY", "ETH", "BTC", "JTO", "PYTH", "MSOL",
];

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}

pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL).round() as u64
}

pub fn explorer_url(signature: &str) -> String {
    format!("{}/{}", EXPLORER_TX_BASE, signature)
}

pub fn is_major_symbol(symbol: &str) -> bool {
    MAJOR_SYMBOLS.iter().any(|major| major.eq_ignore_ascii_case(symbol.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamport_conversion() {
        assert_eq!(lamports_to_sol(1_500_000_000), 1.5);
        assert_eq!(sol_to_lamports(0.0015), 1_500_000);
        assert_eq!(sol_to_lamports(0.005), 5_000_000);
    }

    #[test]
    fn test_major_symbols_case_insensitive() {
        assert!(is_major_symbol("SOL"));
        assert!(is_major_symbol("usdc"));
        assert!(is_major_symbol(" mSOL "));
        assert!(!is_major_symbol("NEWT"));
    }
}
