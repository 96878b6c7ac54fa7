use serde::{Deserialize, Serialize};

use crate::core::TokenMetadata;

/// Social and liquidity requirements a token must meet before it is worth buying
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanCriteria {
    pub require_website: bool,
    pub require_twitter: bool,
    pub require_telegram: bool,
    pub min_liquidity_usd: f64,
}

impl Default for ScanCriteria {
    fn default() -> Self {
        Self {
            require_website: true,
            require_twitter: true,
            require_telegram: true,
            min_liquidity_usd: 0.0,
        }
    }
}

impl ScanCriteria {
    /// Returns whether the token passes and, if not, every unmet requirement
    pub fn evaluate(&self, metadata: &TokenMetadata) -> (bool, Vec<String>) {
        let mut reasons = Vec::new();

        if self.require_website && metadata.website.is_none() {
            reasons.push("missing website".to_string());
        }
        if self.require_twitter && metadata.twitter.is_none() {
            reasons.push("missing twitter".to_string());
        }
        if self.require_telegram && metadata.telegram.is_none() {
            reasons.push("missing telegram".to_string());
        }
        if metadata.liquidity_usd < self.min_liquidity_usd {
            reasons.push(format!(
                "liquidity ${:.2} below minimum ${:.2}",
                metadata.liquidity_usd, self.min_liquidity_usd
            ));
        }

        (reasons.is_empty(), reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requires_core_socials() {
        let mut meta = TokenMetadata::empty("Mint111");
        meta.website = Some("https://a.io".into());
        let (passes, reasons) = ScanCriteria::default().evaluate(&meta);
        assert!(!passes);
        assert_eq!(reasons, vec!["missing twitter", "missing telegram"]);
    }

    #[test]
    fn test_liquidity_floor() {
        let criteria = ScanCriteria {
            require_website: false,
            require_twitter: false,
            require_telegram: false,
            min_liquidity_usd: 1000.0,
        };
        let mut meta = TokenMetadata::empty("Mint111");
        meta.liquidity_usd = 999.0;
        assert!(!criteria.evaluate(&meta).0);
        meta.liquidity_usd = 1000.0;
        assert_eq!(criteria.evaluate(&meta), (true, vec![]));
    }
}
