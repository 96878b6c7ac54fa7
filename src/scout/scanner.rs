use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::filter::ScanCriteria;
use super::metadata::MetadataResolver;
use crate::core::TokenMetadata;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanReport {
    pub metadata: TokenMetadata,
    pub passes: bool,
    pub reasons: Vec<String>,
}

/// Resolves a token's metadata and checks it against `ScanCriteria`
pub struct TokenScanner {
    metadata: Arc<MetadataResolver>,
    criteria: ScanCriteria,
}

impl TokenScanner {
    pub fn new(metadata: Arc<MetadataResolver>, criteria: ScanCriteria) -> Self {
        Self { metadata, criteria }
    }

    pub fn criteria(&self) -> &ScanCriteria {
        &self.criteria
    }

    #[instrument(skip(self))]
    pub async fn scan(&self, address: &str) -> ScanReport {
        let metadata = self.metadata.resolve(address).await;
        let (passes, reasons) = self.criteria.evaluate(&metadata);

        if passes {
            info!("✅ {} passed scan", metadata.display_symbol());
        } else {
            info!("❌ {} failed scan: {}", metadata.display_symbol(), reasons.join(", "));
        }

        ScanReport {
            metadata,
            passes,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MetadataSource;
    use crate::core::{EngineResult, PartialMetadata};
    use async_trait::async_trait;

    struct Socials;

    #[async_trait]
    impl MetadataSource for Socials {
        fn name(&self) -> &str {
            "socials"
        }

        async fn fetch(&self, _address: &str) -> EngineResult<PartialMetadata> {
            Ok(PartialMetadata {
                symbol: Some("GOOD".into()),
                website: Some("https://good.io".into()),
                twitter: Some("https://x.com/good".into()),
                telegram: Some("https://t.me/good".into()),
                liquidity_usd: Some(2500.0),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_scan_passes_with_socials() {
        let resolver = Arc::new(MetadataResolver::new(vec![Arc::new(Socials) as Arc<dyn MetadataSource>]));
        let report = TokenScanner::new(resolver, ScanCriteria::default()).scan("Mint111").await;
        assert!(report.passes);
        assert!(report.reasons.is_empty());
        assert_eq!(report.metadata.symbol.as_deref(), Some("GOOD"));
    }

    #[tokio::test]
    async fn test_scan_without_providers_fails() {
        let resolver = Arc::new(MetadataResolver::new(Vec::new()));
        let report = TokenScanner::new(resolver, ScanCriteria::default()).scan("Mint111").await;
        assert!(!report.passes);
        assert_eq!(report.reasons.len(), 3);
    }
}
