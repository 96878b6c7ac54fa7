use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::client::MetadataSource;
use crate::core::TokenMetadata;

/// Queries metadata providers in priority order and merges their answers.
/// Never fails: an unknown token resolves to a record with only its address.
pub struct MetadataResolver {
    sources: Vec<Arc<dyn MetadataSource>>,
}

impl MetadataResolver {
    pub fn new(sources: Vec<Arc<dyn MetadataSource>>) -> Self {
        Self { sources }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> TokenMetadata {
        let address = address.trim();
        let mut metadata = TokenMetadata::empty(address);
        if address.is_empty() {
            return metadata;
        }

        for source in &self.sources {
            match source.fetch(address).await {
                Ok(partial) => metadata.merge(partial),
                Err(e) => warn!("⚠️ Metadata provider {} failed for {}: {}", source.name(), address, e),
            }

            if metadata.has_core_socials() {
                debug!("✅ Socials complete after {}", source.name());
                break;
            }
        }

        metadata
    }
}
