//! Token scouting: discovery feeds, metadata resolution and social screening

pub mod discovery;
pub mod filter;
pub mod metadata;
pub mod scanner;

pub use discovery::{DiscoveryConfig, TokenDiscoveryAggregator};
pub use filter::ScanCriteria;
pub use metadata::MetadataResolver;
pub use scanner::{ScanReport, TokenScanner};
