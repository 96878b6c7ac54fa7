//! Engine error taxonomy
//!
//! Balance and metadata lookups absorb these locally; the swap pipeline surfaces
//! the first terminal one to the caller inside a `TradeOutcome`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("No wallet found for {0}")]
    NotFound(String),

    #[error("{provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("No swap route found for {0}")]
    NoRoute(String),

    #[error("Malformed {provider} payload: {reason}")]
    Decode { provider: String, reason: String },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Wallet storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn unavailable(provider: impl Into<String>, reason: impl ToString) -> Self {
        EngineError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(provider: impl Into<String>, reason: impl ToString) -> Self {
        EngineError::Decode {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Map a transport error from `provider`. Timeouts land here too.
    pub fn from_http(provider: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            EngineError::decode(provider, err)
        } else if err.is_timeout() {
            EngineError::unavailable(provider, "request timed out")
        } else {
            EngineError::unavailable(provider, err)
        }
    }

    /// Whether fallback logic may move on to the next provider.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::ProviderUnavailable { .. } | EngineError::Decode { .. }
        )
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::decode("json", err)
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(EngineError::unavailable("rpc", "503").is_recoverable());
        assert!(EngineError::decode("solscan", "missing lamports").is_recoverable());
        assert!(!EngineError::NoRoute("mint".into()).is_recoverable());
        assert!(!EngineError::Signing("bad key".into()).is_recoverable());
        assert!(!EngineError::NotFound("alice".into()).is_recoverable());
    }

    #[test]
    fn test_messages_name_the_provider() {
        let err = EngineError::unavailable("jupiter quote", "HTTP 500");
        assert_eq!(err.to_string(), "jupiter quote unavailable: HTTP 500");
    }
}
