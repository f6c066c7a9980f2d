use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine settings.
///
/// Read from the client's `initializationOptions` (camelCase keys); any key
/// left out keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum inference steps for one document analysis.
    pub inference_budget: u64,
    /// Wall-clock limit for answering one hint request, in milliseconds.
    pub request_timeout_ms: u64,
    /// Whether `inlay_hints` returns anything.
    pub inlay_hints: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inference_budget: 2_000_000,
            request_timeout_ms: 2_000,
            inlay_hints: true,
        }
    }
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Settings given on the command line. They win over client options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub inference_budget: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(budget) = self.inference_budget {
            config.inference_budget = budget;
        }
        if let Some(timeout) = self.request_timeout_ms {
            config.request_timeout_ms = timeout;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_what_they_set() {
        let overrides = ConfigOverrides {
            inference_budget: Some(10),
            request_timeout_ms: None,
        };
        let config = overrides.apply(EngineConfig {
            request_timeout_ms: 7,
            ..EngineConfig::default()
        });
        assert_eq!(config.inference_budget, 10);
        assert_eq!(config.request_timeout_ms, 7);
    }

    #[test]
    fn partial_options_keep_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "requestTimeoutMs": 50 }"#).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(50));
        assert_eq!(config.inference_budget, EngineConfig::default().inference_budget);
        assert!(config.inlay_hints);
    }
}
