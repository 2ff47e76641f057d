//! Bridge configuration.

use serde::Deserialize;

use crate::error::BridgeError;

/// Environment variable overriding [`BridgeConfig::property_prefix`].
pub const PROPERTY_PREFIX_ENV: &str = "SPARKCRUMBS_PROPERTY_PREFIX";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Integration name looked up on the reporter to decide if the bridge is on.
    pub integration: String,
    /// Prepended to the property keys written for remote workers.
    pub property_prefix: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            integration: crate::integration::SparkIntegration::IDENTIFIER.to_string(),
            property_prefix: String::new(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(s: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup(PROPERTY_PREFIX_ENV) {
            self.property_prefix = prefix;
        }
        self
    }

    pub fn with_integration(mut self, name: impl Into<String>) -> Self {
        self.integration = name.into();
        self
    }

    pub fn with_property_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.property_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.integration, "spark");
        assert_eq!(cfg.property_prefix, "");
    }

    #[test]
    fn parses_partial_json() {
        let cfg = BridgeConfig::from_json_str(r#"{"property_prefix": "sentry_"}"#).unwrap();
        assert_eq!(cfg.integration, "spark");
        assert_eq!(cfg.property_prefix, "sentry_");
    }

    #[test]
    fn overrides_replace_prefix_only() {
        let cfg = BridgeConfig::default()
            .with_integration("pyspark")
            .with_overrides_from(|key| (key == PROPERTY_PREFIX_ENV).then(|| "sentry_".to_string()));
        assert_eq!(cfg.integration, "pyspark");
        assert_eq!(cfg.property_prefix, "sentry_");

        let untouched = BridgeConfig::default()
            .with_property_prefix("x_")
            .with_overrides_from(|_| None);
        assert_eq!(untouched.property_prefix, "x_");
    }

    #[test]
    fn env_overrides_match_process_environment() {
        let expected = std::env::var(PROPERTY_PREFIX_ENV).unwrap_or_default();
        assert_eq!(BridgeConfig::default().with_env_overrides().property_prefix, expected);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = BridgeConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
