//! Configuration types for the custom-domain reconciler
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Platform account id, passed to the challenge service
    pub account_id: String,

    /// Platform region, passed to the challenge service
    pub region: String,

    /// Binder engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Temporary-domain settings
    #[serde(default)]
    pub temp_domain: TempDomainConfig,
}

impl ReconcilerConfig {
    /// Create a configuration with defaults for the given account/region
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            engine: EngineConfig::default(),
            temp_domain: TempDomainConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.account_id.is_empty() {
            return Err(crate::Error::config("Account id cannot be empty"));
        }
        if self.region.is_empty() {
            return Err(crate::Error::config("Region cannot be empty"));
        }
        self.engine.validate()?;
        self.temp_domain.validate()?;
        Ok(())
    }
}

/// Binder engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum `createDomain` attempts while the platform reports the
    /// domain as not yet resolved (~10 minutes at one attempt/second)
    #[serde(default = "default_create_retry_attempts")]
    pub create_retry_attempts: usize,

    /// Delay between creation attempts (in milliseconds)
    #[serde(default = "default_create_retry_delay_ms")]
    pub create_retry_delay_ms: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new reconciler events will be dropped (with a warning
    /// log). This prevents unbounded memory growth if the consumer stalls.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.create_retry_attempts == 0 {
            return Err(crate::Error::config("create_retry_attempts must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            create_retry_attempts: default_create_retry_attempts(),
            create_retry_delay_ms: default_create_retry_delay_ms(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Temporary-domain and challenge-function configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempDomainConfig {
    /// Reserved suffix identifying platform-issued temporary domains
    #[serde(default = "default_temp_domain_suffix")]
    pub suffix: String,

    /// Fixed service name hosting the ephemeral challenge function
    #[serde(default = "default_challenge_service_name")]
    pub service_name: String,

    /// Fixed trigger name for the challenge function's HTTP trigger
    #[serde(default = "default_challenge_trigger_name")]
    pub trigger_name: String,

    /// Runtime for the challenge function
    #[serde(default = "default_challenge_runtime")]
    pub runtime: String,

    /// Handler entry point for the challenge function
    #[serde(default = "default_challenge_handler")]
    pub handler: String,
}

impl TempDomainConfig {
    /// Validate the temporary-domain configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.suffix.is_empty() {
            return Err(crate::Error::config("Temp domain suffix cannot be empty"));
        }
        if self.service_name.is_empty() {
            return Err(crate::Error::config(
                "Challenge service name cannot be empty",
            ));
        }
        if self.trigger_name.is_empty() {
            return Err(crate::Error::config(
                "Challenge trigger name cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for TempDomainConfig {
    fn default() -> Self {
        Self {
            suffix: default_temp_domain_suffix(),
            service_name: default_challenge_service_name(),
            trigger_name: default_challenge_trigger_name(),
            runtime: default_challenge_runtime(),
            handler: default_challenge_handler(),
        }
    }
}

fn default_create_retry_attempts() -> usize {
    601
}

fn default_create_retry_delay_ms() -> u64 {
    1000
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_temp_domain_suffix() -> String {
    ".test.functioncompute.com".to_string()
}

fn default_challenge_service_name() -> String {
    "fc-domain-challenge".to_string()
}

fn default_challenge_trigger_name() -> String {
    "tmp-domain-http".to_string()
}

fn default_challenge_runtime() -> String {
    "nodejs8".to_string()
}

fn default_challenge_handler() -> String {
    "index.handler".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_contract() {
        let engine = EngineConfig::default();
        assert_eq!(engine.create_retry_attempts, 601);
        assert_eq!(engine.create_retry_delay_ms, 1000);

        let temp = TempDomainConfig::default();
        assert_eq!(temp.suffix, ".test.functioncompute.com");
        assert_eq!(temp.service_name, "fc-domain-challenge");
        assert_eq!(temp.trigger_name, "tmp-domain-http");
    }

    #[test]
    fn validate_rejects_empty_account() {
        let config = ReconcilerConfig::new("", "cn-hangzhou");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = ReconcilerConfig::new("123", "cn-hangzhou");
        config.engine.create_retry_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = ReconcilerConfig::new("123", "cn-hangzhou");
        assert!(config.validate().is_ok());
    }
}
