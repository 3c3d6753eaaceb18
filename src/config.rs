// Copyright 2025 Cowboy AI, LLC.

//! Registry-wide flow settings.
//!
//! Per-TLD policy lives in [`crate::domain::policy::TldPolicySnapshot`]; the values here are
//! limits and texts shared by every TLD.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a [`FlowConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Input was not valid JSON for the config shape
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A limit that must be positive was zero
    #[error("Config value {field} must be greater than zero")]
    ZeroLimit {
        /// Offending field
        field: &'static str,
    },
}

/// Settings shared by all create flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Maximum nameservers on one domain
    pub max_nameservers: usize,
    /// Maximum DS records on one domain
    pub max_ds_records: usize,
    /// Upper bound on registration years; a TLD may set a lower one
    pub max_registration_years: u32,
    /// Period used when the command omits one
    pub default_period_years: u32,
    /// Period an anchor tenant must register for
    pub anchor_tenant_period_years: u32,
    /// How long ago a claims notice may have been accepted
    pub claims_acceptance_window_secs: i64,
    /// Validator id accepted on claims notices
    pub trademark_validator_id: String,
    /// Attempts before a store conflict is surfaced
    pub max_transaction_attempts: u32,
    /// Text of the autorenew poll message
    pub autorenew_message: String,
    /// Text of the name-collision poll message
    pub collision_message: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_nameservers: 13,
            max_ds_records: 8,
            max_registration_years: 10,
            default_period_years: 1,
            anchor_tenant_period_years: 2,
            claims_acceptance_window_secs: 48 * 60 * 60,
            trademark_validator_id: "tmch".to_string(),
            max_transaction_attempts: 3,
            autorenew_message: "Domain was auto-renewed.".to_string(),
            collision_message: "Domain on the name collision list was allocated. But by policy, \
                                the domain will not be delegated. Please visit \
                                https://www.icann.org/namecollision  for more information on name \
                                collision."
                .to_string(),
        }
    }
}

impl FlowConfig {
    /// Load from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FlowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every create fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits: [(&'static str, u64); 4] = [
            ("max_registration_years", self.max_registration_years as u64),
            ("default_period_years", self.default_period_years as u64),
            ("anchor_tenant_period_years", self.anchor_tenant_period_years as u64),
            ("max_transaction_attempts", self.max_transaction_attempts as u64),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { field });
            }
        }
        Ok(())
    }

    /// Claims acceptance window as a duration
    pub fn claims_acceptance_window(&self) -> Duration {
        Duration::seconds(self.claims_acceptance_window_secs)
    }
}
