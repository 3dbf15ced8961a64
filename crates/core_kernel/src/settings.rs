//! Engine-wide policy knobs
//!
//! Loaded by the binary as part of `ApiConfig` and passed by value to every
//! domain service. All fields have defaults so a partial configuration is
//! enough.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Limits and defaults shared by the hiring and claim services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// How many times a client may ask for a new quotation on one hiring
    pub requote_limit: u32,
    /// Upper bound on compliances attached to a single claim resolution
    pub max_compliances_per_claim: usize,
    /// Upper bound on evidence URLs per claim or submission
    pub max_evidence_urls: usize,
    /// Optional cap on submission attempts per compliance
    pub max_submission_attempts: Option<u32>,
    /// Validity used when a quotation does not state its own
    pub default_validity_days: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            requote_limit: 3,
            max_compliances_per_claim: 5,
            max_evidence_urls: 10,
            max_submission_attempts: None,
            default_validity_days: 7,
        }
    }
}

impl EngineSettings {
    /// Rejects combinations no service can honour
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_compliances_per_claim == 0 {
            return Err(CoreError::configuration(
                "max_compliances_per_claim must be at least 1",
            ));
        }
        if self.max_evidence_urls == 0 {
            return Err(CoreError::configuration("max_evidence_urls must be at least 1"));
        }
        if self.default_validity_days == 0 {
            return Err(CoreError::configuration(
                "default_validity_days must be at least 1",
            ));
        }
        if self.max_submission_attempts == Some(0) {
            return Err(CoreError::configuration(
                "max_submission_attempts must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// Builder-style override used by tests and the server bootstrap
    pub fn with_requote_limit(mut self, limit: u32) -> Self {
        self.requote_limit = limit;
        self
    }

    pub fn with_max_submission_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_submission_attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.requote_limit, 3);
        assert_eq!(settings.max_compliances_per_claim, 5);
        assert_eq!(settings.max_submission_attempts, None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"requote_limit": 1}"#).unwrap();
        assert_eq!(settings.requote_limit, 1);
        assert_eq!(settings.max_evidence_urls, 10);
    }

    #[test]
    fn test_zero_attempt_cap_rejected() {
        let settings = EngineSettings::default().with_max_submission_attempts(Some(0));
        assert!(settings.validate().is_err());
    }
}
