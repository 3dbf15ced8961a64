//! Payment gateway vocabulary
//!
//! The gateway reports payments with its own status strings. Only the
//! normalised `PaymentStatus` from the hiring domain crosses into the
//! engine; the raw value is kept for the audit trail.

use serde::{Deserialize, Serialize};

use crate::error::BillingError;
use domain_hiring::PaymentStatus;

/// Notification received from the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    /// Gateway-side payment id
    pub payment_id: String,
    /// Raw gateway status
    pub status: String,
    /// Reference set at checkout; a hiring id or a preference id
    #[serde(default)]
    pub external_reference: String,
    #[serde(default)]
    pub merchant_order_id: Option<String>,
    #[serde(default)]
    pub preference_id: Option<String>,
}

impl PaymentWebhookEvent {
    pub fn new(
        payment_id: impl Into<String>,
        status: impl Into<String>,
        external_reference: impl Into<String>,
    ) -> Self {
        Self {
            payment_id: payment_id.into(),
            status: status.into(),
            external_reference: external_reference.into(),
            merchant_order_id: None,
            preference_id: None,
        }
    }

    pub fn with_preference(mut self, preference_id: impl Into<String>) -> Self {
        self.preference_id = Some(preference_id.into());
        self
    }

    pub fn with_merchant_order(mut self, merchant_order_id: impl Into<String>) -> Self {
        self.merchant_order_id = Some(merchant_order_id.into());
        self
    }

    /// Normalised status
    ///
    /// # Errors
    ///
    /// `UnknownStatus` carrying the raw value when the gateway used a word
    /// outside the mapping table
    pub fn normalized_status(&self) -> Result<PaymentStatus, BillingError> {
        normalize_status(&self.status).ok_or_else(|| BillingError::UnknownStatus {
            raw: self.status.clone(),
        })
    }

    /// Rejects events that cannot be applied to any hiring
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.payment_id.trim().is_empty() {
            return Err(BillingError::InvalidEvent("payment_id must not be blank".into()));
        }
        let has_reference = !self.external_reference.trim().is_empty()
            || self.preference_id.as_deref().is_some_and(|p| !p.trim().is_empty());
        if !has_reference {
            return Err(BillingError::InvalidEvent(
                "either external_reference or preference_id is required".into(),
            ));
        }
        Ok(())
    }
}

/// Maps a raw gateway status, case-insensitively
pub fn normalize_status(raw: &str) -> Option<PaymentStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "approved" | "accredited" => Some(PaymentStatus::Confirmed),
        "pending" | "in_process" | "authorized" | "in_mediation" => Some(PaymentStatus::Pending),
        "rejected" | "cancelled" => Some(PaymentStatus::Rejected),
        "refunded" | "charged_back" => Some(PaymentStatus::Reversed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mapping_table() {
        assert_eq!(normalize_status("approved"), Some(PaymentStatus::Confirmed));
        assert_eq!(normalize_status("accredited"), Some(PaymentStatus::Confirmed));
        assert_eq!(normalize_status("in_mediation"), Some(PaymentStatus::Pending));
        assert_eq!(normalize_status("cancelled"), Some(PaymentStatus::Rejected));
        assert_eq!(normalize_status("charged_back"), Some(PaymentStatus::Reversed));
        assert_eq!(normalize_status("paid"), None);
    }

    #[test]
    fn test_unknown_status_keeps_raw_value() {
        let event = PaymentWebhookEvent::new("p1", "Voided", "ref");
        match event.normalized_status() {
            Err(BillingError::UnknownStatus { raw }) => assert_eq!(raw, "Voided"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_event_needs_some_reference() {
        assert!(PaymentWebhookEvent::new("p1", "approved", " ").validate().is_err());
        assert!(PaymentWebhookEvent::new("p1", "approved", "")
            .with_preference("pref")
            .validate()
            .is_ok());
        assert!(PaymentWebhookEvent::new("", "approved", "ref").validate().is_err());
    }

    #[test]
    fn test_deserializes_minimal_payload() {
        let event: PaymentWebhookEvent = serde_json::from_str(
            r#"{"payment_id":"991","status":"approved","external_reference":"HIR-x"}"#,
        )
        .unwrap();
        assert!(event.preference_id.is_none());
        assert!(event.merchant_order_id.is_none());
    }

    proptest! {
        #[test]
        fn mapping_ignores_case(
            word in prop::sample::select(vec![
                "approved", "accredited", "pending", "in_process", "authorized",
                "in_mediation", "rejected", "cancelled", "refunded", "charged_back",
            ]),
            mask in any::<u16>(),
        ) {
            let mixed: String = word
                .chars()
                .enumerate()
                .map(|(i, c)| if mask & (1 << (i % 16)) != 0 { c.to_ascii_uppercase() } else { c })
                .collect();
            prop_assert_eq!(normalize_status(&mixed), normalize_status(word));
            prop_assert!(normalize_status(word).is_some());
        }
    }
}
