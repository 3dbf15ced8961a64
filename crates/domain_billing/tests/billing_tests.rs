//! Gateway vocabulary and audit record tests for domain_billing
//!
//! Reconciler behaviour against the hiring store is covered by the unit
//! tests in `reconciler.rs` and the scenario suite in `test_utils`.

use chrono::{TimeZone, Utc};
use core_kernel::{Classify, ErrorKind, HiringId};

use domain_billing::{normalize_status, BillingError, PaymentAuditRecord, PaymentWebhookEvent};
use domain_hiring::PaymentStatus;

// ============================================================================
// Status mapping
// ============================================================================

mod status_mapping {
    use super::*;

    #[test]
    fn test_every_confirmed_alias() {
        for raw in ["approved", "Approved", " accredited "] {
            assert_eq!(normalize_status(raw), Some(PaymentStatus::Confirmed), "{raw}");
        }
    }

    #[test]
    fn test_pending_aliases_do_not_confirm() {
        for raw in ["pending", "in_process", "authorized", "in_mediation"] {
            assert_eq!(normalize_status(raw), Some(PaymentStatus::Pending), "{raw}");
        }
    }

    #[test]
    fn test_reversal_aliases() {
        assert_eq!(normalize_status("refunded"), Some(PaymentStatus::Reversed));
        assert_eq!(normalize_status("CHARGED_BACK"), Some(PaymentStatus::Reversed));
    }

    #[test]
    fn test_unknown_status_is_validation() {
        let err = PaymentWebhookEvent::new("1", "expired", "ref")
            .normalized_status()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("expired"));
    }
}

// ============================================================================
// Audit records
// ============================================================================

mod audit_records {
    use super::*;

    #[test]
    fn test_record_copies_gateway_fields() {
        let event = PaymentWebhookEvent::new("pay-77", "approved", "HIR-ref")
            .with_preference("pref-77")
            .with_merchant_order("mo-1");
        let hiring_id = HiringId::new();
        let at = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();

        let record = PaymentAuditRecord::from_event(&event, Some(hiring_id), "applied", at);

        assert_eq!(record.hiring_id, Some(hiring_id));
        assert_eq!(record.payment_id, "pay-77");
        assert_eq!(record.raw_status, "approved");
        assert_eq!(record.preference_id.as_deref(), Some("pref-77"));
        assert_eq!(record.merchant_order_id.as_deref(), Some("mo-1"));
        assert_eq!(record.outcome, "applied");
        assert_eq!(record.received_at, at);
    }

    #[test]
    fn test_records_get_distinct_ids() {
        let event = PaymentWebhookEvent::new("pay-1", "pending", "ref");
        let a = PaymentAuditRecord::from_event(&event, None, "not_found", Utc::now());
        let b = PaymentAuditRecord::from_event(&event, None, "not_found", Utc::now());
        assert_ne!(a.id, b.id);
    }
}

// ============================================================================
// Error classification
// ============================================================================

#[test]
fn test_not_found_reference_is_reported() {
    let err = BillingError::HiringNotFound {
        reference: "pref-x".into(),
    };
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("pref-x"));
}
