//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful failure
//! messages than a bare `assert_eq!`.

use std::fmt::Debug;

use rust_decimal::Decimal;

use core_kernel::{Classify, ErrorKind, Money};
use domain_claims::ClaimCompliance;
use domain_hiring::{Hiring, HiringStatus};

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts the hiring is in the expected lifecycle state
pub fn assert_hiring_status(hiring: &Hiring, expected: HiringStatus) {
    assert_eq!(
        hiring.status, expected,
        "Hiring {} is {}, expected {}",
        hiring.id, hiring.status, expected
    );
}

/// Asserts that a result failed with the given error kind
///
/// # Panics
///
/// Panics when the result is `Ok` or fails with another kind
pub fn assert_error_kind<T: Debug, E: Classify + Debug>(result: &Result<T, E>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected {} error, got Ok({:?})", expected.as_str(), value),
        Err(e) => assert_eq!(
            e.kind(),
            expected,
            "Expected {} error, got {} ({:?})",
            expected.as_str(),
            e.kind().as_str(),
            e
        ),
    }
}

/// Asserts that submission attempts run 1, 2, 3... in order
pub fn assert_attempts_contiguous(compliance: &ClaimCompliance) {
    for (index, submission) in compliance.submissions.iter().enumerate() {
        assert_eq!(
            submission.attempt_number,
            index as u32 + 1,
            "Compliance {} has attempt {} at position {}",
            compliance.id,
            submission.attempt_number,
            index
        );
    }
}

/// Asserts that the current quotation pointer matches at most one history entry
pub fn assert_single_current_quotation(hiring: &Hiring) {
    let current: Vec<_> = hiring
        .quotations
        .iter()
        .filter(|q| Some(q.id) == hiring.current_quotation_id)
        .collect();
    assert!(
        current.len() <= 1,
        "Hiring {} points at {} current quotations",
        hiring.id,
        current.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::HiringBuilder;
    use core_kernel::{CoreError, Currency};
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_approx_eq() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(100.01), Currency::USD);
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "Currency mismatch")]
    fn test_money_approx_eq_rejects_currency_mismatch() {
        let a = Money::new(dec!(100), Currency::USD);
        let b = Money::new(dec!(100), Currency::BRL);
        assert_money_approx_eq(&a, &b, dec!(1));
    }

    #[test]
    fn test_error_kind_matches() {
        let result: Result<(), CoreError> = Err(CoreError::configuration("bad"));
        let kind = result.as_ref().unwrap_err().kind();
        assert_error_kind(&result, kind);
    }

    #[test]
    #[should_panic(expected = "got Ok")]
    fn test_error_kind_fails_on_ok() {
        let result: Result<u8, CoreError> = Ok(1);
        assert_error_kind(&result, ErrorKind::Validation);
    }

    #[test]
    fn test_hiring_status_assert() {
        let hiring = HiringBuilder::new().quoted().build();
        assert_hiring_status(&hiring, HiringStatus::Quoted);
        assert_single_current_quotation(&hiring);
    }
}
