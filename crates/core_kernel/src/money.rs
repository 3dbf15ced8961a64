//! Money types with precise decimal arithmetic
//!
//! Quoted prices, milestone prices and refund/payment obligations are all
//! expressed as [`Money`]. Amounts use rust_decimal so that summing
//! deliverable prices against a quoted total never drifts.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    ARS,
    BRL,
    CLP,
    COP,
    MXN,
    PEN,
    UYU,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::CLP => 0,
            _ => 2,
        }
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "US$",
            Currency::EUR => "€",
            Currency::ARS => "AR$",
            Currency::BRL => "R$",
            Currency::CLP => "CLP$",
            Currency::COP => "COL$",
            Currency::MXN => "MX$",
            Currency::PEN => "S/",
            Currency::UYU => "$U",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::ARS => "ARS",
            Currency::BRL => "BRL",
            Currency::CLP => "CLP",
            Currency::COP => "COP",
            Currency::MXN => "MXN",
            Currency::PEN => "PEN",
            Currency::UYU => "UYU",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "ARS" => Ok(Currency::ARS),
            "BRL" => Ok(Currency::BRL),
            "CLP" => Ok(Currency::CLP),
            "COP" => Ok(Currency::COP),
            "MXN" => Ok(Currency::MXN),
            "PEN" => Ok(Currency::PEN),
            "UYU" => Ok(Currency::UYU),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates Money from an integer amount in minor units (e.g., cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let divisor = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / divisor, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds to the currency's standard decimal places
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Sums a sequence of amounts that must all share `currency`
    pub fn sum<'a>(
        currency: Currency,
        items: impl IntoIterator<Item = &'a Money>,
    ) -> Result<Money, MoneyError> {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::ARS);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::ARS);
    }

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));

        let clp = Money::from_minor(10050, Currency::CLP);
        assert_eq!(clp.amount(), dec!(10050));
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let mxn = Money::new(dec!(100.00), Currency::MXN);

        let result = usd.checked_add(&mxn);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("brl".parse::<Currency>().unwrap(), Currency::BRL);
        assert!(matches!("XYZ".parse::<Currency>(), Err(MoneyError::UnknownCurrency(_))));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sum_matches_fold_of_checked_add(
            parts in proptest::collection::vec(1i64..10_000_000i64, 1..10)
        ) {
            let items: Vec<Money> = parts
                .iter()
                .map(|p| Money::from_minor(*p, Currency::USD))
                .collect();
            let expected: Decimal = items.iter().map(|m| m.amount()).sum();

            let total = Money::sum(Currency::USD, &items).unwrap();
            prop_assert_eq!(total.amount(), expected);
        }
    }
}
