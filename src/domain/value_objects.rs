// Copyright 2025 Cowboy AI, LLC.

//! Value objects shared by the registry flows.
//!
//! Value Objects are immutable, compared by value, and updated by replacement.
//! - Money: amount in minor units with a currency whose exponent is the canonical scale
//! - Period: a registration period with an explicit unit

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency definition: ISO-4217 code with exponent for minor units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Currency {
    /// ISO-4217 code (e.g., "USD", "JPY")
    pub code: String,
    /// Minor unit exponent (e.g., 2 for cents, 0 for yen)
    pub exponent: u8,
}

impl Currency {
    /// Create a Currency definition
    pub fn new(code: impl Into<String>, exponent: u8) -> Self {
        Self {
            code: code.into(),
            exponent,
        }
    }

    /// US dollars
    pub fn usd() -> Self {
        Self::new("USD", 2)
    }

    /// Euros
    pub fn eur() -> Self {
        Self::new("EUR", 2)
    }

    /// Japanese yen
    pub fn jpy() -> Self {
        Self::new("JPY", 0)
    }

    fn factor(&self) -> i128 {
        10i128.pow(self.exponent as u32)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Why a decimal amount could not be turned into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyScaleError {
    /// More fractional digits than the currency allows
    TooManyFractionDigits {
        /// Scale of the supplied amount after trailing zeros are dropped
        scale: u32,
    },
    /// Amount does not fit the minor-unit representation
    Overflow,
}

/// Money as an immutable value object: amount in minor units + currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Money {
    /// Amount in minor units (e.g., cents)
    amount_minor: i128,
    currency: Currency,
}

impl Money {
    /// Create Money from a major unit amount (e.g., dollars) using currency exponent.
    pub fn from_major(major: i128, currency: Currency) -> Self {
        let factor = currency.factor();
        Self {
            amount_minor: major * factor,
            currency,
        }
    }

    /// Create Money from minor units directly.
    pub fn from_minor(minor: i128, currency: Currency) -> Self {
        Self {
            amount_minor: minor,
            currency,
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Create Money from a decimal amount without rounding.
    ///
    /// Trailing zeros are ignored, so `26.000` is accepted for a two-digit currency while
    /// `26.001` is not.
    pub fn from_decimal(amount: Decimal, currency: Currency) -> Result<Self, MoneyScaleError> {
        let normalized = amount.normalize();
        if normalized.scale() > currency.exponent as u32 {
            return Err(MoneyScaleError::TooManyFractionDigits {
                scale: normalized.scale(),
            });
        }
        // value = mantissa / 10^scale; shift the mantissa up to the currency exponent.
        let shift = currency.exponent as u32 - normalized.scale();
        let amount_minor = normalized
            .mantissa()
            .checked_mul(10i128.pow(shift))
            .ok_or(MoneyScaleError::Overflow)?;
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// Get currency
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Amount in minor units
    pub fn amount_minor(&self) -> i128 {
        self.amount_minor
    }

    /// Amount as a decimal at the currency's canonical scale.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.amount_minor, self.currency.exponent as u32)
    }

    /// Whether the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Multiply by a whole number of units (e.g., years).
    pub fn times(&self, units: u32) -> Money {
        Money {
            amount_minor: self.amount_minor * units as i128,
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    /// Renders as `USD 126.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency.code, self.to_decimal())
    }
}

/// Unit of a registration period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PeriodUnit {
    /// Years; the only unit accepted for domain creates
    Years,
    /// Months; wire-legal but rejected
    Months,
}

/// A registration period as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Period {
    /// Number of units
    pub value: u32,
    /// Unit of the value
    pub unit: PeriodUnit,
}

impl Period {
    /// A period in years
    pub fn years(value: u32) -> Self {
        Self {
            value,
            unit: PeriodUnit::Years,
        }
    }

    /// A period in months
    pub fn months(value: u32) -> Self {
        Self {
            value,
            unit: PeriodUnit::Months,
        }
    }
}
