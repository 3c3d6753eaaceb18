// Copyright 2025 Cowboy AI, LLC.

//! Fee reconciliation
//!
//! Matches the fee lines a client declared against the computed price. Lines are classified by
//! description, summed per category, and compared exactly in minor units of the TLD currency.

use crate::commands::{DeclaredFee, FeeCreateExtension};
use crate::domain::value_objects::{Currency, Money, MoneyScaleError};
use crate::errors::{FlowError, FlowResult};
use crate::pricing::CreatePrice;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const DEFAULT_GRACE_PERIOD: &str = "P0D";
const DEFAULT_APPLIED: &str = "immediate";

/// Fee categories a description can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeCategory {
    /// Create fee
    Create,
    /// Renew fee
    Renew,
    /// Transfer fee
    Transfer,
    /// Restore fee
    Restore,
    /// Early access program fee
    EarlyAccess,
}

impl FeeCategory {
    /// Every category, in matching order
    pub const ALL: [FeeCategory; 5] = [
        FeeCategory::Create,
        FeeCategory::Renew,
        FeeCategory::Transfer,
        FeeCategory::Restore,
        FeeCategory::EarlyAccess,
    ];

    /// Upper-case name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            FeeCategory::Create => "CREATE",
            FeeCategory::Renew => "RENEW",
            FeeCategory::Transfer => "TRANSFER",
            FeeCategory::Restore => "RESTORE",
            FeeCategory::EarlyAccess => "EARLY_ACCESS",
        }
    }

    /// Lower-case phrase a description must contain
    pub fn keyword(&self) -> &'static str {
        match self {
            FeeCategory::Create => "create",
            FeeCategory::Renew => "renew",
            FeeCategory::Transfer => "transfer",
            FeeCategory::Restore => "restore",
            FeeCategory::EarlyAccess => "early access period",
        }
    }

    /// Classify a free-text description; exactly one category must match.
    pub fn parse_description(description: &str) -> FlowResult<FeeCategory> {
        let lowered = description.to_lowercase();
        let matches: Vec<FeeCategory> = Self::ALL
            .into_iter()
            .filter(|category| lowered.contains(category.keyword()))
            .collect();
        match matches.as_slice() {
            [single] => Ok(*single),
            [] => Err(FlowError::FeeDescriptionParse {
                description: description.to_string(),
            }),
            _ => Err(FlowError::FeeDescriptionMultipleMatches {
                description: description.to_string(),
                categories: matches,
            }),
        }
    }
}

/// A fee extension is mandatory while an EAP fee is in force.
pub fn require_fee_acknowledgement(
    extension: Option<&FeeCreateExtension>,
    price: &CreatePrice,
) -> FlowResult<()> {
    if extension.is_none() && !price.eap_fee.is_zero() {
        return Err(FlowError::FeesRequiredDuringEarlyAccessProgram {
            eap_fee: price.eap_fee.clone(),
        });
    }
    Ok(())
}

/// Check declared fees against the computed price.
///
/// Order: attributes, credits, currency, scale, per-category sums (only when more than one
/// category is expected), then the total.
pub fn reconcile_fees(
    extension: &FeeCreateExtension,
    price: &CreatePrice,
    tld_currency: &Currency,
) -> FlowResult<()> {
    for fee in &extension.fees {
        check_default_attributes(fee)?;
    }
    if !extension.credits.is_empty() {
        return Err(FlowError::UnsupportedFeeAttribute { attribute: "credit" });
    }
    if let Some(declared) = &extension.currency {
        if declared != &tld_currency.code {
            return Err(FlowError::CurrencyUnitMismatch {
                expected: tld_currency.code.clone(),
                actual: declared.clone(),
            });
        }
    }

    let mut declared_by_category: IndexMap<FeeCategory, i128> = IndexMap::new();
    let mut declared_total: i128 = 0;
    for fee in &extension.fees {
        let amount = Money::from_decimal(fee.amount, tld_currency.clone()).map_err(|err| {
            match err {
                MoneyScaleError::TooManyFractionDigits { scale } => FlowError::CurrencyValueScale {
                    currency: tld_currency.code.clone(),
                    scale,
                },
                MoneyScaleError::Overflow => FlowError::CurrencyValueScale {
                    currency: tld_currency.code.clone(),
                    scale: fee.amount.scale(),
                },
            }
        })?;
        let category = FeeCategory::parse_description(&fee.description)?;
        *declared_by_category.entry(category).or_insert(0) += amount.amount_minor();
        declared_total += amount.amount_minor();
    }

    let expected = price.expected_fees();
    if expected.len() > 1 {
        for (category, amount) in &expected {
            let declared = declared_by_category.get(category).copied().unwrap_or(0);
            if declared != amount.amount_minor() {
                return Err(FlowError::FeesMismatch {
                    expected: amount.clone(),
                    category: Some(*category),
                });
            }
        }
    }

    let total = price.total();
    if declared_total != total.amount_minor() {
        return Err(FlowError::FeesMismatch {
            expected: total,
            category: None,
        });
    }
    Ok(())
}

fn check_default_attributes(fee: &DeclaredFee) -> FlowResult<()> {
    if fee.refundable == Some(false) {
        return Err(FlowError::UnsupportedFeeAttribute {
            attribute: "refundable",
        });
    }
    if fee
        .grace_period
        .as_deref()
        .is_some_and(|period| period != DEFAULT_GRACE_PERIOD)
    {
        return Err(FlowError::UnsupportedFeeAttribute {
            attribute: "grace-period",
        });
    }
    if fee
        .applied
        .as_deref()
        .is_some_and(|applied| applied != DEFAULT_APPLIED)
    {
        return Err(FlowError::UnsupportedFeeAttribute {
            attribute: "applied",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::FeeExtensionVersion;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use test_case::test_case;

    fn usd(major: i128) -> Money {
        Money::from_major(major, Currency::usd())
    }

    fn price(create: i128, eap: i128) -> CreatePrice {
        CreatePrice {
            create_cost: usd(create),
            eap_fee: usd(eap),
            eap_period_end: None,
            is_premium: false,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn extension(lines: &[(&str, &str)]) -> FeeCreateExtension {
        FeeCreateExtension::new(
            FeeExtensionVersion::V06,
            Some("USD"),
            lines
                .iter()
                .map(|(description, amount)| DeclaredFee::new(*description, dec(amount)))
                .collect(),
        )
    }

    #[test_case("create", FeeCategory::Create ; "plain")]
    #[test_case("CREATE", FeeCategory::Create ; "upper case")]
    #[test_case("Early Access Period, fee expires: 2022-03-01T00:00:00.000Z", FeeCategory::EarlyAccess ; "eap")]
    #[test_case("renew", FeeCategory::Renew ; "renew")]
    fn test_description_parsing(description: &str, expected: FeeCategory) {
        assert_eq!(FeeCategory::parse_description(description), Ok(expected));
    }

    #[test]
    fn test_description_errors() {
        assert_eq!(
            FeeCategory::parse_description("scary fee"),
            Err(FlowError::FeeDescriptionParse {
                description: "scary fee".into()
            })
        );
        assert_eq!(
            FeeCategory::parse_description("renew transfer"),
            Err(FlowError::FeeDescriptionMultipleMatches {
                description: "renew transfer".into(),
                categories: vec![FeeCategory::Renew, FeeCategory::Transfer],
            })
        );
    }

    #[test]
    fn test_exact_total_passes() {
        let usd_tld = Currency::usd();
        assert!(reconcile_fees(&extension(&[("create", "26.00")]), &price(26, 0), &usd_tld).is_ok());
        assert!(reconcile_fees(&extension(&[("create", "26")]), &price(26, 0), &usd_tld).is_ok());
    }

    #[test]
    fn test_eap_lines_summed_and_checked_per_category() {
        let ext = extension(&[
            ("create", "26.00"),
            ("Early Access Period", "50.00"),
            ("Early Access Period", "50.00"),
        ]);
        assert!(reconcile_fees(&ext, &price(26, 100), &Currency::usd()).is_ok());

        let shifted = extension(&[("create", "76.00"), ("Early Access Period", "50.00")]);
        assert_eq!(
            reconcile_fees(&shifted, &price(26, 100), &Currency::usd()),
            Err(FlowError::FeesMismatch {
                expected: usd(26),
                category: Some(FeeCategory::Create)
            })
        );
    }

    #[test]
    fn test_per_category_checked_before_total() {
        let ext = extension(&[("create", "26.00"), ("Early Access Period", "155.00")]);
        assert_eq!(
            reconcile_fees(&ext, &price(26, 100), &Currency::usd()),
            Err(FlowError::FeesMismatch {
                expected: usd(100),
                category: Some(FeeCategory::EarlyAccess)
            })
        );
    }

    #[test]
    fn test_unexpected_category_fails_the_total() {
        let ext = extension(&[
            ("create", "26"),
            ("Early Access Period", "100"),
            ("renew", "55"),
        ]);
        let err = reconcile_fees(&ext, &price(26, 100), &Currency::usd()).unwrap_err();
        assert_eq!(
            err,
            FlowError::FeesMismatch {
                expected: usd(126),
                category: None
            }
        );
        assert!(err.to_string().contains("expected total of USD 126.00"));
    }

    #[test]
    fn test_currency_and_scale() {
        let mut ext = extension(&[("create", "26.00")]);
        ext.currency = Some("EUR".into());
        assert_eq!(
            reconcile_fees(&ext, &price(26, 0), &Currency::usd()),
            Err(FlowError::CurrencyUnitMismatch {
                expected: "USD".into(),
                actual: "EUR".into()
            })
        );

        ext.currency = None;
        assert!(reconcile_fees(&ext, &price(26, 0), &Currency::usd()).is_ok());

        let precise = extension(&[("create", "26.001")]);
        assert_eq!(
            reconcile_fees(&precise, &price(26, 0), &Currency::usd()),
            Err(FlowError::CurrencyValueScale {
                currency: "USD".into(),
                scale: 3
            })
        );
    }

    #[test]
    fn test_attributes() {
        let mut fee = DeclaredFee::new("create", dec("26.00"));
        fee.refundable = Some(true);
        fee.grace_period = Some("P0D".into());
        fee.applied = Some("immediate".into());
        let ok = FeeCreateExtension::new(FeeExtensionVersion::V12, Some("USD"), vec![fee.clone()]);
        assert!(reconcile_fees(&ok, &price(26, 0), &Currency::usd()).is_ok());

        let cases: [(&'static str, fn(&mut DeclaredFee)); 3] = [
            ("refundable", |f| f.refundable = Some(false)),
            ("grace-period", |f| f.grace_period = Some("P5D".into())),
            ("applied", |f| f.applied = Some("delayed".into())),
        ];
        for (attribute, mutate) in cases {
            let mut bad = fee.clone();
            mutate(&mut bad);
            let ext = FeeCreateExtension::new(FeeExtensionVersion::V11, Some("USD"), vec![bad]);
            assert_eq!(
                reconcile_fees(&ext, &price(26, 0), &Currency::usd()),
                Err(FlowError::UnsupportedFeeAttribute { attribute })
            );
        }
    }

    #[test]
    fn test_eap_requires_extension() {
        assert_eq!(
            require_fee_acknowledgement(None, &price(26, 100)),
            Err(FlowError::FeesRequiredDuringEarlyAccessProgram { eap_fee: usd(100) })
        );
        assert!(require_fee_acknowledgement(None, &price(26, 0)).is_ok());
    }
}
