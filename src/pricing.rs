// Copyright 2025 Cowboy AI, LLC.

//! Create pricing: standard or premium yearly cost times the period, plus the EAP fee in force.

use crate::domain::policy::TldPolicySnapshot;
use crate::domain::value_objects::Money;
use crate::fees::FeeCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Computed price of one create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePrice {
    /// Registration cost for the whole period
    pub create_cost: Money,
    /// EAP fee in force; zero outside EAP
    pub eap_fee: Money,
    /// When the current EAP fee stops applying
    pub eap_period_end: Option<DateTime<Utc>>,
    /// Whether the label is premium priced
    pub is_premium: bool,
}

impl CreatePrice {
    /// Create cost plus EAP fee
    pub fn total(&self) -> Money {
        Money::from_minor(
            self.create_cost.amount_minor() + self.eap_fee.amount_minor(),
            self.create_cost.currency().clone(),
        )
    }

    /// Fees a client must acknowledge, in checking order. EAP only appears while non-zero.
    pub fn expected_fees(&self) -> Vec<(FeeCategory, Money)> {
        let mut fees = vec![(FeeCategory::Create, self.create_cost.clone())];
        if !self.eap_fee.is_zero() {
            fees.push((FeeCategory::EarlyAccess, self.eap_fee.clone()));
        }
        fees
    }
}

/// Price a create of `label` for `years` at `now`.
pub fn price_create(
    tld: &TldPolicySnapshot,
    label: &str,
    years: u32,
    now: DateTime<Utc>,
) -> CreatePrice {
    let premium = tld.premium_price(label);
    let per_year = premium.unwrap_or(&tld.create_cost_per_year);
    CreatePrice {
        create_cost: per_year.times(years),
        eap_fee: tld.eap_fee_at(now),
        eap_period_end: tld.eap_fee_period_end(now),
        is_premium: premium.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::PremiumList;
    use crate::domain::schedule::TimedTransitions;
    use crate::domain::value_objects::Currency;
    use chrono::Duration;

    fn usd(major: i128) -> Money {
        Money::from_major(major, Currency::usd())
    }

    #[test]
    fn test_standard_price_scales_with_years() {
        let tld = TldPolicySnapshot::new("tld");
        let price = price_create(&tld, "example", 2, Utc::now());
        assert_eq!(price.create_cost, usd(26));
        assert!(price.eap_fee.is_zero());
        assert!(!price.is_premium);
        assert_eq!(price.expected_fees(), vec![(FeeCategory::Create, usd(26))]);
    }

    #[test]
    fn test_premium_price() {
        let tld = TldPolicySnapshot::new("example")
            .with_premium_list(PremiumList::new([("rich".to_string(), usd(100))]));
        let price = price_create(&tld, "rich", 2, Utc::now());
        assert_eq!(price.create_cost, usd(200));
        assert!(price.is_premium);
    }

    #[test]
    fn test_eap_window() {
        let now = Utc::now();
        let tld = TldPolicySnapshot::new("tld").with_eap_fee_schedule(TimedTransitions::new(vec![
            (DateTime::<Utc>::MIN_UTC, usd(0)),
            (now - Duration::days(1), usd(100)),
            (now + Duration::days(1), usd(0)),
        ]));
        let price = price_create(&tld, "example", 2, now);
        assert_eq!(price.eap_fee, usd(100));
        assert_eq!(price.eap_period_end, Some(now + Duration::days(1)));
        assert_eq!(price.total(), usd(126));
        assert_eq!(
            price.expected_fees(),
            vec![
                (FeeCategory::Create, usd(26)),
                (FeeCategory::EarlyAccess, usd(100))
            ]
        );

        let after = price_create(&tld, "example", 2, now + Duration::days(2));
        assert!(after.eap_fee.is_zero());
    }
}
