// Copyright 2025 Cowboy AI, LLC.

//! Property tests for fee reconciliation and time-keyed schedules.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use registry_flows::commands::{DeclaredFee, FeeCreateExtension, FeeExtensionVersion};
use registry_flows::domain::{Currency, Money, TimedTransitions};
use registry_flows::fees::reconcile_fees;
use registry_flows::{CreatePrice, FeeCategory, FlowError};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn price(create_minor: i64, eap_minor: i64) -> CreatePrice {
    CreatePrice {
        create_cost: Money::from_minor(create_minor.into(), Currency::usd()),
        eap_fee: Money::from_minor(eap_minor.into(), Currency::usd()),
        eap_period_end: None,
        is_premium: false,
    }
}

fn extension(lines: &[(&str, i64)]) -> FeeCreateExtension {
    FeeCreateExtension::new(
        FeeExtensionVersion::V12,
        Some("USD"),
        lines
            .iter()
            .map(|(description, minor)| DeclaredFee::new(*description, Decimal::new(*minor, 2)))
            .collect(),
    )
}

/// Create cost split over two lines plus one EAP line, in any order
fn shuffled_lines() -> impl Strategy<Value = (i64, i64, Vec<(&'static str, i64)>)> {
    (1i64..100_000, 0i64..100_000, 1i64..100_000).prop_flat_map(|(create, split, eap)| {
        let split = split % create;
        let lines = vec![
            ("create", split),
            ("Create fee", create - split),
            ("Early Access Period", eap),
        ];
        (Just(create), Just(eap), Just(lines).prop_shuffle())
    })
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

proptest! {
    #[test]
    fn line_order_does_not_matter((create, eap, lines) in shuffled_lines()) {
        let result = reconcile_fees(&extension(&lines), &price(create, eap), &Currency::usd());
        prop_assert_eq!(result, Ok(()));
    }

    #[test]
    fn wrong_eap_amount_is_named(create in 1i64..100_000, eap in 1i64..100_000, delta in 1i64..1_000) {
        let lines = [("create", create), ("Early Access Period", eap + delta)];
        let result = reconcile_fees(&extension(&lines), &price(create, eap), &Currency::usd());
        prop_assert_eq!(
            result,
            Err(FlowError::FeesMismatch {
                expected: Money::from_minor(eap.into(), Currency::usd()),
                category: Some(FeeCategory::EarlyAccess),
            })
        );
    }

    #[test]
    fn single_category_checks_only_total(create in 1i64..100_000, delta in 1i64..1_000) {
        let lines = [("create", create + delta)];
        let result = reconcile_fees(&extension(&lines), &price(create, 0), &Currency::usd());
        prop_assert_eq!(
            result,
            Err(FlowError::FeesMismatch {
                expected: Money::from_minor(create.into(), Currency::usd()),
                category: None,
            })
        );
    }

    #[test]
    fn schedule_is_floor_lookup(
        entries in prop::collection::vec((0i64..10_000, any::<u32>()), 1..16),
        query in 0i64..12_000,
    ) {
        let schedule = TimedTransitions::new(entries.iter().map(|(secs, value)| (at(*secs), *value)));

        let mut latest: BTreeMap<i64, u32> = BTreeMap::new();
        for (secs, value) in &entries {
            latest.insert(*secs, *value);
        }
        let expected = latest.range(..=query).next_back().map(|(_, value)| *value);

        prop_assert_eq!(schedule.value_at(at(query)).copied(), expected);
        prop_assert_eq!(
            schedule.next_transition_after(at(query)),
            latest.range(query + 1..).next().map(|(secs, _)| at(*secs))
        );
    }
}
