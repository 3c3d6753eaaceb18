// Copyright 2025 Cowboy AI, LLC.

//! Signed marks and trademark claims.
//!
//! The mark and claims data sets live outside the registry. [`TrademarkValidator`] is the read
//! contract the flow uses against them; the checks on top of it (label matching, validity
//! windows, claims-notice timing and TCN checksums) are here.

use crate::commands::ClaimsNotice;
use crate::errors::{FlowError, FlowResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Length of a TCN id: 8 hex checksum digits followed by 19 decimal digits
pub const TCN_ID_LENGTH: usize = 27;
const TCN_CHECKSUM_LENGTH: usize = 8;

/// A decoded, signature-checked signed mark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMarkData {
    /// Signed mark id
    pub id: String,
    /// Labels the mark covers
    pub labels: BTreeSet<String>,
    /// Start of validity
    pub not_before: DateTime<Utc>,
    /// End of validity
    pub not_after: DateTime<Utc>,
}

/// Read access to the trademark clearinghouse data
#[cfg_attr(test, mockall::automock)]
pub trait TrademarkValidator: Send + Sync {
    /// Claims key for a label on the current claims list
    fn claims_key(&self, label: &str) -> Option<String>;

    /// Decode an encoded signed mark and verify its signature
    fn decode_signed_mark(&self, encoded: &str) -> FlowResult<SignedMarkData>;
}

/// Validator over fixed in-memory data
#[derive(Debug, Clone, Default)]
pub struct InMemoryTrademarkValidator {
    claims: HashMap<String, String>,
    marks: HashMap<String, SignedMarkData>,
}

impl InMemoryTrademarkValidator {
    /// An empty data set
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a label on the claims list
    pub fn with_claim(mut self, label: impl Into<String>, key: impl Into<String>) -> Self {
        self.claims.insert(label.into(), key.into());
        self
    }

    /// Register the decoded form of an encoded mark
    pub fn with_signed_mark(mut self, encoded: impl Into<String>, mark: SignedMarkData) -> Self {
        self.marks.insert(encoded.into(), mark);
        self
    }
}

impl TrademarkValidator for InMemoryTrademarkValidator {
    fn claims_key(&self, label: &str) -> Option<String> {
        self.claims.get(label).cloned()
    }

    fn decode_signed_mark(&self, encoded: &str) -> FlowResult<SignedMarkData> {
        self.marks
            .get(encoded)
            .cloned()
            .ok_or(FlowError::SignedMarkInvalid)
    }
}

/// Check the signed marks on a create and return the one in use.
///
/// At most one mark; it must cover `label` and be valid at `now` (`not_after` is exclusive).
pub fn verify_signed_marks(
    validator: &dyn TrademarkValidator,
    encoded_marks: &[String],
    label: &str,
    now: DateTime<Utc>,
) -> FlowResult<Option<SignedMarkData>> {
    let encoded = match encoded_marks {
        [] => return Ok(None),
        [single] => single,
        _ => return Err(FlowError::TooManySignedMarks),
    };
    let mark = validator.decode_signed_mark(encoded)?;
    if !mark.labels.contains(label) {
        return Err(FlowError::NoMarksFoundMatchingDomain);
    }
    if now < mark.not_before {
        return Err(FlowError::FoundMarkNotYetValid);
    }
    if now >= mark.not_after {
        return Err(FlowError::FoundMarkExpired);
    }
    Ok(Some(mark))
}

/// Rules a claims notice is checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsNoticeRules<'a> {
    /// Accepted validator id
    pub validator_id: &'a str,
    /// How long ago the notice may have been accepted
    pub acceptance_window: Duration,
    /// Skip the expiry and acceptance-window checks
    pub ignore_timing: bool,
}

/// Check a claims notice for `label`: validator, timing, then TCN id format and checksum.
pub fn verify_claims_notice(
    notice: &ClaimsNotice,
    label: &str,
    rules: &ClaimsNoticeRules<'_>,
    now: DateTime<Utc>,
) -> FlowResult<()> {
    if notice.validator_id != rules.validator_id {
        return Err(FlowError::InvalidTrademarkValidator {
            expected: rules.validator_id.to_string(),
        });
    }
    if !rules.ignore_timing {
        if notice.expiration_time < now {
            return Err(FlowError::ExpiredClaim);
        }
        if notice.accepted_time < now - rules.acceptance_window {
            return Err(FlowError::AcceptedTooLongAgo);
        }
    }
    verify_tcn_id(&notice.notice_id, label, notice.expiration_time)
}

/// Check a TCN id's shape and CRC-32 checksum.
///
/// The checksum covers `label`, the notice expiration in epoch seconds and the 19-digit tail.
pub fn verify_tcn_id(tcn_id: &str, label: &str, expiration: DateTime<Utc>) -> FlowResult<()> {
    if tcn_id.len() != TCN_ID_LENGTH || !tcn_id.is_ascii() {
        return Err(FlowError::MalformedTcnId);
    }
    let (checksum, serial) = tcn_id.split_at(TCN_CHECKSUM_LENGTH);
    if !serial.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FlowError::MalformedTcnId);
    }
    let checksum = u32::from_str_radix(checksum, 16).map_err(|_| FlowError::MalformedTcnId)?;
    if checksum != tcn_checksum(label, expiration, serial) {
        return Err(FlowError::InvalidTcnIdChecksum);
    }
    Ok(())
}

/// Build a TCN id for a label, expiration and 19-digit serial
pub fn tcn_id(label: &str, expiration: DateTime<Utc>, serial: &str) -> String {
    format!("{:08x}{serial}", tcn_checksum(label, expiration, serial))
}

fn tcn_checksum(label: &str, expiration: DateTime<Utc>, serial: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(label.as_bytes());
    hasher.update(expiration.timestamp().to_string().as_bytes());
    hasher.update(serial.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const VALID_TCN: &str = "370d0b7c9223372036854775807";

    fn expiration() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2010, 8, 16, 9, 0, 0).unwrap()
    }

    fn notice(accepted: DateTime<Utc>) -> ClaimsNotice {
        ClaimsNotice {
            notice_id: VALID_TCN.into(),
            validator_id: "tmch".into(),
            expiration_time: expiration(),
            accepted_time: accepted,
        }
    }

    fn rules() -> ClaimsNoticeRules<'static> {
        ClaimsNoticeRules {
            validator_id: "tmch",
            acceptance_window: Duration::hours(48),
            ignore_timing: false,
        }
    }

    #[test]
    fn test_known_tcn_checksum() {
        assert!(verify_tcn_id(VALID_TCN, "example-one", expiration()).is_ok());
        assert_eq!(
            tcn_id("example-one", expiration(), "9223372036854775807"),
            VALID_TCN
        );
        assert_eq!(
            verify_tcn_id(VALID_TCN, "example-two", expiration()),
            Err(FlowError::InvalidTcnIdChecksum)
        );
    }

    #[test]
    fn test_malformed_tcn_ids() {
        for bad in [
            "370d0b7c922337203685477580",
            "zzzzzzzz9223372036854775807",
            "370d0b7c92233720368547758x7",
        ] {
            assert_eq!(
                verify_tcn_id(bad, "example-one", expiration()),
                Err(FlowError::MalformedTcnId),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_claims_notice_timing() {
        let now = Utc.with_ymd_and_hms(2009, 8, 16, 9, 0, 0).unwrap();
        assert!(verify_claims_notice(&notice(now), "example-one", &rules(), now).is_ok());

        let stale = notice(now - Duration::hours(49));
        assert_eq!(
            verify_claims_notice(&stale, "example-one", &rules(), now),
            Err(FlowError::AcceptedTooLongAgo)
        );

        let later = expiration() + Duration::days(1);
        assert_eq!(
            verify_claims_notice(&notice(later), "example-one", &rules(), later),
            Err(FlowError::ExpiredClaim)
        );

        let lenient = ClaimsNoticeRules {
            ignore_timing: true,
            ..rules()
        };
        assert!(verify_claims_notice(&stale, "example-one", &lenient, now).is_ok());
    }

    #[test]
    fn test_claims_notice_validator() {
        let now = Utc.with_ymd_and_hms(2009, 8, 16, 9, 0, 0).unwrap();
        let mut other = notice(now);
        other.validator_id = "other".into();
        assert_eq!(
            verify_claims_notice(&other, "example-one", &rules(), now),
            Err(FlowError::InvalidTrademarkValidator {
                expected: "tmch".into()
            })
        );
    }

    #[test]
    fn test_signed_mark_checks() {
        let not_before = Utc.with_ymd_and_hms(2013, 8, 9, 0, 0, 0).unwrap();
        let not_after = Utc.with_ymd_and_hms(2017, 7, 23, 0, 0, 0).unwrap();
        let validator = InMemoryTrademarkValidator::new().with_signed_mark(
            "smd",
            SignedMarkData {
                id: "0000001761376042759136-65535".into(),
                labels: BTreeSet::from(["test-validate".to_string()]),
                not_before,
                not_after,
            },
        );
        let marks = vec!["smd".to_string()];
        let inside = Utc.with_ymd_and_hms(2014, 9, 9, 9, 9, 9).unwrap();

        assert!(verify_signed_marks(&validator, &[], "x", inside)
            .unwrap()
            .is_none());
        assert_eq!(
            verify_signed_marks(&validator, &marks, "test-validate", inside)
                .unwrap()
                .map(|m| m.id),
            Some("0000001761376042759136-65535".to_string())
        );
        assert_eq!(
            verify_signed_marks(&validator, &marks, "other", inside),
            Err(FlowError::NoMarksFoundMatchingDomain)
        );
        assert_eq!(
            verify_signed_marks(&validator, &marks, "test-validate", not_before - Duration::days(1)),
            Err(FlowError::FoundMarkNotYetValid)
        );
        assert_eq!(
            verify_signed_marks(&validator, &marks, "test-validate", not_after),
            Err(FlowError::FoundMarkExpired)
        );
        assert_eq!(
            verify_signed_marks(&validator, &[marks[0].clone(), marks[0].clone()], "x", inside),
            Err(FlowError::TooManySignedMarks)
        );
        assert_eq!(
            verify_signed_marks(&validator, &["garbage".to_string()], "x", inside),
            Err(FlowError::SignedMarkInvalid)
        );
    }

    #[test]
    fn test_mocked_validator_is_consulted_once() {
        let mut validator = MockTrademarkValidator::new();
        validator
            .expect_decode_signed_mark()
            .times(1)
            .returning(|_| Err(FlowError::SignedMarkInvalid));
        assert_eq!(
            verify_signed_marks(&validator, &["smd".to_string()], "x", Utc::now()),
            Err(FlowError::SignedMarkInvalid)
        );
    }
}
