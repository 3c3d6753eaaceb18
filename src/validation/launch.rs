// Copyright 2025 Cowboy AI, LLC.

//! Signed marks and claims notices.

use super::{CreateInput, Findings, Target};
use crate::domain::resources::LaunchNotice;
use crate::errors::{FlowError, FlowResult};
use crate::trademark::{verify_claims_notice, verify_signed_marks, ClaimsNoticeRules};

pub(super) fn check_marks_and_claims(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    findings: &mut Findings,
) -> FlowResult<()> {
    let superuser = input.is_superuser();
    let label = target.name.label();

    if let Some(launch) = &input.command.extensions.launch {
        if !launch.code_marks.is_empty() {
            return Err(FlowError::UnsupportedMarkType);
        }
    }
    let marks = input.command.signed_marks();
    if !marks.is_empty() && !superuser && !target.phase.is_sunrise() {
        return Err(FlowError::SignedMarksOnlyDuringSunrise);
    }
    findings.signed_mark = verify_signed_marks(input.trademark, marks, label, input.now)?;

    let notice = input.command.claims_notice();
    if let Some(notice) = notice {
        let rules = ClaimsNoticeRules {
            validator_id: &input.config.trademark_validator_id,
            acceptance_window: input.config.claims_acceptance_window(),
            ignore_timing: superuser,
        };
        verify_claims_notice(notice, label, &rules, input.now)?;
        findings.launch_notice = Some(LaunchNotice {
            notice_id: notice.notice_id.clone(),
            validator_id: notice.validator_id.clone(),
            expiration_time: notice.expiration_time,
            accepted_time: notice.accepted_time,
        });
    }

    if superuser {
        return Ok(());
    }
    let claims_open = input.now < target.tld.claims_period_end;
    if notice.is_some() && !claims_open {
        return Err(FlowError::ClaimsPeriodEnded);
    }
    if claims_open && findings.signed_mark.is_none() {
        let on_claims_list = input.trademark.claims_key(label).is_some();
        match (on_claims_list, notice.is_some()) {
            (true, false) => {
                return Err(FlowError::MissingClaimsNotice {
                    name: target.fqdn(),
                })
            }
            (false, true) => {
                return Err(FlowError::UnexpectedClaimsNotice {
                    name: target.fqdn(),
                })
            }
            _ => {}
        }
    }
    Ok(())
}
