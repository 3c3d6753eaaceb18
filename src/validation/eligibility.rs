// Copyright 2025 Cowboy AI, LLC.

//! Whether this registrar may create this name now: existence, phase, tokens, premium names,
//! registrar standing and the registration period.

use super::{has_bound_token, AnchorSource, CreateInput, Findings, Target};
use crate::domain::policy::{ReservationType, TldPhase};
use crate::domain::token::validate_token;
use crate::domain::value_objects::PeriodUnit;
use crate::errors::{FlowError, FlowResult};

pub(super) fn check_not_taken(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let loaded = input.loaded;
    if loaded
        .existing_domain
        .as_ref()
        .is_some_and(|domain| domain.is_active_at(input.now))
    {
        return Err(FlowError::ResourceAlreadyExists { id: target.fqdn() });
    }
    if !input.is_superuser()
        && loaded
            .open_application
            .as_ref()
            .is_some_and(|application| !application.rejected)
    {
        return Err(FlowError::DomainHasOpenApplications);
    }
    Ok(())
}

/// Outside general availability only anchor tenants, token-holders for specific-use names and
/// start-date sunrise creates with a signed mark get through.
pub(super) fn check_phase(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let reserved_create = target.is_reserved_as(ReservationType::ReservedForSpecificUse)
        && has_bound_token(input, &target.fqdn());
    if input.is_superuser() || target.anchor.is_some() || reserved_create {
        return Ok(());
    }
    match target.phase {
        TldPhase::GeneralAvailability => Ok(()),
        TldPhase::StartDateSunrise if input.command.signed_marks().is_empty() => {
            Err(FlowError::MustHaveSignedMarksInCurrentPhase)
        }
        TldPhase::StartDateSunrise => Ok(()),
        _ => Err(FlowError::NoGeneralRegistrationsInCurrentPhase),
    }
}

pub(super) fn check_allocation_token(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    findings: &mut Findings,
) -> FlowResult<()> {
    let Some(supplied) = &input.command.extensions.allocation_token else {
        return Ok(());
    };
    let token = validate_token(
        supplied,
        input.loaded.extension_token.as_ref(),
        &target.fqdn(),
    )?;
    findings.token_to_redeem = Some(token.token.clone());
    Ok(())
}

pub(super) fn check_premium(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    if target.tld.premium_price(target.name.label()).is_none() {
        return Ok(());
    }
    let registrar_requires_ack = input
        .registrar
        .is_some_and(|registrar| registrar.premium_price_ack_required);
    if input.command.extensions.fee.is_none()
        && (target.tld.premium_price_ack_required || registrar_requires_ack)
    {
        return Err(FlowError::FeesRequiredForPremiumName);
    }
    if !input.is_superuser()
        && input
            .registrar
            .is_some_and(|registrar| registrar.block_premium_names)
    {
        return Err(FlowError::PremiumNameBlocked);
    }
    Ok(())
}

pub(super) fn check_registrar(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let registrar = input
        .registrar
        .ok_or_else(|| FlowError::RegistrarNotFound {
            registrar: input.session.registrar_id.clone(),
        })?;
    if !registrar.is_active() {
        return Err(FlowError::RegistrarMustBeActiveToCreateDomains);
    }
    if !input.is_superuser() && !registrar.is_allowed_on(&target.tld.name) {
        return Err(FlowError::NotAuthorizedForTld {
            tld: target.tld.name.clone(),
        });
    }
    Ok(())
}

pub(super) fn check_period(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    if input
        .command
        .period
        .is_some_and(|period| period.unit != PeriodUnit::Years)
    {
        return Err(FlowError::BadPeriodUnit);
    }
    if target.years == 0 {
        return Err(FlowError::InvalidPeriodValue);
    }
    let max = target
        .tld
        .registration_year_cap(input.config.max_registration_years);
    if target.years > max {
        return Err(FlowError::ExceedsMaxRegistrationYears { max });
    }
    Ok(())
}

pub(super) fn check_anchor_period(
    input: &CreateInput<'_>,
    target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let required = input.config.anchor_tenant_period_years;
    match target.anchor {
        Some(AnchorSource::AllocationToken | AnchorSource::AuthCode) if target.years != required => {
            Err(FlowError::AnchorTenantCreatePeriod { years: required })
        }
        _ => Ok(()),
    }
}
