// Copyright 2025 Cowboy AI, LLC.

//! Extension declarations and per-command limits.

use super::{CreateInput, Findings, Target};
use crate::cqrs::RequestSource;
use crate::errors::{FlowError, FlowResult};

/// Every extension used must have been declared at login and be implemented by creates.
pub(super) fn check_declared(input: &CreateInput<'_>) -> FlowResult<()> {
    let extensions = &input.command.extensions;
    if let Some(uri) = extensions
        .used_service_uris()
        .into_iter()
        .find(|uri| !input.session.has_declared(uri))
    {
        return Err(FlowError::UndeclaredServiceExtension {
            uri: uri.to_string(),
        });
    }
    if let Some(uri) = extensions.unimplemented.first() {
        return Err(FlowError::UnimplementedExtension { uri: uri.clone() });
    }
    Ok(())
}

pub(super) fn check_sec_dns(
    input: &CreateInput<'_>,
    _target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let Some(sec_dns) = &input.command.extensions.sec_dns else {
        return Ok(());
    };
    if sec_dns.max_sig_life.is_some() {
        return Err(FlowError::MaxSigLifeNotSupported);
    }
    let max = input.config.max_ds_records;
    if sec_dns.ds_data.len() > max {
        return Err(FlowError::TooManyDsRecords {
            count: sec_dns.ds_data.len(),
            max,
        });
    }
    Ok(())
}

pub(super) fn check_nameserver_count(
    input: &CreateInput<'_>,
    _target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    let count = input.command.nameservers.len();
    let max = input.config.max_nameservers;
    if count > max {
        return Err(FlowError::TooManyNameservers { count, max });
    }
    Ok(())
}

pub(super) fn check_metadata_source(
    input: &CreateInput<'_>,
    _target: &Target<'_>,
    _findings: &mut Findings,
) -> FlowResult<()> {
    if input.command.extensions.metadata.is_some()
        && input.session.request_source != RequestSource::Tool
    {
        return Err(FlowError::OnlyToolCanPassMetadata);
    }
    Ok(())
}
