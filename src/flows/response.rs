// Copyright 2025 Cowboy AI, LLC.

//! Create response payload.

use crate::commands::FeeExtensionVersion;
use crate::domain::resources::DomainResource;
use crate::entity::RepoId;
use crate::pricing::CreatePrice;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One echoed fee line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    /// Description
    pub description: String,
    /// Amount in the TLD currency
    pub amount: Decimal,
}

/// Fee extension echo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEcho {
    /// Version the client used
    pub version: FeeExtensionVersion,
    /// Currency code
    pub currency: String,
    /// Charged fees
    pub fees: Vec<FeeLine>,
}

impl FeeEcho {
    /// Lines for a reconciled price: `create`, then the EAP line while EAP applies
    pub fn for_price(version: FeeExtensionVersion, price: &CreatePrice) -> Self {
        let mut fees = vec![FeeLine {
            description: "create".into(),
            amount: price.create_cost.to_decimal(),
        }];
        if !price.eap_fee.is_zero() {
            let description = match price.eap_period_end {
                Some(end) => format!(
                    "Early Access Period, fee expires: {}",
                    end.to_rfc3339_opts(SecondsFormat::Millis, true)
                ),
                None => "Early Access Period".to_string(),
            };
            fees.push(FeeLine {
                description,
                amount: price.eap_fee.to_decimal(),
            });
        }
        Self {
            version,
            currency: price.create_cost.currency().code.clone(),
            fees,
        }
    }
}

/// Successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    /// Created name
    pub name: String,
    /// Repo id of the new domain
    pub repo_id: RepoId,
    /// Creation time
    pub creation_time: DateTime<Utc>,
    /// Expiration time
    pub expiration_time: DateTime<Utc>,
    /// Present when the command carried a fee extension
    pub fee: Option<FeeEcho>,
}

impl CreateResponse {
    pub(crate) fn new(domain: &DomainResource, fee: Option<FeeEcho>) -> Self {
        Self {
            name: domain.fully_qualified_domain_name.clone(),
            repo_id: domain.repo_id.clone(),
            creation_time: domain.creation_time,
            expiration_time: domain.registration_expiration_time,
            fee,
        }
    }
}
