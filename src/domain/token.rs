// Copyright 2025 Cowboy AI, LLC.

//! Allocation tokens.
//!
//! A token moves from unredeemed to redeemed exactly once. Validation here is a pure read; the
//! redemption itself happens inside the store commit as a compare-and-set on
//! [`AllocationToken::redemption_history_entry`].

use crate::entity::HistoryEntryId;
use crate::errors::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single-use registration credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationToken {
    /// Token string; unique key
    pub token: String,
    /// Fully qualified name the token is bound to, if any
    pub domain_name: Option<String>,
    /// History entry that redeemed the token
    pub redemption_history_entry: Option<HistoryEntryId>,
}

/// Redemption failed because the marker was already set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("token {token} already redeemed by {by}")]
pub struct AlreadyRedeemed {
    /// Token string
    pub token: String,
    /// Entry that holds the marker
    pub by: HistoryEntryId,
}

impl AllocationToken {
    /// An unbound, unredeemed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            domain_name: None,
            redemption_history_entry: None,
        }
    }

    /// Same token bound to one fully qualified name
    pub fn bound_to(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = Some(domain_name.into());
        self
    }

    /// Whether the marker is set
    pub fn is_redeemed(&self) -> bool {
        self.redemption_history_entry.is_some()
    }

    /// Whether the token is bound to exactly this name
    pub fn is_bound_to(&self, fqdn: &str) -> bool {
        self.domain_name.as_deref() == Some(fqdn)
    }

    /// Set the redemption marker; fails if it is already set.
    pub fn redeem(&mut self, entry: HistoryEntryId) -> Result<(), AlreadyRedeemed> {
        match self.redemption_history_entry {
            Some(by) => Err(AlreadyRedeemed {
                token: self.token.clone(),
                by,
            }),
            None => {
                self.redemption_history_entry = Some(entry);
                Ok(())
            }
        }
    }
}

/// Check a supplied token string against what the store returned for it.
///
/// Order: existence, then redemption, then name binding.
pub fn validate_token<'a>(
    supplied: &str,
    found: Option<&'a AllocationToken>,
    fqdn: &str,
) -> FlowResult<&'a AllocationToken> {
    let token = found.ok_or_else(|| FlowError::InvalidAllocationToken {
        token: supplied.to_string(),
    })?;
    if token.is_redeemed() {
        return Err(FlowError::AlreadyRedeemedAllocationToken {
            token: supplied.to_string(),
        });
    }
    if let Some(bound) = &token.domain_name {
        if bound != fqdn {
            return Err(FlowError::AllocationTokenNotValidForDomain {
                token: supplied.to_string(),
            });
        }
    }
    Ok(token)
}
