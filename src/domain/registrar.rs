// Copyright 2025 Cowboy AI, LLC.

//! Registrar records as seen by the flows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Registrar account state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrarState {
    /// Onboarding not finished
    Pending,
    /// Fully active
    Active,
    /// Temporarily not allowed to create
    Suspended,
    /// Permanently disabled
    Disabled,
}

/// A registrar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrar {
    /// Client id used at login
    pub client_id: String,
    /// Account state
    pub state: RegistrarState,
    /// TLDs the registrar may create in
    pub allowed_tlds: BTreeSet<String>,
    /// Premium names need a fee extension from this registrar
    pub premium_price_ack_required: bool,
    /// Premium names are refused for this registrar
    pub block_premium_names: bool,
}

impl Registrar {
    /// An active registrar allowed on the given TLDs
    pub fn active<I, S>(client_id: impl Into<String>, tlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_id: client_id.into(),
            state: RegistrarState::Active,
            allowed_tlds: tlds.into_iter().map(Into::into).collect(),
            premium_price_ack_required: false,
            block_premium_names: false,
        }
    }

    /// Whether the registrar may create domains at all
    pub fn is_active(&self) -> bool {
        self.state == RegistrarState::Active
    }

    /// Whether the registrar may create domains on `tld`
    pub fn is_allowed_on(&self, tld: &str) -> bool {
        self.allowed_tlds.contains(tld)
    }
}
