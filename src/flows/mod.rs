// Copyright 2025 Cowboy AI, LLC.

//! Command flows
//!
//! A flow coordinates one command from load to commit. The domain create flow is the only one
//! here; it is a [`CommandHandler`](crate::cqrs::CommandHandler) for
//! [`DomainCreateCommand`](crate::commands::DomainCreateCommand).

pub mod custom_logic;
pub mod domain_create;
pub mod response;

pub use custom_logic::{DomainCreateCustomLogic, LabelTriggeredMessage, NoCustomLogic};
pub use domain_create::{DomainCreateFlow, DOMAIN_CREATE_COMMAND};
pub use response::{CreateResponse, FeeEcho, FeeLine};
