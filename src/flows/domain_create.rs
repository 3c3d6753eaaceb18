// Copyright 2025 Cowboy AI, LLC.

//! The domain create flow
//!
//! One attempt loads everything the checks need, runs the validation pipeline, prices the create,
//! stages the token redemption, materialises the entities and commits them in one transaction.
//! Each step is a move of a [`CreateFlowState`] machine; any failure moves it to `Rejected` with
//! nothing written.
//!
//! A commit that conflicts with a concurrent transaction reruns the whole attempt against fresh
//! reads, up to [`FlowConfig::max_transaction_attempts`] times.

use crate::clock::{Clock, SystemClock};
use crate::commands::{DomainCreateCommand, FeeCreateExtension};
use crate::config::FlowConfig;
use crate::cqrs::{CommandEnvelope, CommandHandler};
use crate::domain::name::parse_domain_name;
use crate::domain::policy::TldPolicySnapshot;
use crate::domain::registrar::Registrar;
use crate::errors::{FlowError, FlowResult};
use crate::factory::{materialize, CreateContext, MaterializedCreate};
use crate::fees::{reconcile_fees, require_fee_acknowledgement};
use crate::flows::custom_logic::{DomainCreateCustomLogic, NoCustomLogic};
use crate::flows::response::{CreateResponse, FeeEcho};
use crate::infrastructure::metrics::{
    FlowMetric, FlowStatus, MetricSink, NoopMetricSink, ICANN_DOMAIN_CREATE_FIELD,
};
use crate::infrastructure::store::{CreateMutation, RegistryStore, StoreError};
use crate::pricing::{price_create, CreatePrice};
use crate::state_machine::{CreateFlowInput, CreateFlowState, MealyMachine, State, TransitionInput};
use crate::tasks::plan_tasks;
use crate::trademark::TrademarkValidator;
use crate::validation::{validate_create, CreateInput, LoadedResources, ValidatedCreate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Command name reported with metrics
pub const DOMAIN_CREATE_COMMAND: &str = "DomainCreate";

type CreateMachine = MealyMachine<CreateFlowState>;

/// Everything read from the store for one attempt
struct Snapshot {
    tld_names: Vec<String>,
    tld: Option<TldPolicySnapshot>,
    registrar: Option<Registrar>,
    loaded: LoadedResources,
}

/// A create that is ready to commit
struct Staged {
    validated: ValidatedCreate,
    created: MaterializedCreate,
    response: CreateResponse,
}

enum AttemptError {
    Rejected(FlowError),
    Conflict(StoreError),
}

impl From<FlowError> for AttemptError {
    fn from(err: FlowError) -> Self {
        AttemptError::Rejected(err)
    }
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrencyConflict { .. } => AttemptError::Conflict(err),
            StoreError::Backend(message) => AttemptError::Rejected(FlowError::Store(message)),
        }
    }
}

/// Handles [`DomainCreateCommand`]s
pub struct DomainCreateFlow {
    store: Arc<dyn RegistryStore>,
    trademark: Arc<dyn TrademarkValidator>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricSink>,
    custom_logic: Arc<dyn DomainCreateCustomLogic>,
    config: FlowConfig,
}

impl DomainCreateFlow {
    /// A flow over `store` with the system clock, default config, no metrics and no custom logic
    pub fn new(store: Arc<dyn RegistryStore>, trademark: Arc<dyn TrademarkValidator>) -> Self {
        Self {
            store,
            trademark,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(NoopMetricSink),
            custom_logic: Arc::new(NoCustomLogic),
            config: FlowConfig::default(),
        }
    }

    /// Read time from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `config`
    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    /// Report to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run `custom_logic` before every commit
    pub fn with_custom_logic(mut self, custom_logic: Arc<dyn DomainCreateCustomLogic>) -> Self {
        self.custom_logic = custom_logic;
        self
    }

    /// Settings in use
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    async fn load(
        &self,
        command: &DomainCreateCommand,
        registrar_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, StoreError> {
        let store = &self.store;
        let fqdn = command.name();
        let tld_names = store.tld_names().await?;
        let tld = match parse_domain_name(fqdn, &tld_names) {
            Ok(name) => store.load_tld(name.tld()).await?,
            Err(_) => None,
        };
        let registrar = store.load_registrar(registrar_id).await?;

        let contact_ids: Vec<String> = command
            .registrant
            .iter()
            .cloned()
            .chain(command.contacts.iter().map(|c| c.contact_id.clone()))
            .collect();
        let extension_token = match &command.extensions.allocation_token {
            Some(token) => store.load_token(token).await?,
            None => None,
        };
        let auth_code_token = if command.auth_info.is_empty() {
            None
        } else {
            store.load_token(&command.auth_info).await?
        };
        let loaded = LoadedResources {
            existing_domain: store.load_active_domain(fqdn, now).await?,
            open_application: store.load_open_application(fqdn).await?,
            contacts: store.load_contacts(&contact_ids).await?,
            hosts: store.load_hosts(&command.nameservers).await?,
            extension_token,
            auth_code_token,
        };
        Ok(Snapshot {
            tld_names,
            tld,
            registrar,
            loaded,
        })
    }

    /// Everything up to and including materialisation. Writes nothing.
    fn stage(
        &self,
        machine: &mut CreateMachine,
        envelope: &CommandEnvelope<DomainCreateCommand>,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
    ) -> FlowResult<Staged> {
        let command = &envelope.command;
        let input = CreateInput {
            command,
            session: &envelope.session,
            config: &self.config,
            now,
            tld_names: &snapshot.tld_names,
            tld: snapshot.tld.as_ref(),
            registrar: snapshot.registrar.as_ref(),
            loaded: &snapshot.loaded,
            trademark: self.trademark.as_ref(),
        };
        let validated = validate_create(&input)?;
        advance(machine, CreateFlowState::Validated, CreateFlowInput::ValidationPassed, now)?;

        let tld = snapshot
            .tld
            .as_ref()
            .ok_or_else(|| FlowError::TldDoesNotExist {
                tld: validated.name.tld().to_string(),
            })?;
        let price = price_create(tld, validated.name.label(), validated.years, now);
        let fee = command.extensions.fee.as_ref();
        require_fee_acknowledgement(fee, &price)?;
        if let Some(fee) = fee {
            reconcile_fees(fee, &price, &tld.currency)?;
        }
        advance(machine, CreateFlowState::Priced, CreateFlowInput::PricingReconciled, now)?;

        advance(
            machine,
            CreateFlowState::TokenRedeemed,
            CreateFlowInput::TokenStaged {
                token: validated.token_to_redeem.clone(),
            },
            now,
        )?;

        let mut created = materialize(&CreateContext {
            command,
            session: &envelope.session,
            trid: &envelope.trid,
            config: &self.config,
            tld,
            validated: &validated,
            price: &price,
            now,
        });
        for message in self.custom_logic.before_save(&created, now)? {
            created.push_message(message);
        }
        advance(machine, CreateFlowState::Materialized, CreateFlowInput::EntitiesBuilt, now)?;

        let response = CreateResponse::new(&created.domain, fee_echo(fee, &price));
        Ok(Staged {
            validated,
            created,
            response,
        })
    }

    async fn attempt(
        &self,
        envelope: &CommandEnvelope<DomainCreateCommand>,
        attempt: u32,
        now: DateTime<Utc>,
        resolved_tld: &mut Option<String>,
    ) -> Result<CreateResponse, AttemptError> {
        let mut machine = MealyMachine::new(CreateFlowState::Received, envelope.id);
        let snapshot = self
            .load(&envelope.command, envelope.issued_by(), now)
            .await?;
        *resolved_tld = snapshot.tld.as_ref().map(|tld| tld.name.clone());
        let staged = match self.stage(&mut machine, envelope, &snapshot, now) {
            Ok(staged) => staged,
            Err(err) => {
                reject(&mut machine, &err, now);
                return Err(err.into());
            }
        };

        let domain = &staged.created.domain;
        let fqdn = domain.fully_qualified_domain_name.clone();
        if envelope.dry_run {
            debug!(domain = %fqdn, "Dry run; skipping commit");
            return Ok(staged.response);
        }

        let repo_id = domain.repo_id.clone();
        let tasks = plan_tasks(&staged.created, &staged.validated);
        let mutation = CreateMutation {
            created: staged.created,
            token_to_redeem: staged.validated.token_to_redeem.clone(),
            tasks,
        };
        if let Err(err) = self.store.commit_create(mutation, now).await {
            let err = AttemptError::from(err);
            if let AttemptError::Rejected(flow_err) = &err {
                reject(&mut machine, flow_err, now);
            }
            return Err(err);
        }
        advance(&mut machine, CreateFlowState::Committed, CreateFlowInput::CommitApplied, now)?;

        info!(
            domain = %fqdn,
            tld = staged.validated.name.tld(),
            registrar = envelope.issued_by(),
            repo_id = %repo_id,
            attempt,
            "Domain created"
        );
        Ok(staged.response)
    }

    async fn record_metric(
        &self,
        envelope: &CommandEnvelope<DomainCreateCommand>,
        attempts: u32,
        tld: Option<String>,
        result: &FlowResult<CreateResponse>,
    ) {
        let status = match result {
            Ok(_) => FlowStatus::Success,
            Err(err) => FlowStatus::Failure(err.category()),
        };
        self.metrics
            .record(FlowMetric {
                command_name: DOMAIN_CREATE_COMMAND.to_string(),
                attempts,
                tld,
                registrar_id: envelope.issued_by().to_string(),
                status,
                icann_activity_field: Some(ICANN_DOMAIN_CREATE_FIELD.to_string()),
            })
            .await;
    }
}

#[async_trait]
impl CommandHandler<DomainCreateCommand> for DomainCreateFlow {
    type Response = CreateResponse;

    async fn handle(
        &self,
        envelope: CommandEnvelope<DomainCreateCommand>,
    ) -> FlowResult<CreateResponse> {
        let max_attempts = self.config.max_transaction_attempts.max(1);
        let mut attempts = 0;
        let mut tld = None;
        let result = loop {
            attempts += 1;
            let now = self.clock.now();
            match self.attempt(&envelope, attempts, now, &mut tld).await {
                Ok(response) => break Ok(response),
                Err(AttemptError::Rejected(err)) => {
                    info!(
                        domain = envelope.command.name(),
                        registrar = envelope.issued_by(),
                        category = ?err.category(),
                        error = %err,
                        "Domain create rejected"
                    );
                    break Err(err);
                }
                Err(AttemptError::Conflict(err)) if attempts < max_attempts => {
                    warn!(
                        domain = envelope.command.name(),
                        attempt = attempts,
                        error = %err,
                        "Create transaction conflicted; retrying"
                    );
                }
                Err(AttemptError::Conflict(err)) => {
                    warn!(
                        domain = envelope.command.name(),
                        attempts,
                        error = %err,
                        "Create transaction conflicted; giving up"
                    );
                    break Err(FlowError::TransactionConflict { attempts });
                }
            }
        };
        self.record_metric(&envelope, attempts, tld, &result).await;
        result
    }
}

fn fee_echo(fee: Option<&FeeCreateExtension>, price: &CreatePrice) -> Option<FeeEcho> {
    fee.map(|fee| FeeEcho::for_price(fee.version, price))
}

fn advance(
    machine: &mut CreateMachine,
    to: CreateFlowState,
    input: CreateFlowInput,
    now: DateTime<Utc>,
) -> FlowResult<()> {
    let transition = machine.transition_to(to, input, now)?;
    debug!(
        command = %machine.command_id(),
        from = transition.from.name(),
        to = transition.to.name(),
        input = %transition.input.description(),
        "Create flow transition"
    );
    Ok(())
}

fn reject(machine: &mut CreateMachine, err: &FlowError, now: DateTime<Utc>) {
    let input = CreateFlowInput::Failed {
        reason: err.to_string(),
    };
    if let Err(transition_err) = machine.transition_to(CreateFlowState::Rejected, input, now) {
        warn!(error = %transition_err, "Could not record rejection");
    }
}
