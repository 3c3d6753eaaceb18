// Copyright 2025 Cowboy AI, LLC.

//! State machines for command flows
//!
//! A flow is a Mealy machine: the next state depends on the current state and the input that
//! drove the move, and each move produces an output recorded in the machine's history.
//!
//! The create flow runs
//! `Received → Validated → Priced → TokenRedeemed → Materialized → Committed`, and any
//! non-terminal state may fall to `Rejected`. Only `Materialized → Committed` writes anything.

use crate::entity::CommandId;
use crate::errors::{FlowError, FlowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Input to a state machine transition
pub trait TransitionInput: Debug + Clone + Send + Sync {
    /// Get a description of this input for logging
    fn description(&self) -> String;
}

/// Output from a state machine transition
pub trait TransitionOutput: Debug + Clone + Send + Sync {}

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Mealy Machine: Output depends on current state AND input
pub trait MealyStateTransitions: State {
    /// The input type for transitions
    type Input: TransitionInput;
    /// The output type for transitions
    type Output: TransitionOutput;

    /// Check if a transition is valid given the input
    fn can_transition_to(&self, target: &Self, input: &Self::Input) -> bool;

    /// Get valid transitions for a given input
    fn valid_transitions(&self, input: &Self::Input) -> Vec<Self>;

    /// Get the output for a transition
    fn transition_output(&self, target: &Self, input: &Self::Input) -> Self::Output;
}

/// Record of a state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition<S, I, O> {
    /// The state before the transition
    pub from: S,
    /// The state after the transition
    pub to: S,
    /// The input that triggered the transition
    pub input: I,
    /// The output produced by the transition
    pub output: O,
    /// Unique identifier for this transition instance
    pub transition_id: Uuid,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Mealy state machine driven by one command
#[derive(Debug, Clone)]
pub struct MealyMachine<S: MealyStateTransitions> {
    current_state: S,
    command_id: CommandId,
    transition_history: Vec<StateTransition<S, S::Input, S::Output>>,
}

impl<S: MealyStateTransitions> MealyMachine<S> {
    /// Create a new Mealy machine for a command
    pub fn new(initial_state: S, command_id: CommandId) -> Self {
        Self {
            current_state: initial_state,
            command_id,
            transition_history: Vec::new(),
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> &S {
        &self.current_state
    }

    /// Get the command this machine tracks
    pub fn command_id(&self) -> &CommandId {
        &self.command_id
    }

    /// Transition to a new state with input
    pub fn transition_to(
        &mut self,
        new_state: S,
        input: S::Input,
        at: DateTime<Utc>,
    ) -> FlowResult<StateTransition<S, S::Input, S::Output>> {
        if self.current_state.is_terminal()
            || !self.current_state.can_transition_to(&new_state, &input)
        {
            return Err(FlowError::InvalidStateTransition {
                from: self.current_state.name().to_string(),
                to: new_state.name().to_string(),
            });
        }

        let output = self.current_state.transition_output(&new_state, &input);
        let transition = StateTransition {
            from: self.current_state.clone(),
            to: new_state.clone(),
            input,
            output,
            transition_id: Uuid::new_v4(),
            timestamp: at,
        };

        self.current_state = new_state;
        self.transition_history.push(transition.clone());

        Ok(transition)
    }

    /// Get the transition history
    pub fn history(&self) -> &[StateTransition<S, S::Input, S::Output>] {
        &self.transition_history
    }

    /// Check if in a specific state
    pub fn is_in_state(&self, state: &S) -> bool {
        &self.current_state == state
    }

    /// Get valid next states for given input
    pub fn valid_next_states(&self, input: &S::Input) -> Vec<S> {
        self.current_state.valid_transitions(input)
    }
}

/// States of a domain create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreateFlowState {
    /// Command accepted for processing
    Received,
    /// Every validation rule passed
    Validated,
    /// Cost and EAP fee computed and reconciled with the fee extension
    Priced,
    /// Allocation token marked for redemption in the commit
    TokenRedeemed,
    /// Entities built in memory
    Materialized,
    /// Writes applied and tasks enqueued (terminal)
    Committed,
    /// A check failed; nothing was written (terminal)
    Rejected,
}

impl State for CreateFlowState {
    fn name(&self) -> &'static str {
        match self {
            CreateFlowState::Received => "Received",
            CreateFlowState::Validated => "Validated",
            CreateFlowState::Priced => "Priced",
            CreateFlowState::TokenRedeemed => "TokenRedeemed",
            CreateFlowState::Materialized => "Materialized",
            CreateFlowState::Committed => "Committed",
            CreateFlowState::Rejected => "Rejected",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, CreateFlowState::Committed | CreateFlowState::Rejected)
    }
}

/// Inputs that drive a create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CreateFlowInput {
    /// Validation pipeline accepted the command
    ValidationPassed,
    /// Pricing and fee reconciliation succeeded
    PricingReconciled,
    /// Token redemption staged; `None` when no extension token was used
    TokenStaged {
        /// Token string
        token: Option<String>,
    },
    /// Entities built
    EntitiesBuilt,
    /// Store applied the writes
    CommitApplied,
    /// A check failed
    Failed {
        /// Display form of the error
        reason: String,
    },
}

impl TransitionInput for CreateFlowInput {
    fn description(&self) -> String {
        match self {
            CreateFlowInput::ValidationPassed => "validation passed".into(),
            CreateFlowInput::PricingReconciled => "pricing reconciled".into(),
            CreateFlowInput::TokenStaged { token: Some(token) } => format!("token {token} staged"),
            CreateFlowInput::TokenStaged { token: None } => "no token".into(),
            CreateFlowInput::EntitiesBuilt => "entities built".into(),
            CreateFlowInput::CommitApplied => "commit applied".into(),
            CreateFlowInput::Failed { reason } => format!("failed: {reason}"),
        }
    }
}

/// Output of a create transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFlowOutput {
    /// Whether this move performed durable writes
    pub durable: bool,
}

impl TransitionOutput for CreateFlowOutput {}

impl MealyStateTransitions for CreateFlowState {
    type Input = CreateFlowInput;
    type Output = CreateFlowOutput;

    fn can_transition_to(&self, target: &Self, input: &Self::Input) -> bool {
        use CreateFlowInput as I;
        use CreateFlowState as S;
        matches!(
            (*self, target, input),
            (S::Received, S::Validated, I::ValidationPassed)
                | (S::Validated, S::Priced, I::PricingReconciled)
                | (S::Priced, S::TokenRedeemed, I::TokenStaged { .. })
                | (S::TokenRedeemed, S::Materialized, I::EntitiesBuilt)
                | (S::Materialized, S::Committed, I::CommitApplied)
                | (
                    S::Received | S::Validated | S::Priced | S::TokenRedeemed | S::Materialized,
                    S::Rejected,
                    I::Failed { .. }
                )
        )
    }

    fn valid_transitions(&self, input: &Self::Input) -> Vec<Self> {
        use CreateFlowInput as I;
        use CreateFlowState as S;
        match (*self, input) {
            (S::Received, I::ValidationPassed) => vec![S::Validated],
            (S::Validated, I::PricingReconciled) => vec![S::Priced],
            (S::Priced, I::TokenStaged { .. }) => vec![S::TokenRedeemed],
            (S::TokenRedeemed, I::EntitiesBuilt) => vec![S::Materialized],
            (S::Materialized, I::CommitApplied) => vec![S::Committed],
            (state, I::Failed { .. }) if !state.is_terminal() => vec![S::Rejected],
            _ => Vec::new(),
        }
    }

    fn transition_output(&self, target: &Self, _input: &Self::Input) -> Self::Output {
        CreateFlowOutput {
            durable: *target == CreateFlowState::Committed,
        }
    }
}
