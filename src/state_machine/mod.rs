// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Generic, pure state machines for modelling provisioning lifecycles.
//! Transitions are deterministic functions of `(state, input)`:
//!
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! Invalid pairs are rejected with a [`TransitionError`] instead of being
//! silently ignored, and [`StateMachineWithHistory`] keeps an audit trail of
//! every accepted transition with its timestamp.
//!
//! # Example
//!
//! ```rust
//! use edge_infrastructure::state_machine::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Gate { Closed, Open }
//!
//! impl StateMachine for Gate {
//!     type Input = bool;
//!     type Output = ();
//!
//!     fn transition(&self, open: &bool) -> TransitionResult<(Self, ())> {
//!         match (self, open) {
//!             (Gate::Closed, true) => Ok((Gate::Open, ())),
//!             (Gate::Open, false) => Ok((Gate::Closed, ())),
//!             (from, _) => Err(TransitionError::invalid(from, "same state")),
//!         }
//!     }
//! }
//!
//! assert!(Gate::Closed.can_transition(&true));
//! assert!(!Gate::Closed.can_transition(&false));
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Result of a state transition
pub type TransitionResult<S> = Result<S, TransitionError>;

/// Errors that can occur during state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Transition from current state to target state is not allowed
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Precondition not met for transition
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
}

impl TransitionError {
    /// Invalid transition out of `from`
    pub fn invalid(from: &impl Debug, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: format!("{:?}", from),
            to: to.into(),
        }
    }
}

/// Trait for finite state machines
pub trait StateMachine: Sized + Clone {
    /// Input type that triggers transitions
    type Input;

    /// Output type produced by transitions (use () if none)
    type Output;

    /// Attempt to transition to a new state given an input
    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    /// Check if a transition is valid without performing it
    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }

    /// Whether no input leads anywhere from this state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Transition metadata
#[derive(Debug, Clone)]
pub struct Transition<S, I> {
    /// State before transition
    pub from: S,

    /// State after transition
    pub to: S,

    /// Input that triggered transition
    pub input: I,

    /// Timestamp of transition
    pub timestamp: DateTime<Utc>,
}

/// State machine with history
#[derive(Debug, Clone)]
pub struct StateMachineWithHistory<FSM: StateMachine> {
    /// Current state
    pub current: FSM,

    /// Transition history
    pub history: Vec<Transition<FSM, FSM::Input>>,
}

impl<FSM: StateMachine> StateMachineWithHistory<FSM> {
    pub fn new(initial: FSM) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    /// Transition and record it; the state is unchanged on error
    pub fn transition_with_history(
        &mut self,
        input: FSM::Input,
        timestamp: DateTime<Utc>,
    ) -> TransitionResult<FSM::Output> {
        let (to, output) = self.current.transition(&input)?;

        self.history.push(Transition {
            from: self.current.clone(),
            to: to.clone(),
            input,
            timestamp,
        });

        self.current = to;
        Ok(output)
    }

    pub fn get_history(&self) -> &[Transition<FSM, FSM::Input>] {
        &self.history
    }

    pub fn current_state(&self) -> &FSM {
        &self.current
    }
}
