//! The training-step state machine
//!
//! One step walks `Idle -> Forward -> Backward -> Applied -> Idle`. The sequencer only
//! computes and records; waiting between phases is left to whoever drives it
//! (see [`crate::trainer::Trainer`]).

use std::fmt::{self, Display};

use rand::Rng;

use crate::{
    input::{Field, InputError, parse_finite},
    journal::Journal,
    network::{
        ActivationSnapshot, GradientProposal, NetworkParameters, TrainingExample, apply_gradient,
        backward, forward, randomize_parameters, squared_error,
    },
};

/// Learning rate used until the user picks another one
pub const DEFAULT_LEARNING_RATE: f64 = 0.8;

/// Number of steps kept in the error history, older ones are dropped first
pub const ERROR_HISTORY_CAPACITY: usize = 10_000;

/// Stage of the current training step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Forward,
    Backward,
    Applied,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Forward => write!(f, "forward"),
            Phase::Backward => write!(f, "backward"),
            Phase::Applied => write!(f, "applied"),
        }
    }
}

/// Proposed but not yet applied weight changes, for highlighting edges
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pulse {
    pub proposal: GradientProposal,
    /// true while the proposal is being shown
    pub on: bool,
}

// Everything a step needs is captured when it begins so edits made
// mid-step only affect the next one.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    params: NetworkParameters,
    example: TrainingExample,
    learning_rate: f64,
    proposal: Option<GradientProposal>,
}

/// State of the visualized network and of the step being animated
#[derive(Debug, Clone)]
pub struct Sequencer {
    params: NetworkParameters,
    example: TrainingExample,
    learning_rate: f64,
    phase: Phase,
    previous_activations: ActivationSnapshot,
    activations: ActivationSnapshot,
    pulse: Pulse,
    journal: Journal,
    in_flight: Option<InFlight>,
    steps_completed: u64,
    error_history: Vec<f64>,
}

impl Sequencer {
    pub fn new(params: NetworkParameters) -> Self {
        Self {
            params,
            example: TrainingExample::default(),
            learning_rate: DEFAULT_LEARNING_RATE,
            phase: Phase::Idle,
            previous_activations: ActivationSnapshot::default(),
            activations: ActivationSnapshot::default(),
            pulse: Pulse::default(),
            journal: Journal::new(),
            in_flight: None,
            steps_completed: 0,
            error_history: vec![],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.params
    }

    pub fn example(&self) -> &TrainingExample {
        &self.example
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn activations(&self) -> &ActivationSnapshot {
        &self.activations
    }

    /// Activations before and after the latest forward pass
    pub fn activation_transition(&self) -> (&ActivationSnapshot, &ActivationSnapshot) {
        (&self.previous_activations, &self.activations)
    }

    pub fn pulse(&self) -> &Pulse {
        &self.pulse
    }

    /// The proposal of the step in flight, once its backward pass ran
    pub fn pending_proposal(&self) -> Option<&GradientProposal> {
        self.in_flight.as_ref().and_then(|f| f.proposal.as_ref())
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    /// Squared error seen by the forward pass of the last [`ERROR_HISTORY_CAPACITY`] steps
    pub fn error_history(&self) -> &[f64] {
        &self.error_history
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    pub fn set_example(&mut self, example: TrainingExample) {
        self.example = example;
    }

    /// Applies a text edit to one of the numeric fields. Invalid text leaves the state as it was.
    pub fn set_field(&mut self, field: Field, text: &str) -> Result<(), InputError> {
        let field = field.validate()?;
        let value = parse_finite(text)?;
        match field {
            Field::LearningRate => self.learning_rate = value,
            Field::Input(index) => self.example.input[index] = value,
            Field::Target => self.example.target = value,
        }
        Ok(())
    }

    /// Replaces every parameter with a fresh draw and clears the log.
    /// Refused (returns `false`) while a step is in flight.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) -> bool {
        if !self.is_idle() {
            log::debug!("randomize ignored during {} phase", self.phase);
            return false;
        }
        self.params = randomize_parameters(rng);
        self.journal.clear();
        self.journal.push("randomized parameters");
        true
    }

    /// Starts a step with the forward pass. A no-op returning `false` unless idle.
    pub(crate) fn begin_step(&mut self) -> bool {
        if !self.is_idle() {
            log::debug!("step ignored during {} phase", self.phase);
            return false;
        }
        let step = InFlight {
            params: self.params,
            example: self.example,
            learning_rate: self.learning_rate,
            proposal: None,
        };
        let activations = forward(&step.params, &step.example.input);
        self.previous_activations = self.activations;
        self.activations = activations;
        if self.error_history.len() >= ERROR_HISTORY_CAPACITY {
            self.error_history.remove(0);
        }
        self.error_history
            .push(squared_error(activations.output, step.example.target));
        self.in_flight = Some(step);
        self.phase = Phase::Forward;
        self.journal
            .push(format!("forward -> output {:.3}", activations.output));
        true
    }

    /// Performs the transition out of the current phase and returns the new one.
    /// `None` when idle, since only [`Sequencer::begin_step`] leaves that phase.
    pub(crate) fn advance(&mut self) -> Option<Phase> {
        let step = self.in_flight.as_mut()?;
        match self.phase {
            Phase::Idle => return None,
            Phase::Forward => {
                let proposal = backward(
                    &step.params,
                    &self.activations,
                    &step.example,
                    step.learning_rate,
                );
                step.proposal = Some(proposal);
                self.pulse = Pulse { proposal, on: true };
                self.phase = Phase::Backward;
                self.journal.push(format!(
                    "backward -> deltaO {:.3}, deltaH [{:.3}, {:.3}]",
                    proposal.delta_output, proposal.delta_hidden[0], proposal.delta_hidden[1]
                ));
            }
            Phase::Backward => {
                if let Some(proposal) = step.proposal {
                    self.params = apply_gradient(&step.params, &proposal);
                }
                self.pulse.on = false;
                self.phase = Phase::Applied;
                self.journal.push("applied updates");
            }
            Phase::Applied => {
                self.in_flight = None;
                self.phase = Phase::Idle;
                self.steps_completed += 1;
                log::info!(
                    "step {} done, error {:.4}",
                    self.steps_completed,
                    self.error_history.last().copied().unwrap_or(f64::NAN)
                );
            }
        }
        log::debug!("entered {} phase", self.phase);
        Some(self.phase)
    }

    /// Runs a whole step without pauses
    pub fn run_step(&mut self) -> bool {
        if !self.begin_step() {
            return false;
        }
        while self.advance().is_some_and(|phase| phase != Phase::Idle) {}
        true
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(NetworkParameters::demo())
    }
}
