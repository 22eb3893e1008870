use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use shared::error::FieldErrors;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod record;
pub mod steps;
pub mod validation;

pub use record::{raw, AccumulatedRecord, FieldValue, RawInput, ValidatedStep};
pub use steps::StepDefinition;
pub use validation::{validate, FieldSpec, Rule, Schema, ZipFormat};

/// The local calendar day, used when a caller does not pin one.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The receiver refused specific fields.
    #[error("submission rejected: {0}")]
    Rejected(FieldErrors),
    #[error("submission failed: {0}")]
    Failed(String),
}

/// Receives the complete record once the last step validates.
#[async_trait]
pub trait FinalSubmit: Send + Sync {
    async fn submit(&self, record: &AccumulatedRecord) -> Result<(), SubmitError>;
}

/// Accepts every record. Useful when the caller reads the record from
/// [`StepOutcome::Submitted`] and handles it itself.
pub struct AcceptAll;

#[async_trait]
impl FinalSubmit for AcceptAll {
    async fn submit(&self, _record: &AccumulatedRecord) -> Result<(), SubmitError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("a wizard needs at least one step")]
    NoSteps,
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("cannot {action} step {requested}: wizard is on step {current} of {total}")]
    InvalidTransition {
        action: &'static str,
        requested: usize,
        current: usize,
        total: usize,
    },
    #[error("final submission failed: {0}")]
    Submit(String),
}

impl WizardError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step was accepted and the wizard moved to `step`.
    Advanced {
        step: usize,
        record: AccumulatedRecord,
    },
    /// The last step was accepted and the final submit collaborator took the
    /// record. The wizard has been reset.
    Submitted(AccumulatedRecord),
}

pub struct WizardController {
    steps: Vec<StepDefinition>,
    /// 1-based.
    current: usize,
    accumulated: AccumulatedRecord,
    submitter: Arc<dyn FinalSubmit>,
}

impl WizardController {
    pub fn new(
        steps: Vec<StepDefinition>,
        submitter: Arc<dyn FinalSubmit>,
    ) -> Result<Self, WizardError> {
        Self::with_seed(steps, submitter, AccumulatedRecord::new())
    }

    pub fn with_seed(
        steps: Vec<StepDefinition>,
        submitter: Arc<dyn FinalSubmit>,
        seed: AccumulatedRecord,
    ) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::NoSteps);
        }
        Ok(Self {
            steps,
            current: 1,
            accumulated: seed,
            submitter,
        })
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current == self.steps.len()
    }

    pub fn current_definition(&self) -> &StepDefinition {
        &self.steps[self.current - 1]
    }

    pub fn accumulated(&self) -> &AccumulatedRecord {
        &self.accumulated
    }

    /// Values to pre-fill the current step's form with.
    pub fn prefill(&self) -> RawInput {
        self.accumulated.prefill(&self.current_definition().schema)
    }

    pub async fn submit_step(
        &mut self,
        step_index: usize,
        input: &RawInput,
    ) -> Result<StepOutcome, WizardError> {
        self.submit_step_on(step_index, input, today()).await
    }

    /// Like [`submit_step`](Self::submit_step) with an explicit validation day.
    pub async fn submit_step_on(
        &mut self,
        step_index: usize,
        input: &RawInput,
        today: NaiveDate,
    ) -> Result<StepOutcome, WizardError> {
        if step_index != self.current {
            return Err(self.invalid_transition("submit", step_index));
        }

        let validated = validation::validate(&self.current_definition().schema, input, today)
            .map_err(|errors| {
                debug!(
                    step = self.current,
                    invalid_fields = errors.len(),
                    "wizard: step rejected"
                );
                WizardError::Validation(errors)
            })?;
        let merged = self.accumulated.merged(&validated);

        if !self.is_last_step() {
            self.accumulated = merged;
            self.current += 1;
            debug!(step = self.current, "wizard: advanced");
            return Ok(StepOutcome::Advanced {
                step: self.current,
                record: self.accumulated.clone(),
            });
        }

        // The last step's values are kept even when the submit fails, so the
        // user can retry without retyping.
        self.accumulated = merged;
        match self.submitter.submit(&self.accumulated).await {
            Ok(()) => {
                info!(fields = self.accumulated.len(), "wizard: final submit accepted");
                let record = std::mem::take(&mut self.accumulated);
                self.current = 1;
                Ok(StepOutcome::Submitted(record))
            }
            Err(SubmitError::Rejected(errors)) => {
                warn!(
                    invalid_fields = errors.len(),
                    "wizard: final submit rejected fields"
                );
                Err(WizardError::Validation(errors))
            }
            Err(SubmitError::Failed(message)) => {
                warn!(%message, "wizard: final submit failed");
                Err(WizardError::Submit(message))
            }
        }
    }

    pub fn go_to_previous_step(&mut self) -> Result<usize, WizardError> {
        if self.current == 1 {
            return Err(self.invalid_transition("leave", 1));
        }
        self.current -= 1;
        debug!(step = self.current, "wizard: went back");
        Ok(self.current)
    }

    /// Abandons the wizard: back to step 1 with an empty record.
    pub fn reset(&mut self) {
        self.current = 1;
        self.accumulated = AccumulatedRecord::new();
    }

    fn invalid_transition(&self, action: &'static str, requested: usize) -> WizardError {
        WizardError::InvalidTransition {
            action,
            requested,
            current: self.current,
            total: self.steps.len(),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
