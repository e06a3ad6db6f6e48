//! Immutable step store.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::command::{StepCommand, transition};
use crate::error::WizardError;
use crate::step::{Step, StepData, StepPath};

/// Position of a step for progress rendering (`current / total`, 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// The ordered steps of one wizard plus the step marked as current.
///
/// A store is a value: every transition returns a new store. Steps are shared
/// through `Arc`, so steps a transition does not touch are the same
/// allocation in the old and the new store.
#[derive(Debug, Clone, PartialEq)]
pub struct StepStore {
    steps: Vec<Arc<Step>>,
    current: usize,
}

impl StepStore {
    /// Builds a store from already chained steps. `steps` must be non-empty.
    pub(crate) fn from_steps(steps: Vec<Step>) -> Self {
        debug_assert!(!steps.is_empty());
        Self {
            steps: steps.into_iter().map(Arc::new).collect(),
            current: 0,
        }
    }

    /// Returns the step registered under `path`.
    pub fn get_step_by_path(&self, path: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.path == path).map(Arc::as_ref)
    }

    /// Returns the 0-based registration index of `path`.
    pub fn get_current_step_index(&self, path: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.path == path)
    }

    /// Returns the shared handle of a step.
    ///
    /// Two stores return pointer-equal handles for a step that no transition
    /// between them has written.
    pub fn shared_step(&self, path: &str) -> Option<Arc<Step>> {
        self.steps.iter().find(|s| s.path == path).cloned()
    }

    /// Returns the progress of `path` within the wizard.
    pub fn progress(&self, path: &str) -> Option<Progress> {
        self.get_current_step_index(path).map(|index| Progress {
            current: index + 1,
            total: self.steps.len(),
        })
    }

    /// Iterates the steps in registration order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().map(Arc::as_ref)
    }

    /// Returns every registered path in order.
    pub fn paths(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.path.to_string()).collect()
    }

    /// Returns true if `path` is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.get_current_step_index(path).is_some()
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: a store holds at least one step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the first step of the wizard.
    pub fn first_step(&self) -> &Step {
        &self.steps[0]
    }

    /// Returns the step recorded as current.
    pub fn current_step(&self) -> &Step {
        &self.steps[self.current]
    }

    /// Returns the index of the step recorded as current.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Returns the step following `path`, if any.
    pub fn next_of(&self, path: &str) -> Option<&Step> {
        self.get_step_by_path(path)
            .and_then(|s| s.next.as_ref())
            .and_then(|next| self.get_step_by_path(next.as_str()))
    }

    /// Returns true if no step holds any data.
    pub fn is_pristine(&self) -> bool {
        self.steps.iter().all(|s| s.is_empty())
    }

    /// Assembles the union of all step data, keyed by step path.
    pub fn draft(&self) -> StepData {
        self.steps
            .iter()
            .map(|s| (s.path.to_string(), Value::Object(s.data.clone())))
            .collect()
    }

    /// Applies a single command. See [`transition`].
    pub fn dispatch(&self, command: StepCommand) -> Result<Self, WizardError> {
        transition(self, command)
    }

    /// Applies commands in order.
    ///
    /// Either every command applies or the error of the first failing one is
    /// returned and `self` is left as it was.
    pub fn dispatch_all(
        &self,
        commands: impl IntoIterator<Item = StepCommand>,
    ) -> Result<Self, WizardError> {
        commands
            .into_iter()
            .try_fold(self.clone(), |store, command| transition(&store, command))
    }

    pub(crate) fn invalid_path(&self, path: &StepPath) -> WizardError {
        WizardError::InvalidStepPath {
            path: path.clone(),
            valid: self.paths(),
        }
    }

    pub(crate) fn with_step_data(&self, index: usize, data: StepData) -> Self {
        let mut steps = self.steps.clone();
        steps[index] = Arc::new(self.steps[index].with_data(data));
        Self {
            steps,
            current: self.current,
        }
    }

    pub(crate) fn with_current(&self, index: usize) -> Self {
        Self {
            steps: self.steps.clone(),
            current: index,
        }
    }

    pub(crate) fn reset(&self) -> Self {
        Self {
            steps: self
                .steps
                .iter()
                .map(|s| Arc::new(Step::new(s.path.clone(), s.next.clone())))
                .collect(),
            current: 0,
        }
    }
}
