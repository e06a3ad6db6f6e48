//! Wizard error types.

use common::SessionId;
use thiserror::Error;

use crate::step::StepPath;

/// Errors that can occur while building or driving a wizard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// A command named a step that is not registered.
    #[error("Invalid step path '{path}', valid paths are: {}", valid.join(", "))]
    InvalidStepPath { path: StepPath, valid: Vec<String> },

    /// A registry was built from an empty path list.
    #[error("A wizard needs at least one step")]
    EmptyRegistry,

    /// The same path was registered twice.
    #[error("Duplicate step path: {0}")]
    DuplicateStepPath(StepPath),

    /// A step was entered before the data it depends on was collected.
    #[error("Step '{step}' requires '{key}' from step '{requires}'")]
    MissingPrerequisite {
        step: StepPath,
        requires: StepPath,
        key: &'static str,
    },

    /// The session does not exist or was disposed.
    #[error("Wizard session not found: {0}")]
    SessionNotFound(SessionId),

    /// The flow name is not one of the known flows.
    #[error("Unknown wizard flow: {0}")]
    UnknownFlow(String),
}
