//! Step commands and the transition function.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WizardError;
use crate::step::{StepData, StepPath};
use crate::store::StepStore;

/// A request to change a step store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepCommand {
    /// Overwrite the data of one step. Other steps are left untouched.
    SaveStepData { path: StepPath, data: StepData },

    /// Mark a step as the active one for progress rendering.
    SetCurrentStep { path: StepPath },

    /// Drop all collected data and go back to the first step.
    Reset,
}

impl StepCommand {
    /// Builds a `SaveStepData` command from a JSON value.
    ///
    /// Objects are stored as-is, `null` as an empty bag, any other value under
    /// the `value` key.
    pub fn save(path: impl Into<StepPath>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            Value::Null => StepData::new(),
            other => StepData::from_iter([("value".to_string(), other)]),
        };
        StepCommand::SaveStepData {
            path: path.into(),
            data,
        }
    }

    /// Builds a `SetCurrentStep` command.
    pub fn set_current(path: impl Into<StepPath>) -> Self {
        StepCommand::SetCurrentStep { path: path.into() }
    }

    /// Returns the command name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            StepCommand::SaveStepData { .. } => "save_step_data",
            StepCommand::SetCurrentStep { .. } => "set_current_step",
            StepCommand::Reset => "reset",
        }
    }
}

/// Applies `command` to `store` and returns the resulting store.
///
/// The input store is never modified. A command naming an unregistered path
/// fails before anything is built.
pub fn transition(store: &StepStore, command: StepCommand) -> Result<StepStore, WizardError> {
    match command {
        StepCommand::SaveStepData { path, data } => {
            let index = store
                .get_current_step_index(path.as_str())
                .ok_or_else(|| store.invalid_path(&path))?;
            Ok(store.with_step_data(index, data))
        }
        StepCommand::SetCurrentStep { path } => {
            let index = store
                .get_current_step_index(path.as_str())
                .ok_or_else(|| store.invalid_path(&path))?;
            Ok(store.with_current(index))
        }
        StepCommand::Reset => Ok(store.reset()),
    }
}
