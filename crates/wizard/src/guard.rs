//! Prerequisite guards for deep-linked steps.
//!
//! The store does not force users through the `next` chain. A page that is
//! entered directly checks that the earlier steps it reads from were
//! completed, and the configured policy decides what happens when they were
//! not.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::flow::{FlowKind, Prerequisite};
use crate::step::StepPath;
use crate::store::StepStore;

/// Result of checking a step's prerequisites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Everything the step needs is present.
    Proceed,
    /// The first missing prerequisite, in table order.
    Missing(Prerequisite),
}

/// What to do when a step is entered without its prerequisites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPrerequisitePolicy {
    /// Reset the wizard and send the user to the first step.
    #[default]
    Restart,
    /// Refuse with [`WizardError::MissingPrerequisite`].
    Reject,
}

impl MissingPrerequisitePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingPrerequisitePolicy::Restart => "restart",
            MissingPrerequisitePolicy::Reject => "reject",
        }
    }
}

impl FromStr for MissingPrerequisitePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(MissingPrerequisitePolicy::Restart),
            "reject" => Ok(MissingPrerequisitePolicy::Reject),
            other => Err(format!("unknown missing-prerequisite policy: {other}")),
        }
    }
}

impl std::fmt::Display for MissingPrerequisitePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of enforcing a guard under a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The page may render.
    Proceed,
    /// The wizard must be reset and the user sent to `first`.
    Restart { first: StepPath },
}

/// Checks whether `path` may be entered given the data in `store`.
pub fn check_prerequisites(
    store: &StepStore,
    flow: FlowKind,
    path: &str,
) -> Result<Guard, WizardError> {
    if !store.contains(path) {
        return Err(store.invalid_path(&StepPath::new(path)));
    }

    let missing = flow.prerequisites_of(path).find(|p| {
        store
            .get_step_by_path(p.requires)
            .and_then(|step| step.value(p.key))
            .is_none()
    });

    Ok(match missing {
        Some(p) => Guard::Missing(*p),
        None => Guard::Proceed,
    })
}

/// Checks prerequisites and applies `policy` to a missing one.
pub fn enforce(
    store: &StepStore,
    flow: FlowKind,
    path: &str,
    policy: MissingPrerequisitePolicy,
) -> Result<GuardDecision, WizardError> {
    match check_prerequisites(store, flow, path)? {
        Guard::Proceed => Ok(GuardDecision::Proceed),
        Guard::Missing(p) => {
            tracing::info!(
                flow = %flow,
                step = p.step,
                requires = p.requires,
                key = p.key,
                policy = %policy,
                "step entered without prerequisite"
            );
            match policy {
                MissingPrerequisitePolicy::Restart => {
                    metrics::counter!("wizard_restarts_total").increment(1);
                    Ok(GuardDecision::Restart {
                        first: store.first_step().path.clone(),
                    })
                }
                MissingPrerequisitePolicy::Reject => Err(WizardError::MissingPrerequisite {
                    step: StepPath::new(p.step),
                    requires: StepPath::new(p.requires),
                    key: p.key,
                }),
            }
        }
    }
}
