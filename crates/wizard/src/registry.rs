//! Step registry: turns an ordered path list into a chained step store.

use std::collections::HashSet;

use crate::error::WizardError;
use crate::step::{Step, StepPath};
use crate::store::StepStore;

/// Builds the initial store for an ordered list of step paths.
///
/// Each step's `next` points at the path registered after it, the last step
/// is terminal, and every data bag starts empty. The first step is current.
pub fn build_initial_state<I, P>(ordered_paths: I) -> Result<StepStore, WizardError>
where
    I: IntoIterator<Item = P>,
    P: Into<StepPath>,
{
    let paths: Vec<StepPath> = ordered_paths.into_iter().map(Into::into).collect();

    if paths.is_empty() {
        return Err(WizardError::EmptyRegistry);
    }

    let mut seen = HashSet::with_capacity(paths.len());
    for path in &paths {
        if !seen.insert(path.as_str()) {
            return Err(WizardError::DuplicateStepPath(path.clone()));
        }
    }

    let nexts = paths.iter().skip(1).cloned().map(Some).chain([None]);
    let steps = paths
        .iter()
        .cloned()
        .zip(nexts)
        .map(|(path, next)| Step::new(path, next))
        .collect();

    Ok(StepStore::from_steps(steps))
}
