//! Step records and their identifiers.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended key/value bag collected by one step.
pub type StepData = Map<String, Value>;

/// Route identifier of a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepPath(String);

impl StepPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StepPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StepPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StepPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StepPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One stage of a wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique route identifier.
    pub path: StepPath,

    /// Path of the following step, `None` on the terminal step.
    pub next: Option<StepPath>,

    /// Data collected on this step. Starts empty.
    #[serde(default)]
    pub data: StepData,
}

impl Step {
    pub(crate) fn new(path: StepPath, next: Option<StepPath>) -> Self {
        Self {
            path,
            next,
            data: StepData::new(),
        }
    }

    /// Returns a copy of this step carrying `data` instead.
    pub(crate) fn with_data(&self, data: StepData) -> Self {
        Self {
            path: self.path.clone(),
            next: self.next.clone(),
            data,
        }
    }

    /// Returns true if this is the last step of its wizard.
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }

    /// Returns true if nothing has been saved on this step yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a value from the data bag, treating JSON null as absent.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_step_has_empty_data() {
        let step = Step::new(StepPath::new("guests"), Some(StepPath::new("dates")));
        assert!(step.is_empty());
        assert!(!step.is_terminal());
    }

    #[test]
    fn value_ignores_null() {
        let mut step = Step::new(StepPath::new("dates"), None);
        step.data.insert("start_date".into(), Value::Null);
        step.data.insert("end_date".into(), json!("2026-11-02"));

        assert!(step.value("start_date").is_none());
        assert_eq!(step.value("end_date"), Some(&json!("2026-11-02")));
        assert!(step.is_terminal());
    }

    #[test]
    fn step_path_compares_with_str() {
        let path = StepPath::from("checkout");
        assert_eq!(path, "checkout");
        assert_eq!(path.to_string(), "checkout");
    }

    #[test]
    fn step_serializes_with_plain_path() {
        let step = Step::new(StepPath::new("guests"), None);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json, json!({ "path": "guests", "next": null, "data": {} }));
    }
}
