//! Step orchestration for multi-page wizards.
//!
//! This crate provides:
//! - Step registry building an ordered, chained list of steps
//! - An immutable step store addressable by path and index
//! - Step commands and the pure transition function that applies them
//! - Built-in flows (booking, citizen subscription, token sale) and their prerequisites
//! - A session registry owning one store per wizard session

pub mod command;
pub mod error;
pub mod flow;
pub mod guard;
pub mod registry;
pub mod session;
pub mod step;
pub mod store;

pub use command::{StepCommand, transition};
pub use error::WizardError;
pub use flow::{FlowKind, Navigation, Prerequisite};
pub use guard::{Guard, GuardDecision, MissingPrerequisitePolicy, check_prerequisites, enforce};
pub use registry::build_initial_state;
pub use session::{SessionRegistry, SessionTurn, WizardSession};
pub use step::{Step, StepData, StepPath};
pub use store::{Progress, StepStore};
