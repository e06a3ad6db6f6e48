//! Built-in wizard flows.
//!
//! Every flow is a fixed, ordered list of step paths plus a table of the data
//! each step needs from earlier steps.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::registry::build_initial_state;
use crate::step::StepPath;
use crate::store::StepStore;

/// Step paths of the booking flow.
pub mod booking {
    pub const GUESTS: &str = "guests";
    pub const DATES: &str = "dates";
    pub const ACCOMMODATION: &str = "accommodation";
    pub const QUESTIONNAIRE: &str = "questionnaire";
    pub const CHECKOUT: &str = "checkout";
    pub const CONFIRMATION: &str = "confirmation";

    pub const PATHS: &[&str] = &[
        GUESTS,
        DATES,
        ACCOMMODATION,
        QUESTIONNAIRE,
        CHECKOUT,
        CONFIRMATION,
    ];
}

/// Step paths of the citizen subscription flow.
pub mod subscription {
    pub const PLAN: &str = "plan";
    pub const SUMMARY: &str = "summary";
    pub const CHECKOUT: &str = "checkout";
    pub const SUCCESS: &str = "success";

    pub const PATHS: &[&str] = &[PLAN, SUMMARY, CHECKOUT, SUCCESS];
}

/// Step paths of the token sale flow.
pub mod token_sale {
    pub const ELIGIBILITY: &str = "eligibility";
    pub const NATIONALITY: &str = "nationality";
    pub const AMOUNT: &str = "amount";
    pub const CHECKOUT: &str = "checkout";
    pub const SUCCESS: &str = "success";

    pub const PATHS: &[&str] = &[ELIGIBILITY, NATIONALITY, AMOUNT, CHECKOUT, SUCCESS];
}

/// A value a step needs from an earlier step before it can be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prerequisite {
    /// The step being entered.
    pub step: &'static str,
    /// The earlier step holding the value.
    pub requires: &'static str,
    /// The key that must be present (and not null) in `requires`' data.
    pub key: &'static str,
}

const fn req(step: &'static str, requires: &'static str, key: &'static str) -> Prerequisite {
    Prerequisite {
        step,
        requires,
        key,
    }
}

const BOOKING_PREREQUISITES: &[Prerequisite] = &[
    req(booking::DATES, booking::GUESTS, "adults"),
    req(booking::ACCOMMODATION, booking::DATES, "start_date"),
    req(booking::ACCOMMODATION, booking::DATES, "end_date"),
    req(booking::QUESTIONNAIRE, booking::ACCOMMODATION, "booking_id"),
    req(booking::CHECKOUT, booking::ACCOMMODATION, "booking_id"),
    req(booking::CONFIRMATION, booking::CHECKOUT, "status"),
];

const SUBSCRIPTION_PREREQUISITES: &[Prerequisite] = &[
    req(subscription::SUMMARY, subscription::PLAN, "plan_id"),
    req(subscription::CHECKOUT, subscription::PLAN, "plan_id"),
    req(subscription::SUCCESS, subscription::CHECKOUT, "status"),
];

const TOKEN_SALE_PREREQUISITES: &[Prerequisite] = &[
    req(token_sale::NATIONALITY, token_sale::ELIGIBILITY, "accepted"),
    req(token_sale::AMOUNT, token_sale::NATIONALITY, "country"),
    req(token_sale::CHECKOUT, token_sale::AMOUNT, "tokens"),
    req(token_sale::SUCCESS, token_sale::CHECKOUT, "status"),
];

/// The wizards built on the step store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    /// Stay booking: guests, dates, accommodation, questionnaire, checkout.
    Booking,
    /// Citizen membership subscription.
    Subscription,
    /// Token purchase.
    TokenSale,
}

impl FlowKind {
    pub const ALL: [FlowKind; 3] = [
        FlowKind::Booking,
        FlowKind::Subscription,
        FlowKind::TokenSale,
    ];

    /// Returns the ordered step paths of the flow.
    pub fn paths(&self) -> &'static [&'static str] {
        match self {
            FlowKind::Booking => booking::PATHS,
            FlowKind::Subscription => subscription::PATHS,
            FlowKind::TokenSale => token_sale::PATHS,
        }
    }

    /// Returns the prerequisite table of the flow.
    pub fn prerequisites(&self) -> &'static [Prerequisite] {
        match self {
            FlowKind::Booking => BOOKING_PREREQUISITES,
            FlowKind::Subscription => SUBSCRIPTION_PREREQUISITES,
            FlowKind::TokenSale => TOKEN_SALE_PREREQUISITES,
        }
    }

    /// Returns the prerequisites of a single step.
    pub fn prerequisites_of<'a>(
        &self,
        path: &'a str,
    ) -> impl Iterator<Item = &'static Prerequisite> + 'a {
        self.prerequisites().iter().filter(move |p| p.step == path)
    }

    /// Builds a fresh store for this flow.
    pub fn initial_state(&self) -> StepStore {
        build_initial_state(self.paths().iter().copied())
            .expect("built-in flows have unique, non-empty paths")
    }

    /// Returns the flow name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Booking => "booking",
            FlowKind::Subscription => "subscription",
            FlowKind::TokenSale => "token-sale",
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowKind::ALL
            .into_iter()
            .find(|flow| flow.as_str() == s)
            .ok_or_else(|| WizardError::UnknownFlow(s.to_string()))
    }
}

/// Where a page should send the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Navigation {
    /// Continue to the given step.
    Next { path: StepPath },
    /// The wizard was reset; start again at the given step.
    Restart { path: StepPath },
    /// Remain on the current step, optionally with an inline error.
    Stay { error: Option<String> },
    /// The wizard has nothing after this step.
    Complete,
}

impl Navigation {
    pub fn next(path: impl Into<StepPath>) -> Self {
        Navigation::Next { path: path.into() }
    }

    pub fn restart(path: impl Into<StepPath>) -> Self {
        Navigation::Restart { path: path.into() }
    }

    pub fn stay_with_error(error: impl Into<String>) -> Self {
        Navigation::Stay {
            error: Some(error.into()),
        }
    }

    /// Navigation to whatever follows `path` in `store`.
    pub fn after(store: &StepStore, path: &str) -> Self {
        match store.get_step_by_path(path).and_then(|s| s.next.clone()) {
            Some(next) => Navigation::Next { path: next },
            None => Navigation::Complete,
        }
    }
}
