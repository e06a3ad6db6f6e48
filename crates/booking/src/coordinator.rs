//! Page actions of the booking wizard.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use wizard::flow::booking;
use wizard::{
    FlowKind, GuardDecision, MissingPrerequisitePolicy, Navigation, StepCommand, StepData,
    StepPath, StepStore, WizardError, enforce,
};

use crate::draft::{
    AccommodationData, BookingConfirmation, BookingDraft, CheckoutData, DatesData,
    QuestionnaireData, save,
};
use crate::error::{BookingError, WalletError};
use crate::services::booking_api::nights_between;
use crate::services::{AvailabilityRequest, BookingApi, BookingPatch, BookingRequest, Wallet};
use crate::value_objects::{BookingStatus, Guests, ListingId, PaymentMethod};

/// Settings of the booking flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSettings {
    /// Chain token payments must be made on.
    pub chain_id: u64,
    /// What to do when a page is entered without its prerequisites.
    pub policy: MissingPrerequisitePolicy,
    /// Longest stay that can be booked in one go.
    pub max_nights: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            chain_id: 42220,
            policy: MissingPrerequisitePolicy::Restart,
            max_nights: 365,
        }
    }
}

/// Input of the dates page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatesInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Input of the accommodation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccommodationInput {
    pub listing_id: ListingId,
}

/// Input of the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInput {
    pub method: PaymentMethod,
}

/// What a page action wants done: commands for the store and where to go.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub commands: Vec<StepCommand>,
    pub navigation: Navigation,
}

impl StepOutcome {
    /// Saves the step and moves on to the step after `path`.
    fn advance(store: &StepStore, path: &str, save: StepCommand) -> Self {
        let navigation = Navigation::after(store, path);
        let mut commands = vec![save];
        if let Navigation::Next { path } = &navigation {
            commands.push(StepCommand::set_current(path.clone()));
        }
        Self {
            commands,
            navigation,
        }
    }

    fn stay(error: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            navigation: Navigation::stay_with_error(error),
        }
    }

    fn restart(first: StepPath) -> Self {
        Self {
            commands: vec![StepCommand::Reset],
            navigation: Navigation::Restart { path: first },
        }
    }
}

/// Result of opening the confirmation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationView {
    pub outcome: StepOutcome,
    pub confirmation: Option<BookingConfirmation>,
}

/// Records the duration of a page action when dropped.
struct ActionTimer {
    action: &'static str,
    started: Instant,
}

impl ActionTimer {
    fn start(action: &'static str) -> Self {
        Self {
            action,
            started: Instant::now(),
        }
    }
}

impl Drop for ActionTimer {
    fn drop(&mut self) {
        metrics::histogram!("booking_action_duration_seconds", "action" => self.action)
            .record(self.started.elapsed().as_secs_f64());
    }
}

/// Drives the booking flow's pages against the booking API and the wallet.
///
/// Actions never modify the store they are given. They return the commands
/// to apply, so the owner of the store can apply them against its latest
/// state in one dispatch.
pub struct BookingCoordinator<B, W>
where
    B: BookingApi,
    W: Wallet,
{
    api: B,
    wallet: W,
    settings: BookingSettings,
}

impl<B, W> BookingCoordinator<B, W>
where
    B: BookingApi,
    W: Wallet,
{
    pub fn new(api: B, wallet: W, settings: BookingSettings) -> Self {
        Self {
            api,
            wallet,
            settings,
        }
    }

    pub fn api(&self) -> &B {
        &self.api
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn settings(&self) -> &BookingSettings {
        &self.settings
    }

    /// Guests page: records the head count.
    #[tracing::instrument(skip(self, store))]
    pub async fn submit_guests(
        &self,
        store: &StepStore,
        guests: Guests,
    ) -> Result<StepOutcome, BookingError> {
        let _timer = ActionTimer::start("guests");
        if guests.adults == 0 {
            return Err(BookingError::InvalidInput(
                "At least one adult is required".to_string(),
            ));
        }
        Ok(StepOutcome::advance(
            store,
            booking::GUESTS,
            save(booking::GUESTS, &guests)?,
        ))
    }

    /// Dates page: validates the stay and looks up availability.
    #[tracing::instrument(skip(self, store))]
    pub async fn submit_dates(
        &self,
        store: &StepStore,
        input: DatesInput,
    ) -> Result<StepOutcome, BookingError> {
        let _timer = ActionTimer::start("dates");
        if let Some(outcome) = self.guard(store, booking::DATES)? {
            return Ok(outcome);
        }
        let draft = BookingDraft::from_store(store);
        let Some(guests) = draft.guests else {
            return self.prerequisite_lost(store, booking::DATES, booking::GUESTS, "adults");
        };

        let nights = nights_between(input.start_date, input.end_date).ok_or_else(|| {
            BookingError::InvalidInput("Check-out must be after check-in".to_string())
        })?;
        if nights > self.settings.max_nights {
            return Err(BookingError::InvalidInput(format!(
                "Stays are limited to {} nights",
                self.settings.max_nights
            )));
        }
        if input.start_date < Utc::now().date_naive() {
            return Err(BookingError::InvalidInput(
                "Check-in cannot be in the past".to_string(),
            ));
        }

        let request = AvailabilityRequest {
            start_date: input.start_date,
            end_date: input.end_date,
            guests,
            booking_id: draft.booking_id(),
        };
        let listings = match self.api.check_availability(request).await {
            Ok(listings) => listings,
            Err(e) => return Ok(api_failure("check_availability", e)),
        };
        if listings.is_empty() {
            return Ok(StepOutcome::stay(
                "No accommodation is available for these dates",
            ));
        }

        let data = DatesData {
            start_date: input.start_date,
            end_date: input.end_date,
            nights,
            available_listings: listings.into_iter().map(|l| l.id).collect(),
        };
        Ok(StepOutcome::advance(
            store,
            booking::DATES,
            save(booking::DATES, &data)?,
        ))
    }

    /// Accommodation page: requests the booking, or moves the existing one.
    #[tracing::instrument(skip(self, store))]
    pub async fn select_accommodation(
        &self,
        store: &StepStore,
        input: AccommodationInput,
    ) -> Result<StepOutcome, BookingError> {
        let _timer = ActionTimer::start("accommodation");
        if let Some(outcome) = self.guard(store, booking::ACCOMMODATION)? {
            return Ok(outcome);
        }
        let draft = BookingDraft::from_store(store);
        let (Some(guests), Some(dates)) = (draft.guests, draft.dates.as_ref()) else {
            return self.prerequisite_lost(
                store,
                booking::ACCOMMODATION,
                booking::DATES,
                "start_date",
            );
        };

        if !dates.available_listings.contains(&input.listing_id) {
            return Err(BookingError::InvalidInput(format!(
                "Listing {} is not available for the selected dates",
                input.listing_id
            )));
        }

        let request = BookingRequest {
            listing_id: input.listing_id,
            start_date: dates.start_date,
            end_date: dates.end_date,
            guests,
        };
        metrics::counter!("booking_requests_total").increment(1);
        let result = match draft.booking_id() {
            Some(id) => {
                self.api
                    .patch_booking(id, BookingPatch::from_request(&request))
                    .await
            }
            None => self.api.request_booking(request).await,
        };
        let record = match result {
            Ok(record) => record,
            Err(e) => return Ok(api_failure("request_booking", e)),
        };

        tracing::info!(
            booking_id = %record.id,
            listing = %record.listing_id,
            nights = record.nights,
            "booking requested"
        );
        Ok(StepOutcome::advance(
            store,
            booking::ACCOMMODATION,
            save(booking::ACCOMMODATION, &AccommodationData::from(&record))?,
        ))
    }

    /// Questionnaire page: attaches the answers to the booking.
    #[tracing::instrument(skip(self, store, answers))]
    pub async fn submit_questionnaire(
        &self,
        store: &StepStore,
        answers: StepData,
    ) -> Result<StepOutcome, BookingError> {
        let _timer = ActionTimer::start("questionnaire");
        if let Some(outcome) = self.guard(store, booking::QUESTIONNAIRE)? {
            return Ok(outcome);
        }
        let Some(booking_id) = BookingDraft::from_store(store).booking_id() else {
            return self.prerequisite_lost(
                store,
                booking::QUESTIONNAIRE,
                booking::ACCOMMODATION,
                "booking_id",
            );
        };

        let patch = BookingPatch {
            questionnaire: Some(answers.clone()),
            ..BookingPatch::default()
        };
        if let Err(e) = self.api.patch_booking(booking_id, patch).await {
            return Ok(api_failure("patch_booking", e));
        }

        Ok(StepOutcome::advance(
            store,
            booking::QUESTIONNAIRE,
            save(booking::QUESTIONNAIRE, &QuestionnaireData { answers })?,
        ))
    }

    /// Checkout page: fiat hands over to the payment gateway, token pays on chain.
    #[tracing::instrument(skip(self, store))]
    pub async fn checkout(
        &self,
        store: &StepStore,
        input: CheckoutInput,
    ) -> Result<StepOutcome, BookingError> {
        let _timer = ActionTimer::start("checkout");
        if let Some(outcome) = self.guard(store, booking::CHECKOUT)? {
            return Ok(outcome);
        }
        let draft = BookingDraft::from_store(store);
        let Some(accommodation) = draft.accommodation else {
            return self.prerequisite_lost(
                store,
                booking::CHECKOUT,
                booking::ACCOMMODATION,
                "booking_id",
            );
        };
        let booking_id = accommodation.booking_id;
        if draft
            .dates
            .as_ref()
            .is_some_and(|dates| !accommodation.covers(dates))
        {
            return Err(BookingError::InvalidInput(
                "The dates changed after the accommodation was chosen, choose it again".to_string(),
            ));
        }

        let data = match input.method {
            PaymentMethod::Fiat => {
                let patch = BookingPatch {
                    payment_method: Some(PaymentMethod::Fiat),
                    status: Some(BookingStatus::PendingPayment),
                    ..BookingPatch::default()
                };
                match self.api.patch_booking(booking_id, patch).await {
                    Ok(record) => CheckoutData {
                        booking_id,
                        method: PaymentMethod::Fiat,
                        status: record.status,
                        tx_hash: None,
                    },
                    Err(e) => return Ok(api_failure("patch_booking", e)),
                }
            }
            PaymentMethod::Token => {
                let Some(amount) = accommodation.token_cost else {
                    return Err(BookingError::InvalidInput(
                        "This accommodation cannot be paid in tokens".to_string(),
                    ));
                };
                let tx_hash = match self.pay_with_tokens(amount).await {
                    Ok(tx_hash) => tx_hash,
                    Err(e) => return Ok(wallet_failure(e)),
                };
                match self.api.token_payment(booking_id, &tx_hash).await {
                    Ok(record) => CheckoutData {
                        booking_id,
                        method: PaymentMethod::Token,
                        status: record.status,
                        tx_hash: Some(tx_hash),
                    },
                    Err(e) => {
                        tracing::error!(%booking_id, %tx_hash, "tokens staked but payment not recorded");
                        return Ok(api_failure("token_payment", e));
                    }
                }
            }
        };

        tracing::info!(%booking_id, status = %data.status, "checkout finished");
        Ok(StepOutcome::advance(
            store,
            booking::CHECKOUT,
            save(booking::CHECKOUT, &data)?,
        ))
    }

    /// Confirmation page: summarizes the booking with its latest status.
    #[tracing::instrument(skip(self, store))]
    pub async fn confirmation(&self, store: &StepStore) -> Result<ConfirmationView, BookingError> {
        let _timer = ActionTimer::start("confirmation");
        if let Some(outcome) = self.guard(store, booking::CONFIRMATION)? {
            return Ok(ConfirmationView {
                outcome,
                confirmation: None,
            });
        }
        let Some(confirmation) = BookingConfirmation::from_draft(&BookingDraft::from_store(store))
        else {
            let outcome = self.prerequisite_lost(
                store,
                booking::CONFIRMATION,
                booking::CHECKOUT,
                "status",
            )?;
            return Ok(ConfirmationView {
                outcome,
                confirmation: None,
            });
        };

        let confirmation = match self.api.get_booking(confirmation.booking_id).await {
            Ok(record) => confirmation.refresh(&record),
            Err(e) => {
                tracing::warn!(error = %e, "showing confirmation from draft");
                metrics::counter!("booking_api_failures_total", "operation" => "get_booking")
                    .increment(1);
                confirmation
            }
        };

        Ok(ConfirmationView {
            outcome: StepOutcome {
                commands: vec![StepCommand::set_current(booking::CONFIRMATION)],
                navigation: Navigation::Complete,
            },
            confirmation: Some(confirmation),
        })
    }

    async fn pay_with_tokens(&self, amount: u64) -> Result<String, WalletError> {
        if self.wallet.address().await.is_none() {
            self.wallet.connect_wallet().await?;
        }
        let chain_id = self.wallet.chain_id().await;
        if chain_id != self.settings.chain_id {
            tracing::info!(from = chain_id, to = self.settings.chain_id, "switching network");
            self.wallet.switch_network(self.settings.chain_id).await?;
        }
        self.wallet.stake_tokens(amount).await
    }

    /// Runs the page guard. `Some` is the outcome to return instead of the page.
    fn guard(&self, store: &StepStore, path: &str) -> Result<Option<StepOutcome>, BookingError> {
        match enforce(store, FlowKind::Booking, path, self.settings.policy)? {
            GuardDecision::Proceed => Ok(None),
            GuardDecision::Restart { first } => Ok(Some(StepOutcome::restart(first))),
        }
    }

    /// Handles upstream data that is present but unreadable like missing data.
    fn prerequisite_lost(
        &self,
        store: &StepStore,
        step: &str,
        requires: &str,
        key: &'static str,
    ) -> Result<StepOutcome, BookingError> {
        tracing::info!(step, requires, key, "prerequisite data unreadable");
        match self.settings.policy {
            MissingPrerequisitePolicy::Restart => {
                metrics::counter!("wizard_restarts_total").increment(1);
                Ok(StepOutcome::restart(store.first_step().path.clone()))
            }
            MissingPrerequisitePolicy::Reject => Err(WizardError::MissingPrerequisite {
                step: StepPath::new(step),
                requires: StepPath::new(requires),
                key,
            }
            .into()),
        }
    }
}

fn api_failure(operation: &'static str, error: BookingError) -> StepOutcome {
    tracing::warn!(operation, error = %error, "booking API call failed");
    metrics::counter!("booking_api_failures_total", "operation" => operation).increment(1);
    StepOutcome::stay(error.to_string())
}

fn wallet_failure(error: WalletError) -> StepOutcome {
    tracing::warn!(error = %error, "wallet request failed");
    metrics::counter!("wallet_failures_total").increment(1);
    StepOutcome::stay(error.to_string())
}
