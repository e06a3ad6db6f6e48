//! Typed view over the booking flow's step data.
//!
//! Pages save plain JSON into the store. The draft reads it back into the
//! structures each later page needs, skipping steps that are empty or hold
//! data of the wrong shape.

use chrono::NaiveDate;
use common::BookingId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wizard::flow::booking;
use wizard::{StepCommand, StepData, StepStore};

use crate::error::BookingError;
use crate::services::BookingRecord;
use crate::value_objects::{BookingStatus, Guests, ListingId, Money, PaymentMethod};

/// Saved on the dates step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatesData {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: u32,
    #[serde(default)]
    pub available_listings: Vec<ListingId>,
}

/// Saved on the accommodation step once the booking exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationData {
    pub listing_id: ListingId,
    pub listing_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: u32,
    pub rental_cents: i64,
    pub token_cost: Option<u64>,
    pub booking_id: BookingId,
}

impl AccommodationData {
    /// Whether the booking still covers the stay saved on the dates step.
    pub fn covers(&self, dates: &DatesData) -> bool {
        self.start_date == dates.start_date && self.end_date == dates.end_date
    }
}

impl From<&BookingRecord> for AccommodationData {
    fn from(record: &BookingRecord) -> Self {
        Self {
            listing_id: record.listing_id.clone(),
            listing_name: record.listing_name.clone(),
            start_date: record.start_date,
            end_date: record.end_date,
            nights: record.nights,
            rental_cents: record.rental.cents(),
            token_cost: record.token_cost,
            booking_id: record.id,
        }
    }
}

/// Saved on the questionnaire step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireData {
    #[serde(default)]
    pub answers: StepData,
}

/// Saved on the checkout step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutData {
    pub booking_id: BookingId,
    pub method: PaymentMethod,
    pub status: BookingStatus,
    pub tx_hash: Option<String>,
}

/// Everything the booking flow has collected so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingDraft {
    pub guests: Option<Guests>,
    pub dates: Option<DatesData>,
    pub accommodation: Option<AccommodationData>,
    pub questionnaire: Option<QuestionnaireData>,
    pub checkout: Option<CheckoutData>,
}

impl BookingDraft {
    /// Reads the booking steps of `store`.
    pub fn from_store(store: &StepStore) -> Self {
        Self {
            guests: read(store, booking::GUESTS),
            dates: read(store, booking::DATES),
            accommodation: read(store, booking::ACCOMMODATION),
            questionnaire: read(store, booking::QUESTIONNAIRE),
            checkout: read(store, booking::CHECKOUT),
        }
    }

    /// Returns the booking created on the accommodation step, if any.
    pub fn booking_id(&self) -> Option<BookingId> {
        self.accommodation.as_ref().map(|a| a.booking_id)
    }
}

fn read<T: DeserializeOwned>(store: &StepStore, path: &str) -> Option<T> {
    let step = store.get_step_by_path(path)?;
    if step.is_empty() {
        return None;
    }
    match serde_json::from_value(serde_json::Value::Object(step.data.clone())) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(step = path, error = %e, "step data does not match the booking draft");
            None
        }
    }
}

/// Builds a command saving `value` as the data of `path`.
pub(crate) fn save<T: Serialize>(path: &str, value: &T) -> Result<StepCommand, BookingError> {
    Ok(StepCommand::save(path, serde_json::to_value(value)?))
}

/// Summary shown on the confirmation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
    pub listing_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: u32,
    pub guests: Guests,
    pub rental: Money,
    pub token_cost: Option<u64>,
    pub method: PaymentMethod,
    pub status: BookingStatus,
    pub tx_hash: Option<String>,
}

impl BookingConfirmation {
    /// Assembles the summary from the draft. `None` if a needed step is missing.
    pub fn from_draft(draft: &BookingDraft) -> Option<Self> {
        let guests = draft.guests?;
        let accommodation = draft.accommodation.as_ref()?;
        let checkout = draft.checkout.as_ref()?;

        Some(Self {
            booking_id: accommodation.booking_id,
            listing_name: accommodation.listing_name.clone(),
            start_date: accommodation.start_date,
            end_date: accommodation.end_date,
            nights: accommodation.nights,
            guests,
            rental: Money::from_cents(accommodation.rental_cents),
            token_cost: accommodation.token_cost,
            method: checkout.method,
            status: checkout.status,
            tx_hash: checkout.tx_hash.clone(),
        })
    }

    /// Overlays the latest state held by the booking API.
    pub fn refresh(mut self, record: &BookingRecord) -> Self {
        self.listing_name = record.listing_name.clone();
        self.start_date = record.start_date;
        self.end_date = record.end_date;
        self.nights = record.nights;
        self.guests = record.guests;
        self.rental = record.rental;
        self.token_cost = record.token_cost;
        self.status = record.status;
        self.tx_hash = record.tx_hash.clone().or(self.tx_hash);
        self
    }
}
