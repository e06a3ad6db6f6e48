//! Booking REST API trait and in-memory implementation.
//!
//! The trait mirrors the endpoints the wizard consumes:
//! `POST /bookings/availability`, `POST /bookings/request`,
//! `PATCH /booking/:id` and `POST /bookings/:id/token-payment`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::BookingId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use wizard::StepData;

use crate::error::BookingError;
use crate::value_objects::{BookingStatus, Guests, ListingId, Money, PaymentMethod};

/// An accommodation option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub name: String,
    /// Beds per unit.
    pub capacity: u32,
    /// Number of identical units.
    pub quantity: u32,
    pub price_per_night: Money,
    /// Nightly price in tokens; `None` when the listing cannot be paid in tokens.
    pub token_price_per_night: Option<u64>,
}

impl Listing {
    pub fn new(
        id: impl Into<ListingId>,
        name: impl Into<String>,
        capacity: u32,
        quantity: u32,
        price_per_night: Money,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            quantity,
            price_per_night,
            token_price_per_night: None,
        }
    }

    pub fn with_token_price(mut self, tokens_per_night: u64) -> Self {
        self.token_price_per_night = Some(tokens_per_night);
        self
    }
}

/// Body of `POST /bookings/availability`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: Guests,
    /// Booking being moved. Its own units are not counted as taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
}

/// Body of `POST /bookings/request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub listing_id: ListingId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: Guests,
}

/// Body of `PATCH /booking/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingPatch {
    pub listing_id: Option<ListingId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub guests: Option<Guests>,
    pub questionnaire: Option<StepData>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<BookingStatus>,
}

impl BookingPatch {
    /// Patch moving a booking to another listing or stay.
    pub fn from_request(request: &BookingRequest) -> Self {
        Self {
            listing_id: Some(request.listing_id.clone()),
            start_date: Some(request.start_date),
            end_date: Some(request.end_date),
            guests: Some(request.guests),
            ..Self::default()
        }
    }
}

/// A booking as returned by the booking API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub listing_id: ListingId,
    pub listing_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: Guests,
    pub nights: u32,
    pub rental: Money,
    pub token_cost: Option<u64>,
    pub status: BookingStatus,
    pub questionnaire: Option<StepData>,
    pub payment_method: Option<PaymentMethod>,
    pub tx_hash: Option<String>,
}

/// Client of the booking REST API.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Lists the listings that can host `guests` for the whole stay.
    async fn check_availability(
        &self,
        request: AvailabilityRequest,
    ) -> Result<Vec<Listing>, BookingError>;

    /// Creates a pending booking.
    async fn request_booking(&self, request: BookingRequest)
    -> Result<BookingRecord, BookingError>;

    /// Updates an existing booking.
    async fn patch_booking(
        &self,
        booking_id: BookingId,
        patch: BookingPatch,
    ) -> Result<BookingRecord, BookingError>;

    /// Records an on-chain token payment for a booking.
    async fn token_payment(
        &self,
        booking_id: BookingId,
        tx_hash: &str,
    ) -> Result<BookingRecord, BookingError>;

    /// Loads a booking.
    async fn get_booking(&self, booking_id: BookingId) -> Result<BookingRecord, BookingError>;
}

/// Number of nights between two dates, if `end` is after `start`.
pub fn nights_between(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let nights = (end - start).num_days();
    u32::try_from(nights).ok().filter(|n| *n > 0)
}

fn overlaps(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

#[derive(Debug, Default)]
struct InMemoryBookingState {
    listings: Vec<Listing>,
    bookings: HashMap<BookingId, BookingRecord>,
    fail_on_availability: bool,
    fail_on_request: bool,
    fail_on_patch: bool,
    fail_on_token_payment: bool,
}

impl InMemoryBookingState {
    fn listing(&self, id: &ListingId) -> Result<&Listing, BookingError> {
        self.listings
            .iter()
            .find(|l| &l.id == id)
            .ok_or_else(|| BookingError::BookingApi(format!("Unknown listing: {id}")))
    }

    fn units_taken(
        &self,
        listing_id: &ListingId,
        stay: (NaiveDate, NaiveDate),
        ignore: Option<BookingId>,
    ) -> u32 {
        let taken = self
            .bookings
            .values()
            .filter(|b| Some(b.id) != ignore)
            .filter(|b| &b.listing_id == listing_id && b.status.holds_unit())
            .filter(|b| overlaps((b.start_date, b.end_date), stay))
            .count();
        u32::try_from(taken).unwrap_or(u32::MAX)
    }

    fn is_available(
        &self,
        listing: &Listing,
        stay: (NaiveDate, NaiveDate),
        guests: &Guests,
        ignore: Option<BookingId>,
    ) -> bool {
        listing.capacity >= guests.beds_needed()
            && self.units_taken(&listing.id, stay, ignore) < listing.quantity
    }

    fn price(
        &self,
        record: &mut BookingRecord,
        listing_id: &ListingId,
        ignore: Option<BookingId>,
    ) -> Result<(), BookingError> {
        let stay = (record.start_date, record.end_date);
        let nights = nights_between(stay.0, stay.1)
            .ok_or_else(|| BookingError::BookingApi("End date must be after start date".into()))?;
        let listing = self.listing(listing_id)?;

        if !self.is_available(listing, stay, &record.guests, ignore) {
            return Err(BookingError::BookingApi(format!(
                "Listing {} is not available for {} - {}",
                listing.id, stay.0, stay.1
            )));
        }

        record.listing_id = listing.id.clone();
        record.listing_name = listing.name.clone();
        record.nights = nights;
        record.rental = listing.price_per_night.multiply(nights);
        record.token_cost = listing
            .token_price_per_night
            .map(|tokens| tokens * u64::from(nights));
        Ok(())
    }
}

/// In-memory booking API for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingApi {
    state: Arc<RwLock<InMemoryBookingState>>,
}

impl InMemoryBookingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an API serving the given listings.
    pub fn with_listings(listings: impl IntoIterator<Item = Listing>) -> Self {
        let state = InMemoryBookingState {
            listings: listings.into_iter().collect(),
            ..InMemoryBookingState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn add_listing(&self, listing: Listing) {
        self.state.write().await.listings.push(listing);
    }

    pub async fn set_fail_on_availability(&self, fail: bool) {
        self.state.write().await.fail_on_availability = fail;
    }

    pub async fn set_fail_on_request(&self, fail: bool) {
        self.state.write().await.fail_on_request = fail;
    }

    pub async fn set_fail_on_patch(&self, fail: bool) {
        self.state.write().await.fail_on_patch = fail;
    }

    pub async fn set_fail_on_token_payment(&self, fail: bool) {
        self.state.write().await.fail_on_token_payment = fail;
    }

    /// Returns the number of bookings ever requested.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }
}

#[async_trait]
impl BookingApi for InMemoryBookingApi {
    async fn check_availability(
        &self,
        request: AvailabilityRequest,
    ) -> Result<Vec<Listing>, BookingError> {
        let state = self.state.read().await;
        if state.fail_on_availability {
            return Err(BookingError::BookingApi("Availability service unavailable".into()));
        }

        let stay = (request.start_date, request.end_date);
        Ok(state
            .listings
            .iter()
            .filter(|l| state.is_available(l, stay, &request.guests, request.booking_id))
            .cloned()
            .collect())
    }

    async fn request_booking(
        &self,
        request: BookingRequest,
    ) -> Result<BookingRecord, BookingError> {
        let mut state = self.state.write().await;
        if state.fail_on_request {
            return Err(BookingError::BookingApi("Booking request failed".into()));
        }

        let mut record = BookingRecord {
            id: BookingId::new(),
            listing_id: request.listing_id.clone(),
            listing_name: String::new(),
            start_date: request.start_date,
            end_date: request.end_date,
            guests: request.guests,
            nights: 0,
            rental: Money::zero(),
            token_cost: None,
            status: BookingStatus::Pending,
            questionnaire: None,
            payment_method: None,
            tx_hash: None,
        };
        state.price(&mut record, &request.listing_id, None)?;

        state.bookings.insert(record.id, record.clone());
        Ok(record)
    }

    async fn patch_booking(
        &self,
        booking_id: BookingId,
        patch: BookingPatch,
    ) -> Result<BookingRecord, BookingError> {
        let mut state = self.state.write().await;
        if state.fail_on_patch {
            return Err(BookingError::BookingApi("Booking update failed".into()));
        }

        let mut record = state
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        let reprice = patch.listing_id.is_some()
            || patch.start_date.is_some()
            || patch.end_date.is_some()
            || patch.guests.is_some();

        let listing_id = patch.listing_id.unwrap_or_else(|| record.listing_id.clone());
        if let Some(start) = patch.start_date {
            record.start_date = start;
        }
        if let Some(end) = patch.end_date {
            record.end_date = end;
        }
        if let Some(guests) = patch.guests {
            record.guests = guests;
        }
        if reprice {
            state.price(&mut record, &listing_id, Some(booking_id))?;
        }
        if let Some(answers) = patch.questionnaire {
            record.questionnaire = Some(answers);
        }
        if let Some(method) = patch.payment_method {
            record.payment_method = Some(method);
        }
        if let Some(status) = patch.status {
            record.status = status;
        }

        state.bookings.insert(booking_id, record.clone());
        Ok(record)
    }

    async fn token_payment(
        &self,
        booking_id: BookingId,
        tx_hash: &str,
    ) -> Result<BookingRecord, BookingError> {
        let mut state = self.state.write().await;
        if state.fail_on_token_payment {
            return Err(BookingError::BookingApi("Token payment not recorded".into()));
        }

        let record = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if record.token_cost.is_none() {
            return Err(BookingError::BookingApi(format!(
                "Booking {booking_id} cannot be paid in tokens"
            )));
        }

        record.status = BookingStatus::Paid;
        record.payment_method = Some(PaymentMethod::Token);
        record.tx_hash = Some(tx_hash.to_string());
        Ok(record.clone())
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<BookingRecord, BookingError> {
        self.state
            .read()
            .await
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(booking_id))
    }
}
