//! Booking wizard orchestration.
//!
//! The booking flow walks a guest through these pages:
//! 1. Guests
//! 2. Dates (availability lookup)
//! 3. Accommodation (booking request)
//! 4. Questionnaire
//! 5. Checkout (fiat or token payment)
//! 6. Confirmation
//!
//! Every page action reads the step store, checks the page's prerequisites,
//! talks to the booking API or the wallet, and returns the step commands the
//! owner of the store should apply.

pub mod coordinator;
pub mod draft;
pub mod error;
pub mod services;
pub mod value_objects;

pub use coordinator::{
    AccommodationInput, BookingCoordinator, BookingSettings, CheckoutInput, ConfirmationView,
    DatesInput, StepOutcome,
};
pub use draft::{
    AccommodationData, BookingConfirmation, BookingDraft, CheckoutData, DatesData,
    QuestionnaireData,
};
pub use error::{BookingError, WalletError};
pub use services::{
    AvailabilityRequest, BookingApi, BookingPatch, BookingRecord, BookingRequest,
    InMemoryBookingApi, InMemoryWallet, Listing, Wallet,
};
pub use value_objects::{BookingStatus, Guests, ListingId, Money, PaymentMethod};
