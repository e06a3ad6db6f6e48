//! External collaborator traits and in-memory implementations.

pub mod booking_api;
pub mod wallet;

pub use booking_api::{
    AvailabilityRequest, BookingApi, BookingPatch, BookingRecord, BookingRequest,
    InMemoryBookingApi, Listing,
};
pub use wallet::{InMemoryWallet, Wallet};
