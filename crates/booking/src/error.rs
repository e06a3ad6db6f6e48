//! Booking error types.

use common::BookingId;
use thiserror::Error;
use wizard::WizardError;

/// Errors returned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No account is connected.
    #[error("Wallet is not connected")]
    NotConnected,

    /// The user declined the request in the wallet.
    #[error("Request rejected by user")]
    Rejected,

    /// The wallet is on another chain.
    #[error("Wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    /// Not enough tokens for the operation.
    #[error("Insufficient balance: {required} required, {available} available")]
    InsufficientBalance { required: u64, available: u64 },
}

/// Errors that can occur while running booking page actions.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Step store error.
    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    /// Input rejected by local validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The booking API refused or failed a request.
    #[error("Booking API error: {0}")]
    BookingApi(String),

    /// Wallet error.
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Booking not found.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
