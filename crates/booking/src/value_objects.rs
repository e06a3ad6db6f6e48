//! Value objects for the booking domain.

use serde::{Deserialize, Serialize};

/// Accommodation listing identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ListingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ListingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Money amount in cents of the platform currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Multiplies by a count (nights, units).
    pub fn multiply(&self, count: u32) -> Money {
        Money {
            cents: self.cents * i64::from(count),
        }
    }

    /// Formats the amount with a currency symbol, e.g. `€120.50`.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.abs();
        format!("{sign}{symbol}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_with(""))
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

/// Head count of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Guests {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
    #[serde(default)]
    pub pets: u32,
}

impl Guests {
    pub fn adults(adults: u32) -> Self {
        Self {
            adults,
            ..Self::default()
        }
    }

    /// People who need a bed. Infants share.
    pub fn beds_needed(&self) -> u32 {
        self.adults + self.children
    }
}

/// Lifecycle of a booking on the booking API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested, nothing paid yet.
    #[default]
    Pending,
    /// Fiat checkout chosen, awaiting the payment gateway.
    PendingPayment,
    /// Paid in full.
    Paid,
    /// Cancelled; no longer holds a unit.
    Cancelled,
}

impl BookingStatus {
    /// Returns true if the booking still occupies its listing.
    pub fn holds_unit(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the guest pays at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Fiat,
    Token,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_formatting() {
        assert_eq!(Money::from_cents(12050).format_with("€"), "€120.50");
        assert_eq!(Money::from_cents(-5).format_with("€"), "-€0.05");
        assert_eq!(Money::from_cents(700).to_string(), "7.00");
    }

    #[test]
    fn money_arithmetic() {
        let nightly = Money::from_cents(4500);
        assert_eq!(nightly.multiply(3).cents(), 13500);
        assert_eq!((nightly + Money::from_cents(500)).cents(), 5000);
        assert!(!Money::zero().is_positive());
    }

    #[test]
    fn guests_defaults_missing_counts() {
        let guests: Guests = serde_json::from_value(serde_json::json!({ "adults": 2 })).unwrap();
        assert_eq!(guests, Guests::adults(2));
        assert_eq!(guests.beds_needed(), 2);
    }

    #[test]
    fn infants_do_not_need_beds() {
        let guests = Guests {
            adults: 2,
            children: 1,
            infants: 1,
            pets: 0,
        };
        assert_eq!(guests.beds_needed(), 3);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_value(BookingStatus::PendingPayment).unwrap(),
            serde_json::json!("pending_payment")
        );
        assert!(!BookingStatus::Cancelled.holds_unit());
        assert!(BookingStatus::Paid.holds_unit());
    }
}
