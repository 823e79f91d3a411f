//! Booking record types.
//!
//! A [`Booking`] is keyed by the compound [`BookingKey`] `(booking_id,
//! restaurant_name)`. [`BookingTable`] carries the validated name of the table
//! bookings live in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Random 8-character identifier.
    pub booking_id: String,
    pub restaurant_name: String,
    /// Calendar date, e.g. `2025-12-01`.
    pub date: String,
    /// Time of day, e.g. `20:00`.
    pub hour: String,
    pub guest_name: String,
    pub num_guests: u32,
}

impl Booking {
    pub fn key(&self) -> BookingKey {
        BookingKey::new(&self.booking_id, &self.restaurant_name)
    }
}

/// Input for creating a booking. The identifier is generated by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub date: String,
    pub hour: String,
    pub restaurant_name: String,
    pub guest_name: String,
    pub num_guests: u32,
}

impl NewBooking {
    /// Every field must be present; there is no restaurant or slot check.
    pub fn validate(&self) -> Result<(), BookingError> {
        let fields = [
            ("date", &self.date),
            ("hour", &self.hour),
            ("restaurant_name", &self.restaurant_name),
            ("guest_name", &self.guest_name),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(BookingError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.num_guests == 0 {
            return Err(BookingError::Invalid("num_guests must be at least 1".into()));
        }
        Ok(())
    }
}

/// Compound lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingKey {
    pub booking_id: String,
    pub restaurant_name: String,
}

impl BookingKey {
    pub fn new(booking_id: impl Into<String>, restaurant_name: impl Into<String>) -> Self {
        Self {
            booking_id: booking_id.into(),
            restaurant_name: restaurant_name.into(),
        }
    }
}

/// One page of a table scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanPage {
    pub items: Vec<Booking>,
    /// Pass back to continue the scan; `None` when the table is exhausted.
    pub next_token: Option<String>,
}

/// Name of the booking table, checked to be a plain SQL identifier since it
/// is interpolated into statements. Always interpolate [`BookingTable::quoted`]
/// so keywords such as `order` stay usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingTable(String);

impl BookingTable {
    pub fn new(name: impl Into<String>) -> Result<Self, BookingError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid || name.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(BookingError::InvalidTable(name));
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The name as a double-quoted SQL identifier.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl Default for BookingTable {
    fn default() -> Self {
        Self("bookings".into())
    }
}

impl std::fmt::Display for BookingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from the booking store.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("No booking found with ID {0}")]
    NotFound(String),

    #[error("invalid booking: {0}")]
    Invalid(String),

    #[error("invalid table name: {0:?}")]
    InvalidTable(String),

    #[error("invalid pagination token: {0:?}")]
    InvalidToken(String),

    #[error("could not generate an unused booking id after {0} attempts")]
    IdExhausted(usize),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
