pub mod store;
pub mod types;

pub use types::{Booking, BookingError, BookingKey, BookingTable, NewBooking, ScanPage};
