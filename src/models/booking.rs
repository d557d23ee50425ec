use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reservation moderated by administrators.
///
/// Prices are integers in the smallest currency unit. `amount` is never
/// written directly: it is recomputed from `unit_price` and the number of
/// nights every time the booking is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Full name of the person who booked.
    pub booker: String,
    /// What is booked (room, desk, equipment...).
    pub resource: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub unit_price: i64,
    pub amount: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn nights(&self) -> i64 {
        nights_between(self.start_date, self.end_date)
    }
}

pub fn nights_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Total price of a stay, or `None` when it does not fit in an `i64`.
pub fn booking_amount(unit_price: i64, start: NaiveDate, end: NaiveDate) -> Option<i64> {
    unit_price.checked_mul(nights_between(start, end))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingInput {
    pub booker: String,
    pub resource: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub unit_price: i64,
    pub comment: Option<String>,
}

/// Input for the admin booking edit. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookingInput {
    pub booker: Option<String>,
    pub resource: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub unit_price: Option<i64>,
    /// An empty string clears the comment.
    pub comment: Option<String>,
}
