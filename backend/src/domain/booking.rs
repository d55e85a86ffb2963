//! Booking model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{BookingId, ListingId, UserId};

/// A confirmed stay. Immutable once created.
///
/// ## Invariants
/// - `check_out >= check_in`; the booking workflow validates the range before
///   construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub listing: ListingId,
    /// The user staying at the listing.
    pub tenant: UserId,
    /// First night of the stay (calendar date, inclusive).
    pub check_in: NaiveDate,
    /// Last night of the stay (calendar date, inclusive).
    pub check_out: NaiveDate,
}
