//! Listing model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::availability::BookingsIndex;
use super::ids::{BookingId, ListingId, UserId};

/// Property category advertised on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingType {
    Apartment,
    House,
}

/// Raised when decoding an unknown listing type from storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown listing type: {value}")]
pub struct UnknownListingType {
    /// The unrecognised stored value.
    pub value: String,
}

impl ListingType {
    /// Stable storage identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Apartment => "APARTMENT",
            Self::House => "HOUSE",
        }
    }
}

impl TryFrom<&str> for ListingType {
    type Error = UnknownListingType;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "APARTMENT" => Ok(Self::Apartment),
            "HOUSE" => Ok(Self::House),
            other => Err(UnknownListingType {
                value: other.to_owned(),
            }),
        }
    }
}

/// A bookable property.
///
/// ## Invariants
/// - Every `true` leaf in `bookings_index` is covered by at least one booking
///   in `bookings`; the index only ever gains days through this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    /// Hosted image URL.
    pub image: String,
    pub host: UserId,
    pub listing_type: ListingType,
    pub address: String,
    pub country: String,
    /// First-level administrative area (state, province, region).
    pub admin: String,
    pub city: String,
    /// Nightly price in the smallest currency unit.
    pub price: i64,
    pub num_of_guests: i32,
    /// Bookings against this listing, oldest first.
    pub bookings: Vec<BookingId>,
    /// Denormalised booked-day index, see [`super::availability`].
    pub bookings_index: BookingsIndex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_type_round_trips_through_storage_strings() {
        for listing_type in [ListingType::Apartment, ListingType::House] {
            assert_eq!(
                ListingType::try_from(listing_type.as_str()),
                Ok(listing_type)
            );
        }
    }

    #[test]
    fn unknown_listing_type_is_rejected() {
        let err = ListingType::try_from("CASTLE").expect_err("unknown type must fail");
        assert_eq!(err.value, "CASTLE");
    }
}
