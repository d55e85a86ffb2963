//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain. Conversion helpers map rows into domain values, treating any
//! undecodable stored data as [`StoreError::Corrupt`].

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::domain::availability::BookingsIndex;
use crate::domain::ids::{BookingId, ListingId, UserId};
use crate::domain::ports::StoreError;
use crate::domain::{Booking, Listing, ListingType, User};

use super::schema::{bookings, listings, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: String,
    pub name: String,
    pub token: String,
    pub avatar: String,
    pub contact: String,
    pub wallet_id: Option<String>,
    pub income: i64,
    pub bookings: Vec<String>,
    pub listings: Vec<String>,
    #[expect(dead_code, reason = "audit column read back with the row")]
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub token: &'a str,
    pub avatar: &'a str,
    pub contact: &'a str,
    pub income: i64,
    pub bookings: Vec<String>,
    pub listings: Vec<String>,
}

/// Row struct for reading from the listings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ListingRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub host: String,
    pub listing_type: String,
    pub address: String,
    pub country: String,
    pub admin: String,
    pub city: String,
    pub price: i64,
    pub num_of_guests: i32,
    pub bookings: Vec<String>,
    pub bookings_index: serde_json::Value,
    #[expect(dead_code, reason = "audit column read back with the row")]
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new listing records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = listings)]
pub(crate) struct NewListingRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub image: &'a str,
    pub host: &'a str,
    pub listing_type: &'a str,
    pub address: &'a str,
    pub country: &'a str,
    pub admin: &'a str,
    pub city: &'a str,
    pub price: i64,
    pub num_of_guests: i32,
    pub bookings: Vec<String>,
    pub bookings_index: serde_json::Value,
}

/// Row struct for reading from the bookings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: String,
    pub listing: String,
    pub tenant: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[expect(dead_code, reason = "audit column read back with the row")]
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new booking records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow<'a> {
    pub id: &'a str,
    pub listing: &'a str,
    pub tenant: &'a str,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

fn corrupt_id(table: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::corrupt(format!("{table} row carries an invalid id: {err}"))
}

pub(crate) fn booking_ids(raw: Vec<String>, table: &str) -> Result<Vec<BookingId>, StoreError> {
    raw.into_iter()
        .map(|id| BookingId::new(id).map_err(|err| corrupt_id(table, err)))
        .collect()
}

pub(crate) fn listing_ids(raw: Vec<String>, table: &str) -> Result<Vec<ListingId>, StoreError> {
    raw.into_iter()
        .map(|id| ListingId::new(id).map_err(|err| corrupt_id(table, err)))
        .collect()
}

/// Decode a stored `jsonb` availability index.
pub(crate) fn index_from_value(value: serde_json::Value) -> Result<BookingsIndex, StoreError> {
    serde_json::from_value(value)
        .map_err(|err| StoreError::corrupt(format!("listing availability index: {err}")))
}

/// Encode an availability index for a `jsonb` column.
pub(crate) fn index_to_value(index: &BookingsIndex) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(index)
        .map_err(|err| StoreError::corrupt(format!("listing availability index: {err}")))
}

/// Convert a database row to a domain [`User`].
pub(crate) fn row_to_user(row: UserRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::new(row.id).map_err(|err| corrupt_id("users", err))?,
        name: row.name,
        token: row.token,
        avatar: row.avatar,
        contact: row.contact,
        wallet_id: row.wallet_id,
        income: row.income,
        bookings: booking_ids(row.bookings, "users")?,
        listings: listing_ids(row.listings, "users")?,
    })
}

/// Convert a database row to a domain [`Listing`].
pub(crate) fn row_to_listing(row: ListingRow) -> Result<Listing, StoreError> {
    let listing_type = ListingType::try_from(row.listing_type.as_str())
        .map_err(|err| StoreError::corrupt(err.to_string()))?;
    Ok(Listing {
        id: ListingId::new(row.id).map_err(|err| corrupt_id("listings", err))?,
        title: row.title,
        description: row.description,
        image: row.image,
        host: UserId::new(row.host).map_err(|err| corrupt_id("listings", err))?,
        listing_type,
        address: row.address,
        country: row.country,
        admin: row.admin,
        city: row.city,
        price: row.price,
        num_of_guests: row.num_of_guests,
        bookings: booking_ids(row.bookings, "listings")?,
        bookings_index: index_from_value(row.bookings_index)?,
    })
}

/// Convert a database row to a domain [`Booking`].
pub(crate) fn row_to_booking(row: BookingRow) -> Result<Booking, StoreError> {
    Ok(Booking {
        id: BookingId::new(row.id).map_err(|err| corrupt_id("bookings", err))?,
        listing: ListingId::new(row.listing).map_err(|err| corrupt_id("bookings", err))?,
        tenant: UserId::new(row.tenant).map_err(|err| corrupt_id("bookings", err))?,
        check_in: row.check_in,
        check_out: row.check_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_index_maps_to_corrupt_error() {
        let err = index_from_value(serde_json::json!({ "not-a-year": [] }))
            .expect_err("non-index JSON must fail");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn index_round_trips_through_jsonb_values() {
        let index = crate::domain::extend_index(
            &BookingsIndex::new(),
            NaiveDate::from_ymd_opt(2026, 12, 30).expect("valid date"),
            NaiveDate::from_ymd_opt(2027, 1, 2).expect("valid date"),
        );
        let value = index_to_value(&index).expect("index encodes");
        assert_eq!(index_from_value(value).expect("index decodes"), index);
    }

    #[test]
    fn blank_stored_ids_are_corrupt() {
        let err = booking_ids(vec![String::new()], "users").expect_err("blank id must fail");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
