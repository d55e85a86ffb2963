//! PostgreSQL persistence adapters for the store ports.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::Booking;
use crate::domain::ids::BookingId;
use crate::domain::ports::{Page, StoreError};

pub mod pool;
pub mod schema;

mod diesel_booking_store;
mod diesel_listing_store;
mod diesel_user_store;
mod functions;
mod models;

pub use diesel_booking_store::DieselBookingStore;
pub use diesel_listing_store::DieselListingStore;
pub use diesel_user_store::DieselUserStore;
pub use pool::{DbPool, PoolConfig, PoolError};

/// Map pool errors to the domain store error.
pub(crate) fn map_pool_error(error: PoolError) -> StoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreError::connection(message)
        }
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(?kind, message = info.message(), "diesel operation failed");
            }
            _ => debug!(
                error_type = %std::any::type_name_of_val(&error),
                "diesel operation failed"
            ),
        }

        match error {
            DieselError::NotFound => Self::query("record not found"),
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                Self::connection("database connection error")
            }
            _ => Self::query("database error"),
        }
    }
}

/// Load a page of bookings by id, oldest first.
pub(crate) async fn booking_page_query(
    conn: &mut AsyncPgConnection,
    ids: &[BookingId],
    page: Page,
) -> Result<Vec<Booking>, StoreError> {
    use schema::bookings;

    let raw_ids: Vec<&str> = ids.iter().map(BookingId::as_str).collect();
    let rows: Vec<models::BookingRow> = bookings::table
        .filter(bookings::id.eq_any(raw_ids))
        .order(bookings::created_at.asc())
        .offset(page.offset())
        .limit(page.limit)
        .select(models::BookingRow::as_select())
        .load(conn)
        .await?;
    rows.into_iter().map(models::row_to_booking).collect()
}
