//! PostgreSQL-backed [`BookingStore`] implementation using Diesel.
//!
//! Booking creation applies the record plus every side effect in one
//! transaction. The listing row is locked (`FOR UPDATE`) for the duration so
//! concurrent bookings of the same listing serialise, and the caller's index
//! contribution is merged into the freshest stored value under that lock,
//! so a concurrent writer's booked days are never overwritten.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::Booking;
use crate::domain::ids::BookingId;
use crate::domain::merge_index;
use crate::domain::ports::{BookingStore, Page, PersistBooking, StoreError};

use super::functions::array_append;
use super::models::{NewBookingRow, index_from_value, index_to_value};
use super::pool::DbPool;
use super::schema::{bookings, listings, users};
use super::{booking_page_query, map_pool_error};

/// Diesel-backed implementation of the [`BookingStore`] port.
#[derive(Clone)]
pub struct DieselBookingStore {
    pool: DbPool,
}

impl DieselBookingStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for DieselBookingStore {
    async fn create(&self, request: &PersistBooking) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let booking = &request.booking;
        let new_row = NewBookingRow {
            id: booking.id.as_str(),
            listing: booking.listing.as_str(),
            tenant: booking.tenant.as_str(),
            check_in: booking.check_in,
            check_out: booking.check_out,
        };

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                // Serialisation point for concurrent bookings of one listing.
                let stored_index: serde_json::Value = listings::table
                    .find(new_row.listing)
                    .select(listings::bookings_index)
                    .for_update()
                    .first(conn)
                    .await?;

                diesel::insert_into(bookings::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;

                diesel::update(users::table.find(request.host.as_str()))
                    .set(users::income.eq(users::income + request.total))
                    .execute(conn)
                    .await?;

                diesel::update(users::table.find(new_row.tenant))
                    .set(users::bookings.eq(array_append(users::bookings, new_row.id)))
                    .execute(conn)
                    .await?;

                let merged = merge_index(&index_from_value(stored_index)?, &request.index);
                diesel::update(listings::table.find(new_row.listing))
                    .set((
                        listings::bookings.eq(array_append(listings::bookings, new_row.id)),
                        listings::bookings_index.eq(index_to_value(&merged)?),
                    ))
                    .execute(conn)
                    .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_page(
        &self,
        ids: &[BookingId],
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        booking_page_query(&mut conn, ids, page).await
    }
}
