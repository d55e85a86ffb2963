//! PostgreSQL-backed [`ListingStore`] implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::Listing;
use crate::domain::ids::ListingId;
use crate::domain::ports::{ListingPage, ListingSearch, ListingStore, Page, PriceOrder, StoreError};

use super::functions::array_append;
use super::models::{ListingRow, NewListingRow, index_to_value, row_to_listing};
use super::pool::DbPool;
use super::schema::{listings, users};
use super::map_pool_error;

/// Diesel-backed implementation of the [`ListingStore`] port.
#[derive(Clone)]
pub struct DieselListingStore {
    pool: DbPool,
}

impl DieselListingStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Apply the optional location filters to a boxed query.
///
/// A macro rather than a function because the row and count queries carry
/// different boxed select types.
macro_rules! apply_location_filters {
    ($query:expr, $search:expr) => {{
        let mut query = $query;
        if let Some(country) = &$search.country {
            query = query.filter(listings::country.eq(country));
        }
        if let Some(admin) = &$search.admin {
            query = query.filter(listings::admin.eq(admin));
        }
        if let Some(city) = &$search.city {
            query = query.filter(listings::city.eq(city));
        }
        query
    }};
}

#[async_trait]
impl ListingStore for DieselListingStore {
    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = listings::table
            .find(id.as_str())
            .select(ListingRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        row.map(row_to_listing).transpose()
    }

    async fn create_for_host(&self, listing: &Listing) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let index = index_to_value(&listing.bookings_index)?;
        let new_row = NewListingRow {
            id: listing.id.as_str(),
            title: &listing.title,
            description: &listing.description,
            image: &listing.image,
            host: listing.host.as_str(),
            listing_type: listing.listing_type.as_str(),
            address: &listing.address,
            country: &listing.country,
            admin: &listing.admin,
            city: &listing.city,
            price: listing.price,
            num_of_guests: listing.num_of_guests,
            bookings: Vec::new(),
            bookings_index: index,
        };
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                diesel::insert_into(listings::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                diesel::update(users::table.find(new_row.host))
                    .set(users::listings.eq(array_append(users::listings, new_row.id)))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn search(&self, search: &ListingSearch) -> Result<ListingPage, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 =
            apply_location_filters!(listings::table.count().into_boxed(), search)
                .get_result(&mut conn)
                .await?;

        let page = Page {
            limit: search.limit,
            page: search.page,
        };
        let mut query = apply_location_filters!(
            listings::table.select(ListingRow::as_select()).into_boxed(),
            search
        );
        query = match search.order {
            Some(PriceOrder::LowToHigh) => query.order(listings::price.asc()),
            Some(PriceOrder::HighToLow) => query.order(listings::price.desc()),
            None => query.order(listings::created_at.asc()),
        };
        let rows: Vec<ListingRow> = query
            .offset(page.offset())
            .limit(page.limit)
            .load(&mut conn)
            .await?;

        let items = rows
            .into_iter()
            .map(row_to_listing)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListingPage { total, items })
    }

    async fn find_page(
        &self,
        ids: &[ListingId],
        page: Page,
    ) -> Result<Vec<Listing>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw_ids: Vec<&str> = ids.iter().map(ListingId::as_str).collect();
        let rows: Vec<ListingRow> = listings::table
            .filter(listings::id.eq_any(raw_ids))
            .order(listings::created_at.asc())
            .offset(page.offset())
            .limit(page.limit)
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(row_to_listing).collect()
    }
}
