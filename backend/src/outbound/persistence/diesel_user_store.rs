//! PostgreSQL-backed [`UserStore`] implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ids::{BookingId, UserId};
use crate::domain::ports::{IdentityProfile, Page, StoreError, UserStore};
use crate::domain::{Booking, User};

use super::models::{NewUserRow, UserRow, row_to_user};
use super::pool::DbPool;
use super::schema::users;
use super::{booking_page_query, map_pool_error};

/// Diesel-backed implementation of the [`UserStore`] port.
#[derive(Clone)]
pub struct DieselUserStore {
    pool: DbPool,
}

impl DieselUserStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for DieselUserStore {
    async fn find(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(id.as_str())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_id_and_token(
        &self,
        id: &UserId,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_str()))
            .filter(users::token.eq(token))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        row.map(row_to_user).transpose()
    }

    async fn upsert_identity(
        &self,
        profile: &IdentityProfile,
        token: &str,
    ) -> Result<User, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            id: profile.id.as_str(),
            name: &profile.name,
            token,
            avatar: &profile.avatar,
            contact: &profile.contact,
            income: 0,
            bookings: Vec::new(),
            listings: Vec::new(),
        };
        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::name.eq(excluded(users::name)),
                users::avatar.eq(excluded(users::avatar)),
                users::contact.eq(excluded(users::contact)),
                users::token.eq(excluded(users::token)),
            ))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await?;
        row_to_user(row)
    }

    async fn rotate_token(
        &self,
        id: &UserId,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(users::table.find(id.as_str()))
            .set(users::token.eq(token))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        row.map(row_to_user).transpose()
    }

    async fn set_wallet(
        &self,
        id: &UserId,
        wallet_id: Option<String>,
    ) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(users::table.find(id.as_str()))
            .set(users::wallet_id.eq(wallet_id))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        row.map(row_to_user).transpose()
    }

    async fn bookings_page(
        &self,
        ids: &[BookingId],
        page: Page,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        booking_page_query(&mut conn, ids, page).await
    }
}
