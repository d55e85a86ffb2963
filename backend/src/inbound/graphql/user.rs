//! User resolvers with viewer-gated private fields.

use async_graphql::{Context, ErrorExtensions, ID, Object, Result, SimpleObject};

use crate::domain::ports::Page;
use crate::domain::{DomainError, UserId};

use super::GraphQlData;
use super::booking::Booking;
use super::listing::Listing;
use super::viewer::authorized_viewer_id;

/// A marketplace user. Private fields resolve to null unless the viewer is
/// this user.
pub struct User {
    pub(super) user: crate::domain::User,
    pub(super) authorized: bool,
}

impl User {
    pub(super) fn public(user: crate::domain::User) -> Self {
        Self {
            user,
            authorized: false,
        }
    }
}

/// One page of bookings plus the unpaginated total.
#[derive(SimpleObject)]
pub struct Bookings {
    pub total: i64,
    pub result: Vec<Booking>,
}

/// One page of listings plus the unpaginated total. `region` is present only
/// on location searches.
#[derive(SimpleObject)]
pub struct Listings {
    pub region: Option<String>,
    pub total: i64,
    pub result: Vec<Listing>,
}

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID::from(self.user.id.as_str())
    }

    async fn name(&self) -> &str {
        &self.user.name
    }

    async fn avatar(&self) -> &str {
        &self.user.avatar
    }

    async fn contact(&self) -> &str {
        &self.user.contact
    }

    async fn has_wallet(&self) -> bool {
        self.user.wallet_id.is_some()
    }

    /// Lifetime host earnings; only visible to the user themselves.
    async fn income(&self) -> Option<i64> {
        self.authorized.then_some(self.user.income)
    }

    /// Stays booked by this user; only visible to the user themselves.
    async fn bookings(
        &self,
        ctx: &Context<'_>,
        limit: i32,
        page: i32,
    ) -> Result<Option<Bookings>> {
        if !self.authorized {
            return Ok(None);
        }
        let data = ctx.data::<GraphQlData>()?;
        let result = data
            .users
            .bookings_page(
                &self.user.bookings,
                Page {
                    limit: i64::from(limit),
                    page: i64::from(page),
                },
            )
            .await
            .map_err(|err| DomainError::persistence(err.to_string()).extend())?;
        Ok(Some(Bookings {
            total: self.user.bookings.len() as i64,
            result: result.into_iter().map(Booking).collect(),
        }))
    }

    /// Listings hosted by this user.
    async fn listings(&self, ctx: &Context<'_>, limit: i32, page: i32) -> Result<Listings> {
        let data = ctx.data::<GraphQlData>()?;
        let result = data
            .listings
            .find_page(
                &self.user.listings,
                Page {
                    limit: i64::from(limit),
                    page: i64::from(page),
                },
            )
            .await
            .map_err(|err| DomainError::persistence(err.to_string()).extend())?;
        Ok(Listings {
            region: None,
            total: self.user.listings.len() as i64,
            result: result.into_iter().map(Listing::public).collect(),
        })
    }
}

/// User query root.
#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Fetch a user by id.
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<User> {
        let data = ctx.data::<GraphQlData>()?;
        let id = UserId::new(id.as_str())
            .map_err(|err| DomainError::invalid_input(err.to_string()).extend())?;
        let user = data
            .users
            .find(&id)
            .await
            .map_err(|err| DomainError::persistence(err.to_string()).extend())?
            .ok_or_else(|| DomainError::not_found("user cannot be found").extend())?;
        let authorized = authorized_viewer_id(ctx).await?.is_some_and(|viewer| viewer == user.id);
        Ok(User { user, authorized })
    }
}
