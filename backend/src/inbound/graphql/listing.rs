//! Listing resolvers: lookup, location search, and hosting.

use std::sync::Arc;

use async_graphql::{Context, Enum, ErrorExtensions, ID, InputObject, Object, Result};

use crate::domain::ports::{Page, PriceOrder};
use crate::domain::{DomainError, HostListingRequest, ListingId};

use super::booking::Booking;
use super::user::{Bookings, Listings, User};
use super::{GraphQlData, RequestSession};

/// Property category advertised on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[graphql(name = "ListingType")]
pub enum ListingType {
    Apartment,
    House,
}

impl From<ListingType> for crate::domain::ListingType {
    fn from(value: ListingType) -> Self {
        match value {
            ListingType::Apartment => Self::Apartment,
            ListingType::House => Self::House,
        }
    }
}

impl From<crate::domain::ListingType> for ListingType {
    fn from(value: crate::domain::ListingType) -> Self {
        match value {
            crate::domain::ListingType::Apartment => Self::Apartment,
            crate::domain::ListingType::House => Self::House,
        }
    }
}

/// Price ordering applied to listing searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum ListingsFilter {
    PriceLowToHigh,
    PriceHighToLow,
}

impl From<ListingsFilter> for PriceOrder {
    fn from(value: ListingsFilter) -> Self {
        match value {
            ListingsFilter::PriceLowToHigh => Self::LowToHigh,
            ListingsFilter::PriceHighToLow => Self::HighToLow,
        }
    }
}

/// A bookable property. The bookings list resolves only for the host.
pub struct Listing {
    pub(super) listing: crate::domain::Listing,
    pub(super) authorized: bool,
}

impl Listing {
    pub(super) fn public(listing: crate::domain::Listing) -> Self {
        Self {
            listing,
            authorized: false,
        }
    }
}

#[Object]
impl Listing {
    async fn id(&self) -> ID {
        ID::from(self.listing.id.as_str())
    }

    async fn title(&self) -> &str {
        &self.listing.title
    }

    async fn description(&self) -> &str {
        &self.listing.description
    }

    async fn image(&self) -> &str {
        &self.listing.image
    }

    async fn host(&self, ctx: &Context<'_>) -> Result<User> {
        let data = ctx.data::<GraphQlData>()?;
        let host = data
            .users
            .find(&self.listing.host)
            .await
            .map_err(|err| DomainError::persistence(err.to_string()).extend())?
            .ok_or_else(|| DomainError::not_found("host cannot be found").extend())?;
        Ok(User::public(host))
    }

    #[graphql(name = "type")]
    async fn listing_type(&self) -> ListingType {
        self.listing.listing_type.into()
    }

    async fn address(&self) -> &str {
        &self.listing.address
    }

    async fn country(&self) -> &str {
        &self.listing.country
    }

    async fn admin(&self) -> &str {
        &self.listing.admin
    }

    async fn city(&self) -> &str {
        &self.listing.city
    }

    /// Bookings against this listing; only visible to its host.
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
            .bookings
            .find_page(
                &self.listing.bookings,
                Page {
                    limit: i64::from(limit),
                    page: i64::from(page),
                },
            )
            .await
            .map_err(|err| DomainError::persistence(err.to_string()).extend())?;
        Ok(Some(Bookings {
            total: self.listing.bookings.len() as i64,
            result: result.into_iter().map(Booking).collect(),
        }))
    }

    /// The booked-day index as a JSON document.
    async fn bookings_index(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.listing.bookings_index)
            .map_err(|err| DomainError::internal(err.to_string()).extend())?)
    }

    async fn price(&self) -> i64 {
        self.listing.price
    }

    async fn num_of_guests(&self) -> i32 {
        self.listing.num_of_guests
    }
}

#[derive(InputObject)]
struct HostListingInput {
    title: String,
    description: String,
    /// Base64-encoded photo.
    image: String,
    #[graphql(name = "type")]
    listing_type: ListingType,
    address: String,
    /// Nightly price in the smallest currency unit.
    price: i64,
    num_of_guests: i32,
}

/// Listing query root.
#[derive(Default)]
pub struct ListingQuery;

#[Object]
impl ListingQuery {
    /// Fetch a listing by id.
    async fn listing(&self, ctx: &Context<'_>, id: ID) -> Result<Listing> {
        let data = ctx.data::<GraphQlData>()?;
        let session = ctx.data::<Arc<RequestSession>>()?;
        let id = ListingId::new(id.as_str())
            .map_err(|err| DomainError::invalid_input(err.to_string()).extend())?;
        let (listing, authorized) = data
            .listing_service
            .listing(session.credentials(), &id)
            .await
            .map_err(|err| err.extend())?;
        Ok(Listing { listing, authorized })
    }

    /// Search listings, optionally narrowed to a location.
    async fn listings(
        &self,
        ctx: &Context<'_>,
        location: Option<String>,
        filter: Option<ListingsFilter>,
        limit: i32,
        page: i32,
    ) -> Result<Listings> {
        let data = ctx.data::<GraphQlData>()?;
        let result = data
            .listing_service
            .listings(
                location.as_deref(),
                filter.map(PriceOrder::from),
                Page {
                    limit: i64::from(limit),
                    page: i64::from(page),
                },
            )
            .await
            .map_err(|err| err.extend())?;
        Ok(Listings {
            region: result.region,
            total: result.total,
            result: result.items.into_iter().map(Listing::public).collect(),
        })
    }
}

/// Listing mutation root.
#[derive(Default)]
pub struct ListingMutation;

#[Object]
impl ListingMutation {
    /// Host a new listing.
    async fn host_listing(&self, ctx: &Context<'_>, input: HostListingInput) -> Result<Listing> {
        let data = ctx.data::<GraphQlData>()?;
        let session = ctx.data::<Arc<RequestSession>>()?;
        let request = HostListingRequest {
            title: input.title,
            description: input.description,
            image: input.image,
            listing_type: input.listing_type.into(),
            address: input.address,
            price: input.price,
            num_of_guests: input.num_of_guests,
        };
        let listing = data
            .listing_service
            .host_listing(session.credentials(), request)
            .await
            .map_err(|err| err.extend())?;
        Ok(Listing::public(listing))
    }
}
