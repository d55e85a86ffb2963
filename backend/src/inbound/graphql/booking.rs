//! Booking resolvers: creation and lazy reference resolution.

use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, ID, InputObject, Object, Result};
use chrono::NaiveDate;

use crate::domain::{CreateBookingRequest, DomainError, ListingId};

use super::listing::Listing;
use super::user::User;
use super::{GraphQlData, RequestSession};

/// A confirmed stay. Listing and tenant resolve lazily on demand.
pub struct Booking(pub(super) crate::domain::Booking);

#[Object]
impl Booking {
    async fn id(&self) -> ID {
        ID::from(self.0.id.as_str())
    }

    async fn listing(&self, ctx: &Context<'_>) -> Result<Listing> {
        let data = ctx.data::<GraphQlData>()?;
        let listing = data
            .listings
            .find(&self.0.listing)
            .await
            .map_err(|err| DomainError::persistence(err.to_string()).extend())?
            .ok_or_else(|| DomainError::not_found("listing cannot be found").extend())?;
        Ok(Listing::public(listing))
    }

    async fn tenant(&self, ctx: &Context<'_>) -> Result<User> {
        let data = ctx.data::<GraphQlData>()?;
        let tenant = data
            .users
            .find(&self.0.tenant)
            .await
            .map_err(|err| DomainError::persistence(err.to_string()).extend())?
            .ok_or_else(|| DomainError::not_found("tenant cannot be found").extend())?;
        Ok(User::public(tenant))
    }

    async fn check_in(&self) -> String {
        self.0.check_in.to_string()
    }

    async fn check_out(&self) -> String {
        self.0.check_out.to_string()
    }
}

#[derive(InputObject)]
struct CreateBookingInput {
    /// Listing to book.
    id: ID,
    /// Opaque payment-source token from the client.
    source: String,
    /// First night, `YYYY-MM-DD`.
    check_in: String,
    /// Last night, `YYYY-MM-DD`.
    check_out: String,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        DomainError::invalid_input(format!("{field} must be a YYYY-MM-DD date")).extend()
    })
}

/// Booking mutation root.
#[derive(Default)]
pub struct BookingMutation;

#[Object]
impl BookingMutation {
    /// Book a stay at a listing, capturing payment for its host.
    async fn create_booking(
        &self,
        ctx: &Context<'_>,
        input: CreateBookingInput,
    ) -> Result<Booking> {
        let data = ctx.data::<GraphQlData>()?;
        let session = ctx.data::<Arc<RequestSession>>()?;
        let listing_id = ListingId::new(input.id.as_str())
            .map_err(|err| DomainError::invalid_input(err.to_string()).extend())?;
        let request = CreateBookingRequest {
            listing_id,
            source: input.source,
            check_in: parse_date("checkIn", &input.check_in)?,
            check_out: parse_date("checkOut", &input.check_out)?,
        };
        let booking = data
            .booking_service
            .create_booking(session.credentials(), request)
            .await
            .map_err(|err| err.extend())?;
        Ok(Booking(booking))
    }
}
