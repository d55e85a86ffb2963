//! Booking creation workflow.
//!
//! A linear pipeline: resolve the viewer, load and guard the listing,
//! validate the stay, price it, charge the host's connected account, then
//! hand the record plus all side effects to the store in one transaction.
//! Validation and reads abort with no side effect; the charge is the single
//! external effect and always precedes persistence.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use mockable::Clock;
use tracing::error;

use super::availability::extend_index;
use super::booking::Booking;
use super::error::{DomainError, DomainResult};
use super::ids::{BookingId, ListingId};
use super::ports::{BookingStore, ListingStore, PaymentGateway, PersistBooking, StoreError, UserStore};
use super::viewer::{SessionCredentials, authorize};

/// How far ahead a stay may begin or end, in days from today.
pub const BOOKING_HORIZON_DAYS: u64 = 30;

/// Request to book a stay, as received from the API layer.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub listing_id: ListingId,
    /// Opaque payment-source token supplied by the client.
    pub source: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Orchestrates booking creation across the stores and the payment gateway.
#[derive(Clone)]
pub struct BookingService {
    users: Arc<dyn UserStore>,
    listings: Arc<dyn ListingStore>,
    bookings: Arc<dyn BookingStore>,
    payments: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl BookingService {
    /// Create a service over the given adapters.
    pub fn new(
        users: Arc<dyn UserStore>,
        listings: Arc<dyn ListingStore>,
        bookings: Arc<dyn BookingStore>,
        payments: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            users,
            listings,
            bookings,
            payments,
            clock,
        }
    }

    /// Book a stay for the viewer identified by `credentials`.
    pub async fn create_booking(
        &self,
        credentials: &SessionCredentials,
        request: CreateBookingRequest,
    ) -> DomainResult<Booking> {
        let viewer = authorize(self.users.as_ref(), credentials)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::unauthenticated("viewer cannot be found"))?;

        let listing = self
            .listings
            .find(&request.listing_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::not_found("listing cannot be found"))?;

        if listing.host == viewer.id {
            return Err(DomainError::invalid_operation(
                "viewer cannot book their own listing",
            ));
        }

        self.validate_dates(request.check_in, request.check_out)?;

        let contribution = extend_index(&listing.bookings_index, request.check_in, request.check_out);
        let total = total_price(listing.price, request.check_in, request.check_out);

        let host = self
            .users
            .find(&listing.host)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::not_found("host cannot be found"))?;
        let Some(wallet_id) = host.wallet_id.as_deref() else {
            return Err(DomainError::payment_setup_required(
                "host has not connected a payment wallet",
            ));
        };

        self.payments
            .charge(total, &request.source, wallet_id)
            .await
            .map_err(|err| DomainError::payment_failed(format!("charge was not captured: {err}")))?;

        let booking = Booking {
            id: BookingId::generate(),
            listing: listing.id.clone(),
            tenant: viewer.id.clone(),
            check_in: request.check_in,
            check_out: request.check_out,
        };
        let persist = PersistBooking {
            booking: booking.clone(),
            host: host.id.clone(),
            total,
            index: contribution,
        };
        if let Err(err) = self.bookings.create(&persist).await {
            // Funds moved but nothing was recorded; flag for manual
            // reconciliation.
            error!(
                booking_id = %booking.id,
                listing_id = %booking.listing,
                tenant_id = %booking.tenant,
                amount = total,
                error = %err,
                "booking persistence failed after charge capture; manual reconciliation required",
            );
            return Err(DomainError::persistence(format!(
                "booking could not be recorded: {err}"
            )));
        }

        Ok(booking)
    }

    fn validate_dates(&self, check_in: NaiveDate, check_out: NaiveDate) -> DomainResult<()> {
        if check_out < check_in {
            return Err(DomainError::invalid_input(
                "check out date cannot be before check in date",
            ));
        }
        let today = self.clock.utc().date_naive();
        let horizon = today
            .checked_add_days(Days::new(BOOKING_HORIZON_DAYS))
            .unwrap_or(NaiveDate::MAX);
        if check_in > horizon || check_out > horizon {
            return Err(DomainError::invalid_input(format!(
                "stays may only be booked up to {BOOKING_HORIZON_DAYS} days ahead"
            )));
        }
        Ok(())
    }
}

/// Nightly price times the length of the stay, billed inclusive of both
/// boundary dates.
fn total_price(nightly: i64, check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    let nights = (check_out - check_in).num_days();
    nightly * (nights + 1)
}

fn store_error(err: StoreError) -> DomainError {
    DomainError::persistence(err.to_string())
}
