//! Server assembly: configuration, adapter wiring, and the schema builder.

use std::sync::Arc;

use crate::domain::{BookingService, ListingService, ViewerService};
use crate::inbound::graphql::{GraphQlData, MarketplaceSchema, build_schema};
use crate::outbound::persistence::{
    DbPool, DieselBookingStore, DieselListingStore, DieselUserStore,
};
use crate::outbound::{
    CloudinaryImageStore, GoogleIdentity, MapQuestGeocoder, StripeGateway,
};

pub mod config;
pub mod health;

pub use config::{AppConfig, ConfigError};
pub use health::HealthState;

/// Errors raised while wiring the outbound adapters.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    /// An HTTP client for a SaaS adapter could not be constructed.
    #[error("failed to build outbound HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Wire the production adapters and services into an executable schema.
pub fn build_production_schema(
    config: &AppConfig,
    pool: DbPool,
) -> Result<MarketplaceSchema, WiringError> {
    let users: Arc<DieselUserStore> = Arc::new(DieselUserStore::new(pool.clone()));
    let listings = Arc::new(DieselListingStore::new(pool.clone()));
    let bookings = Arc::new(DieselBookingStore::new(pool));
    let payments = Arc::new(StripeGateway::new(config.stripe.clone())?);
    let identity = Arc::new(GoogleIdentity::new(config.google.clone())?);
    let geocoder = Arc::new(MapQuestGeocoder::new(config.geocoder.clone())?);
    let images = Arc::new(CloudinaryImageStore::new(config.images.clone())?);
    let clock = Arc::new(mockable::DefaultClock);

    let viewer_service = ViewerService::new(users.clone(), identity, payments.clone());
    let listing_service = ListingService::new(
        users.clone(),
        listings.clone(),
        geocoder,
        images,
    );
    let booking_service = BookingService::new(
        users.clone(),
        listings.clone(),
        bookings.clone(),
        payments,
        clock,
    );

    Ok(build_schema(GraphQlData {
        users,
        listings,
        bookings,
        viewer_service,
        listing_service,
        booking_service,
    }))
}
