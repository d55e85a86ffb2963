//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters:
//! the PostgreSQL stores and the outbound SaaS gateways. Each trait exposes
//! strongly typed errors so adapters map their failures into predictable
//! variants.

use async_trait::async_trait;
use thiserror::Error;

use super::availability::BookingsIndex;
use super::booking::Booking;
use super::ids::{BookingId, ListingId, UserId};
use super::listing::Listing;
use super::user::User;

/// Errors surfaced by persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Database connectivity or pool checkout failures.
    #[error("store connection failed: {message}")]
    Connection { message: String },
    /// A query or write was rejected by the database.
    #[error("store query failed: {message}")]
    Query { message: String },
    /// A stored record could not be decoded into its domain shape.
    #[error("stored record could not be decoded: {message}")]
    Corrupt { message: String },
}

impl StoreError {
    /// Helper for connection-level failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for undecodable stored data.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Errors surfaced by outbound SaaS adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The remote service could not be reached.
    #[error("gateway transport failed: {message}")]
    Transport { message: String },
    /// The remote service did not answer in time.
    #[error("gateway timed out: {message}")]
    Timeout { message: String },
    /// The remote service answered but refused the request.
    #[error("gateway rejected the request: {message}")]
    Rejected { message: String },
    /// The response body could not be decoded.
    #[error("gateway response could not be decoded: {message}")]
    Decode { message: String },
}

impl GatewayError {
    /// Helper for transport-level failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for timeouts.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Helper for refusals.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Helper for undecodable responses.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Profile returned by the identity provider after a successful code
/// exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub id: UserId,
    pub name: String,
    pub avatar: String,
    /// Contact email address.
    pub contact: String,
}

/// Components of a geocoded address. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodedAddress {
    pub country: Option<String>,
    pub admin: Option<String>,
    pub city: Option<String>,
}

/// 1-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub page: i64,
}

impl Page {
    /// Number of records to skip; page numbers below one clamp to the start.
    pub fn offset(self) -> i64 {
        if self.page > 0 {
            (self.page - 1) * self.limit
        } else {
            0
        }
    }
}

/// Price ordering applied to listing searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    LowToHigh,
    HighToLow,
}

/// Filter and pagination for a listing search.
#[derive(Debug, Clone, Default)]
pub struct ListingSearch {
    pub country: Option<String>,
    pub admin: Option<String>,
    pub city: Option<String>,
    pub order: Option<PriceOrder>,
    pub limit: i64,
    pub page: i64,
}

/// One page of listing search results.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Total matches before pagination.
    pub total: i64,
    pub items: Vec<Listing>,
}

/// The booking record plus every side effect persisted with it.
///
/// Adapters apply the whole request in one transaction: the booking insert,
/// the host income credit, the tenant and listing reference appends, and the
/// index contribution merged into the freshest stored value under a lock on
/// the listing row.
#[derive(Debug, Clone)]
pub struct PersistBooking {
    pub booking: Booking,
    pub host: UserId,
    /// Amount charged, credited to the host.
    pub total: i64,
    /// Index produced by extending the listing's index over the stay.
    pub index: BookingsIndex,
}

/// Point lookups and identity-driven writes for user records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user by id.
    async fn find(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Fetch a user only when `token` matches the stored session token.
    async fn find_by_id_and_token(
        &self,
        id: &UserId,
        token: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Insert a user from an identity profile, or refresh the profile fields
    /// of an existing record. Either way the session token is replaced.
    async fn upsert_identity(
        &self,
        profile: &IdentityProfile,
        token: &str,
    ) -> Result<User, StoreError>;

    /// Replace the session token, returning the updated user if they exist.
    async fn rotate_token(&self, id: &UserId, token: &str)
    -> Result<Option<User>, StoreError>;

    /// Set or clear the payment wallet, returning the updated user if they
    /// exist.
    async fn set_wallet(
        &self,
        id: &UserId,
        wallet_id: Option<String>,
    ) -> Result<Option<User>, StoreError>;

    /// Fetch the given users' bookings page-wise, oldest first.
    async fn bookings_page(
        &self,
        ids: &[BookingId],
        page: Page,
    ) -> Result<Vec<Booking>, StoreError>;
}

/// Lookups, search, and creation for listing records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Fetch a listing by id.
    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;

    /// Insert a listing and append its id to the host's listing list in one
    /// transaction.
    async fn create_for_host(&self, listing: &Listing) -> Result<(), StoreError>;

    /// Search listings by location filters with price ordering.
    async fn search(&self, search: &ListingSearch) -> Result<ListingPage, StoreError>;

    /// Fetch the given listings page-wise, oldest first.
    async fn find_page(&self, ids: &[ListingId], page: Page)
    -> Result<Vec<Listing>, StoreError>;
}

/// Insert-only booking creation plus reference-list reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a booking and all of its side effects atomically.
    async fn create(&self, request: &PersistBooking) -> Result<(), StoreError>;

    /// Fetch the given bookings page-wise, oldest first.
    async fn find_page(&self, ids: &[BookingId], page: Page)
    -> Result<Vec<Booking>, StoreError>;
}

/// Payment capture and wallet onboarding against the payment gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Capture `amount` from `source` for the connected `destination_account`.
    ///
    /// Succeeds only when the gateway reports the charge captured.
    async fn charge(
        &self,
        amount: i64,
        source: &str,
        destination_account: &str,
    ) -> Result<(), GatewayError>;

    /// Exchange an onboarding OAuth code for a connected-account id.
    async fn connect(&self, code: &str) -> Result<String, GatewayError>;

    /// Deauthorise a previously connected account.
    async fn disconnect(&self, account_id: &str) -> Result<(), GatewayError>;
}

/// OAuth identity provider used for login.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization URL clients are redirected to.
    fn auth_url(&self) -> String;

    /// Exchange an authorization code for the viewer's profile.
    async fn login(&self, code: &str) -> Result<IdentityProfile, GatewayError>;
}

/// Forward geocoding of free-form addresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve an address into country/admin/city components.
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GatewayError>;
}

/// Image hosting for listing photos.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload a base64-encoded image, returning its hosted URL.
    async fn upload(&self, image: &str) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10, 1, 0)]
    #[case(10, 2, 10)]
    #[case(4, 3, 8)]
    #[case(10, 0, 0)]
    #[case(10, -1, 0)]
    fn page_offset_is_one_based_and_clamped(
        #[case] limit: i64,
        #[case] page: i64,
        #[case] expected: i64,
    ) {
        assert_eq!(Page { limit, page }.offset(), expected);
    }
}
