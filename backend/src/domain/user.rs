//! Marketplace user model.

use serde::{Deserialize, Serialize};

use super::ids::{BookingId, ListingId, UserId};

/// A marketplace participant.
///
/// Role-agnostic: the same record hosts listings and books stays with other
/// hosts.
///
/// ## Invariants
/// - `income` only ever increases, and only the booking workflow credits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Current session CSRF token; rotated on every login.
    pub token: String,
    pub avatar: String,
    /// Contact email sourced from the identity provider.
    pub contact: String,
    /// Connected payment-gateway account, present once onboarding completes.
    pub wallet_id: Option<String>,
    /// Lifetime host earnings in the smallest currency unit.
    pub income: i64,
    /// Bookings made by this user as tenant, oldest first.
    pub bookings: Vec<BookingId>,
    /// Listings hosted by this user, oldest first.
    pub listings: Vec<ListingId>,
}
