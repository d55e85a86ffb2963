//! GraphQL surface: schema assembly, resolver context, and error mapping.
//!
//! Keeps the domain free of wire concerns: resolvers translate GraphQL
//! inputs into domain requests, and [`DomainError`] values surface as
//! GraphQL errors carrying the stable code in their extensions.

use std::sync::Arc;
use std::sync::Mutex;

use async_graphql::{EmptySubscription, ErrorExtensions, MergedObject, Schema};

use crate::domain::ports::{BookingStore, ListingStore, UserStore};
use crate::domain::{
    BookingService, DomainError, ListingService, SessionCredentials, SessionDirective,
    ViewerService,
};

mod booking;
mod listing;
mod user;
mod viewer;

pub mod handler;

pub use handler::{VIEWER_SESSION_KEY, graphql};

/// Shared resolver dependencies stored in the schema.
pub struct GraphQlData {
    pub users: Arc<dyn UserStore>,
    pub listings: Arc<dyn ListingStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub viewer_service: ViewerService,
    pub listing_service: ListingService,
    pub booking_service: BookingService,
}

/// Per-request session view shared with resolvers.
///
/// actix's `Session` handle is not `Send`, so the HTTP handler snapshots the
/// cookie contents into this value before execution and applies whatever
/// directive the resolvers left behind afterwards.
pub struct RequestSession {
    credentials: SessionCredentials,
    directive: Mutex<Option<SessionDirective>>,
}

impl RequestSession {
    /// Snapshot the request's credentials.
    pub fn new(credentials: SessionCredentials) -> Self {
        Self {
            credentials,
            directive: Mutex::new(None),
        }
    }

    /// Credentials presented by the current request.
    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// Record a session mutation to apply once execution finishes.
    pub fn apply(&self, directive: SessionDirective) {
        if let Ok(mut slot) = self.directive.lock() {
            *slot = Some(directive);
        }
    }

    /// Take the recorded session mutation, if any.
    pub fn take_directive(&self) -> Option<SessionDirective> {
        self.directive.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl ErrorExtensions for DomainError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.message().to_owned())
            .extend_with(|_, extensions| extensions.set("code", self.code().as_str()))
    }
}

/// The query root, merged from the per-entity roots.
#[derive(MergedObject, Default)]
pub struct QueryRoot(viewer::ViewerQuery, user::UserQuery, listing::ListingQuery);

/// The mutation root, merged from the per-entity roots.
#[derive(MergedObject, Default)]
pub struct MutationRoot(
    viewer::ViewerMutation,
    listing::ListingMutation,
    booking::BookingMutation,
);

/// Executable schema over the booking-marketplace domain.
pub type MarketplaceSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Assemble the schema with its shared dependencies.
pub fn build_schema(data: GraphQlData) -> MarketplaceSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(data)
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[test]
    fn domain_errors_extend_with_their_code() {
        let error = DomainError::new(ErrorCode::PaymentFailed, "charge was not captured").extend();
        assert_eq!(error.message, "charge was not captured");
        let extensions = error.extensions.expect("extensions present");
        assert_eq!(
            extensions.get("code"),
            Some(&async_graphql::Value::from("PAYMENT_FAILED"))
        );
    }

    #[test]
    fn request_session_hands_back_the_last_directive() {
        let session = RequestSession::new(SessionCredentials::default());
        assert_eq!(session.take_directive(), None);
        session.apply(SessionDirective::Purge);
        assert_eq!(session.take_directive(), Some(SessionDirective::Purge));
        assert_eq!(session.take_directive(), None);
    }
}
