//! actix-web handler bridging HTTP requests into the GraphQL schema.
//!
//! The session cookie and CSRF header are snapshotted into a
//! [`RequestSession`] before execution because actix's `Session` handle is
//! not `Send`; any session directive the resolvers record is applied once
//! execution finishes.

use std::sync::Arc;

use actix_session::Session;
use actix_web::{HttpRequest, web};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use tracing::warn;

use crate::domain::{SessionCredentials, SessionDirective, UserId};

use super::{MarketplaceSchema, RequestSession};

/// Session key the viewer id is stored under.
pub const VIEWER_SESSION_KEY: &str = "viewer";

/// Header carrying the viewer's CSRF token.
pub const CSRF_TOKEN_HEADER: &str = "X-CSRF-TOKEN";

fn extract_credentials(session: &Session, request: &HttpRequest) -> SessionCredentials {
    let viewer_id = session
        .get::<String>(VIEWER_SESSION_KEY)
        .ok()
        .flatten()
        .and_then(|id| UserId::new(id).ok());
    let csrf_token = request
        .headers()
        .get(CSRF_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    SessionCredentials {
        viewer_id,
        csrf_token,
    }
}

fn apply_directive(session: &Session, directive: Option<SessionDirective>) {
    match directive {
        Some(SessionDirective::SetViewer(id)) => {
            if let Err(error) = session.insert(VIEWER_SESSION_KEY, id.as_str()) {
                warn!(error = %error, "failed to store viewer id in session");
            }
        }
        Some(SessionDirective::Purge) => session.purge(),
        Some(SessionDirective::Keep) | None => {}
    }
}

/// Execute a GraphQL request against the schema.
pub async fn graphql(
    schema: web::Data<MarketplaceSchema>,
    session: Session,
    http_request: HttpRequest,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let request_session = Arc::new(RequestSession::new(extract_credentials(
        &session,
        &http_request,
    )));
    let response = schema
        .execute(request.into_inner().data(Arc::clone(&request_session)))
        .await;
    apply_directive(&session, request_session.take_directive());
    response.into()
}
