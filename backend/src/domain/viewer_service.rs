//! Viewer workflows: OAuth login, logout, and wallet onboarding.

use std::sync::Arc;

use super::error::{DomainError, DomainResult};
use super::ids::UserId;
use super::ports::{IdentityProvider, PaymentGateway, StoreError, UserStore};
use super::user::User;
use super::viewer::{SessionCredentials, Viewer, authorize};

/// Session mutation the transport layer must apply after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDirective {
    /// Store the viewer id in the session cookie.
    SetViewer(UserId),
    /// Remove any stored viewer.
    Purge,
    /// Leave the session untouched.
    Keep,
}

/// Outcome of a login or logout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub viewer: Viewer,
    pub session: SessionDirective,
}

/// Orchestrates viewer identity against the identity provider, the user
/// store, and the payment gateway.
#[derive(Clone)]
pub struct ViewerService {
    users: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
    payments: Arc<dyn PaymentGateway>,
}

impl ViewerService {
    /// Create a service over the given adapters.
    pub fn new(
        users: Arc<dyn UserStore>,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            users,
            identity,
            payments,
        }
    }

    /// Authorization URL clients are redirected to for login.
    pub fn auth_url(&self) -> String {
        self.identity.auth_url()
    }

    /// Resolve the authenticated user for the request, if any.
    pub async fn authorize(&self, credentials: &SessionCredentials) -> DomainResult<Option<User>> {
        authorize(self.users.as_ref(), credentials)
            .await
            .map_err(store_error)
    }

    /// Log in, either by exchanging a provider code or from the session
    /// cookie. Both paths rotate the stored CSRF token.
    pub async fn log_in(
        &self,
        credentials: &SessionCredentials,
        code: Option<&str>,
    ) -> DomainResult<LoginOutcome> {
        let token = generate_token();
        match code {
            Some(code) => self.log_in_via_provider(code, &token).await,
            None => self.log_in_via_cookie(credentials, &token).await,
        }
    }

    async fn log_in_via_provider(&self, code: &str, token: &str) -> DomainResult<LoginOutcome> {
        let profile = self
            .identity
            .login(code)
            .await
            .map_err(|err| DomainError::internal(format!("identity login failed: {err}")))?;
        let user = self
            .users
            .upsert_identity(&profile, token)
            .await
            .map_err(store_error)?;
        let session = SessionDirective::SetViewer(user.id.clone());
        Ok(LoginOutcome {
            viewer: Viewer::from_user(&user),
            session,
        })
    }

    async fn log_in_via_cookie(
        &self,
        credentials: &SessionCredentials,
        token: &str,
    ) -> DomainResult<LoginOutcome> {
        let Some(viewer_id) = credentials.viewer_id.as_ref() else {
            return Ok(LoginOutcome {
                viewer: Viewer::anonymous(),
                session: SessionDirective::Purge,
            });
        };
        match self
            .users
            .rotate_token(viewer_id, token)
            .await
            .map_err(store_error)?
        {
            Some(user) => Ok(LoginOutcome {
                viewer: Viewer::from_user(&user),
                session: SessionDirective::Keep,
            }),
            // The cookie references a user that no longer exists.
            None => Ok(LoginOutcome {
                viewer: Viewer::anonymous(),
                session: SessionDirective::Purge,
            }),
        }
    }

    /// Log out the current viewer.
    pub fn log_out(&self) -> LoginOutcome {
        LoginOutcome {
            viewer: Viewer::anonymous(),
            session: SessionDirective::Purge,
        }
    }

    /// Exchange an onboarding code at the payment gateway and store the
    /// resulting wallet id on the viewer.
    pub async fn connect_wallet(
        &self,
        credentials: &SessionCredentials,
        code: &str,
    ) -> DomainResult<Viewer> {
        let viewer = self
            .authorize(credentials)
            .await?
            .ok_or_else(|| DomainError::unauthenticated("viewer cannot be found"))?;
        let wallet_id = self
            .payments
            .connect(code)
            .await
            .map_err(|err| DomainError::internal(format!("wallet grant failed: {err}")))?;
        let user = self
            .users
            .set_wallet(&viewer.id, Some(wallet_id))
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::not_found("viewer cannot be found"))?;
        Ok(Viewer::from_user(&user))
    }

    /// Deauthorise the viewer's wallet at the gateway and clear the stored id.
    pub async fn disconnect_wallet(&self, credentials: &SessionCredentials) -> DomainResult<Viewer> {
        let viewer = self
            .authorize(credentials)
            .await?
            .ok_or_else(|| DomainError::unauthenticated("viewer cannot be found"))?;
        let Some(wallet_id) = viewer.wallet_id.as_deref() else {
            return Err(DomainError::invalid_operation(
                "viewer has no connected wallet",
            ));
        };
        self.payments
            .disconnect(wallet_id)
            .await
            .map_err(|err| DomainError::internal(format!("wallet deauthorisation failed: {err}")))?;
        let user = self
            .users
            .set_wallet(&viewer.id, None)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::not_found("viewer cannot be found"))?;
        Ok(Viewer::from_user(&user))
    }
}

/// The per-session CSRF token: 16 random bytes, hex-encoded.
fn generate_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

fn store_error(err: StoreError) -> DomainError {
    DomainError::persistence(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{
        GatewayError, IdentityProfile, MockIdentityProvider, MockPaymentGateway, MockUserStore,
    };

    fn profile() -> IdentityProfile {
        IdentityProfile {
            id: UserId::new("identity-7").expect("valid id"),
            name: "Grace".into(),
            avatar: "https://img.invalid/grace.png".into(),
            contact: "grace@example.com".into(),
        }
    }

    fn stored_user(token: &str) -> User {
        User {
            id: UserId::new("identity-7").expect("valid id"),
            name: "Grace".into(),
            token: token.to_owned(),
            avatar: "https://img.invalid/grace.png".into(),
            contact: "grace@example.com".into(),
            wallet_id: None,
            income: 0,
            bookings: Vec::new(),
            listings: Vec::new(),
        }
    }

    fn service(
        users: MockUserStore,
        identity: MockIdentityProvider,
        payments: MockPaymentGateway,
    ) -> ViewerService {
        ViewerService::new(Arc::new(users), Arc::new(identity), Arc::new(payments))
    }

    #[test]
    fn generated_tokens_are_32_hex_chars_and_unique() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn login_with_code_upserts_the_profile_and_sets_the_session() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_login()
            .withf(|code| code == "auth-code")
            .return_once(|_| Ok(profile()));
        let mut users = MockUserStore::new();
        users
            .expect_upsert_identity()
            .withf(|p, token| p.id.as_str() == "identity-7" && token.len() == 32)
            .returning(|_, token| Ok(stored_user(token)));

        let outcome = service(users, identity, MockPaymentGateway::new())
            .log_in(&SessionCredentials::default(), Some("auth-code"))
            .await
            .expect("login succeeds");
        assert_eq!(
            outcome.session,
            SessionDirective::SetViewer(UserId::new("identity-7").expect("valid id"))
        );
        assert_eq!(outcome.viewer.id.as_ref().map(UserId::as_str), Some("identity-7"));
        assert!(outcome.viewer.did_request);
    }

    #[tokio::test]
    async fn cookie_login_rotates_the_token_and_keeps_the_session() {
        let mut users = MockUserStore::new();
        users
            .expect_rotate_token()
            .withf(|id, token| id.as_str() == "identity-7" && token.len() == 32)
            .returning(|_, token| Ok(Some(stored_user(token))));

        let credentials = SessionCredentials {
            viewer_id: Some(UserId::new("identity-7").expect("valid id")),
            csrf_token: None,
        };
        let outcome = service(users, MockIdentityProvider::new(), MockPaymentGateway::new())
            .log_in(&credentials, None)
            .await
            .expect("login succeeds");
        assert_eq!(outcome.session, SessionDirective::Keep);
        assert!(outcome.viewer.token.is_some());
    }

    #[tokio::test]
    async fn cookie_login_for_a_vanished_user_purges_the_session() {
        let mut users = MockUserStore::new();
        users.expect_rotate_token().return_once(|_, _| Ok(None));

        let credentials = SessionCredentials {
            viewer_id: Some(UserId::new("identity-7").expect("valid id")),
            csrf_token: None,
        };
        let outcome = service(users, MockIdentityProvider::new(), MockPaymentGateway::new())
            .log_in(&credentials, None)
            .await
            .expect("login succeeds");
        assert_eq!(outcome.session, SessionDirective::Purge);
        assert_eq!(outcome.viewer, Viewer::anonymous());
    }

    #[tokio::test]
    async fn connect_wallet_requires_an_authenticated_viewer() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id_and_token()
            .return_once(|_, _| Ok(None));

        let credentials = SessionCredentials {
            viewer_id: Some(UserId::new("identity-7").expect("valid id")),
            csrf_token: Some("stale".into()),
        };
        let err = service(users, MockIdentityProvider::new(), MockPaymentGateway::new())
            .connect_wallet(&credentials, "grant-code")
            .await
            .expect_err("anonymous connect must fail");
        assert_eq!(err.code(), ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn connect_wallet_stores_the_granted_account() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id_and_token()
            .return_once(|_, _| Ok(Some(stored_user("tok"))));
        users
            .expect_set_wallet()
            .withf(|id, wallet| {
                id.as_str() == "identity-7" && wallet.as_deref() == Some("acct_42")
            })
            .return_once(|_, wallet| {
                let mut user = stored_user("tok");
                user.wallet_id = wallet;
                Ok(Some(user))
            });
        let mut payments = MockPaymentGateway::new();
        payments
            .expect_connect()
            .withf(|code| code == "grant-code")
            .return_once(|_| Ok("acct_42".into()));

        let credentials = SessionCredentials {
            viewer_id: Some(UserId::new("identity-7").expect("valid id")),
            csrf_token: Some("tok".into()),
        };
        let viewer = service(users, MockIdentityProvider::new(), payments)
            .connect_wallet(&credentials, "grant-code")
            .await
            .expect("connect succeeds");
        assert_eq!(viewer.wallet_id.as_deref(), Some("acct_42"));
    }

    #[tokio::test]
    async fn disconnect_without_a_wallet_is_an_invalid_operation() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id_and_token()
            .return_once(|_, _| Ok(Some(stored_user("tok"))));

        let credentials = SessionCredentials {
            viewer_id: Some(UserId::new("identity-7").expect("valid id")),
            csrf_token: Some("tok".into()),
        };
        let err = service(users, MockIdentityProvider::new(), MockPaymentGateway::new())
            .disconnect_wallet(&credentials)
            .await
            .expect_err("walletless disconnect must fail");
        assert_eq!(err.code(), ErrorCode::InvalidOperation);
    }

    #[tokio::test]
    async fn failed_grant_does_not_touch_the_store() {
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id_and_token()
            .return_once(|_, _| Ok(Some(stored_user("tok"))));
        let mut payments = MockPaymentGateway::new();
        payments
            .expect_connect()
            .return_once(|_| Err(GatewayError::rejected("bad grant")));

        let credentials = SessionCredentials {
            viewer_id: Some(UserId::new("identity-7").expect("valid id")),
            csrf_token: Some("tok".into()),
        };
        let err = service(users, MockIdentityProvider::new(), payments)
            .connect_wallet(&credentials, "grant-code")
            .await
            .expect_err("failed grant must fail");
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
