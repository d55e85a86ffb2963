//! Viewer identity resolved from request credentials.

use super::ids::UserId;
use super::ports::{StoreError, UserStore};
use super::user::User;

/// Session-derived credentials presented by the current request.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    /// Viewer id stored in the session cookie.
    pub viewer_id: Option<UserId>,
    /// CSRF token supplied via request header; must match the token stored on
    /// the user record.
    pub csrf_token: Option<String>,
}

/// The identity the current request acts as.
///
/// Mirrors what login returns to clients: populated for an authenticated
/// viewer, bare for an anonymous one. `did_request` marks that the server
/// processed the request either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub id: Option<UserId>,
    pub token: Option<String>,
    pub avatar: Option<String>,
    pub wallet_id: Option<String>,
    pub did_request: bool,
}

impl Viewer {
    /// An anonymous viewer.
    pub fn anonymous() -> Self {
        Self {
            did_request: true,
            ..Self::default()
        }
    }

    /// Viewer details for an authenticated user.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: Some(user.id.clone()),
            token: Some(user.token.clone()),
            avatar: Some(user.avatar.clone()),
            wallet_id: user.wallet_id.clone(),
            did_request: true,
        }
    }
}

/// Resolve the authenticated user for the request, if any.
///
/// Requires both the session viewer id and a header token matching the one
/// stored on the user record; anything less resolves to `None` rather than an
/// error so read paths can degrade to public data.
pub async fn authorize(
    users: &dyn UserStore,
    credentials: &SessionCredentials,
) -> Result<Option<User>, StoreError> {
    let (Some(id), Some(token)) = (
        credentials.viewer_id.as_ref(),
        credentials.csrf_token.as_deref(),
    ) else {
        return Ok(None);
    };
    users.find_by_id_and_token(id, token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockUserStore;

    fn sample_user() -> User {
        User {
            id: UserId::new("viewer-1").expect("valid id"),
            name: "Ada".into(),
            token: "token-1".into(),
            avatar: "https://img.invalid/ada.png".into(),
            contact: "ada@example.com".into(),
            wallet_id: None,
            income: 0,
            bookings: Vec::new(),
            listings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn missing_credentials_resolve_to_none_without_a_lookup() {
        let users = MockUserStore::new();
        let resolved = authorize(&users, &SessionCredentials::default())
            .await
            .expect("authorize succeeds");
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn token_and_id_together_resolve_the_user() {
        let user = sample_user();
        let expected = user.clone();
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id_and_token()
            .withf(|id, token| id.as_str() == "viewer-1" && token == "token-1")
            .return_once(move |_, _| Ok(Some(user)));

        let credentials = SessionCredentials {
            viewer_id: Some(UserId::new("viewer-1").expect("valid id")),
            csrf_token: Some("token-1".into()),
        };
        let resolved = authorize(&users, &credentials)
            .await
            .expect("authorize succeeds");
        assert_eq!(resolved, Some(expected));
    }

    #[test]
    fn viewer_from_user_copies_identity_fields() {
        let user = sample_user();
        let viewer = Viewer::from_user(&user);
        assert_eq!(viewer.id, Some(user.id));
        assert_eq!(viewer.token, Some("token-1".into()));
        assert!(viewer.did_request);
        assert_eq!(Viewer::anonymous().id, None);
    }
}
