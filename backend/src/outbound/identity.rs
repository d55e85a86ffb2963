//! Google-backed OAuth identity adapter.
//!
//! Exchanges an authorization code for an access token, then fetches the
//! OpenID userinfo document. A profile missing any required field is a
//! decode failure rather than a partially-populated identity.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::domain::ids::UserId;
use crate::domain::ports::{GatewayError, IdentityProfile, IdentityProvider};

use super::http::{map_status_error, map_transport_error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const AUTH_SCOPES: &str = "openid email profile";

/// Client registration and endpoint settings for the Google adapter.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URL registered with the provider; the client lands here with
    /// the authorization code.
    pub redirect_url: String,
    /// Authorization endpoint users are sent to.
    pub auth_url: Url,
    /// Token exchange endpoint.
    pub token_url: Url,
    /// OpenID userinfo endpoint.
    pub userinfo_url: Url,
}

impl GoogleConfig {
    /// Settings against the public Google endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error when the well-known endpoint URLs fail to parse,
    /// which indicates a programming error rather than bad input.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            auth_url: Url::parse("https://accounts.google.com/o/oauth2/v2/auth")?,
            token_url: Url::parse("https://oauth2.googleapis.com/token")?,
            userinfo_url: Url::parse("https://openidconnect.googleapis.com/v1/userinfo")?,
        })
    }
}

/// Google adapter implementing the [`IdentityProvider`] port.
pub struct GoogleIdentity {
    client: Client,
    config: GoogleConfig,
}

impl GoogleIdentity {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: GoogleConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(config: GoogleConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Deserialize)]
struct TokenDto {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct UserinfoDto {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

fn parse_profile(body: &[u8]) -> Result<IdentityProfile, GatewayError> {
    let info: UserinfoDto = serde_json::from_slice(body)
        .map_err(|err| GatewayError::decode(format!("invalid userinfo payload: {err}")))?;
    let (Some(sub), Some(name), Some(picture), Some(email)) =
        (info.sub, info.name, info.picture, info.email)
    else {
        return Err(GatewayError::decode(
            "identity profile missing required fields",
        ));
    };
    let id = UserId::new(sub)
        .map_err(|err| GatewayError::decode(format!("identity profile id: {err}")))?;
    Ok(IdentityProfile {
        id,
        name,
        avatar: picture,
        contact: email,
    })
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    fn auth_url(&self) -> String {
        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", AUTH_SCOPES)
            .append_pair("access_type", "online");
        url.into()
    }

    async fn login(&self, code: &str) -> Result<IdentityProfile, GatewayError> {
        let response = self
            .client
            .post(self.config.token_url.clone())
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let token: TokenDto = serde_json::from_slice(body.as_ref())
            .map_err(|err| GatewayError::decode(format!("invalid token payload: {err}")))?;

        let response = self
            .client
            .get(self.config.userinfo_url.clone())
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_profile(body.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> GoogleIdentity {
        let config = GoogleConfig::new("client-1", "secret-1", "https://app.invalid/login")
            .expect("well-known endpoints parse");
        GoogleIdentity::new(config).expect("client builds")
    }

    #[test]
    fn auth_url_carries_client_and_scopes() {
        let url = adapter().auth_url();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.invalid%2Flogin"));
    }

    #[test]
    fn complete_userinfo_parses_into_a_profile() {
        let body = br#"{
            "sub": "10857",
            "name": "Ada Lovelace",
            "picture": "https://img.invalid/ada.png",
            "email": "ada@example.com"
        }"#;
        let profile = parse_profile(body).expect("profile parses");
        assert_eq!(profile.id.as_str(), "10857");
        assert_eq!(profile.name, "Ada Lovelace");
        assert_eq!(profile.avatar, "https://img.invalid/ada.png");
        assert_eq!(profile.contact, "ada@example.com");
    }

    #[test]
    fn userinfo_missing_an_email_is_a_decode_error() {
        let body = br#"{ "sub": "10857", "name": "Ada", "picture": "p" }"#;
        assert!(matches!(
            parse_profile(body),
            Err(GatewayError::Decode { .. })
        ));
    }
}
