//! Stripe-backed payment gateway adapter.
//!
//! Owns transport details only: request serialisation, timeout and HTTP
//! error mapping, and JSON decoding of charge and OAuth responses. Charges
//! are captured on the platform account with a destination connected
//! account and an application fee retained per charge.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::domain::ports::{GatewayError, PaymentGateway};

use super::http::{map_status_error, map_transport_error};

/// Application fee retained on every charge, in percent of the amount.
const APPLICATION_FEE_PERCENT: i64 = 5;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Account and endpoint settings for the Stripe adapter.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// API origin, e.g. `https://api.stripe.com`.
    pub api_base: Url,
    /// Platform secret key used as the bearer credential.
    pub secret_key: String,
    /// Platform client id, required for deauthorisation.
    pub client_id: String,
}

/// Stripe adapter implementing the [`PaymentGateway`] port.
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

impl StripeGateway {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: StripeConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(config: StripeConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.config
            .api_base
            .join(path)
            .map_err(|err| GatewayError::transport(format!("invalid endpoint {path}: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct ChargeDto {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ConnectDto {
    stripe_user_id: String,
}

/// Fee retained by the platform, rounded to the nearest unit.
fn application_fee(amount: i64) -> i64 {
    (amount * APPLICATION_FEE_PERCENT + 50) / 100
}

fn parse_charge(body: &[u8]) -> Result<(), GatewayError> {
    let charge: ChargeDto = serde_json::from_slice(body)
        .map_err(|err| GatewayError::decode(format!("invalid charge payload: {err}")))?;
    if charge.status != "succeeded" {
        return Err(GatewayError::rejected(format!(
            "charge status {}",
            charge.status
        )));
    }
    Ok(())
}

fn parse_connect(body: &[u8]) -> Result<String, GatewayError> {
    let grant: ConnectDto = serde_json::from_slice(body)
        .map_err(|err| GatewayError::decode(format!("invalid grant payload: {err}")))?;
    Ok(grant.stripe_user_id)
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(
        &self,
        amount: i64,
        source: &str,
        destination_account: &str,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.endpoint("/v1/charges")?)
            .bearer_auth(&self.config.secret_key)
            .header("Stripe-Account", destination_account)
            .form(&[
                ("amount", amount.to_string()),
                ("currency", "usd".to_owned()),
                ("source", source.to_owned()),
                ("application_fee_amount", application_fee(amount).to_string()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_charge(body.as_ref())
    }

    async fn connect(&self, code: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.endpoint("/oauth/token")?)
            .bearer_auth(&self.config.secret_key)
            .form(&[("grant_type", "authorization_code"), ("code", code)])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_connect(body.as_ref())
    }

    async fn disconnect(&self, account_id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.endpoint("/oauth/deauthorize")?)
            .bearer_auth(&self.config.secret_key)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("stripe_user_id", account_id),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, 5)]
    #[case(400, 20)]
    #[case(10, 1)] // 0.5 rounds up
    #[case(9, 0)] // 0.45 rounds down
    #[case(0, 0)]
    fn application_fee_rounds_to_the_nearest_unit(#[case] amount: i64, #[case] expected: i64) {
        assert_eq!(application_fee(amount), expected);
    }

    #[test]
    fn captured_charge_parses_as_success() {
        assert!(parse_charge(br#"{ "status": "succeeded", "id": "ch_1" }"#).is_ok());
    }

    #[test]
    fn uncaptured_charge_is_rejected_with_its_status() {
        let error = parse_charge(br#"{ "status": "pending" }"#).expect_err("must fail");
        let GatewayError::Rejected { message } = error else {
            panic!("expected rejection, got {error:?}");
        };
        assert!(message.contains("pending"));
    }

    #[test]
    fn malformed_charge_payload_is_a_decode_error() {
        assert!(matches!(
            parse_charge(b"not json"),
            Err(GatewayError::Decode { .. })
        ));
    }

    #[test]
    fn grant_payload_yields_the_connected_account_id() {
        let account = parse_connect(br#"{ "stripe_user_id": "acct_42", "scope": "read_write" }"#)
            .expect("grant parses");
        assert_eq!(account, "acct_42");
    }
}
