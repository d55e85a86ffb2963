//! MapQuest-backed forward geocoding adapter.
//!
//! Resolves a free-form address into country/admin/city components. An
//! address the provider cannot place resolves to an empty
//! [`GeocodedAddress`] rather than an error; callers decide which components
//! they require.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::domain::ports::{GatewayError, GeocodedAddress, Geocoder};

use super::http::{map_status_error, map_transport_error};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Endpoint and credential settings for the MapQuest adapter.
#[derive(Debug, Clone)]
pub struct MapQuestConfig {
    /// API origin, e.g. `https://www.mapquestapi.com`.
    pub api_base: Url,
    pub api_key: String,
}

/// MapQuest adapter implementing the [`Geocoder`] port.
pub struct MapQuestGeocoder {
    client: Client,
    config: MapQuestConfig,
}

impl MapQuestGeocoder {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: MapQuestConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(config: MapQuestConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponseDto {
    #[serde(default)]
    results: Vec<GeocodeResultDto>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResultDto {
    #[serde(default)]
    locations: Vec<LocationDto>,
}

/// MapQuest labels administrative areas by level: 1 is the country, 3 the
/// state/region, 5 the city.
#[derive(Debug, Default, Deserialize)]
struct LocationDto {
    #[serde(rename = "adminArea1", default)]
    country: Option<String>,
    #[serde(rename = "adminArea3", default)]
    admin: Option<String>,
    #[serde(rename = "adminArea5", default)]
    city: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_geocode(body: &[u8]) -> Result<GeocodedAddress, GatewayError> {
    let decoded: GeocodeResponseDto = serde_json::from_slice(body)
        .map_err(|err| GatewayError::decode(format!("invalid geocode payload: {err}")))?;
    let location = decoded
        .results
        .into_iter()
        .next()
        .and_then(|result| result.locations.into_iter().next())
        .unwrap_or_default();
    Ok(GeocodedAddress {
        country: non_blank(location.country),
        admin: non_blank(location.admin),
        city: non_blank(location.city),
    })
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GatewayError> {
        let mut url = self
            .config
            .api_base
            .join("/geocoding/v1/address")
            .map_err(|err| GatewayError::transport(format!("invalid endpoint: {err}")))?;
        url.query_pairs_mut()
            .append_pair("key", &self.config.api_key)
            .append_pair("location", address);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_geocode(body.as_ref())
    }
}
