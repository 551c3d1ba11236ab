//! Reverse geocoding against a Nominatim-compatible endpoint.

use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;

use super::position::Position;
use super::AddressResult;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("geocoding request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("geocoding service returned status {0}")]
    Status(u16),
    #[error("invalid geocoding response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("geocoding response has no address")]
    NoAddress,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub suburb: Option<String>,
    pub neighbourhood: Option<String>,
    pub road: Option<String>,
}

/// Reply body; `address` is absent when nothing was found
/// (e.g. `{"error":"Unable to geocode"}`).
#[derive(Debug, Default, Deserialize)]
pub struct NominatimResponse {
    pub address: Option<NominatimAddress>,
}

#[derive(Debug, Clone)]
pub struct ReverseGeocodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReverseGeocodeClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `GET {base}/reverse?format=json&lat=..&lon=..&addressdetails=1`
    pub async fn reverse(&self, position: Position) -> Result<AddressResult, LookupError> {
        let url = format!("{}/reverse", self.base_url);
        log::debug!(
            "Reverse geocoding ({}, {})",
            position.latitude,
            position.longitude
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(LookupError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: NominatimResponse = response.json().await.map_err(LookupError::Decode)?;
        body.address
            .map(AddressResult::from)
            .ok_or(LookupError::NoAddress)
    }
}
