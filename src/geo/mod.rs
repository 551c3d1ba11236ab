//! Address lookup - resolves a device position to neighborhood and street.
//!
//! - `position` - one-shot position providers
//! - `nominatim` - the reverse geocoding HTTP client

pub mod nominatim;
pub mod position;

pub use nominatim::{LookupError, ReverseGeocodeClient};
pub use position::{Position, PositionError, PositionProvider, PositionReport};

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use nominatim::NominatimAddress;

pub const NEIGHBORHOOD_PLACEHOLDER: &str = "Não encontrado. Insira manualmente!";
pub const STREET_PLACEHOLDER: &str = "Não encontrada. Insira manualmente!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AddressResult {
    #[schema(example = "Boa Viagem")]
    pub neighborhood: String,
    #[schema(example = "Avenida Conselheiro Aguiar")]
    pub street: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<NominatimAddress> for AddressResult {
    fn from(address: NominatimAddress) -> Self {
        let neighborhood = non_empty(address.suburb)
            .or_else(|| non_empty(address.neighbourhood))
            .unwrap_or_else(|| NEIGHBORHOOD_PLACEHOLDER.to_string());
        let street = non_empty(address.road).unwrap_or_else(|| STREET_PLACEHOLDER.to_string());
        Self {
            neighborhood,
            street,
        }
    }
}

#[derive(Debug, Error)]
pub enum AddressLookupError {
    #[error("positioning is not available on this platform")]
    UnsupportedPlatform,
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

#[derive(Debug, Clone)]
pub struct AddressLookup {
    client: ReverseGeocodeClient,
}

impl AddressLookup {
    pub fn new(client: ReverseGeocodeClient) -> Self {
        Self { client }
    }

    pub async fn lookup(
        &self,
        provider: &dyn PositionProvider,
    ) -> Result<AddressResult, AddressLookupError> {
        if !provider.is_supported() {
            return Err(AddressLookupError::UnsupportedPlatform);
        }
        let position = provider.current_position().await?;
        Ok(self.client.reverse(position).await?)
    }

    pub async fn lookup_position(&self, position: Position) -> Result<AddressResult, LookupError> {
        self.client.reverse(position).await
    }
}
