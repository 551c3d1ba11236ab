use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::geo::AddressResult;
use crate::photo::{ControlValues, PreviewElement};
use crate::report::{ReportFields, ValidationError};
use crate::status::StatusMessage;
use crate::ErrorResponse;

/// Everything the page shows for one form.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormView {
    #[schema(example = "a1b2c3d4-e5f6-7890-1234-567890abcdef")]
    pub id: Uuid,
    pub fields: ReportFields,
    /// Current time in pt-BR format; frozen into the report at submission.
    #[schema(example = "16/10/2026, 14:03:05")]
    pub registered_at: String,
    pub preview: PreviewElement,
    pub controls: ControlValues,
    pub status: StatusMessage,
    pub submit_enabled: bool,
    pub lookup_enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShareResponse {
    pub shared: bool,
    #[schema(example = "Relatorio_Obras_Centro.pdf")]
    pub filename: String,
    pub status: StatusMessage,
    /// Set when the photo could not be embedded.
    pub warning: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocateResponse {
    pub address: Option<AddressResult>,
    /// Single user-facing alert when the lookup failed.
    pub alert: Option<String>,
    pub form: FormView,
}

/// Required fields missing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationFailure {
    #[serde(flatten)]
    pub error: ErrorResponse,
    pub invalid_fields: Vec<ValidationError>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReverseQuery {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

#[allow(unused)]
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadImageRequest {
    /// Image picked from files (mutually exclusive with `camera`)
    pub file: Option<Vec<u8>>,
    /// Image captured with the camera
    pub camera: Option<Vec<u8>>,
}
