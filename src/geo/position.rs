//! One-shot position fixes.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PositionError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(PositionError::OutOfRange {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PositionError {
    #[error("position fix failed: {0}")]
    Unavailable(String),
    #[error("coordinates out of range: ({latitude}, {longitude})")]
    OutOfRange { latitude: f64, longitude: f64 },
}

#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Whether positioning exists at all on this platform.
    fn is_supported(&self) -> bool;

    /// Resolve a single fix. No retry.
    async fn current_position(&self) -> Result<Position, PositionError>;
}

/// Position fix as reported by the client device.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PositionReport {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Set when the device could not produce a fix (e.g. permission denied).
    #[schema(example = "User denied Geolocation")]
    pub error: Option<String>,
}

#[async_trait]
impl PositionProvider for PositionReport {
    fn is_supported(&self) -> bool {
        self.error.is_some() || (self.latitude.is_some() && self.longitude.is_some())
    }

    async fn current_position(&self) -> Result<Position, PositionError> {
        if let Some(error) = &self.error {
            return Err(PositionError::Unavailable(error.clone()));
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Position::new(latitude, longitude),
            _ => Err(PositionError::Unavailable("no coordinates reported".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_with_coordinates() {
        let report = PositionReport {
            latitude: Some(-8.05),
            longitude: Some(-34.9),
            error: None,
        };
        assert!(report.is_supported());
        let position = report.current_position().await.unwrap();
        assert_eq!(position, Position { latitude: -8.05, longitude: -34.9 });
    }

    #[tokio::test]
    async fn test_report_with_error() {
        let report = PositionReport {
            error: Some("User denied Geolocation".into()),
            ..Default::default()
        };
        assert!(report.is_supported());
        assert!(matches!(
            report.current_position().await,
            Err(PositionError::Unavailable(_))
        ));
    }

    #[test]
    fn test_empty_report_is_unsupported() {
        assert!(!PositionReport::default().is_supported());
        let half = PositionReport {
            latitude: Some(1.0),
            ..Default::default()
        };
        assert!(!half.is_supported());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Position::new(91.0, 0.0).is_err());
        assert!(Position::new(0.0, f64::NAN).is_err());
        assert!(Position::new(-90.0, 180.0).is_ok());
    }
}
