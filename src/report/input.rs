use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{validate_required, ValidationErrors, Validator};
use crate::photo::ImageAttachment;

/// Editable text fields of the report form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportFields {
    #[serde(default, alias = "bairro")]
    #[schema(example = "São José")]
    pub neighborhood: String,
    #[serde(default, alias = "rua")]
    #[schema(example = "Rua das Flores")]
    pub street: String,
    #[serde(default, alias = "complemento")]
    #[schema(example = "Em frente à praça")]
    pub complement: String,
    #[serde(default, alias = "descricao")]
    #[schema(example = "Recapeamento asfáltico concluído")]
    pub description: String,
}

impl Validator for ReportFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.neighborhood, "neighborhood", "Bairro", &mut errors);
        validate_required(&self.street, "street", "Rua", &mut errors);
        validate_required(&self.complement, "complement", "Complemento", &mut errors);
        validate_required(&self.description, "description", "Descrição", &mut errors);
        errors.into_result()
    }
}

/// Snapshot of the form taken at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    pub neighborhood: String,
    /// Upper-cased.
    pub street: String,
    pub complement: String,
    pub description: String,
    pub registered_at: String,
    pub image: Option<ImageAttachment>,
}

impl ReportInput {
    /// Validate `fields` and take the snapshot.
    pub fn new(
        fields: &ReportFields,
        registered_at: impl Into<String>,
        image: Option<ImageAttachment>,
    ) -> Result<Self, ValidationErrors> {
        fields.validate()?;
        Ok(Self {
            neighborhood: fields.neighborhood.trim().to_string(),
            street: fields.street.trim().to_uppercase(),
            complement: fields.complement.trim().to_string(),
            description: fields.description.trim().to_string(),
            registered_at: registered_at.into(),
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ReportFields {
        ReportFields {
            neighborhood: " Centro ".into(),
            street: "rua são bento".into(),
            complement: "Lote 4".into(),
            description: "Calçada refeita".into(),
        }
    }

    #[test]
    fn test_snapshot_trims_and_uppercases_street() {
        let input = ReportInput::new(&fields(), "01/02/2026, 10:00:00", None).unwrap();
        assert_eq!(input.neighborhood, "Centro");
        assert_eq!(input.street, "RUA SÃO BENTO");
        assert!(input.image.is_none());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut f = fields();
        f.street = "  ".into();
        f.description.clear();
        let err = ReportInput::new(&f, "x", None).unwrap_err();
        assert_eq!(err.fields(), vec!["street", "description"]);
    }

    #[test]
    fn test_fields_accept_portuguese_names() {
        let json = r#"{"bairro":"Centro","rua":"Rua A","complemento":"B","descricao":"C"}"#;
        let f: ReportFields = serde_json::from_str(json).unwrap();
        assert_eq!(f.neighborhood, "Centro");
        assert_eq!(f.description, "C");
    }
}
