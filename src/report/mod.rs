//! Report module - turns a validated form snapshot into a PDF document.
//!
//! - `input` - form fields and the submission snapshot
//! - `validation` - required-field checks
//! - `layout` - page geometry constants
//! - `document` - the immutable drawing-operation document
//! - `builder` - title, labeled fields and scaled photo placement
//! - `pdf` - lopdf serialization
//! - `common` - timestamp and filename helpers

pub mod builder;
pub mod common;
pub mod document;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod validation;

pub use builder::{BuiltReport, ReportBuilder};
pub use common::{format_registration_time, report_filename, sanitize_filename};
pub use document::{Document, DrawOp};
pub use input::{ReportFields, ReportInput};
pub use layout::LayoutConfig;
pub use pdf::PdfError;
pub use validation::{ValidationError, ValidationErrors, Validator};
