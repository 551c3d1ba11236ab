//! Common utilities for report generation.
//!
//! Timestamp formatting and filename sanitization shared by the builder and
//! the output dispatcher.

use chrono::{DateTime, Local, TimeZone};
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

pub const REPORT_FILE_PREFIX: &str = "Relatorio_Obras_";

/// Format a timestamp the way pt-BR locales print it (e.g. "16/10/2026, 14:03:05").
pub fn format_pt_br_datetime<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%d/%m/%Y, %H:%M:%S").to_string()
}

/// Current local time in pt-BR format.
pub fn format_registration_time() -> String {
    format_pt_br_datetime(&Local::now())
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\-]").expect("static regex"))
}

/// Sanitize a neighborhood name for use in a filename.
///
/// Diacritics are stripped after canonical decomposition, whitespace runs
/// become a single underscore, and anything outside `[A-Za-z0-9_-]` is dropped.
pub fn sanitize_filename(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect();
    let underscored = whitespace_run().replace_all(&stripped, "_");
    disallowed_chars().replace_all(&underscored, "").into_owned()
}

/// `Relatorio_Obras_<sanitized-neighborhood>.pdf`
pub fn report_filename(neighborhood: &str) -> String {
    format!("{}{}.pdf", REPORT_FILE_PREFIX, sanitize_filename(neighborhood))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_sanitize_strips_diacritics_and_spaces() {
        assert_eq!(sanitize_filename("São José Center"), "Sao_Jose_Center");
    }

    #[test]
    fn test_sanitize_collapses_whitespace_runs() {
        assert_eq!(sanitize_filename("Vila   Nova\tSul"), "Vila_Nova_Sul");
    }

    #[test]
    fn test_sanitize_drops_punctuation_but_keeps_hyphen() {
        assert_eq!(sanitize_filename("Jardim (Norte)-2!"), "Jardim_Norte-2");
        assert_eq!(sanitize_filename("Conceição/Açaí"), "ConceicaoAcai");
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(report_filename("Centro"), "Relatorio_Obras_Centro.pdf");
        assert_eq!(report_filename(""), "Relatorio_Obras_.pdf");
    }

    #[test]
    fn test_format_pt_br_datetime() {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let date = tz.with_ymd_and_hms(2026, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(format_pt_br_datetime(&date), "07/03/2026, 09:05:02");
    }
}
